use axum::extract::{Path, State};
use axum::Json;
use directory::{Caller, UserInfo};

use super::{ApiResult, AppState};

pub async fn me(State(state): State<AppState>) -> ApiResult<Caller> {
    Ok(Json(state.router.me().await?))
}

pub async fn employee(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<UserInfo> {
    Ok(Json(state.router.employee(id).await?))
}
