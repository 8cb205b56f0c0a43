use attendance_service::models::RegularizationRequest;
use attendance_service::{NewRegularization, RangeValidation};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::{ApiError, ApiResult, AppState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeBody {
    pub from_date: String,
    pub to_date: String,
}

pub async fn validate(
    State(state): State<AppState>,
    Json(body): Json<RangeBody>,
) -> ApiResult<RangeValidation> {
    let result = state
        .router
        .validate_regularization(&body.from_date, &body.to_date)
        .await?;
    Ok(Json(result))
}

pub async fn submit(
    State(state): State<AppState>,
    Json(body): Json<NewRegularization>,
) -> Result<(StatusCode, Json<RegularizationRequest>), ApiError> {
    let created = state.router.submit_regularization(body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn mine(State(state): State<AppState>) -> ApiResult<Vec<RegularizationRequest>> {
    Ok(Json(state.router.my_regularizations().await?))
}

pub async fn pending(State(state): State<AppState>) -> ApiResult<Vec<RegularizationRequest>> {
    Ok(Json(state.router.pending_regularizations().await?))
}
