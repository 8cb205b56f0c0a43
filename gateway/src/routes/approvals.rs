use attendance_service::{ApprovalAction, ApprovalOutcome, ApprovalSubject};
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use super::{ApiResult, AppState};

#[derive(Deserialize, Default)]
pub struct DecisionBody {
    #[serde(default)]
    pub comment: Option<String>,
}

/// `POST /api/v1/approvals/{regularization|timesheet}/:id/{approve|reject|recall}`
pub async fn decide(
    State(state): State<AppState>,
    Path((subject, id, action)): Path<(ApprovalSubject, i64, ApprovalAction)>,
    body: Option<Json<DecisionBody>>,
) -> ApiResult<ApprovalOutcome> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let outcome = state
        .router
        .decide(subject, id, action, body.comment.as_deref())
        .await?;
    Ok(Json(outcome))
}
