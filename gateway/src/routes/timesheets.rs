use attendance_service::models::{TimesheetHeader, TimesheetLine};
use attendance_service::{NewTimesheetLine, WeekTimesheet};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::{ApiError, ApiResult, AppState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoursBody {
    pub hours_booked: f64,
}

pub async fn week(State(state): State<AppState>, Path(date): Path<String>) -> ApiResult<WeekTimesheet> {
    Ok(Json(state.router.week_timesheet(&date).await?))
}

pub async fn add_line(
    State(state): State<AppState>,
    Json(body): Json<NewTimesheetLine>,
) -> Result<(StatusCode, Json<TimesheetLine>), ApiError> {
    let line = state.router.add_timesheet_line(body).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

pub async fn update_line(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<HoursBody>,
) -> ApiResult<TimesheetLine> {
    Ok(Json(state.router.update_timesheet_line(id, body.hours_booked).await?))
}

pub async fn delete_line(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.router.delete_timesheet_line(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<TimesheetHeader> {
    Ok(Json(state.router.submit_timesheet(id).await?))
}
