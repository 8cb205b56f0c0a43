use attendance_service::{MonthCalendar, TimesheetProgress};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::{ApiResult, AppState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarParams {
    pub employee_id: Option<String>,
}

pub async fn month_calendar(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
    Query(params): Query<CalendarParams>,
) -> ApiResult<MonthCalendar> {
    let calendar = state
        .router
        .calendar(year, month, params.employee_id.as_deref())
        .await?;
    Ok(Json(calendar))
}

pub async fn fill_status(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> ApiResult<TimesheetProgress> {
    Ok(Json(state.router.fill_status(&date).await?))
}
