use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use error::{AppError, ErrorResponse};

use crate::router::ServiceRouter;

pub mod approvals;
pub mod calendar;
pub mod employees;
pub mod health;
pub mod regularizations;
pub mod timesheets;

#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ServiceRouter>,
    pub version: String,
}

/// [`AppError`] rendered as an [`ErrorResponse`] body.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Permission(_) => StatusCode::FORBIDDEN,
        AppError::TransientFetch(_) => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Build the HTTP API.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/v1/me", get(employees::me))
        .route("/api/v1/employees/:id", get(employees::employee))
        .route("/api/v1/calendar/:year/:month", get(calendar::month_calendar))
        .route("/api/v1/fill-status/:date", get(calendar::fill_status))
        .route(
            "/api/v1/regularizations",
            get(regularizations::mine).post(regularizations::submit),
        )
        .route("/api/v1/regularizations/pending", get(regularizations::pending))
        .route("/api/v1/regularizations/validate", post(regularizations::validate))
        .route("/api/v1/timesheets/week/:date", get(timesheets::week))
        .route("/api/v1/timesheets/lines", post(timesheets::add_line))
        .route(
            "/api/v1/timesheets/lines/:id",
            patch(timesheets::update_line).delete(timesheets::delete_line),
        )
        .route("/api/v1/timesheets/:id/submit", post(timesheets::submit))
        .route(
            "/api/v1/approvals/:subject/:id/:action",
            post(approvals::decide),
        )
        .with_state(state)
}
