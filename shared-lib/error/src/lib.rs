//! Common error types for the self-service crates.
//!
//! Every operation reports one of four failure kinds: a validation failure
//! (rejected before any write), a missing record, a missing capability, or a
//! transient failure talking to the store or the directory.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Transient fetch error: {0}")]
    TransientFetch(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the caller may offer a retry for this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::TransientFetch(_))
    }
}

/// Record store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Record {id} not found in {collection}")]
    NotFound { collection: String, id: i64 },

    #[error("Malformed record: {0}")]
    Malformed(String),
}

/// Directory (identity and group) errors.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Directory unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Malformed directory response: {0}")]
    Malformed(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => AppError::NotFound(err.to_string()),
            StoreError::Malformed(msg) => AppError::Internal(msg),
            StoreError::Unavailable(_) | StoreError::RequestFailed(_) => {
                AppError::TransientFetch(err.to_string())
            }
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::UnknownUser(_) => AppError::NotFound(err.to_string()),
            DirectoryError::Malformed(msg) => AppError::Internal(msg),
            DirectoryError::Unavailable(_) => AppError::TransientFetch(err.to_string()),
        }
    }
}

/// Error response for API clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Whether the client should show a retry affordance
    pub retryable: bool,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    /// Add details to the error response.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let (code, message, details) = match err {
            AppError::Validation(d) => ("VALIDATION_FAILED", "Request failed validation", d),
            AppError::NotFound(d) => ("NOT_FOUND", "Record not found", d),
            AppError::Permission(d) => ("PERMISSION_DENIED", "Action not permitted", d),
            AppError::TransientFetch(d) => ("TRANSIENT_FETCH", "Data source unavailable, try again", d),
            AppError::Internal(d) => ("INTERNAL", "Internal error", d),
        };
        let mut response = Self::new(code, message).with_details(details.clone());
        response.retryable = err.is_retryable();
        response
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;
