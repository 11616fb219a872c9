use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::dao::storage::StorageError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested game does not exist (or was already terminated).
    #[error("game `{0}` not found")]
    NotFound(u64),
    /// No unique game id could be derived.
    #[error("unable to allocate a game id: {reason}")]
    AllocationFailed {
        /// Why allocation stopped.
        reason: String,
        /// Store failure behind it, if any.
        #[source]
        source: Option<StorageError>,
    },
    /// Storage rejected a write.
    #[error("storage write failed")]
    StoreWrite(#[source] StorageError),
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// A storage round-trip exceeded its deadline.
    #[error("storage operation timed out")]
    Timeout,
}

impl ServiceError {
    pub(crate) fn allocation(reason: impl Into<String>, source: Option<StorageError>) -> Self {
        ServiceError::AllocationFailed {
            reason: reason.into(),
            source,
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status matching the error class.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Store failures are logged with their full chain here; clients only see a generic message.
impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::NotFound(id) => AppError::NotFound(format!("game `{id}` not found")),
            ServiceError::AllocationFailed { reason, source } => {
                if let Some(source) = source {
                    error!(error = %source, %reason, "game id allocation failed");
                }
                AppError::Internal("unable to generate incremental id for new game".into())
            }
            ServiceError::StoreWrite(source) => {
                error!(error = %source, "storage write failed");
                AppError::Internal("failed to persist game".into())
            }
            ServiceError::Unavailable(source) => {
                error!(error = %source, "storage unavailable");
                AppError::ServiceUnavailable("storage unavailable".into())
            }
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Timeout => AppError::ServiceUnavailable("operation timed out".into()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let payload = Json(ErrorBody {
            success: false,
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
