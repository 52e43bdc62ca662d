use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::domain::TransactionStatus;
use crate::format::DataFormat;
use crate::ports::{PublishError, RepositoryError};
use crate::validation::ValidationError;

/// Errors surfaced by the transaction pipeline.
///
/// Cache failures never appear here; the coordinator logs and drops them.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transaction not found: {0}")]
    NotFound(String),

    #[error("Transaction {transaction_id} is already {status}")]
    AlreadyFinalized {
        transaction_id: String,
        status: TransactionStatus,
    },

    #[error("Store failure: {0}")]
    Store(String),

    #[error("Publish failure: {0}")]
    Publish(String),

    #[error("Publisher circuit is open")]
    CircuitOpen,
}

impl From<RepositoryError> for PipelineError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound(id) => PipelineError::NotFound(id),
            other => PipelineError::Store(other.to_string()),
        }
    }
}

impl From<PublishError> for PipelineError {
    fn from(e: PublishError) -> Self {
        PipelineError::Publish(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        let message = e.to_string();
        match e {
            PipelineError::Validation(_) => AppError::Validation(message),
            PipelineError::NotFound(_) => AppError::NotFound(message),
            PipelineError::AlreadyFinalized { .. } => AppError::Conflict(message),
            PipelineError::Store(_) | PipelineError::Publish(_) => AppError::Internal(message),
            PipelineError::CircuitOpen => AppError::Unavailable(message),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl AppError {
    /// Error response encoded in the caller's body format.
    pub fn into_response_as(self, format: DataFormat) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
            status: status.as_u16(),
        };

        format.render(status, &body)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_as(DataFormat::Json)
    }
}
