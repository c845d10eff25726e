// Central Error Type for the Application

use crate::domain::QueueError;
use crate::port::ApiError;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Request was cleared from the queue before it started")]
    QueueCleared,

    #[error("Request panicked: {0}")]
    Panicked(String),

    #[error("Request abandoned before completion")]
    Abandoned,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl From<QueueError<ApiError>> for AppError {
    fn from(err: QueueError<ApiError>) -> Self {
        match err {
            QueueError::Failed(api) => AppError::Api(api),
            QueueError::Cleared => AppError::QueueCleared,
            QueueError::Panicked(msg) => AppError::Panicked(msg),
            QueueError::Abandoned => AppError::Abandoned,
        }
    }
}
