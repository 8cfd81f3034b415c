use std::io::Error as IoError;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use connwatch::heartbeat::HeartbeatError;
use connwatch::notify::DeliveryError;
use connwatch::{ConfigError, DirectoryError};
use thiserror::Error;

use crate::validation::ValidationError;

/// Startup and top-level failures; any of these stops the process
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),
    #[error("notification setup error: {0}")]
    Delivery(#[from] DeliveryError),
    #[error("heartbeat error: {0}")]
    Heartbeat(#[from] HeartbeatError),
}

/// Errors returned by the HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("failed to {action}")]
    Storage {
        action: &'static str,
        #[source]
        source: DirectoryError,
    },
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}
