use crate::services::ingest::{FailureKind, IngestError};
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        if let IngestError::PayloadTooLarge { .. } = err {
            return AppError::PayloadTooLarge(err.to_string());
        }
        // The request body limit can trip while a multipart field is being staged
        if let IngestError::Staging(io) = &err {
            if let Some(multipart) = body_limit_error(io) {
                return AppError::PayloadTooLarge(multipart.body_text());
            }
        }
        match err.kind() {
            FailureKind::InvalidInput | FailureKind::DataFailure => {
                AppError::BadRequest(err.to_string())
            }
            FailureKind::Unauthorized => AppError::Unauthorized(err.to_string()),
            FailureKind::UpstreamFailure => {
                tracing::error!("Ingestion failed: {:?}", err);
                AppError::Internal(err.to_string())
            }
        }
    }
}

fn body_limit_error(err: &std::io::Error) -> Option<&MultipartError> {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<MultipartError>())
        .filter(|e| e.status() == StatusCode::PAYLOAD_TOO_LARGE)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Anyhow(e) => {
                tracing::error!("Anyhow error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
