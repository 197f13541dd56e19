use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use quill_core::SessionId;
use quill_engine::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("please enter text or upload a file")]
    EmptyInput,

    #[error("unsupported file encoding, please upload a UTF-8 or GBK text file")]
    EncodingUnsupported,

    #[error("upload exceeds the size limit")]
    TooLarge,

    #[error("malformed form data: {0}")]
    Multipart(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("session not found: {0}")]
    NotFound(SessionId),

    #[error("an operation is already running for session {0}")]
    Busy(SessionId),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Busy(_) => StatusCode::CONFLICT,
            Self::Upload(UploadError::TooLarge) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upload(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::SessionNotFound(id) => Self::NotFound(id),
            EngineError::SessionBusy(id) => Self::Busy(id),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

/// Turn a handler panic into the usual internal-error body.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "no panic message".to_string());
    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}
