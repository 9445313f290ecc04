use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::any::Any;

use crate::error::Error;

/// Errors a request handler can answer with.
///
/// Every variant renders as a JSON body with an `error` field; backend detail
/// is only exposed for failed inserts.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed input, answered with 400.
    #[error("{0}")]
    Validation(String),

    /// The multipart body could not be read; answered with axum's status
    /// (400 for malformed input, 413 past the body limit).
    #[error(transparent)]
    Multipart(#[from] MultipartError),

    /// The photo could not be stored; nothing was inserted.
    #[error("photo upload failed: {0}")]
    Upload(#[source] Error),

    /// The row insert failed.
    #[error("{context}: {source}")]
    Persistence {
        context: &'static str,
        #[source]
        source: Error,
    },

    /// Anything else.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(err) => err.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Unexpected(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(msg) => json!({ "error": msg }),
            ApiError::Multipart(err) => {
                tracing::debug!(error = %err, "unreadable multipart body");
                json!({ "error": err.body_text() })
            }
            ApiError::Upload(err) => {
                tracing::error!(error = %err, "photo upload failed");
                json!({ "error": "photo upload failed" })
            }
            ApiError::Persistence { context, source } => {
                tracing::error!(error = %source, "{context}");
                json!({ "error": context, "detalhes": source.detail() })
            }
            ApiError::Unexpected(msg) => {
                tracing::error!(error = %msg, "unexpected error");
                json!({ "error": "internal server error" })
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Answer for a handler that panicked
pub(crate) fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    ApiError::Unexpected(format!("handler panicked: {detail}")).into_response()
}
