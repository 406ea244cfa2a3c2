//! Error types for the relay server
//!
//! [`ApiError`] is converted to JSON responses with appropriate status codes.
//! [`ServerError`] covers startup and serving failures.

use std::io;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::generator::InvokeError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// No route for the requested path (404)
    NotFound { path: String },

    /// Generator could not be started (503 when the program is missing, 500 otherwise)
    Generator(InvokeError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::NotFound { path } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("no route for '{}'", path)
                }),
            ),
            Self::Generator(InvokeError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                tracing::error!("Generator program not found: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({
                        "error": "generator_unavailable",
                        "message": "the generator program could not be found"
                    }),
                )
            }
            Self::Generator(e) => {
                // Log the actual error, return generic message
                tracing::error!("Generator error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "failed to start the generator"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Errors that stop the server from starting or serving
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("generator error: {0}")]
    Invoke(#[from] InvokeError),
}

pub type Result<T> = std::result::Result<T, ServerError>;

impl From<InvokeError> for ApiError {
    fn from(e: InvokeError) -> Self {
        Self::Generator(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn not_found_is_404_with_json_body() {
        let err = ApiError::NotFound {
            path: "/nope".into(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "not_found");
    }

    #[tokio::test]
    async fn missing_program_is_503() {
        let err: ApiError = InvokeError::Io(io::Error::from(io::ErrorKind::NotFound)).into();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn other_spawn_failures_are_500() {
        let err: ApiError = InvokeError::EmptyCommand.into();
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
