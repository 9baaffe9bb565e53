//! Application-level error type returned by handlers.
//!
//! All variants serialise to [`ErrorResponse`] JSON and map to the
//! appropriate HTTP status code. No partial HTML body is ever sent.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ldview::RenderError;
use serde::{Deserialize, Serialize};

/// The JSON body returned for all error responses.
///
/// ```json
/// { "error": "failed to transform graph: template raised an error", "code": "internal_error" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human-readable description of the problem.
    pub error: String,

    /// Machine-readable error code: `not_acceptable` (406) or
    /// `internal_error` (500).
    pub code: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            error: error.into(),
        }
    }
}

/// An error that a handler can return; converts directly to an HTTP response.
#[derive(Debug)]
pub enum AppError {
    /// No representation matches the request's `Accept` header.
    NotAcceptable(String),
    /// The render pipeline failed.
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::NotAcceptable(msg) => (StatusCode::NOT_ACCEPTABLE, "not_acceptable", msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };
        let body = ErrorResponse::new(code, message);
        (status, Json(body)).into_response()
    }
}

impl From<RenderError> for AppError {
    fn from(e: RenderError) -> Self {
        tracing::error!(error = %e, "render failed");
        AppError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_roundtrip() {
        let e = ErrorResponse::new("not_acceptable", "no HTML representation");
        let json = serde_json::to_string(&e).unwrap();
        let back: ErrorResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn statuses() {
        assert_eq!(
            AppError::NotAcceptable("x".into()).into_response().status(),
            StatusCode::NOT_ACCEPTABLE
        );
        assert_eq!(
            AppError::Internal("x".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
