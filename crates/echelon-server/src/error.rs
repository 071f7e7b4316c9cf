//! Mapping of core errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use echelon_core::EchelonError;
use serde_json::json;
use thiserror::Error;

/// Errors returned by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failure reported by the ranking core.
    #[error(transparent)]
    Echelon(#[from] EchelonError),

    /// The request could not be understood.
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl ApiError {
    /// Status code and machine-readable error type.
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Echelon(err) => match err {
                EchelonError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                EchelonError::DuplicateName(_) | EchelonError::AlreadyInitialized(_) => {
                    (StatusCode::CONFLICT, "conflict")
                }
                EchelonError::InvalidOutcome(_) => (StatusCode::BAD_REQUEST, "invalid_outcome"),
                EchelonError::InsufficientItems { .. } => {
                    (StatusCode::CONFLICT, "insufficient_items")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.classify();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
