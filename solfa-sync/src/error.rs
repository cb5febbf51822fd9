//! Error types for solfa-sync

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
///
/// Maps the service's error taxonomy onto HTTP statuses with the flat
/// `{"error": ...}` bodies the operator dashboard expects.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No caller identity (401)
    #[error("Unauthorized")]
    Unauthorized,

    /// Caller lacks the admin/teacher capability (403)
    #[error("Forbidden")]
    Forbidden,

    /// Missing or malformed request field (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Referenced resource does not exist (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource is not in the expected state (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The persistence collaborator failed for this request (500)
    #[error("{message}: {details}")]
    Adapter { message: String, details: String },

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// solfa-common error
    #[error(transparent)]
    Common(#[from] solfa_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({"error": "Unauthorized"}),
            ),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, json!({"error": "Forbidden"})),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({"error": msg})),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({"error": msg})),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, json!({"error": msg})),
            ApiError::Adapter { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": message, "details": details}),
            ),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": msg}))
            }
            ApiError::Common(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": err.to_string()}),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
