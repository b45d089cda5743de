//! Error types for literatus-web
//!
//! Wraps the engine errors and adds web-only conditions, with a single
//! mapping to HTTP status codes and JSON error bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Web service error type
#[derive(Error, Debug)]
pub enum Error {
    /// Engine error from literatus-core
    #[error(transparent)]
    Core(#[from] literatus_core::Error),

    /// Database error outside the engine (users, auth sessions)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Missing or invalid session cookie
    #[error("Not logged in")]
    Unauthorized,

    /// Malformed request parameters
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Username already taken
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Convenience Result type using the web Error
pub type Result<T> = std::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        use literatus_core::Error as Core;

        let status = match &self {
            Error::Core(Core::NotFound(_)) => StatusCode::NOT_FOUND,
            Error::Core(Core::InvalidState(_)) => StatusCode::CONFLICT,
            Error::Core(Core::PermissionDenied(_)) => StatusCode::FORBIDDEN,
            Error::Core(Core::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Error::Core(Core::InvariantViolation(_)) | Error::Core(Core::Database(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Conflict(_) => StatusCode::CONFLICT,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Internal error: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
