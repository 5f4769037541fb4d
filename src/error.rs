//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache library and its HTTP host.
///
/// A cache miss is not an error; the library reports it as `Ok(None)`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found or expired (HTTP layer only)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Caller passed an unusable argument, rejected before any I/O
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing or malformed store configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Stored payload is not valid UTF-8
    #[error("Value is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Store communication failure, passed through as-is
    #[error("Store error: {0}")]
    Store(#[from] mongodb::error::Error),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            CacheError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CacheError::InvalidUtf8(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CacheError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
