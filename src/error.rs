//! Error types for linkcard-web
//!
//! Two layers live here. [`Error`] is the crate-level error used by setup code
//! (configuration, binding the listener). [`PreviewError`] is what the preview
//! path returns; it knows how to turn itself into an HTTP response so the
//! handler never has to map status codes by hand.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for linkcard-web setup and runtime operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Outbound fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Configuration loading errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but could not be parsed
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue {
        /// Variable or flag name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// The bind address could not be parsed
    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),
}

/// Errors from the single outbound GET
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// The request did not complete within the configured timeout
    #[error("Fetch timed out after {0}ms")]
    Timeout(u64),

    /// Connection, DNS, TLS or other transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Reading the response body failed part-way
    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl FetchError {
    /// Classify a reqwest error, folding timeouts into [`FetchError::Timeout`].
    pub fn from_reqwest(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(timeout_ms)
        } else if err.is_body() || err.is_decode() {
            FetchError::Body(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Caller input problems, rejected before any network I/O
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidRequest {
    /// `url` absent, null, or empty
    #[error("URL is required")]
    MissingUrl,

    /// `url` is present but is not a well-formed absolute URL
    #[error("Invalid URL")]
    MalformedUrl,
}

/// Failure of a preview request
///
/// An unsuccessful upstream status is deliberately absent: it is absorbed into
/// a degraded [`PreviewResult`](crate::preview::PreviewResult) instead.
#[derive(Error, Debug)]
pub enum PreviewError {
    /// Rejected input (400)
    #[error(transparent)]
    InvalidRequest(#[from] InvalidRequest),

    /// Any fault during fetch or parse (500)
    #[error("Internal failure: {0}")]
    Internal(#[from] FetchError),
}

/// Message returned to callers on internal failure. Never carries detail.
pub const INTERNAL_FAILURE_MESSAGE: &str = "Failed to fetch preview";

/// JSON error body: `{ "error": "..." }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short machine-readable reason
    pub error: String,
}

impl PreviewError {
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            PreviewError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PreviewError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The body message exposed to callers.
    pub fn public_message(&self) -> String {
        match self {
            PreviewError::InvalidRequest(reason) => reason.to_string(),
            PreviewError::Internal(_) => INTERNAL_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for PreviewError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Result type alias for linkcard-web operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a generic error from a string
    pub fn generic<S: Into<String>>(msg: S) -> Self {
        Error::Generic(msg.into())
    }
}
