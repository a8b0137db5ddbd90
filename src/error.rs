//! Error types for the sales data layer
//!
//! Provides unified error handling using thiserror. Errors are `Clone` so a
//! single fetch outcome can be handed to every caller joined on it.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Fetch Error Enum ==
/// Unified error type for fetches, the coordinator and the HTTP facade.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport or HTTP failure talking to the sales backend
    #[error("Network error: {message}")]
    Network {
        message: String,
        status: Option<u16>,
    },

    /// Caller-enforced quota exceeded; the fetcher was never called
    #[error("Rate limit exceeded for '{key}', retry in {}ms", .retry_after.as_millis())]
    RateLimited { key: String, retry_after: Duration },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Backend answered but the body could not be decoded
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Fetch task panicked or was cancelled
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FetchError {
    /// Builds a network error without a status code.
    pub fn network(message: impl Into<String>) -> Self {
        FetchError::Network {
            message: message.into(),
            status: None,
        }
    }

    /// Builds a network error carrying the HTTP status the backend returned.
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        FetchError::Network {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Whether another attempt could succeed.
    ///
    /// Transport failures, 429 and 5xx responses are transient. Client
    /// errors, undecodable bodies, local quota rejections and panicked
    /// fetches are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network { status: None, .. } => true,
            FetchError::Network {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return FetchError::Malformed(err.to_string());
        }
        FetchError::Network {
            message: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for FetchError {
    fn into_response(self) -> Response {
        let status = match &self {
            FetchError::Network {
                status: Some(code), ..
            } => StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_GATEWAY),
            FetchError::Network { status: None, .. } => StatusCode::BAD_GATEWAY,
            FetchError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            FetchError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            FetchError::Malformed(_) => StatusCode::BAD_GATEWAY,
            FetchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the data layer.
pub type Result<T> = std::result::Result<T, FetchError>;
