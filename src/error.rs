//! Error types for the weather relay
//!
//! Every failure a caller can see is one of the three [`WeatherError`]
//! kinds. Individual upstream attempts fail with a [`FetchFailure`], which
//! decides whether the attempt is worth retrying.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Weather Error Enum ==
/// Unified error type returned by the client.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeatherError {
    /// Caller-supplied input outside the accepted domain
    #[error("Validation error: {0}")]
    Validation(String),

    /// Local admission control rejected the request
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Upstream failed terminally or retries were exhausted
    #[error("API unavailable after {attempts} attempt(s): {cause}")]
    Unavailable {
        /// Number of attempts made before giving up
        attempts: u32,
        /// The last observed failure
        cause: FetchFailure,
    },
}

// == Fetch Failure Enum ==
/// Outcome of a single failed upstream attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The attempt exceeded the configured timeout
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established or was reset
    #[error("connection error: {0}")]
    Connect(String),

    /// Upstream answered with a 5xx status (or 408)
    #[error("server error: HTTP {0}")]
    Server(u16),

    /// Upstream answered with a non-retryable 4xx status
    #[error("client error: HTTP {0}")]
    Client(u16),

    /// The response body could not be understood
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The request could not be built or sent
    #[error("request error: {0}")]
    Request(String),
}

impl FetchFailure {
    /// Classifies an HTTP status code that is not a success.
    pub fn from_status(status: u16) -> Self {
        match status {
            408 | 500..=599 => FetchFailure::Server(status),
            _ => FetchFailure::Client(status),
        }
    }

    /// Returns true when another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchFailure::Timeout | FetchFailure::Connect(_) | FetchFailure::Server(_)
        )
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for WeatherError {
    fn into_response(self) -> Response {
        let status = match &self {
            WeatherError::Validation(_) => StatusCode::BAD_REQUEST,
            WeatherError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            WeatherError::Unavailable { .. } => StatusCode::BAD_GATEWAY,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the weather relay.
pub type Result<T> = std::result::Result<T, WeatherError>;
