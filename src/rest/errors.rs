//! REST Transport Error Types
//!
//! Structured errors for upload commands and binary download requests.
//! Maps HTTP status codes to specific variants for retry decisions.

/// Transport-level error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestError {
    #[error("Rate limited, try again after backoff")]
    RateLimited,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({0}): {1}")]
    Server(u16, String),

    #[error("Request timeout")]
    Timeout,

    #[error("Request error: {0}")]
    Request(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl RestError {
    /// Whether this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RestError::RateLimited
                | RestError::Timeout
                | RestError::Network(_)
                | RestError::Server(_, _)
        )
    }

    /// Create a RestError from an HTTP status code and response body
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            408 => RestError::Timeout,
            429 => RestError::RateLimited,
            500..=599 => RestError::Server(status, body.to_string()),
            _ => RestError::Request(format!("HTTP {}: {}", status, body)),
        }
    }
}

impl From<reqwest::Error> for RestError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RestError::Timeout
        } else if e.is_connect() || e.is_request() {
            RestError::Network(e.to_string())
        } else if e.is_decode() {
            RestError::InvalidResponse(e.to_string())
        } else {
            RestError::Request(e.to_string())
        }
    }
}

impl From<std::io::Error> for RestError {
    fn from(e: std::io::Error) -> Self {
        RestError::Io(e.to_string())
    }
}
