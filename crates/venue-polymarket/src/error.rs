//! Error types for the Polymarket venue client.
//!
//! Mirrors the error taxonomy in SPEC_FULL.md §7: transport, parse, not-found, rate-limit,
//! and validation failures. The venue client layer recovers from all of these; callers see
//! `None` rather than a propagated error.

use thiserror::Error;

/// Errors that can occur when interacting with Polymarket.
#[derive(Debug, Error)]
pub enum PolymarketError {
    /// API request failed with a non-2xx status.
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Error message from the API.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimit {
        /// Seconds to wait before retry.
        retry_after_secs: u64,
    },

    /// Network-level transport error.
    #[error("network error: {0}")]
    Network(String),

    /// Request timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// The requested event slug could not be found.
    #[error("event not found: {slug}")]
    EventNotFound {
        /// The event slug that was not found.
        slug: String,
    },

    /// WebSocket connection or protocol error.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// Response body could not be parsed into the expected shape.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl PolymarketError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api { status_code, message: message.into() }
    }

    /// Creates a rate limit error.
    pub fn rate_limit(retry_after_secs: u64) -> Self {
        Self::RateLimit { retry_after_secs }
    }

    /// Creates an event-not-found error.
    pub fn event_not_found(slug: impl Into<String>) -> Self {
        Self::EventNotFound { slug: slug.into() }
    }

    /// Returns true if the error is retryable as-is (transport-level).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_) | Self::RateLimit { .. })
    }

    /// Returns true if the error indicates the request should be retried later, including
    /// server-side (5xx) API errors.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimit { .. } => true,
            Self::Api { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for PolymarketError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PolymarketError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for PolymarketError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(err.to_string())
    }
}

/// Result type alias for Polymarket operations.
pub type Result<T> = std::result::Result<T, PolymarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_construction() {
        let err = PolymarketError::api(404, "not found");
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_rate_limit_is_retryable_and_transient() {
        let err = PolymarketError::rate_limit(30);
        assert!(err.is_retryable());
        assert!(err.is_transient());
    }

    #[test]
    fn test_server_error_transient_not_retryable() {
        let err = PolymarketError::api(503, "unavailable");
        assert!(!err.is_retryable());
        assert!(err.is_transient());
    }

    #[test]
    fn test_client_error_neither() {
        let err = PolymarketError::api(400, "bad request");
        assert!(!err.is_retryable());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_event_not_found_display() {
        let err = PolymarketError::event_not_found("nba-lal-bos-2026-02-02");
        assert!(err.to_string().contains("nba-lal-bos-2026-02-02"));
    }
}
