//! Error types for the Kalshi venue client.
//!
//! Mirrors the error taxonomy in SPEC_FULL.md §7: transport, parse, not-found, rate-limit,
//! validation, and auth failures. The venue client layer recovers from all of these except
//! `AuthFailure` at WebSocket connect time; callers see `None` rather than a propagated error.

use thiserror::Error;

/// Errors that can occur when interacting with Kalshi.
#[derive(Debug, Error)]
pub enum KalshiError {
    /// Streaming or REST authentication failed.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// RSA signing error.
    #[error("RSA signing error: {0}")]
    Signing(String),

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

    /// The requested ticker or series could not be found.
    #[error("market not found: {ticker}")]
    MarketNotFound {
        /// The market ticker that was not found.
        ticker: String,
    },

    /// An identifier failed validation (path-traversal guard, empty, overlong).
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error (missing environment variable, unreadable key file).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Response body could not be parsed into the expected shape.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl KalshiError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a rate limit error.
    pub fn rate_limit(retry_after_secs: u64) -> Self {
        Self::RateLimit { retry_after_secs }
    }

    /// Creates a market-not-found error.
    pub fn market_not_found(ticker: impl Into<String>) -> Self {
        Self::MarketNotFound {
            ticker: ticker.into(),
        }
    }

    /// Returns true if the error is retryable as-is (transport-level).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::RateLimit { .. }
        )
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

    /// Returns the suggested retry delay in seconds, if applicable.
    #[must_use]
    pub fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimit { retry_after_secs } => Some(*retry_after_secs),
            Self::Network(_) | Self::Timeout(_) => Some(1),
            Self::Api { status_code, .. } if *status_code >= 500 => Some(2),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for KalshiError {
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

impl From<serde_json::Error> for KalshiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for Kalshi operations.
pub type Result<T> = std::result::Result<T, KalshiError>;

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Error construction tests ====================

    #[test]
    fn test_api_error_construction() {
        let err = KalshiError::api(400, "bad request");
        assert!(matches!(
            err,
            KalshiError::Api {
                status_code: 400,
                ..
            }
        ));
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("bad request"));
    }

    #[test]
    fn test_rate_limit_error_construction() {
        let err = KalshiError::rate_limit(60);
        assert!(matches!(
            err,
            KalshiError::RateLimit {
                retry_after_secs: 60
            }
        ));
        assert!(err.to_string().contains("60"));
    }

    #[test]
    fn test_market_not_found_error() {
        let err = KalshiError::market_not_found("KXBTC-26FEB02-B100000");
        assert!(err.to_string().contains("KXBTC-26FEB02-B100000"));
    }

    // ==================== Retryable tests ====================

    #[test]
    fn test_network_error_is_retryable() {
        let err = KalshiError::Network("connection refused".to_string());
        assert!(err.is_retryable());
        assert!(err.is_transient());
    }

    #[test]
    fn test_timeout_error_is_retryable() {
        let err = KalshiError::Timeout("request timed out".to_string());
        assert!(err.is_retryable());
        assert!(err.is_transient());
    }

    #[test]
    fn test_rate_limit_error_is_retryable() {
        let err = KalshiError::rate_limit(30);
        assert!(err.is_retryable());
        assert!(err.is_transient());
    }

    #[test]
    fn test_server_error_is_transient_but_not_retryable_flag() {
        let err = KalshiError::api(500, "internal server error");
        assert!(!err.is_retryable());
        assert!(err.is_transient());
    }

    #[test]
    fn test_client_error_is_not_transient() {
        let err = KalshiError::api(400, "bad request");
        assert!(!err.is_retryable());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_auth_error_is_not_retryable() {
        let err = KalshiError::Authentication("invalid key".to_string());
        assert!(!err.is_retryable());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_validation_error_is_not_retryable() {
        let err = KalshiError::Validation("ticker contains '..'".to_string());
        assert!(!err.is_retryable());
        assert!(!err.is_transient());
    }

    // ==================== Retry delay tests ====================

    #[test]
    fn test_rate_limit_retry_delay() {
        let err = KalshiError::rate_limit(60);
        assert_eq!(err.retry_delay_secs(), Some(60));
    }

    #[test]
    fn test_network_error_retry_delay() {
        let err = KalshiError::Network("connection failed".to_string());
        assert_eq!(err.retry_delay_secs(), Some(1));
    }

    #[test]
    fn test_server_error_retry_delay() {
        let err = KalshiError::api(503, "service unavailable");
        assert_eq!(err.retry_delay_secs(), Some(2));
    }

    #[test]
    fn test_client_error_no_retry_delay() {
        let err = KalshiError::api(400, "bad request");
        assert_eq!(err.retry_delay_secs(), None);
    }

    // ==================== Error display tests ====================

    #[test]
    fn test_error_display_authentication() {
        let err = KalshiError::Authentication("invalid API key".to_string());
        let display = err.to_string();
        assert!(display.contains("authentication"));
        assert!(display.contains("invalid API key"));
    }

    #[test]
    fn test_error_display_signing() {
        let err = KalshiError::Signing("invalid private key".to_string());
        let display = err.to_string();
        assert!(display.contains("signing"));
    }

    #[test]
    fn test_error_display_configuration() {
        let err = KalshiError::Configuration("missing API key".to_string());
        let display = err.to_string();
        assert!(display.contains("configuration"));
    }
}
