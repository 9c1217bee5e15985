//! RSA-PSS authentication for the Kalshi streaming API.
//!
//! Kalshi's WebSocket endpoint requires a signature over `"{timestamp}{method}{path}"`
//! using RSA-PSS (SHA-256). Credentials are read directly from the process environment
//! and working directory rather than through `ConfigLoader`/figment, since they are
//! secrets, not tunables (SPEC_FULL.md §6/§10).
//!
//! # Security
//!
//! - The API key id comes from `KALSHI_API_ID`.
//! - The private key is read from a `kalshi-api-rsa` PEM file at the process cwd.
//! - The private key is never logged; the API key id is zeroized on drop.
//!
//! # Example
//!
//! ```ignore
//! use venue_kalshi::auth::{KalshiAuth, KalshiAuthConfig};
//!
//! let auth = KalshiAuth::from_env(KalshiAuthConfig::default())?;
//! let headers = auth.sign_request("GET", "/trade-api/ws/v2", "")?;
//! ```

use crate::error::{KalshiError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rsa::pkcs8::DecodePrivateKey;
use rand::rngs::OsRng;
use rsa::pss::SigningKey;
use rsa::sha2::Sha256;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use rsa::RsaPrivateKey;
use secrecy::{ExposeSecret, SecretString};
use std::time::{SystemTime, UNIX_EPOCH};
use zeroize::Zeroize;

/// Configuration for Kalshi streaming authentication.
#[derive(Debug, Clone)]
pub struct KalshiAuthConfig {
    /// Environment variable name for the API key id.
    pub api_id_env: String,

    /// Path to the PEM-encoded RSA private key file, relative to the process cwd.
    pub private_key_path: String,
}

impl Default for KalshiAuthConfig {
    fn default() -> Self {
        Self {
            api_id_env: "KALSHI_API_ID".to_string(),
            private_key_path: "kalshi-api-rsa".to_string(),
        }
    }
}

impl KalshiAuthConfig {
    /// Sets a custom environment variable name and key file path.
    #[must_use]
    pub fn with_source(mut self, api_id_env: impl Into<String>, private_key_path: impl Into<String>) -> Self {
        self.api_id_env = api_id_env.into();
        self.private_key_path = private_key_path.into();
        self
    }
}

/// Headers required for authenticated Kalshi requests.
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    /// `KALSHI-ACCESS-KEY` header.
    pub access_key: String,

    /// `KALSHI-ACCESS-SIGNATURE` header (base64 encoded).
    pub signature: String,

    /// `KALSHI-ACCESS-TIMESTAMP` header (Unix timestamp in milliseconds).
    pub timestamp: String,
}

impl SignedHeaders {
    /// Returns headers as tuples for reqwest/tungstenite request builders.
    #[must_use]
    pub fn as_tuples(&self) -> [(&'static str, &str); 3] {
        [
            ("KALSHI-ACCESS-KEY", &self.access_key),
            ("KALSHI-ACCESS-SIGNATURE", &self.signature),
            ("KALSHI-ACCESS-TIMESTAMP", &self.timestamp),
        ]
    }
}

/// RSA-PSS authenticator for the Kalshi streaming API.
pub struct KalshiAuth {
    api_id: String,
    private_key: RsaPrivateKey,
}

impl std::fmt::Debug for KalshiAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KalshiAuth")
            .field("api_id", &self.api_id)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl Drop for KalshiAuth {
    fn drop(&mut self) {
        self.api_id.zeroize();
    }
}

impl KalshiAuth {
    /// Creates an authenticator from an API key id and PEM-encoded private key.
    ///
    /// # Errors
    /// Returns an error if the private key cannot be parsed.
    pub fn new(api_id: impl Into<String>, private_key_pem: &str) -> Result<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
            .map_err(|e| KalshiError::Signing(format!("failed to parse private key: {e}")))?;

        Ok(Self {
            api_id: api_id.into(),
            private_key,
        })
    }

    /// Creates an authenticator by reading `KALSHI_API_ID` from the environment and the
    /// RSA private key from `kalshi-api-rsa` at the process working directory.
    ///
    /// # Errors
    /// Returns an error if the environment variable or key file is missing or invalid.
    pub fn from_env(config: KalshiAuthConfig) -> Result<Self> {
        let api_id = std::env::var(&config.api_id_env).map_err(|_| {
            KalshiError::Configuration(format!(
                "missing environment variable: {}",
                config.api_id_env
            ))
        })?;

        let private_key_pem = std::fs::read_to_string(&config.private_key_path).map_err(|e| {
            KalshiError::Configuration(format!(
                "failed to read private key file {}: {e}",
                config.private_key_path
            ))
        })?;

        Self::new(api_id, &private_key_pem)
    }

    /// Creates an authenticator with a `SecretString` private key, for callers that source
    /// the PEM from somewhere other than the filesystem (e.g. a secrets manager).
    ///
    /// # Errors
    /// Returns an error if the private key cannot be parsed.
    pub fn with_secret_key(api_id: impl Into<String>, private_key_pem: SecretString) -> Result<Self> {
        Self::new(api_id, private_key_pem.expose_secret())
    }

    /// Returns the API key id.
    #[must_use]
    pub fn api_id(&self) -> &str {
        &self.api_id
    }

    /// Signs a request and returns the required headers, stamping the current time.
    ///
    /// # Errors
    /// Returns an error if the system clock is before the Unix epoch.
    pub fn sign_request(&self, method: &str, path: &str, body: &str) -> Result<SignedHeaders> {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| KalshiError::Signing(format!("failed to get timestamp: {e}")))?
            .as_millis();

        self.sign_request_with_timestamp(method, path, body, timestamp_ms as u64)
    }

    /// Signs a request with an explicit timestamp (used by tests).
    ///
    /// # Errors
    /// This implementation does not fail, but the signature is reserved for future
    /// RSA-PSS parameter validation.
    pub fn sign_request_with_timestamp(
        &self,
        method: &str,
        path: &str,
        body: &str,
        timestamp_ms: u64,
    ) -> Result<SignedHeaders> {
        let timestamp_str = timestamp_ms.to_string();
        let message = format!("{timestamp_str}{method}{path}{body}");

        let signing_key = SigningKey::<Sha256>::new(self.private_key.clone());
        let signature = signing_key.sign_with_rng(&mut OsRng, message.as_bytes());
        let signature_b64 = BASE64.encode(signature.to_bytes());

        Ok(SignedHeaders {
            access_key: self.api_id.clone(),
            signature: signature_b64,
            timestamp: timestamp_str,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Config tests ====================

    #[test]
    fn test_auth_config_default() {
        let config = KalshiAuthConfig::default();
        assert_eq!(config.api_id_env, "KALSHI_API_ID");
        assert_eq!(config.private_key_path, "kalshi-api-rsa");
    }

    #[test]
    fn test_auth_config_custom_source() {
        let config = KalshiAuthConfig::default().with_source("CUSTOM_ID", "custom-key-path");
        assert_eq!(config.api_id_env, "CUSTOM_ID");
        assert_eq!(config.private_key_path, "custom-key-path");
    }

    // ==================== SignedHeaders tests ====================

    #[test]
    fn test_signed_headers_as_tuples() {
        let headers = SignedHeaders {
            access_key: "test-key".to_string(),
            signature: "dGVzdC1zaWduYXR1cmU=".to_string(),
            timestamp: "1234567890000".to_string(),
        };

        let tuples = headers.as_tuples();
        assert_eq!(tuples.len(), 3);
        assert_eq!(tuples[0], ("KALSHI-ACCESS-KEY", "test-key"));
        assert_eq!(tuples[2], ("KALSHI-ACCESS-TIMESTAMP", "1234567890000"));
    }

    // ==================== KalshiAuth tests ====================

    #[test]
    fn test_auth_from_env_missing_api_id() {
        std::env::remove_var("TEST_MISSING_API_ID");
        let config = KalshiAuthConfig::default().with_source("TEST_MISSING_API_ID", "kalshi-api-rsa");

        let result = KalshiAuth::from_env(config);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("missing environment variable"));
    }

    #[test]
    fn test_auth_invalid_private_key() {
        let result = KalshiAuth::new("test-api-id", "invalid-pem-data");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("parse private key"));
    }

    #[test]
    fn test_signature_message_format() {
        let timestamp = "1706817600000";
        let method = "GET";
        let path = "/trade-api/ws/v2";
        let body = "";

        let message = format!("{timestamp}{method}{path}{body}");
        assert_eq!(message, "1706817600000GET/trade-api/ws/v2");
    }

    #[test]
    fn test_secret_string_not_leaked() {
        let secret = SecretString::from("super-secret-key".to_string());
        let debug_output = format!("{:?}", secret);
        assert!(!debug_output.contains("super-secret-key"));
    }
}
