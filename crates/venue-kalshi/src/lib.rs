//! Kalshi venue client for the cross-venue arbitrage scanner.
//!
//! This crate provides:
//! - a catalog client resolving `(ticker, series)` to an `arb_core::types::EventShell`
//! - an order-book client returning a normalized, bid-inverted book for a ticker
//! - RSA-PSS authentication for the streaming API
//!
//! # Example
//!
//! ```ignore
//! use venue_kalshi::{KalshiClient, KalshiClientConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = KalshiClient::new(KalshiClientConfig::default());
//!     let event = client.get_event("KXNBAGAME-26FEB02LALBOS", "KXNBAGAME").await;
//!     println!("{:?}", event.map(|e| e.markets.len()));
//! }
//! ```
//!
//! # Authentication
//!
//! The streaming API is signed with RSA-PSS (SHA-256). Credentials are read directly from
//! the environment rather than through `ConfigLoader` (SPEC_FULL.md §6/§10):
//!
//! - `KALSHI_API_ID`: the API key id.
//! - `kalshi-api-rsa`: a PEM-encoded RSA private key file at the process working directory.

pub mod auth;
pub mod client;
pub mod error;
pub mod types;
pub mod websocket;

pub use auth::{KalshiAuth, KalshiAuthConfig, SignedHeaders};
pub use client::{KalshiClient, KalshiClientConfig, KALSHI_PROD_URL};
pub use error::{KalshiError, Result};
pub use types::{Market, MarketStatus, NormalizedOrderBook, PriceLevel, Side};
pub use websocket::{BookEvent as WsBookEvent, KalshiWebSocket, WebSocketConfig as KalshiWebSocketConfig};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_exports() {
        let _ = KalshiAuthConfig::default();
        let _ = KalshiClientConfig::default();
    }

    #[test]
    fn test_error_types_accessible() {
        let err = KalshiError::api(400, "bad request");
        assert!(err.to_string().contains("400"));
    }

    #[test]
    fn test_constants_accessible() {
        assert!(KALSHI_PROD_URL.starts_with("https://"));
    }
}
