//! Polymarket venue integration for the cross-venue arbitrage scanner.
//!
//! This crate provides:
//! - A Gamma API client for event/market discovery
//! - A CLOB REST client for order book snapshots, including the bid/ask merge that
//!   reconstructs a side's effective ask ladder from the complementary outcome's bids
//! - A CLOB WebSocket client for realtime order book streaming
//!
//! # Example
//!
//! ```no_run
//! use venue_polymarket::{PolymarketClient, PolymarketClientConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = PolymarketClient::new(PolymarketClientConfig::default());
//!     let event = client.get_event("will-it-rain-tomorrow").await;
//!     println!("{event:?}");
//! }
//! ```

pub mod clob;
pub mod error;
pub mod gamma;
pub mod models;
pub mod venue_client;
pub mod websocket;

pub use clob::{ClobClient, ClobClientConfig, NormalizedOrderBook, PriceLevel};
pub use error::{PolymarketError, Result};
pub use gamma::{GammaClient, GammaClientConfig};
pub use models::{GammaEvent, GammaMarket};
pub use venue_client::{PolymarketClient, PolymarketClientConfig};
pub use websocket::{BookEvent, L2Book, PolymarketWebSocket, Side, WebSocketConfig};
