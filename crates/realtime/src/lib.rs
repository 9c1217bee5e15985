//! Realtime cross-venue arbitrage engine (SPEC_FULL.md §4.8, component C8).
//!
//! Two streaming venue clients (Polymarket CLOB WebSocket, Kalshi streaming WebSocket) feed
//! a pair registry. Each tracked pair gets its own trailing-edge debounce timer; once
//! quiescent, the cheapest YES ask and cheapest NO ask across both venues are compared and
//! an opportunity is opened or closed per SPEC_FULL.md's gating rule.
//!
//! # Example
//!
//! ```no_run
//! use arb_realtime::{EngineConfig, PairSubscription, RealtimeEngine};
//! use venue_kalshi::auth::KalshiAuth;
//! use venue_kalshi::websocket::WebSocketConfig as KWebSocketConfig;
//! use venue_polymarket::websocket::WebSocketConfig as PWebSocketConfig;
//! use std::sync::Arc;
//!
//! # async fn run(auth: Arc<KalshiAuth>) {
//! let pairs = vec![PairSubscription {
//!     pair_id: "lakers-celtics".to_string(),
//!     p_yes_token: "tok_yes".to_string(),
//!     p_no_token: "tok_no".to_string(),
//!     k_ticker: "KXNBAGAME-26FEB02LALBOS-LAL".to_string(),
//! }];
//!
//! let (mut engine, mut events) = RealtimeEngine::connect(
//!     pairs,
//!     PWebSocketConfig::default(),
//!     KWebSocketConfig::default(),
//!     auth,
//!     EngineConfig::default(),
//! ).await.unwrap();
//!
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//!
//! engine.stop().await;
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod evaluator;
pub mod types;

pub use engine::{EngineConfig, RealtimeEngine};
pub use error::{RealtimeError, Result};
pub use evaluator::{evaluate, BestAsk, EvaluatedSpread, VenueAsks};
pub use types::{PairSubscription, RealtimeEvent, RealtimeOpportunity};
