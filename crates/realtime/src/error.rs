//! Error type for the realtime engine.

use thiserror::Error;

/// Errors that can occur while starting the realtime engine. Per-pair evaluation never
/// errors; a missing or stale book simply yields no opportunity for that tick.
#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("polymarket streaming connect failed: {0}")]
    Polymarket(#[from] venue_polymarket::PolymarketError),

    #[error("kalshi streaming connect failed: {0}")]
    Kalshi(#[from] venue_kalshi::KalshiError),
}

pub type Result<T> = std::result::Result<T, RealtimeError>;
