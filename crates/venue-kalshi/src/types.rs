//! Data models for the Kalshi venue client.
//!
//! All prices are normalized to `f64` probabilities (SPEC_FULL.md §4.6); the wire format is
//! cents (`0..=100`), converted via `arb_core::price::p_from_cents`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Kalshi market (event contract), as returned by the catalog client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// Market ticker (e.g., "KXBTC-26FEB02-B100000").
    pub ticker: String,

    /// Event ticker this market belongs to.
    pub event_ticker: String,

    /// Market title/question.
    pub title: String,

    /// Market subtitle (often describes the settlement condition).
    pub subtitle: Option<String>,

    /// Whether the market is currently open for trading.
    pub status: MarketStatus,

    /// Yes price, probability in `[0, 1]`, derived from mid or last trade.
    pub yes_price: f64,

    /// No price, probability in `[0, 1]`.
    pub no_price: Option<f64>,

    /// 24h volume in contracts.
    pub volume_24h: Option<i64>,

    /// Market close time.
    pub close_time: Option<DateTime<Utc>>,
}

impl Market {
    /// Returns true if the market is currently tradeable.
    #[must_use]
    pub fn is_tradeable(&self) -> bool {
        self.status == MarketStatus::Open
    }
}

/// Market status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketStatus {
    Open,
    Closed,
    Settled,
    Paused,
}

/// Side of a binary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
        }
    }

    #[must_use]
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

/// A single price level in a normalized order book.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Probability in `(0, 1)`.
    pub price: f64,
    /// Number of contracts available at this price.
    pub size: f64,
}

/// A normalized order book for one market, with both sides already expressed as asks
/// (SPEC_FULL.md §4.1/§4.2: a bid at `X` on side `S` equals an ask at `1-X` on side `¬S`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedOrderBook {
    pub ticker: String,
    /// Ascending by price, no zero-size entries.
    pub yes_asks: Vec<PriceLevel>,
    /// Ascending by price, no zero-size entries.
    pub no_asks: Vec<PriceLevel>,
    pub updated_at: DateTime<Utc>,
}

impl NormalizedOrderBook {
    #[must_use]
    pub fn best_yes_ask(&self) -> Option<f64> {
        self.yes_asks.first().map(|l| l.price)
    }

    #[must_use]
    pub fn best_no_ask(&self) -> Option<f64> {
        self.no_asks.first().map(|l| l.price)
    }

    #[must_use]
    pub fn yes_ask_depth(&self) -> f64 {
        self.yes_asks.iter().map(|l| l.size).sum()
    }

    #[must_use]
    pub fn no_ask_depth(&self) -> f64 {
        self.no_asks.iter().map(|l| l.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_market() -> Market {
        Market {
            ticker: "KXBTC-26FEB02-B100000".to_string(),
            event_ticker: "KXBTC-26FEB02".to_string(),
            title: "Bitcoin above $100,000?".to_string(),
            subtitle: Some("Will BTC exceed $100k at 3pm EST?".to_string()),
            status: MarketStatus::Open,
            yes_price: 0.46,
            no_price: Some(0.54),
            volume_24h: Some(50000),
            close_time: None,
        }
    }

    #[test]
    fn test_market_is_tradeable() {
        let market = sample_market();
        assert!(market.is_tradeable());
    }

    #[test]
    fn test_market_not_tradeable_when_closed() {
        let mut market = sample_market();
        market.status = MarketStatus::Closed;
        assert!(!market.is_tradeable());
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Yes.opposite(), Side::No);
        assert_eq!(Side::No.opposite(), Side::Yes);
    }

    fn sample_book() -> NormalizedOrderBook {
        NormalizedOrderBook {
            ticker: "KXBTC-TEST".to_string(),
            yes_asks: vec![
                PriceLevel { price: 0.47, size: 150.0 },
                PriceLevel { price: 0.48, size: 100.0 },
            ],
            no_asks: vec![
                PriceLevel { price: 0.55, size: 200.0 },
            ],
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_book_best_asks() {
        let book = sample_book();
        assert_eq!(book.best_yes_ask(), Some(0.47));
        assert_eq!(book.best_no_ask(), Some(0.55));
    }

    #[test]
    fn test_book_depth() {
        let book = sample_book();
        assert!((book.yes_ask_depth() - 250.0).abs() < 1e-9);
        assert!((book.no_ask_depth() - 200.0).abs() < 1e-9);
    }
}
