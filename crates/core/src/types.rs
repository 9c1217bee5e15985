//! Shared domain entities that flow between the catalog generator, venue clients, and
//! the intra-event matcher (SPEC_FULL.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The domain a catalog entry belongs to; dispatches which matcher handles its event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Sports,
    Weather,
    Finance,
    NbaGame,
    Other,
}

/// Whether a catalog entry was expanded from a date-templated pattern or is a fixed pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogType {
    Static,
    Dynamic,
}

/// A concrete `(P-slug, K-ticker)` pairing the scanner will attempt to fetch and match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub category: Category,
    pub entry_type: CatalogType,
    pub p_slug: String,
    pub k_ticker: String,
    pub k_series: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// The venue-specific identifier carried by a [`MarketShell`]: P markets are addressed by a
/// `(yesId, noId)` token pair, K markets by a single ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VenueId {
    PolymarketTokens { yes_id: String, no_id: String },
    KalshiTicker(String),
}

/// A single binary market as returned by a venue's catalog client, already normalized into
/// probability space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketShell {
    pub question: String,
    pub yes_price: f64,
    pub no_price: Option<f64>,
    pub volume: Option<f64>,
    pub end_date: Option<DateTime<Utc>>,
    pub venue_id: VenueId,
}

impl MarketShell {
    /// Returns the NO price, deriving it as `1 - yesPrice` if not directly quoted.
    #[must_use]
    pub fn no_price_or_derived(&self) -> f64 {
        self.no_price.unwrap_or(1.0 - self.yes_price)
    }

    /// A market at exactly 0 or 1 has settled and must be filtered before matching.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        crate::price::is_resolved(self.yes_price)
    }
}

/// An event as returned by a venue's catalog client: a title plus its constituent binary
/// markets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventShell {
    pub title: String,
    pub image_url: Option<String>,
    pub markets: Vec<MarketShell>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_shell_no_price_derivation() {
        let m = MarketShell {
            question: "Will it rain?".to_string(),
            yes_price: 0.3,
            no_price: None,
            volume: None,
            end_date: None,
            venue_id: VenueId::KalshiTicker("WEATHER-TEST".to_string()),
        };
        assert!((m.no_price_or_derived() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_market_shell_resolved() {
        let mut m = MarketShell {
            question: "Resolved?".to_string(),
            yes_price: 1.0,
            no_price: None,
            volume: None,
            end_date: None,
            venue_id: VenueId::KalshiTicker("X".to_string()),
        };
        assert!(m.is_resolved());
        m.yes_price = 0.5;
        assert!(!m.is_resolved());
    }

    #[test]
    fn test_category_serde_snake_case() {
        let json = serde_json::to_string(&Category::NbaGame).unwrap();
        assert_eq!(json, "\"nba_game\"");
    }
}
