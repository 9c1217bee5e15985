//! The matched-pair type produced by every category matcher (SPEC_FULL.md §3/§4.4).

use arb_core::types::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The venue-P side of a [`MarketPair`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PSide {
    pub question: String,
    pub yes_price: f64,
    pub no_price: f64,
    /// `(yesId, noId)`, carried so the liquidity fan-out can fetch this market's book.
    pub token_ids: Option<(String, String)>,
    pub slug: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
}

/// The venue-K side of a [`MarketPair`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KSide {
    pub question: String,
    pub yes_price: f64,
    pub no_price: f64,
    pub ticker: Option<String>,
    pub series_ticker: Option<String>,
    pub image_url: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
}

/// A pair of semantically equivalent binary markets, one per venue, produced by an
/// intra-event matcher. `spread` is derived at construction and must never be recomputed
/// downstream with a different formula (SPEC_FULL.md §3 invariant 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketPair {
    pub matched_entity: String,
    pub event_name: String,
    pub category: Category,
    pub p: PSide,
    pub k: KSide,
    pub confidence: f64,
    pub spread: f64,
}

impl MarketPair {
    /// Constructs a pair, deriving `spread = |p.yesPrice - k.yesPrice|` so the invariant
    /// can never drift from the construction site.
    #[must_use]
    pub fn new(
        matched_entity: impl Into<String>,
        event_name: impl Into<String>,
        category: Category,
        p: PSide,
        k: KSide,
        confidence: f64,
    ) -> Self {
        let spread = (p.yes_price - k.yes_price).abs();
        Self {
            matched_entity: matched_entity.into(),
            event_name: event_name.into(),
            category,
            p,
            k,
            confidence,
            spread,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p_side(yes: f64) -> PSide {
        PSide {
            question: "q".to_string(),
            yes_price: yes,
            no_price: 1.0 - yes,
            token_ids: None,
            slug: None,
            end_date: None,
        }
    }

    fn k_side(yes: f64) -> KSide {
        KSide {
            question: "q".to_string(),
            yes_price: yes,
            no_price: 1.0 - yes,
            ticker: None,
            series_ticker: None,
            image_url: None,
            end_date: None,
        }
    }

    #[test]
    fn test_spread_derived_at_construction() {
        let pair = MarketPair::new("X", "Event", Category::Sports, p_side(0.60), k_side(0.45), 1.0);
        assert!((pair.spread - 0.15).abs() < 1e-9);
    }
}
