//! Wire models for the Gamma catalog API (SPEC_FULL.md §6).
//!
//! Polymarket's `outcomePrices`/`clobTokenIds` fields are themselves JSON-encoded strings
//! rather than native arrays, so every market must be re-parsed after the outer response
//! deserializes.

use arb_core::types::{EventShell, MarketShell, VenueId};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A Gamma API event: a title plus its constituent markets.
#[derive(Debug, Clone, Deserialize)]
pub struct GammaEvent {
    pub slug: String,
    pub title: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub markets: Vec<GammaMarket>,
}

/// A Gamma API market. Prices and token ids arrive as JSON-encoded strings ("[\"0.53\",
/// \"0.47\"]") rather than native arrays or numbers.
#[derive(Debug, Clone, Deserialize)]
pub struct GammaMarket {
    pub question: Option<String>,

    /// JSON string array of two decimal-string prices, in thousandths-equivalent decimal
    /// form (e.g. `"0.530"`), e.g. `"[\"0.530\", \"0.470\"]"`.
    #[serde(rename = "outcomePrices")]
    pub outcome_prices: Option<String>,

    /// JSON string array of two opaque token ids: `"[\"yesTokenId\", \"noTokenId\"]"`.
    #[serde(rename = "clobTokenIds")]
    pub clob_token_ids: Option<String>,

    pub volume: Option<String>,

    #[serde(rename = "endDate")]
    pub end_date: Option<String>,

    #[serde(default)]
    pub active: Option<bool>,

    #[serde(default)]
    pub closed: Option<bool>,
}

impl GammaMarket {
    /// Parses the `outcomePrices` field, yielding `(yesPrice, noPrice)` as probabilities.
    #[must_use]
    pub fn parse_outcome_prices(&self) -> Option<(f64, f64)> {
        let raw = self.outcome_prices.as_ref()?;
        let prices: Vec<String> = serde_json::from_str(raw).ok()?;
        if prices.len() < 2 {
            return None;
        }
        let yes: f64 = prices[0].parse().ok()?;
        let no: f64 = prices[1].parse().ok()?;
        Some((yes, no))
    }

    /// Parses the `clobTokenIds` field, yielding `(yesId, noId)`.
    #[must_use]
    pub fn parse_token_ids(&self) -> Option<(String, String)> {
        let raw = self.clob_token_ids.as_ref()?;
        let ids: Vec<String> = serde_json::from_str(raw).ok()?;
        if ids.len() < 2 {
            return None;
        }
        Some((ids[0].clone(), ids[1].clone()))
    }

    /// Converts this wire market into a venue-neutral [`MarketShell`], or `None` if the
    /// required price/token fields fail to parse (treated as a parse failure per SPEC_FULL.md
    /// §7, recovered locally by the caller as a skipped market rather than a thrown error).
    #[must_use]
    pub fn to_market_shell(&self) -> Option<MarketShell> {
        let (yes_price, no_price) = self.parse_outcome_prices()?;
        let (yes_id, no_id) = self.parse_token_ids()?;

        let end_date = self.end_date.as_ref().and_then(|s| {
            DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc))
        });

        let volume = self.volume.as_ref().and_then(|v| v.parse::<f64>().ok());

        Some(MarketShell {
            question: self.question.clone().unwrap_or_default(),
            yes_price,
            no_price: Some(no_price),
            volume,
            end_date,
            venue_id: VenueId::PolymarketTokens { yes_id, no_id },
        })
    }
}

impl GammaEvent {
    /// Converts this wire event into a venue-neutral [`EventShell`], dropping markets that
    /// fail to parse or are no longer active.
    #[must_use]
    pub fn to_event_shell(&self) -> EventShell {
        let markets = self
            .markets
            .iter()
            .filter(|m| m.active.unwrap_or(true) && !m.closed.unwrap_or(false))
            .filter_map(GammaMarket::to_market_shell)
            .collect();

        EventShell { title: self.title.clone().unwrap_or_default(), image_url: self.image.clone(), markets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_market() -> GammaMarket {
        GammaMarket {
            question: Some("Will it rain in NYC?".to_string()),
            outcome_prices: Some(r#"["0.53", "0.47"]"#.to_string()),
            clob_token_ids: Some(r#"["tok_yes", "tok_no"]"#.to_string()),
            volume: Some("12345.67".to_string()),
            end_date: Some("2026-03-01T00:00:00Z".to_string()),
            active: Some(true),
            closed: Some(false),
        }
    }

    #[test]
    fn test_parse_outcome_prices_from_json_string() {
        let (yes, no) = sample_market().parse_outcome_prices().unwrap();
        assert!((yes - 0.53).abs() < 1e-9);
        assert!((no - 0.47).abs() < 1e-9);
    }

    #[test]
    fn test_parse_token_ids_from_json_string() {
        let (yes_id, no_id) = sample_market().parse_token_ids().unwrap();
        assert_eq!(yes_id, "tok_yes");
        assert_eq!(no_id, "tok_no");
    }

    #[test]
    fn test_to_market_shell_round_trips_prices() {
        let shell = sample_market().to_market_shell().unwrap();
        assert!((shell.yes_price - 0.53).abs() < 1e-3);
        assert_eq!(shell.venue_id, VenueId::PolymarketTokens { yes_id: "tok_yes".to_string(), no_id: "tok_no".to_string() });
    }

    #[test]
    fn test_missing_outcome_prices_yields_none() {
        let mut m = sample_market();
        m.outcome_prices = None;
        assert!(m.to_market_shell().is_none());
    }

    #[test]
    fn test_to_event_shell_drops_inactive_and_closed_markets() {
        let mut inactive = sample_market();
        inactive.active = Some(false);
        let mut closed = sample_market();
        closed.closed = Some(true);

        let event = GammaEvent {
            slug: "nyc-weather".to_string(),
            title: Some("NYC Weather".to_string()),
            image: None,
            markets: vec![sample_market(), inactive, closed],
        };
        let shell = event.to_event_shell();
        assert_eq!(shell.markets.len(), 1);
    }
}
