//! Weather temperature-range matcher (SPEC_FULL.md §4.4).
//!
//! Parses a question into a `{min?, max?, exact?}` range and pairs markets whose ranges are
//! *exactly* equal. No approximate matching: a one-degree boundary offset between venues is a
//! real difference, not noise, and treating it as a match would create phantom arbitrage.

use crate::types::{KSide, MarketPair, PSide};
use arb_core::types::{Category, MarketShell, VenueId};
use once_cell::sync::Lazy;
use regex::Regex;

/// A parsed temperature condition. Exactly one of `exact`, or one-or-both of `min`/`max`,
/// is populated depending on which phrasing matched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureRange {
    pub min: Option<i32>,
    pub max: Option<i32>,
    pub exact: Option<i32>,
}

static RE_OR_BELOW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(-?\d+)\s*(?:°|degrees?)?F?\s*or\s*below").unwrap());
static RE_OR_ABOVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(-?\d+)\s*(?:°|degrees?)?F?\s*or\s*above").unwrap());
static RE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(-?\d+)\s*(?:°|degrees?)?F?\s*to\s*(-?\d+)\s*(?:°|degrees?)?F?").unwrap());
static RE_EXACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(-?\d+)\s*°F").unwrap());

/// Parses a question's temperature phrasing. Tries, in order: "or below", "or above",
/// "A to B", then a bare "N°F".
#[must_use]
pub fn parse_range(question: &str) -> Option<TemperatureRange> {
    if let Some(caps) = RE_OR_BELOW.captures(question) {
        let max: i32 = caps[1].parse().ok()?;
        return Some(TemperatureRange { min: None, max: Some(max), exact: None });
    }
    if let Some(caps) = RE_OR_ABOVE.captures(question) {
        let min: i32 = caps[1].parse().ok()?;
        return Some(TemperatureRange { min: Some(min), max: None, exact: None });
    }
    if let Some(caps) = RE_RANGE.captures(question) {
        let a: i32 = caps[1].parse().ok()?;
        let b: i32 = caps[2].parse().ok()?;
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        return Some(TemperatureRange { min: Some(min), max: Some(max), exact: None });
    }
    if let Some(caps) = RE_EXACT.captures(question) {
        let exact: i32 = caps[1].parse().ok()?;
        return Some(TemperatureRange { min: None, max: None, exact: Some(exact) });
    }
    None
}

fn ranges_equal(a: &TemperatureRange, b: &TemperatureRange) -> bool {
    a.min == b.min && a.max == b.max && a.exact == b.exact
}

/// Matches weather markets within a single event by exact temperature-range equality.
/// Confidence is fixed at 0.9.
#[must_use]
pub fn match_weather(
    event_name: &str,
    p_markets: &[MarketShell],
    k_markets: &[MarketShell],
) -> Vec<MarketPair> {
    let mut pairs = Vec::new();
    for pm in p_markets {
        let Some(p_range) = parse_range(&pm.question) else {
            continue;
        };
        for km in k_markets {
            let Some(k_range) = parse_range(&km.question) else {
                continue;
            };
            if !ranges_equal(&p_range, &k_range) {
                continue;
            }

            let p_side = PSide {
                question: pm.question.clone(),
                yes_price: pm.yes_price,
                no_price: pm.no_price_or_derived(),
                token_ids: match &pm.venue_id {
                    VenueId::PolymarketTokens { yes_id, no_id } => Some((yes_id.clone(), no_id.clone())),
                    VenueId::KalshiTicker(_) => None,
                },
                slug: None,
                end_date: pm.end_date,
            };
            let k_side = KSide {
                question: km.question.clone(),
                yes_price: km.yes_price,
                no_price: km.no_price_or_derived(),
                ticker: match &km.venue_id {
                    VenueId::KalshiTicker(t) => Some(t.clone()),
                    VenueId::PolymarketTokens { .. } => None,
                },
                series_ticker: None,
                image_url: None,
                end_date: km.end_date,
            };

            pairs.push(MarketPair::new(
                format_range(&p_range),
                event_name,
                Category::Weather,
                p_side,
                k_side,
                0.9,
            ));
        }
    }
    pairs
}

fn format_range(r: &TemperatureRange) -> String {
    match (r.min, r.max, r.exact) {
        (Some(min), Some(max), _) => format!("{min}-{max}F"),
        (None, Some(max), _) => format!("<={max}F"),
        (Some(min), None, _) => format!(">={min}F"),
        (_, _, Some(exact)) => format!("{exact}F"),
        _ => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_below() {
        let r = parse_range("Will NYC high be 40F or below on Jan 5?").unwrap();
        assert_eq!(r, TemperatureRange { min: None, max: Some(40), exact: None });
    }

    #[test]
    fn test_parse_or_above() {
        let r = parse_range("Will NYC high be 90F or above?").unwrap();
        assert_eq!(r, TemperatureRange { min: Some(90), max: None, exact: None });
    }

    #[test]
    fn test_parse_range_a_to_b() {
        let r = parse_range("Will NYC high be 50 to 55F?").unwrap();
        assert_eq!(r, TemperatureRange { min: Some(50), max: Some(55), exact: None });
    }

    #[test]
    fn test_parse_exact_degree() {
        let r = parse_range("Will NYC high be exactly 72°F?").unwrap();
        assert_eq!(r, TemperatureRange { min: None, max: None, exact: Some(72) });
    }

    #[test]
    fn test_one_degree_offset_does_not_match() {
        let a = parse_range("40F or below").unwrap();
        let b = parse_range("41F or below").unwrap();
        assert!(!ranges_equal(&a, &b));
    }

    fn shell(question: &str, yes_price: f64, venue_id: VenueId) -> MarketShell {
        MarketShell { question: question.to_string(), yes_price, no_price: None, volume: None, end_date: None, venue_id }
    }

    #[test]
    fn test_match_weather_exact_range() {
        let p = vec![shell("NYC high 50 to 55F", 0.4, VenueId::PolymarketTokens { yes_id: "y".to_string(), no_id: "n".to_string() })];
        let k = vec![shell("NYC high 50 to 55F", 0.42, VenueId::KalshiTicker("WX-NYC".to_string()))];
        let pairs = match_weather("NYC high temp", &p, &k);
        assert_eq!(pairs.len(), 1);
        assert!((pairs[0].confidence - 0.9).abs() < 1e-9);
    }
}
