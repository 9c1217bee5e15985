//! Monetary-policy matcher (SPEC_FULL.md §4.4).
//!
//! Parses a question into a `{type, bps?}` action and pairs markets with exact equality on
//! both fields (or both `bps` absent).

use crate::types::{KSide, MarketPair, PSide};
use arb_core::types::{Category, MarketShell, VenueId};
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    Cut,
    Raise,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyMove {
    pub action: PolicyAction,
    pub bps: Option<u32>,
}

static RE_BPS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*(?:bps|basis points?)").unwrap());
static RE_CUT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bcut\b|\bdecrease\b|\blower\b").unwrap());
static RE_RAISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\braise\b|\bincrease\b|\bhike\b").unwrap());
static RE_HOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bhold\b|\bunchanged\b|\bno change\b|\bpause\b").unwrap());

/// Parses a question into a monetary-policy action. Returns `None` if none of cut/raise/hold
/// can be identified.
#[must_use]
pub fn parse_action(question: &str) -> Option<PolicyMove> {
    let action = if RE_CUT.is_match(question) {
        PolicyAction::Cut
    } else if RE_RAISE.is_match(question) {
        PolicyAction::Raise
    } else if RE_HOLD.is_match(question) {
        PolicyAction::Hold
    } else {
        return None;
    };
    let bps = RE_BPS.captures(question).and_then(|c| c[1].parse().ok());
    Some(PolicyMove { action, bps })
}

/// Matches monetary-policy markets within a single event by exact action equality.
/// Confidence is fixed at 1.0.
#[must_use]
pub fn match_finance(
    event_name: &str,
    p_markets: &[MarketShell],
    k_markets: &[MarketShell],
) -> Vec<MarketPair> {
    let mut pairs = Vec::new();
    for pm in p_markets {
        let Some(p_move) = parse_action(&pm.question) else {
            continue;
        };
        for km in k_markets {
            let Some(k_move) = parse_action(&km.question) else {
                continue;
            };
            if p_move != k_move {
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

            let label = match (p_move.action, p_move.bps) {
                (PolicyAction::Cut, Some(bps)) => format!("cut {bps}bps"),
                (PolicyAction::Cut, None) => "cut".to_string(),
                (PolicyAction::Raise, Some(bps)) => format!("raise {bps}bps"),
                (PolicyAction::Raise, None) => "raise".to_string(),
                (PolicyAction::Hold, _) => "hold".to_string(),
            };

            pairs.push(MarketPair::new(label, event_name, Category::Finance, p_side, k_side, 1.0));
        }
    }
    pairs
}
