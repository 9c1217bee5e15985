//! NBA full-game moneyline matcher (SPEC_FULL.md §4.4, test case S5).
//!
//! Locates the single full-game moneyline market on P (excluding props, spreads, totals,
//! periods, and sub-markets), locates the two K markets whose tickers end with each team's
//! three-letter code, and resolves which team the P question's `yesPrice` actually refers to
//! before emitting one pair per team.

use crate::types::{KSide, MarketPair, PSide};
use arb_core::types::{Category, MarketShell, VenueId};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// The identifying surface forms for one NBA franchise.
#[derive(Debug, Clone)]
pub struct TeamInfo {
    pub full_name: String,
    pub city: String,
    pub nickname: String,
    pub code: String,
}

/// Substrings that disqualify a P question from being the full-game moneyline market: props,
/// spreads, totals, and period/sub-markets. Checked as plain substrings (case-insensitive).
const EXCLUSION_SUBSTRINGS: &[&str] = &[
    "spread",
    "handicap",
    "prop",
    "margin",
    "point total",
    "player",
    "assists",
    "rebounds",
    "to score",
];

/// Words that must be excluded only as *whole words*, since some appear as substrings of
/// team nicknames (e.g. "under" inside "Thunder").
const EXCLUSION_WHOLE_WORDS: &[&str] = &["over", "under", "first", "second", "three"];

static WHOLE_WORD_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    EXCLUSION_WHOLE_WORDS
        .iter()
        .map(|w| Regex::new(&format!(r"(?i)\b{w}\b")).unwrap())
        .collect()
});

/// Returns true if `question` is the full-game moneyline market: contains "vs." and none of
/// the exclusion substrings or whole words.
#[must_use]
pub fn is_full_game_moneyline(question: &str) -> bool {
    if !question.to_lowercase().contains("vs.") {
        return false;
    }
    let lower = question.to_lowercase();
    if EXCLUSION_SUBSTRINGS.iter().any(|s| lower.contains(s)) {
        return false;
    }
    if WHOLE_WORD_RES.iter().any(|re| re.is_match(question)) {
        return false;
    }
    true
}

/// Finds the earliest character position at which `team` is referenced in `question`,
/// searching in order: full name, city, nickname, three-letter code.
fn locate_team_position(question: &str, team: &TeamInfo) -> Option<usize> {
    let lower = question.to_lowercase();
    for candidate in [&team.full_name, &team.city, &team.nickname, &team.code] {
        let needle = candidate.to_lowercase();
        if let Some(pos) = lower.find(&needle) {
            return Some(pos);
        }
    }
    None
}

/// Whether the away team is the one listed first in the question text. Returns the
/// disambiguation result plus whether the "away first" default was applied (for logging).
fn away_listed_first(question: &str, away: &TeamInfo, home: &TeamInfo) -> (bool, bool) {
    let away_pos = locate_team_position(question, away);
    let home_pos = locate_team_position(question, home);
    match (away_pos, home_pos) {
        (Some(a), Some(h)) => (a < h, false),
        (Some(_), None) => (true, false),
        (None, Some(_)) => (false, false),
        (None, None) => (true, true),
    }
}

/// Locates the K market whose ticker ends with the given three-letter team code.
fn find_k_market_by_code<'a>(k_markets: &'a [MarketShell], code: &str) -> Option<&'a MarketShell> {
    let suffix = format!("-{}", code.to_uppercase());
    k_markets.iter().find(|m| match &m.venue_id {
        VenueId::KalshiTicker(ticker) => ticker.to_uppercase().ends_with(&suffix),
        VenueId::PolymarketTokens { .. } => false,
    })
}

/// Matches the full-game moneyline market within an NBA event, producing one pair per team.
///
/// `p_markets` is scanned for the single full-game moneyline; `k_markets` must contain (at
/// least) the two per-team markets whose tickers end in each team's three-letter code.
#[must_use]
pub fn match_nba_game(
    event_name: &str,
    p_markets: &[MarketShell],
    k_markets: &[MarketShell],
    away: &TeamInfo,
    home: &TeamInfo,
) -> Vec<MarketPair> {
    let Some(p_market) = p_markets.iter().find(|m| is_full_game_moneyline(&m.question)) else {
        return Vec::new();
    };

    let (away_first, used_default) = away_listed_first(&p_market.question, away, home);
    if used_default {
        warn!(
            event = event_name,
            question = %p_market.question,
            "neither team located in NBA moneyline question; defaulting to away-first"
        );
    }

    let away_poly_yes = if away_first { p_market.yes_price } else { 1.0 - p_market.yes_price };
    let home_poly_yes = 1.0 - away_poly_yes;

    let (orig_yes_id, orig_no_id) = match &p_market.venue_id {
        VenueId::PolymarketTokens { yes_id, no_id } => (yes_id.clone(), no_id.clone()),
        VenueId::KalshiTicker(_) => (String::new(), String::new()),
    };

    // The original token pair's YES leg belongs to whichever team is listed first.
    let (away_tokens, home_tokens) = if away_first {
        (Some((orig_yes_id.clone(), orig_no_id.clone())), Some((orig_no_id, orig_yes_id)))
    } else {
        (Some((orig_no_id.clone(), orig_yes_id.clone())), Some((orig_yes_id, orig_no_id)))
    };

    let mut pairs = Vec::new();

    if let Some(k_away) = find_k_market_by_code(k_markets, &away.code) {
        let p_side = PSide {
            question: p_market.question.clone(),
            yes_price: away_poly_yes,
            no_price: 1.0 - away_poly_yes,
            token_ids: away_tokens,
            slug: None,
            end_date: p_market.end_date,
        };
        let k_side = KSide {
            question: k_away.question.clone(),
            yes_price: k_away.yes_price,
            no_price: k_away.no_price_or_derived(),
            ticker: match &k_away.venue_id {
                VenueId::KalshiTicker(t) => Some(t.clone()),
                VenueId::PolymarketTokens { .. } => None,
            },
            series_ticker: None,
            image_url: None,
            end_date: k_away.end_date,
        };
        pairs.push(MarketPair::new(away.full_name.clone(), event_name, Category::NbaGame, p_side, k_side, 1.0));
    }

    if let Some(k_home) = find_k_market_by_code(k_markets, &home.code) {
        let p_side = PSide {
            question: p_market.question.clone(),
            yes_price: home_poly_yes,
            no_price: 1.0 - home_poly_yes,
            token_ids: home_tokens,
            slug: None,
            end_date: p_market.end_date,
        };
        let k_side = KSide {
            question: k_home.question.clone(),
            yes_price: k_home.yes_price,
            no_price: k_home.no_price_or_derived(),
            ticker: match &k_home.venue_id {
                VenueId::KalshiTicker(t) => Some(t.clone()),
                VenueId::PolymarketTokens { .. } => None,
            },
            series_ticker: None,
            image_url: None,
            end_date: k_home.end_date,
        };
        pairs.push(MarketPair::new(home.full_name.clone(), event_name, Category::NbaGame, p_side, k_side, 1.0));
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lakers() -> TeamInfo {
        TeamInfo {
            full_name: "Los Angeles Lakers".to_string(),
            city: "Los Angeles".to_string(),
            nickname: "Lakers".to_string(),
            code: "LAL".to_string(),
        }
    }

    fn celtics() -> TeamInfo {
        TeamInfo {
            full_name: "Boston Celtics".to_string(),
            city: "Boston".to_string(),
            nickname: "Celtics".to_string(),
            code: "BOS".to_string(),
        }
    }

    fn shell(question: &str, yes_price: f64, venue_id: VenueId) -> MarketShell {
        MarketShell { question: question.to_string(), yes_price, no_price: None, volume: None, end_date: None, venue_id }
    }

    #[test]
    fn test_is_full_game_moneyline_excludes_spread() {
        assert!(!is_full_game_moneyline("Lakers vs. Celtics spread -4.5"));
    }

    #[test]
    fn test_is_full_game_moneyline_excludes_whole_word_but_not_thunder() {
        assert!(!is_full_game_moneyline("Lakers vs. Celtics: over 220.5 points"));
        assert!(is_full_game_moneyline("Thunder vs. Celtics"));
    }

    #[test]
    fn test_requires_vs_dot() {
        assert!(!is_full_game_moneyline("Lakers at Celtics"));
    }

    #[test]
    fn test_s5_team_order_disambiguation() {
        // Lakers vs. Celtics, yesPrice=0.60, away=Boston Celtics (BOS), home=LAL.
        let away = celtics();
        let home = lakers();
        let p_markets = vec![shell(
            "Lakers vs. Celtics",
            0.60,
            VenueId::PolymarketTokens { yes_id: "tokA".to_string(), no_id: "tokB".to_string() },
        )];
        let k_markets = vec![
            shell("Lakers moneyline", 0.58, VenueId::KalshiTicker("KXNBAGAME-26FEB02LALBOS-LAL".to_string())),
            shell("Celtics moneyline", 0.44, VenueId::KalshiTicker("KXNBAGAME-26FEB02LALBOS-BOS".to_string())),
        ];

        let pairs = match_nba_game("Lakers at Celtics", &p_markets, &k_markets, &away, &home);
        assert_eq!(pairs.len(), 2);

        let away_pair = pairs.iter().find(|p| p.matched_entity == "Boston Celtics").unwrap();
        assert!((away_pair.p.yes_price - 0.40).abs() < 1e-9);
        assert_eq!(away_pair.p.token_ids, Some(("tokB".to_string(), "tokA".to_string())));

        let home_pair = pairs.iter().find(|p| p.matched_entity == "Los Angeles Lakers").unwrap();
        assert!((home_pair.p.yes_price - 0.60).abs() < 1e-9);
        assert_eq!(home_pair.p.token_ids, Some(("tokA".to_string(), "tokB".to_string())));
    }

    #[test]
    fn test_neither_team_found_defaults_to_away_first() {
        let away = celtics();
        let home = lakers();
        let (first, used_default) = away_listed_first("Team X vs. Team Y", &away, &home);
        assert!(first);
        assert!(used_default);
    }

    #[test]
    fn test_only_one_team_found_assumed_first() {
        let away = celtics();
        let home = lakers();
        let (first, used_default) = away_listed_first("Celtics vs. Unknown", &away, &home);
        assert!(first);
        assert!(!used_default);
    }
}
