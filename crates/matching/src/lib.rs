//! Intra-event market matching (SPEC_FULL.md §4.4, component C4).
//!
//! Pairs semantically equivalent binary markets across venue P and venue K within a single
//! matched event. Each category has its own matcher with its own confidence level; the sports
//! and NBA matchers are exact on canonical identity, weather and finance are exact on parsed
//! structured fields.

pub mod finance;
pub mod nba;
pub mod sports;
pub mod types;
pub mod weather;

pub use nba::TeamInfo;
pub use sports::AliasTable;
pub use types::{KSide, MarketPair, PSide};

use arb_core::types::{Category, MarketShell};

/// Catalog-level context every pair is enriched with before leaving this component
/// (SPEC_FULL.md §4.4's closing sentence: "All pairs are enriched with ... slug,
/// seriesTicker, imageUrl, endDate before leaving this component"). `endDate` and
/// `category`/`eventName` are already set per-market/per-call by each sub-matcher; this
/// context carries the catalog-entry-level fields no individual market shell knows about.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairContext<'a> {
    pub p_slug: Option<&'a str>,
    pub k_series: Option<&'a str>,
    pub image_url: Option<&'a str>,
}

/// Dispatches a matched event's markets to the matcher for its category, then enriches
/// every resulting pair with the catalog-level context (§4.4).
///
/// The NBA matcher additionally requires the away/home [`TeamInfo`] (resolved upstream from
/// game-schedule data, outside this crate's scope); callers outside the `nba_game` category
/// may pass `None`.
#[must_use]
pub fn match_event(
    event_name: &str,
    category: Category,
    p_markets: &[MarketShell],
    k_markets: &[MarketShell],
    sports_aliases: &AliasTable,
    nba_teams: Option<(&TeamInfo, &TeamInfo)>,
    context: PairContext<'_>,
) -> Vec<MarketPair> {
    let mut pairs = match category {
        Category::Sports => sports::match_sports(event_name, p_markets, k_markets, sports_aliases),
        Category::Weather => weather::match_weather(event_name, p_markets, k_markets),
        Category::Finance => finance::match_finance(event_name, p_markets, k_markets),
        Category::NbaGame => match nba_teams {
            Some((away, home)) => nba::match_nba_game(event_name, p_markets, k_markets, away, home),
            None => Vec::new(),
        },
        Category::Other => Vec::new(),
    };

    for pair in &mut pairs {
        if pair.p.slug.is_none() {
            pair.p.slug = context.p_slug.map(String::from);
        }
        if pair.k.series_ticker.is_none() {
            pair.k.series_ticker = context.k_series.map(String::from);
        }
        if pair.k.image_url.is_none() {
            pair.k.image_url = context.image_url.map(String::from);
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use arb_core::types::VenueId;

    #[test]
    fn test_dispatch_other_category_yields_nothing() {
        let p = vec![MarketShell {
            question: "anything".to_string(),
            yes_price: 0.5,
            no_price: None,
            volume: None,
            end_date: None,
            venue_id: VenueId::KalshiTicker("X".to_string()),
        }];
        let aliases = AliasTable::default_table();
        let pairs = match_event("Misc", Category::Other, &p, &[], &aliases, None, PairContext::default());
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_dispatch_nba_without_teams_yields_nothing() {
        let aliases = AliasTable::default_table();
        let pairs = match_event("Lakers vs Celtics", Category::NbaGame, &[], &[], &aliases, None, PairContext::default());
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_dispatch_enriches_pairs_with_catalog_context() {
        let p = vec![MarketShell {
            question: "NYC high 50 to 55F".to_string(),
            yes_price: 0.4,
            no_price: None,
            volume: None,
            end_date: None,
            venue_id: VenueId::PolymarketTokens { yes_id: "y".to_string(), no_id: "n".to_string() },
        }];
        let k = vec![MarketShell {
            question: "NYC high 50 to 55F".to_string(),
            yes_price: 0.42,
            no_price: None,
            volume: None,
            end_date: None,
            venue_id: VenueId::KalshiTicker("WX-NYC".to_string()),
        }];
        let aliases = AliasTable::default_table();
        let context = PairContext { p_slug: Some("nyc-high-temp"), k_series: Some("KXWX"), image_url: Some("https://img") };
        let pairs = match_event("NYC high temp", Category::Weather, &p, &k, &aliases, None, context);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].p.slug.as_deref(), Some("nyc-high-temp"));
        assert_eq!(pairs[0].k.series_ticker.as_deref(), Some("KXWX"));
        assert_eq!(pairs[0].k.image_url.as_deref(), Some("https://img"));
    }
}
