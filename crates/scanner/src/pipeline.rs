//! The concrete scan pipeline (SPEC_FULL.md §4.7 `performScan`), wired against the real venue
//! clients. This is the only module in the crate that knows about `venue-kalshi` and
//! `venue-polymarket`; `orchestrator.rs` only sees the [`ScanExecutor`] trait.

use crate::catalog::{expand_dynamic, expand_nba_games, expand_yearly, DynamicPattern, NbaGameFixture, YearlyPattern};
use crate::orchestrator::ScanExecutor;
use crate::types::{OpportunityWithLiquidity, ScanResult};
use arb_arbitrage::{compute_all, LiquidityOptions};
use arb_core::types::{CatalogEntry, EventShell, MarketShell};
use arb_matching::nba::is_full_game_moneyline;
use arb_matching::{match_event, AliasTable, PairContext, TeamInfo};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};
use venue_kalshi::KalshiClient;
use venue_polymarket::PolymarketClient;

/// Static configuration for one pipeline instance: catalog patterns, matcher inputs, and the
/// concurrency/threshold knobs from `ScannerConfig`.
pub struct PipelineConfig {
    pub yearly: Vec<YearlyPattern>,
    pub dynamic: Vec<DynamicPattern>,
    pub nba_fixtures: Vec<NbaGameFixture>,
    pub catalog_days: u32,
    pub sports_aliases: AliasTable,
    pub min_profit_pct: f64,
    pub liquidity_top_n: usize,
    pub k_max_concurrent: usize,
    pub k_pagination_delay: Duration,
    /// Page size/page count used when populating the per-scan "all NBA markets" cache
    /// (SPEC_FULL.md §4.7 step 1, §6's paginated active-events endpoint).
    pub nba_markets_page_size: u32,
    pub nba_markets_max_pages: u32,
}

/// The full fetch → match → calculate → liquidity-fan-out pipeline, implementing
/// [`ScanExecutor`] for `Scanner<Pipeline>`.
pub struct Pipeline {
    p_client: PolymarketClient,
    k_client: KalshiClient,
    config: PipelineConfig,
    /// The per-scan "all NBA markets" cache (SPEC_FULL.md §4.7 step 1): every currently
    /// active full-game-moneyline market across venue P's event catalog, fetched once and
    /// reused as a fallback for any NBA fixture whose guessed slug doesn't resolve. Cleared
    /// at the start of every `perform_scan` call; never carried across scans.
    nba_markets_cache: Mutex<Option<Arc<Vec<MarketShell>>>>,
}

impl Pipeline {
    #[must_use]
    pub fn new(p_client: PolymarketClient, k_client: KalshiClient, config: PipelineConfig) -> Self {
        Self { p_client, k_client, config, nba_markets_cache: Mutex::new(None) }
    }

    fn build_catalog(&self) -> Vec<(CatalogEntry, Option<(TeamInfo, TeamInfo)>)> {
        let now = Utc::now();
        let mut out: Vec<(CatalogEntry, Option<(TeamInfo, TeamInfo)>)> = Vec::new();
        for entry in expand_yearly(&self.config.yearly, now.year()) {
            out.push((entry, None));
        }
        for entry in expand_dynamic(&self.config.dynamic, now, self.config.catalog_days) {
            out.push((entry, None));
        }
        let nba_entries = expand_nba_games(&self.config.nba_fixtures);
        for (entry, fixture) in nba_entries.into_iter().zip(self.config.nba_fixtures.iter()) {
            out.push((entry, Some((fixture.away.clone(), fixture.home.clone()))));
        }
        out
    }

    async fn fetch_p_events(&self, entries: &[(CatalogEntry, Option<(TeamInfo, TeamInfo)>)]) -> Vec<Option<EventShell>> {
        let futures = entries.iter().map(|(entry, _)| {
            let slug = entry.p_slug.clone();
            async move { self.p_client.get_event(&slug).await }
        });
        futures_util::future::join_all(futures).await
    }

    async fn fetch_k_events(&self, entries: &[(CatalogEntry, Option<(TeamInfo, TeamInfo)>)]) -> Vec<Option<EventShell>> {
        let delay = self.config.k_pagination_delay;
        stream::iter(entries.iter())
            .map(|(entry, _)| {
                let ticker = entry.k_ticker.clone();
                let series = entry.k_series.clone().unwrap_or_default();
                async move {
                    tokio::time::sleep(delay).await;
                    self.k_client.get_event(&ticker, &series).await
                }
            })
            .buffered(self.config.k_max_concurrent)
            .collect()
            .await
    }

    /// Returns the per-scan "all NBA markets" cache, populating it on first use within a scan
    /// by paginating venue P's active-events catalog and keeping only markets that look like
    /// a full-game moneyline (SPEC_FULL.md §4.7 step 1). Cheap to call repeatedly: later
    /// fixtures in the same scan reuse the first fetch.
    async fn all_nba_markets(&self) -> Arc<Vec<MarketShell>> {
        if let Some(cached) = self.nba_markets_cache.lock().await.clone() {
            return cached;
        }

        let events = self.p_client.get_active_events(self.config.nba_markets_page_size, self.config.nba_markets_max_pages).await;
        let markets: Vec<MarketShell> =
            events.into_iter().flat_map(|e| e.markets).filter(|m| is_full_game_moneyline(&m.question)).collect();

        info!(markets = markets.len(), "populated all-NBA-markets cache");
        let markets = Arc::new(markets);
        *self.nba_markets_cache.lock().await = Some(markets.clone());
        markets
    }

    /// Searches the per-scan "all NBA markets" cache for full-game moneyline markets whose
    /// question mentions both fixture teams, as a fallback when a fixture's guessed P slug
    /// fails to resolve (the slug pattern in `catalog::expand_nba_games` is a best-effort
    /// guess, not a guaranteed-correct identifier).
    async fn find_nba_event_in_cache(&self, away: &TeamInfo, home: &TeamInfo) -> Option<EventShell> {
        let markets = self.all_nba_markets().await;
        let matches: Vec<MarketShell> = markets
            .iter()
            .filter(|m| mentions_team(&m.question, away) && mentions_team(&m.question, home))
            .cloned()
            .collect();
        if matches.is_empty() {
            return None;
        }
        Some(EventShell { title: format!("{} at {}", away.full_name, home.full_name), image_url: None, markets: matches })
    }
}

/// Whether `question` references `team` by full name, city, nickname, or three-letter code.
fn mentions_team(question: &str, team: &TeamInfo) -> bool {
    let lower = question.to_lowercase();
    [&team.full_name, &team.city, &team.nickname, &team.code].iter().any(|s| lower.contains(&s.to_lowercase()))
}

#[async_trait]
impl ScanExecutor for Pipeline {
    async fn perform_scan(&self) -> ScanResult {
        // SPEC_FULL.md §4.7 step 1: clear per-scan caches, notably the "all NBA markets"
        // cache, so a stale scan's fallback lookups never leak into this one.
        *self.nba_markets_cache.lock().await = None;

        let scanned_at = Utc::now();
        let catalog = self.build_catalog();
        info!(entries = catalog.len(), "starting scan");

        let (p_events, k_events) = tokio::join!(self.fetch_p_events(&catalog), self.fetch_k_events(&catalog));

        let mut matched_events = Vec::new();
        let mut pairs = Vec::new();
        for (((entry, nba_teams), p_event), k_event) in catalog.iter().zip(p_events.into_iter()).zip(k_events.into_iter()) {
            let Some(k_event) = k_event else {
                warn!(name = %entry.name, "skipping catalog entry: event fetch failed on venue K");
                continue;
            };

            let p_event = match (p_event, nba_teams.as_ref()) {
                (Some(p_event), _) => Some(p_event),
                (None, Some((away, home))) => {
                    warn!(name = %entry.name, "guessed P slug did not resolve; falling back to all-NBA-markets cache");
                    self.find_nba_event_in_cache(away, home).await
                }
                (None, None) => None,
            };
            let Some(p_event) = p_event else {
                warn!(name = %entry.name, "skipping catalog entry: event fetch failed on venue P");
                continue;
            };

            let nba_pair_ref = nba_teams.as_ref().map(|(away, home)| (away, home));
            let context = PairContext {
                p_slug: Some(entry.p_slug.as_str()),
                k_series: entry.k_series.as_deref(),
                image_url: p_event.image_url.as_deref().or(k_event.image_url.as_deref()),
            };
            let matched =
                match_event(&entry.name, entry.category, &p_event.markets, &k_event.markets, &self.config.sports_aliases, nba_pair_ref, context);
            pairs.extend(matched);
            matched_events.push(p_event);
        }

        info!(pairs = pairs.len(), "intra-event matching complete");

        let mut opportunities = compute_all(pairs);
        let top_n = self.config.liquidity_top_n.min(opportunities.len());
        let (to_analyze, rest) = opportunities.split_at_mut(top_n);
        let rest: Vec<OpportunityWithLiquidity> =
            rest.iter().cloned().map(|opportunity| OpportunityWithLiquidity { opportunity, liquidity: None }).collect();

        let p_books = {
            let futures = to_analyze.iter().map(|o| {
                let tokens = o.pair.p.token_ids.clone();
                async move {
                    match tokens {
                        Some((yes_id, no_id)) => self.p_client.get_order_book(&yes_id, &no_id).await,
                        None => None,
                    }
                }
            });
            futures_util::future::join_all(futures).await
        };

        let k_books = {
            let delay = self.config.k_pagination_delay;
            stream::iter(to_analyze.iter())
                .map(|o| {
                    let ticker = o.pair.k.ticker.clone();
                    async move {
                        tokio::time::sleep(delay).await;
                        match ticker {
                            Some(ticker) => self.k_client.get_orderbook(&ticker).await,
                            None => None,
                        }
                    }
                })
                .buffered(self.config.k_max_concurrent)
                .collect::<Vec<_>>()
                .await
        };

        // SPEC_FULL.md §9(b): the scanner always calls the analyzer with zero fees; the
        // 2%/1% p_fee_pct/k_fee_pct shown in the DTO are documentary only (see projection.rs).
        let options = LiquidityOptions { p_fee: 0.0, k_fee: 0.0, min_profit_pct: self.config.min_profit_pct };

        let mut analyzed: Vec<OpportunityWithLiquidity> = Vec::with_capacity(to_analyze.len());
        for ((opportunity, p_book), k_book) in to_analyze.iter().cloned().zip(p_books.into_iter()).zip(k_books.into_iter()) {
            let liquidity = match (p_book, k_book) {
                (Some(p_book), Some(k_book)) => {
                    let p_asks: Vec<arb_arbitrage::PriceLevel> =
                        p_book.yes_asks.iter().map(|l| arb_arbitrage::PriceLevel { price: l.price, size: l.size }).collect();
                    let k_asks: Vec<arb_arbitrage::PriceLevel> =
                        k_book.no_asks.iter().map(|l| arb_arbitrage::PriceLevel { price: l.price, size: l.size }).collect();
                    Some(arb_arbitrage::analyze_liquidity(opportunity.clone(), &p_asks, &k_asks, options))
                }
                _ => None,
            };
            analyzed.push(OpportunityWithLiquidity { opportunity, liquidity });
        }

        analyzed.extend(rest);
        crate::sort_opportunities_with_liquidity(&mut analyzed);

        ScanResult { events: matched_events, opportunities: analyzed, scanned_at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(full_name: &str, city: &str, nickname: &str, code: &str) -> TeamInfo {
        TeamInfo { full_name: full_name.to_string(), city: city.to_string(), nickname: nickname.to_string(), code: code.to_string() }
    }

    #[test]
    fn test_mentions_team_matches_full_name() {
        let lakers = team("Los Angeles Lakers", "Los Angeles", "Lakers", "LAL");
        assert!(mentions_team("Los Angeles Lakers vs. Boston Celtics", &lakers));
    }

    #[test]
    fn test_mentions_team_matches_nickname_case_insensitively() {
        let lakers = team("Los Angeles Lakers", "Los Angeles", "Lakers", "LAL");
        assert!(mentions_team("will the LAKERS win tonight?", &lakers));
    }

    #[test]
    fn test_mentions_team_matches_code() {
        let lakers = team("Los Angeles Lakers", "Los Angeles", "Lakers", "LAL");
        assert!(mentions_team("LAL moneyline", &lakers));
    }

    #[test]
    fn test_mentions_team_no_match() {
        let lakers = team("Los Angeles Lakers", "Los Angeles", "Lakers", "LAL");
        assert!(!mentions_team("Boston Celtics vs. Miami Heat", &lakers));
    }

    #[tokio::test]
    async fn test_all_nba_markets_cache_is_cleared_between_scans() {
        let p_client = PolymarketClient::default();
        let k_client = KalshiClient::new(venue_kalshi::KalshiClientConfig::default());
        let config = PipelineConfig {
            yearly: Vec::new(),
            dynamic: Vec::new(),
            nba_fixtures: Vec::new(),
            catalog_days: 7,
            sports_aliases: AliasTable::default_table(),
            min_profit_pct: 0.0,
            liquidity_top_n: 10,
            k_max_concurrent: 4,
            k_pagination_delay: Duration::from_millis(0),
            nba_markets_page_size: 10,
            nba_markets_max_pages: 1,
        };
        let pipeline = Pipeline::new(p_client, k_client, config);

        let seeded = Arc::new(vec![MarketShell {
            question: "Los Angeles Lakers vs. Boston Celtics".to_string(),
            yes_price: 0.5,
            no_price: None,
            volume: None,
            end_date: None,
            venue_id: arb_core::types::VenueId::PolymarketTokens { yes_id: "tok_yes".to_string(), no_id: "tok_no".to_string() },
        }]);
        *pipeline.nba_markets_cache.lock().await = Some(seeded);
        assert!(pipeline.nba_markets_cache.lock().await.is_some());

        *pipeline.nba_markets_cache.lock().await = None;
        assert!(pipeline.nba_markets_cache.lock().await.is_none());
    }
}
