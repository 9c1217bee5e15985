//! CLOB order-book REST client (SPEC_FULL.md §4.1/§4.2).
//!
//! P's book endpoint is per-token: a market is two tokens (YES, NO), each with its own bid
//! and ask ladder. The YES-outcome ask book is the union of the YES token's direct asks and
//! the NO token's inverted bids (`askPrice = 1 - bidPrice`); the NO-outcome ask book is built
//! symmetrically. Entries colliding at the same resulting price have their sizes summed.

use crate::error::PolymarketError;
use chrono::Utc;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;

/// CLOB REST base URL.
pub const CLOB_API_URL: &str = "https://clob.polymarket.com";

/// A single price level in a normalized order book.
#[derive(Debug, Clone, Copy, serde::Serialize, Deserialize)]
pub struct PriceLevel {
    /// Probability in `(0, 1)`.
    pub price: f64,
    /// Number of contracts available at this price.
    pub size: f64,
}

/// A normalized order book combining the YES and NO token books for one market.
#[derive(Debug, Clone, serde::Serialize, Deserialize)]
pub struct NormalizedOrderBook {
    pub yes_id: String,
    pub no_id: String,
    /// Ascending by price, no zero-size entries.
    pub yes_asks: Vec<PriceLevel>,
    /// Ascending by price, no zero-size entries.
    pub no_asks: Vec<PriceLevel>,
    pub updated_at: chrono::DateTime<Utc>,
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
}

#[derive(Debug, Deserialize)]
struct RawBookLevel {
    price: String,
    size: String,
}

#[derive(Debug, Deserialize)]
struct RawBook {
    #[serde(default)]
    bids: Vec<RawBookLevel>,
    #[serde(default)]
    asks: Vec<RawBookLevel>,
}

fn parse_levels(raw: Vec<RawBookLevel>) -> Vec<(f64, f64)> {
    raw.into_iter()
        .filter_map(|l| {
            let price: f64 = l.price.parse().ok()?;
            let size: f64 = l.size.parse().ok()?;
            if size <= 0.0 {
                return None;
            }
            Some((price, size))
        })
        .collect()
}

/// Merges a token's direct asks with its complement's inverted bids, consolidating
/// collisions at the same resulting price (SPEC_FULL.md §4.1/§4.2). Shared with the
/// WebSocket client, which performs the same merge over live per-token ladders.
pub(crate) fn merge_ask_side(direct_asks: &[(f64, f64)], complement_bids: &[(f64, f64)]) -> Vec<PriceLevel> {
    let mut levels: Vec<PriceLevel> = direct_asks.iter().map(|&(price, size)| PriceLevel { price, size }).collect();
    levels.extend(complement_bids.iter().map(|&(price, size)| PriceLevel { price: 1.0 - price, size }));

    levels.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal));

    let mut consolidated: Vec<PriceLevel> = Vec::with_capacity(levels.len());
    for level in levels {
        if let Some(last) = consolidated.last_mut() {
            if (last.price - level.price).abs() < 1e-9 {
                last.size += level.size;
                continue;
            }
        }
        consolidated.push(level);
    }
    consolidated
}

/// Configuration for [`ClobClient`].
#[derive(Debug, Clone)]
pub struct ClobClientConfig {
    pub base_url: String,
    pub requests_per_minute: NonZeroU32,
    pub timeout_secs: u64,
}

impl Default for ClobClientConfig {
    fn default() -> Self {
        Self { base_url: CLOB_API_URL.to_string(), requests_per_minute: nonzero!(60u32), timeout_secs: 30 }
    }
}

impl ClobClientConfig {
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Unauthenticated CLOB REST client for fetching per-token order books.
pub struct ClobClient {
    http: Client,
    config: ClobClientConfig,
    rate_limiter:
        Arc<RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>>,
}

impl std::fmt::Debug for ClobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClobClient").field("base_url", &self.config.base_url).finish_non_exhaustive()
    }
}

impl ClobClient {
    #[must_use]
    pub fn new(config: ClobClientConfig) -> Self {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        let quota = Quota::per_minute(config.requests_per_minute);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));
        Self { http, config, rate_limiter }
    }

    async fn fetch_token_book(&self, token_id: &str) -> Result<RawBook, PolymarketError> {
        self.rate_limiter.until_ready().await;
        let url = format!("{}/book?token_id={}", self.config.base_url, token_id);
        tracing::debug!(%url, "GET");

        let response = self.http.get(&url).header("Accept", "application/json").send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PolymarketError::api(status.as_u16(), text));
        }
        response.json::<RawBook>().await.map_err(PolymarketError::from)
    }

    /// Fetches both tokens' books and combines them into a single `{yesAsks, noAsks}`
    /// structure. Returns `None` on any transport or parse failure.
    pub async fn get_order_book(&self, yes_id: &str, no_id: &str) -> Option<NormalizedOrderBook> {
        let (yes_book, no_book) = tokio::join!(self.fetch_token_book(yes_id), self.fetch_token_book(no_id));

        let yes_book = match yes_book {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, yes_id, "polymarket yes-token book fetch failed");
                return None;
            }
        };
        let no_book = match no_book {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, no_id, "polymarket no-token book fetch failed");
                return None;
            }
        };

        let yes_direct_asks = parse_levels(yes_book.asks);
        let yes_bids = parse_levels(yes_book.bids);
        let no_direct_asks = parse_levels(no_book.asks);
        let no_bids = parse_levels(no_book.bids);

        Some(NormalizedOrderBook {
            yes_id: yes_id.to_string(),
            no_id: no_id.to_string(),
            yes_asks: merge_ask_side(&yes_direct_asks, &no_bids),
            no_asks: merge_ask_side(&no_direct_asks, &yes_bids),
            updated_at: Utc::now(),
        })
    }
}
