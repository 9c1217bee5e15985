//! Kalshi catalog and order-book REST clients.
//!
//! Two client facets are exposed, mirroring SPEC_FULL.md §4.1: a **catalog client** that
//! resolves `(ticker, series)` to an [`EventShell`], and an **order-book client** that
//! returns a [`NormalizedOrderBook`] for a single ticker. Both never propagate transport or
//! parse failures to the caller — they return `None` and log a warning, per §7's venue-client
//! recovery policy. Kalshi's public market-data endpoints require no authentication; only the
//! streaming API (see `auth.rs`) is signed.
//!
//! # Example
//!
//! ```ignore
//! use venue_kalshi::{KalshiClient, KalshiClientConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = KalshiClient::new(KalshiClientConfig::default());
//!     if let Some(event) = client.get_event("KXNBAGAME-26FEB02LALBOS", "KXNBAGAME").await {
//!         println!("found {} markets", event.markets.len());
//!     }
//! }
//! ```

use crate::error::KalshiError;
use crate::types::{MarketStatus, NormalizedOrderBook, PriceLevel};
use arb_core::price::p_from_cents;
use arb_core::types::{EventShell, MarketShell, VenueId};
use chrono::{DateTime, Utc};
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Kalshi production REST base URL.
pub const KALSHI_PROD_URL: &str = "https://api.elections.kalshi.com/trade-api/v2";

/// Configuration for [`KalshiClient`].
#[derive(Debug, Clone)]
pub struct KalshiClientConfig {
    pub base_url: String,
    pub requests_per_minute: NonZeroU32,
    pub timeout_secs: u64,
    /// Backoff delays applied to rate-limited requests, in order (SPEC_FULL.md §4.1/§5).
    pub retry_delays_ms: Vec<u64>,
}

impl Default for KalshiClientConfig {
    fn default() -> Self {
        Self {
            base_url: KALSHI_PROD_URL.to_string(),
            requests_per_minute: nonzero!(60u32),
            timeout_secs: 30,
            retry_delays_ms: vec![100, 200, 400],
        }
    }
}

impl KalshiClientConfig {
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_retry_delays_ms(mut self, delays: Vec<u64>) -> Self {
        self.retry_delays_ms = delays;
        self
    }
}

#[derive(Debug, Deserialize)]
struct RawEventsResponse {
    events: Option<Vec<RawEvent>>,
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    event_ticker: String,
    title: Option<String>,
    markets: Option<Vec<RawMarket>>,
}

#[derive(Debug, Deserialize)]
struct RawMarket {
    #[allow(dead_code)]
    ticker: String,
    title: Option<String>,
    subtitle: Option<String>,
    status: Option<String>,
    yes_bid: Option<i64>,
    yes_ask: Option<i64>,
    no_bid: Option<i64>,
    no_ask: Option<i64>,
    last_price: Option<i64>,
    volume_24h: Option<i64>,
    close_time: Option<String>,
}

fn parse_status(raw: Option<&str>) -> MarketStatus {
    match raw {
        Some("active") | Some("open") => MarketStatus::Open,
        Some("settled") => MarketStatus::Settled,
        Some("paused") => MarketStatus::Paused,
        _ => MarketStatus::Closed,
    }
}

fn mid_price_cents(yes_bid: Option<i64>, yes_ask: Option<i64>, last: Option<i64>) -> Option<f64> {
    match (yes_bid, yes_ask) {
        (Some(b), Some(a)) => Some((b + a) as f64 / 2.0),
        (Some(b), None) => Some(b as f64),
        (None, Some(a)) => Some(a as f64),
        (None, None) => last.map(|p| p as f64),
    }
}

impl RawMarket {
    fn into_shell(self) -> MarketShell {
        let yes_price = mid_price_cents(self.yes_bid, self.yes_ask, self.last_price)
            .map(p_from_cents)
            .unwrap_or(0.0);
        let no_price = mid_price_cents(self.no_bid, self.no_ask, None).map(p_from_cents);

        MarketShell {
            question: self.title.or(self.subtitle).unwrap_or_default(),
            yes_price,
            no_price,
            volume: self.volume_24h.map(|v| v as f64),
            end_date: self.close_time.and_then(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .ok()
                    .map(|d| d.with_timezone(&Utc))
            }),
            venue_id: VenueId::KalshiTicker(self.ticker),
        }
    }

    fn status(&self) -> MarketStatus {
        parse_status(self.status.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct RawOrderbookResponse {
    orderbook: Option<RawOrderbook>,
}

#[derive(Debug, Deserialize)]
struct RawOrderbook {
    yes: Option<Vec<Vec<i64>>>,
    no: Option<Vec<Vec<i64>>>,
}

/// Validates a ticker/series/identifier to prevent path traversal through REST paths.
///
/// Grounded in the teacher's `validate_ticker`/`validate_identifier` (SPEC_FULL.md §10).
pub fn validate_identifier(id: &str) -> Result<&str, KalshiError> {
    if id.contains("..") || id.contains('/') || id.contains('\\') {
        return Err(KalshiError::Validation(format!(
            "identifier contains forbidden characters: {id}"
        )));
    }
    if id.is_empty() {
        return Err(KalshiError::Validation("identifier cannot be empty".to_string()));
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(KalshiError::Validation(format!(
            "identifier must contain only alphanumeric, hyphen, or underscore: {id}"
        )));
    }
    if id.len() > 128 {
        return Err(KalshiError::Validation(format!(
            "identifier exceeds maximum length of 128: {}",
            id.len()
        )));
    }
    Ok(id)
}

/// Kalshi catalog and order-book REST client.
pub struct KalshiClient {
    config: KalshiClientConfig,
    http: Client,
    rate_limiter: Arc<
        RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>,
    >,
}

impl std::fmt::Debug for KalshiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KalshiClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl KalshiClient {
    #[must_use]
    pub fn new(config: KalshiClientConfig) -> Self {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        let quota = Quota::per_minute(config.requests_per_minute);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Self {
            config,
            http,
            rate_limiter,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Performs a GET request against the configured base URL, retrying on rate-limit
    /// signals only, with the configured backoff delays (up to 3 attempts).
    async fn get_with_retry<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, KalshiError> {
        let delays = self.config.retry_delays_ms.clone();
        let mut last_err = None;

        for (attempt, delay_ms) in std::iter::once(&0u64).chain(delays.iter()).enumerate() {
            if attempt > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(*delay_ms)).await;
            }

            self.rate_limiter.until_ready().await;
            let url = format!("{}{}", self.config.base_url, path);
            tracing::debug!(%url, attempt, "GET");

            match self.http.get(&url).header("Accept", "application/json").send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.as_u16() == 429 {
                        last_err = Some(KalshiError::rate_limit(delays.first().copied().unwrap_or(100)));
                        continue;
                    }
                    if !status.is_success() {
                        let text = response.text().await.unwrap_or_default();
                        return Err(KalshiError::api(status.as_u16(), text));
                    }
                    return response.json::<T>().await.map_err(KalshiError::from);
                }
                Err(e) => {
                    let err = KalshiError::from(e);
                    if !err.is_retryable() {
                        return Err(err);
                    }
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| KalshiError::Network("exhausted retries".to_string())))
    }

    /// Resolves `(ticker, series)` to an [`EventShell`], per SPEC_FULL.md §4.1's K-contract:
    /// paginates the series' events and selects the one whose ticker matches case-insensitively,
    /// filtering out non-active markets. Returns `None` on not-found, transport, or parse
    /// failure (logged as a warning, never propagated).
    pub async fn get_event(&self, ticker: &str, series: &str) -> Option<EventShell> {
        let ticker = match validate_identifier(ticker) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, ticker, "invalid kalshi ticker");
                return None;
            }
        };
        let series = match validate_identifier(series) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, series, "invalid kalshi series");
                return None;
            }
        };

        let mut cursor: Option<String> = None;
        loop {
            let path = match &cursor {
                Some(c) => format!("/series/{series}/events?with_nested_markets=true&cursor={c}"),
                None => format!("/series/{series}/events?with_nested_markets=true"),
            };

            let response: RawEventsResponse = match self.get_with_retry(&path).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(error = %e, series, "kalshi catalog fetch failed");
                    return None;
                }
            };

            let events = response.events.unwrap_or_default();
            if let Some(event) = events
                .into_iter()
                .find(|e| e.event_ticker.eq_ignore_ascii_case(ticker))
            {
                let markets: Vec<MarketShell> = event
                    .markets
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|m| m.status() == MarketStatus::Open)
                    .map(RawMarket::into_shell)
                    .collect();

                return Some(EventShell {
                    title: event.title.unwrap_or_default(),
                    image_url: None,
                    markets,
                });
            }

            match response.cursor {
                Some(c) if !c.is_empty() => cursor = Some(c),
                _ => return None,
            }
        }
    }

    /// Returns the normalized order book for a market ticker, inverting each side's bids
    /// into the opposite side's asks (SPEC_FULL.md §4.1). Returns `None` on any failure.
    pub async fn get_orderbook(&self, ticker: &str) -> Option<NormalizedOrderBook> {
        let ticker = match validate_identifier(ticker) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, ticker, "invalid kalshi ticker");
                return None;
            }
        };

        let path = format!("/markets/{ticker}/orderbook?depth=100");
        let response: RawOrderbookResponse = match self.get_with_retry(&path).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, ticker, "kalshi orderbook fetch failed");
                return None;
            }
        };

        let raw = response.orderbook.unwrap_or(RawOrderbook { yes: None, no: None });
        let yes_asks = invert_levels(raw.no.unwrap_or_default());
        let no_asks = invert_levels(raw.yes.unwrap_or_default());

        Some(NormalizedOrderBook {
            ticker: ticker.to_string(),
            yes_asks,
            no_asks,
            updated_at: Utc::now(),
        })
    }
}

/// Inverts bid levels `(priceCents, size)` on one side into ask levels on the opposite side:
/// `askPrice = 1 - p_from_cents(priceCents)`. Consolidates collisions at the same price.
fn invert_levels(raw: Vec<Vec<i64>>) -> Vec<PriceLevel> {
    let mut levels: Vec<PriceLevel> = raw
        .into_iter()
        .filter(|v| v.len() >= 2 && v[1] > 0)
        .map(|v| PriceLevel {
            price: 1.0 - p_from_cents(v[0] as f64),
            size: v[1] as f64,
        })
        .collect();

    levels.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal));

    let mut consolidated: Vec<PriceLevel> = Vec::with_capacity(levels.len());
    for level in levels.drain(..) {
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
