//! Gamma API catalog client (SPEC_FULL.md §4.1's P-contract).
//!
//! Resolves a single event slug to an [`EventShell`], normalizing the outer `outcomePrices`/
//! `clobTokenIds` JSON-encoded-string fields along the way. Never propagates transport or
//! parse failures to the caller — returns `None` and logs a warning, per §7's venue-client
//! recovery policy. The catalog endpoint is public; no authentication is required.
//!
//! # Example
//!
//! ```ignore
//! use venue_polymarket::{GammaClient, GammaClientConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = GammaClient::new(GammaClientConfig::default());
//!     if let Some(event) = client.get_event("nba-lal-bos-2026-feb-02").await {
//!         println!("found {} markets", event.markets.len());
//!     }
//! }
//! ```

use crate::error::PolymarketError;
use crate::models::GammaEvent;
use arb_core::types::EventShell;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Gamma API base URL.
pub const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";

/// Configuration for [`GammaClient`].
#[derive(Debug, Clone)]
pub struct GammaClientConfig {
    pub base_url: String,
    pub requests_per_minute: NonZeroU32,
    pub timeout_secs: u64,
}

impl Default for GammaClientConfig {
    fn default() -> Self {
        Self { base_url: GAMMA_API_URL.to_string(), requests_per_minute: nonzero!(30u32), timeout_secs: 30 }
    }
}

impl GammaClientConfig {
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Gamma API catalog client, rate limited to the configured requests-per-minute.
pub struct GammaClient {
    http: Client,
    config: GammaClientConfig,
    rate_limiter:
        Arc<RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>>,
}

impl std::fmt::Debug for GammaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GammaClient").field("base_url", &self.config.base_url).finish_non_exhaustive()
    }
}

impl GammaClient {
    #[must_use]
    pub fn new(config: GammaClientConfig) -> Self {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        let quota = Quota::per_minute(config.requests_per_minute);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));
        Self { http, config, rate_limiter }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Waits for rate limit and makes a GET request.
    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, PolymarketError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.config.base_url, path);
        tracing::debug!(%url, "GET");

        let response = self.http.get(&url).header("Accept", "application/json").send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PolymarketError::api(status.as_u16(), text));
        }

        response.json::<T>().await.map_err(PolymarketError::from)
    }

    /// Resolves an event slug to an [`EventShell`], filtering to active and non-closed
    /// markets. Returns `None` on not-found, transport, or parse failure (logged as a
    /// warning, never propagated).
    pub async fn get_event(&self, slug: &str) -> Option<EventShell> {
        let path = format!("/events?slug={slug}");

        let events: Vec<GammaEvent> = match self.get(&path).await {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, slug, "polymarket catalog fetch failed");
                return None;
            }
        };

        let event = match events.into_iter().next() {
            Some(e) => e,
            None => {
                tracing::warn!(slug, "no polymarket event found for slug");
                return None;
            }
        };

        Some(event.to_event_shell())
    }

    /// Lists active, non-closed events via the paginated catalog endpoint (SPEC_FULL.md §6:
    /// `GET {P_GAMMA}/events?limit=…&offset=…&active=true&closed=false`), rather than a single
    /// slug. Used by callers that need to search across many events at once (e.g. the
    /// scanner's per-scan "all NBA markets" cache) instead of guessing one slug per event.
    ///
    /// Pages until a response returns fewer than `page_size` events or `max_pages` is reached;
    /// a page fetch failure stops pagination and returns whatever was gathered so far, logged
    /// as a warning rather than propagated (§7's venue-client recovery policy).
    pub async fn get_active_events(&self, page_size: u32, max_pages: u32) -> Vec<EventShell> {
        let mut out = Vec::new();
        for page in 0..max_pages {
            let offset = page * page_size;
            let path = format!("/events?limit={page_size}&offset={offset}&active=true&closed=false");

            let events: Vec<GammaEvent> = match self.get(&path).await {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(error = %e, page, "polymarket active-events page fetch failed");
                    break;
                }
            };

            let fetched = events.len();
            out.extend(events.into_iter().map(|e| e.to_event_shell()));

            if (fetched as u32) < page_size {
                break;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = GammaClientConfig::default();
        assert_eq!(config.base_url, GAMMA_API_URL);
        assert_eq!(config.requests_per_minute.get(), 30);
    }

    #[test]
    fn test_client_config_builder() {
        let config = GammaClientConfig::default().with_base_url("https://custom.test");
        assert_eq!(config.base_url, "https://custom.test");
    }

    #[tokio::test]
    async fn test_get_event_not_found_returns_none() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/events"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
            .mount(&server)
            .await;

        let client = GammaClient::new(GammaClientConfig::default().with_base_url(server.uri()));
        assert!(client.get_event("missing-slug").await.is_none());
    }

    #[tokio::test]
    async fn test_get_event_parses_markets() {
        let server = wiremock::MockServer::start().await;
        let body = serde_json::json!([{
            "slug": "nba-lal-bos-2026-feb-02",
            "title": "Lakers vs. Celtics",
            "markets": [{
                "question": "Lakers moneyline",
                "outcomePrices": "[\"0.60\", \"0.40\"]",
                "clobTokenIds": "[\"tok_yes\", \"tok_no\"]",
                "active": true,
                "closed": false
            }]
        }]);
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/events"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = GammaClient::new(GammaClientConfig::default().with_base_url(server.uri()));
        let event = client.get_event("nba-lal-bos-2026-feb-02").await.unwrap();
        assert_eq!(event.markets.len(), 1);
        assert!((event.markets[0].yes_price - 0.60).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_get_active_events_stops_on_short_page() {
        let server = wiremock::MockServer::start().await;
        let body = serde_json::json!([{
            "slug": "nba-lal-bos-2026-feb-02",
            "title": "Lakers vs. Celtics",
            "markets": []
        }]);
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/events"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = GammaClient::new(GammaClientConfig::default().with_base_url(server.uri()));
        let events = client.get_active_events(100, 5).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Lakers vs. Celtics");
    }

    #[tokio::test]
    async fn test_get_active_events_returns_gathered_events_on_page_failure() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/events"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = GammaClient::new(GammaClientConfig::default().with_base_url(server.uri()));
        let events = client.get_active_events(100, 3).await;
        assert!(events.is_empty());
    }
}
