//! Facade combining the catalog and order-book clients into the single surface the scanner
//! pipeline depends on (SPEC_FULL.md §4.1).

use crate::clob::{ClobClient, ClobClientConfig, NormalizedOrderBook};
use crate::gamma::{GammaClient, GammaClientConfig};
use arb_core::types::EventShell;

/// Configuration for [`PolymarketClient`].
#[derive(Debug, Clone, Default)]
pub struct PolymarketClientConfig {
    pub gamma: GammaClientConfig,
    pub clob: ClobClientConfig,
}

/// Polymarket venue client: resolves catalog events and order books.
pub struct PolymarketClient {
    gamma: GammaClient,
    clob: ClobClient,
}

impl PolymarketClient {
    #[must_use]
    pub fn new(config: PolymarketClientConfig) -> Self {
        Self { gamma: GammaClient::new(config.gamma), clob: ClobClient::new(config.clob) }
    }

    /// Resolves an event slug to an [`EventShell`]. Returns `None` on not-found, transport,
    /// or parse failure.
    pub async fn get_event(&self, slug: &str) -> Option<EventShell> {
        self.gamma.get_event(slug).await
    }

    /// Returns the combined, normalized order book for a market's YES/NO token pair.
    pub async fn get_order_book(&self, yes_id: &str, no_id: &str) -> Option<NormalizedOrderBook> {
        self.clob.get_order_book(yes_id, no_id).await
    }

    /// Lists active, non-closed events across the paginated catalog endpoint, for callers
    /// that need to search across many events rather than resolve one known slug.
    pub async fn get_active_events(&self, page_size: u32, max_pages: u32) -> Vec<EventShell> {
        self.gamma.get_active_events(page_size, max_pages).await
    }
}

impl Default for PolymarketClient {
    fn default() -> Self {
        Self::new(PolymarketClientConfig::default())
    }
}
