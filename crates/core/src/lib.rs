//! Shared types, configuration, and probability-space price model for the cross-venue
//! arbitrage scanner.
//!
//! # Example
//!
//! ```
//! use arb_core::{ConfigLoader, ScannerConfig};
//!
//! let config = ScannerConfig::default();
//! assert_eq!(config.cache.ttl_secs, 60);
//! ```

pub mod config;
pub mod config_loader;
pub mod price;
pub mod types;

pub use config::{
    CacheConfig, CatalogConfig, ConcurrencyConfig, RealtimeConfig, ScannerConfig, ThresholdsConfig,
    VenueConfig,
};
pub use config_loader::ConfigLoader;
pub use types::{Category, CatalogEntry, CatalogType, EventShell, MarketShell, VenueId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_exports() {
        let _ = ScannerConfig::default();
        let _ = Category::Sports;
    }
}
