use serde::{Deserialize, Serialize};

/// Top-level configuration for the scanner process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default)]
    pub venues: VenueConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    pub p_gamma_url: String,
    pub p_clob_url: String,
    pub p_ws_url: String,
    pub k_rest_url: String,
    pub k_ws_url: String,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            p_gamma_url: "https://gamma-api.polymarket.com".to_string(),
            p_clob_url: "https://clob.polymarket.com".to_string(),
            p_ws_url: "wss://ws-subscriptions-clob.polymarket.com/ws/market".to_string(),
            k_rest_url: "https://api.elections.kalshi.com/trade-api/v2".to_string(),
            k_ws_url: "wss://api.elections.kalshi.com/trade-api/ws/v2".to_string(),
        }
    }
}

/// Scan-result cache TTL, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 60 }
    }
}

/// Asymmetric-concurrency knobs for venue fan-out (see SPEC_FULL.md §5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    pub k_max_concurrent: usize,
    pub k_pagination_delay_ms: u64,
    pub k_retry_delays_ms: Vec<u64>,
    pub liquidity_top_n: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            k_max_concurrent: 4,
            k_pagination_delay_ms: 50,
            k_retry_delays_ms: vec![100, 200, 400],
            liquidity_top_n: 70,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    pub min_spread_pct: f64,
    pub min_profit_pct: f64,
    pub p_fee_pct: f64,
    pub k_fee_pct: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            min_spread_pct: 2.0,
            min_profit_pct: 1.0,
            p_fee_pct: 2.0,
            k_fee_pct: 1.0,
        }
    }
}

/// Catalog-generation window: how many consecutive days of dynamic entries to expand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub days_ahead: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { days_ahead: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    pub debounce_ms: u64,
    pub reconnect_delay_ms: u64,
    pub spread_change_threshold_pct: f64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            reconnect_delay_ms: 5_000,
            spread_change_threshold_pct: 0.1,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            venues: VenueConfig::default(),
            cache: CacheConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            thresholds: ThresholdsConfig::default(),
            catalog: CatalogConfig::default(),
            realtime: RealtimeConfig::default(),
        }
    }
}
