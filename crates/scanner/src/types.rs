//! Scan result model (SPEC_FULL.md §3, "Scan result").

use arb_arbitrage::{ArbitrageOpportunity, LiquidityAnalysis};
use arb_core::types::EventShell;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An opportunity paired with its liquidity analysis, when one was computed (top-N only;
/// SPEC_FULL.md §4.7 step 5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpportunityWithLiquidity {
    pub opportunity: ArbitrageOpportunity,
    pub liquidity: Option<LiquidityAnalysis>,
}

/// The output of a single scan: every matched event, every opportunity (enriched with
/// liquidity where computed), and the timestamp the scan completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub events: Vec<EventShell>,
    pub opportunities: Vec<OpportunityWithLiquidity>,
    pub scanned_at: DateTime<Utc>,
}

impl ScanResult {
    #[must_use]
    pub fn empty(scanned_at: DateTime<Utc>) -> Self {
        Self { events: Vec::new(), opportunities: Vec::new(), scanned_at }
    }
}
