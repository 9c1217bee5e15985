//! Pair registry and event types for the realtime engine (SPEC_FULL.md §4.8, component C8).

use serde::{Deserialize, Serialize};

/// One realtime-tracked pair: a Polymarket YES/NO token pair and a Kalshi ticker believed
/// to settle on the same underlying event. Subscriptions are market-level, per SPEC_FULL.md
/// §4.8 ("K ticker on one side; two P token ids on the other").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairSubscription {
    /// Stable identifier used to key per-pair state and events.
    pub pair_id: String,
    pub p_yes_token: String,
    pub p_no_token: String,
    pub k_ticker: String,
}

/// An opportunity window open on a tracked pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeOpportunity {
    pub pair_id: String,
    pub spread_percent: f64,
    pub max_contracts: f64,
    pub potential_profit: f64,
}

/// Events emitted by the realtime engine, one per pair per debounced evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RealtimeEvent {
    OpportunityOpened(RealtimeOpportunity),
    OpportunityClosed { pair_id: String },
}
