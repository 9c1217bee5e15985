//! Data model for C5's output and C6's input/output (SPEC_FULL.md §3/§4.5/§4.6).

use arb_matching::MarketPair;
use serde::{Deserialize, Serialize};

/// Whether a pair's mispricing guarantees profit regardless of outcome, or is a simple
/// cross-venue spread with no such guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityType {
    Guaranteed,
    Simple,
}

/// A single price level at which an arbitrage position can be taken, for the liquidity-walk
/// output (SPEC_FULL.md §4.6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub size: f64,
}

/// One step of the liquidity walk (SPEC_FULL.md §4.6 step 4).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LiquidityLevel {
    pub contracts: f64,
    pub p_price: f64,
    pub k_price: f64,
    pub cost_per_contract: f64,
    pub profit_per_contract: f64,
    pub cumulative_contracts: f64,
    pub cumulative_cost: f64,
    pub cumulative_profit: f64,
}

/// What constrained how far the liquidity walk could go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitedBy {
    PLiquidity,
    KLiquidity,
    SpreadExhausted,
    SpreadClosed,
    NoLiquidity,
}

/// The classified arbitrage opportunity for a matched pair (C5 output).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageOpportunity {
    pub pair: MarketPair,
    pub opportunity_type: OpportunityType,
    pub profit_pct: f64,
    /// "buy p-yes + k-no" or "buy k-yes + p-no", whichever cost was lower.
    pub action: String,
    /// Populated only when `opportunity_type = Guaranteed`.
    pub guaranteed_profit: Option<f64>,
}

/// The executable-liquidity analysis for an [`ArbitrageOpportunity`] (C6 output).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityAnalysis {
    pub opportunity: ArbitrageOpportunity,
    pub max_contracts: f64,
    pub max_investment: f64,
    pub max_profit: f64,
    pub avg_profit_pct: f64,
    pub levels: Vec<LiquidityLevel>,
    pub limited_by: LimitedBy,
    pub p_depth: f64,
    pub k_depth: f64,
    pub best_p_ask: Option<f64>,
    pub best_k_ask: Option<f64>,
    pub order_book_cost: Option<f64>,
}
