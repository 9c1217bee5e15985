//! Arbitrage classification and liquidity analysis for matched market pairs
//! (SPEC_FULL.md §4.5/§4.6, components C5/C6).

pub mod calculator;
pub mod liquidity;
pub mod types;

pub use calculator::{classify_pair, compute_all, compute_arbitrage_only, sort_opportunities, MIN_SPREAD_PCT};
pub use liquidity::{analyze_liquidity, LiquidityOptions};
pub use types::{ArbitrageOpportunity, LimitedBy, LiquidityAnalysis, LiquidityLevel, OpportunityType, PriceLevel};
