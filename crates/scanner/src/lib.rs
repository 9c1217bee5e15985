//! Catalog generation, scan orchestration, and opportunity projection for the cross-venue
//! arbitrage scanner (SPEC_FULL.md §4.3/§4.7/§4.9, components C3/C7/C9).

pub mod catalog;
pub mod orchestrator;
pub mod pipeline;
pub mod projection;
pub mod types;

pub use catalog::{expand_dynamic, expand_nba_games, expand_yearly, strip_trailing_year, DynamicPattern, NbaGameFixture, YearlyPattern};
pub use orchestrator::{ScanExecutor, Scanner};
pub use pipeline::{Pipeline, PipelineConfig};
pub use projection::{project, project_all, OpportunityDto};
pub use types::{OpportunityWithLiquidity, ScanResult};

use arb_arbitrage::OpportunityType;

/// Sorts already-liquidity-enriched opportunities guaranteed-first, then `profit_pct`
/// descending (SPEC_FULL.md §4.7 step 7) — the same ordering `arb_arbitrage::sort_opportunities`
/// applies, lifted to work over the wrapper type the liquidity fan-out produces.
pub fn sort_opportunities_with_liquidity(items: &mut [OpportunityWithLiquidity]) {
    items.sort_by(|a, b| {
        use OpportunityType::{Guaranteed, Simple};
        match (a.opportunity.opportunity_type, b.opportunity.opportunity_type) {
            (Guaranteed, Simple) => std::cmp::Ordering::Less,
            (Simple, Guaranteed) => std::cmp::Ordering::Greater,
            _ => b.opportunity.profit_pct.partial_cmp(&a.opportunity.profit_pct).unwrap_or(std::cmp::Ordering::Equal),
        }
    });
}
