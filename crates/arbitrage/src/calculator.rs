//! Arbitrage classification (SPEC_FULL.md §4.5, component C5).

use crate::types::{ArbitrageOpportunity, OpportunityType};
use arb_matching::MarketPair;

/// Default minimum spread, in percentage points, below which a `simple` opportunity is
/// considered uninteresting and dropped by [`compute_arbitrage_only`].
pub const MIN_SPREAD_PCT: f64 = 2.0;

/// Classifies a single pair, or returns `None` if either venue's YES price is non-positive
/// (an unresolved-but-degenerate or already-settled market).
#[must_use]
pub fn classify_pair(pair: MarketPair) -> Option<ArbitrageOpportunity> {
    if pair.p.yes_price <= 0.0 || pair.k.yes_price <= 0.0 {
        return None;
    }

    let cost1 = pair.p.yes_price + pair.k.no_price;
    let cost2 = pair.k.yes_price + pair.p.no_price;
    let min_cost = cost1.min(cost2);

    if min_cost < 1.0 {
        let action = if cost1 <= cost2 {
            "buy p-yes + k-no".to_string()
        } else {
            "buy k-yes + p-no".to_string()
        };
        return Some(ArbitrageOpportunity {
            pair,
            opportunity_type: OpportunityType::Guaranteed,
            profit_pct: (1.0 - min_cost) * 100.0,
            action,
            guaranteed_profit: Some(1.0 - min_cost),
        });
    }

    let spread_pct = (pair.p.yes_price - pair.k.yes_price).abs() * 100.0;
    let action = if pair.p.yes_price < pair.k.yes_price {
        "buy p-yes, sell k-yes".to_string()
    } else {
        "buy k-yes, sell p-yes".to_string()
    };
    Some(ArbitrageOpportunity {
        pair,
        opportunity_type: OpportunityType::Simple,
        profit_pct: spread_pct,
        action,
        guaranteed_profit: None,
    })
}

/// Sorts opportunities guaranteed-first, then by `profit_pct` descending.
pub fn sort_opportunities(opportunities: &mut [ArbitrageOpportunity]) {
    opportunities.sort_by(|a, b| {
        use OpportunityType::{Guaranteed, Simple};
        match (a.opportunity_type, b.opportunity_type) {
            (Guaranteed, Simple) => std::cmp::Ordering::Less,
            (Simple, Guaranteed) => std::cmp::Ordering::Greater,
            _ => b.profit_pct.partial_cmp(&a.profit_pct).unwrap_or(std::cmp::Ordering::Equal),
        }
    });
}

/// Classifies every pair, retaining every one regardless of spread size, for the "all matched
/// markets" display. Sorted guaranteed-first, then `profit_pct` descending.
#[must_use]
pub fn compute_all(pairs: Vec<MarketPair>) -> Vec<ArbitrageOpportunity> {
    let mut opportunities: Vec<ArbitrageOpportunity> = pairs.into_iter().filter_map(classify_pair).collect();
    sort_opportunities(&mut opportunities);
    opportunities
}

/// Classifies every pair, dropping `simple` opportunities whose spread falls below
/// `min_spread_pct`, for the arbitrage-only report. Sorted guaranteed-first, then
/// `profit_pct` descending.
#[must_use]
pub fn compute_arbitrage_only(pairs: Vec<MarketPair>, min_spread_pct: f64) -> Vec<ArbitrageOpportunity> {
    let mut opportunities: Vec<ArbitrageOpportunity> = pairs
        .into_iter()
        .filter_map(classify_pair)
        .filter(|o| o.opportunity_type == OpportunityType::Guaranteed || o.profit_pct >= min_spread_pct)
        .collect();
    sort_opportunities(&mut opportunities);
    opportunities
}

#[cfg(test)]
mod tests {
    use super::*;
    use arb_core::types::Category;
    use arb_matching::{KSide, PSide};

    fn pair(p_yes: f64, k_yes: f64) -> MarketPair {
        let p = PSide { question: "p".to_string(), yes_price: p_yes, no_price: 1.0 - p_yes, token_ids: None, slug: None, end_date: None };
        let k = KSide { question: "k".to_string(), yes_price: k_yes, no_price: 1.0 - k_yes, ticker: None, series_ticker: None, image_url: None, end_date: None };
        MarketPair::new("X", "Event", Category::Sports, p, k, 1.0)
    }

    /// S1: no-arbitrage simple spread.
    #[test]
    fn test_s1_simple_spread() {
        let opp = classify_pair(pair(0.40, 0.45)).unwrap();
        assert_eq!(opp.opportunity_type, OpportunityType::Simple);
        assert!((opp.profit_pct - 5.0).abs() < 1e-9);
    }

    /// S2: guaranteed arbitrage ranks ahead of a larger simple spread.
    #[test]
    fn test_s2_guaranteed_ranks_first() {
        // Pair A: p.yes=0.48, k.no=0.48 => k.yes=0.52. cost1 = 0.48+0.48=0.96 < 1.
        let a = pair(0.48, 0.52);
        // Pair B: p.yes=0.40, k.yes=0.45 (simple, 5%).
        let b = pair(0.40, 0.45);

        let mut opportunities = vec![classify_pair(b).unwrap(), classify_pair(a).unwrap()];
        sort_opportunities(&mut opportunities);

        assert_eq!(opportunities[0].opportunity_type, OpportunityType::Guaranteed);
        assert!((opportunities[0].profit_pct - 4.0).abs() < 1e-9);
        assert_eq!(opportunities[1].opportunity_type, OpportunityType::Simple);
    }

    #[test]
    fn test_non_positive_yes_price_dropped() {
        assert!(classify_pair(pair(0.0, 0.5)).is_none());
        assert!(classify_pair(pair(0.5, -0.01)).is_none());
    }

    #[test]
    fn test_compute_arbitrage_only_drops_below_threshold() {
        let opportunities = compute_arbitrage_only(vec![pair(0.50, 0.505)], MIN_SPREAD_PCT);
        assert!(opportunities.is_empty());
    }

    #[test]
    fn test_compute_all_keeps_below_threshold() {
        let opportunities = compute_all(vec![pair(0.50, 0.505)]);
        assert_eq!(opportunities.len(), 1);
    }
}
