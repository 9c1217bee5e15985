//! Order-book liquidity analysis (SPEC_FULL.md §4.6, component C6).
//!
//! Analyzes the one fixed strategy "buy P-YES and K-NO" against two ask books by walking
//! price levels on both sides simultaneously. All arithmetic is IEEE-754 double; the
//! symmetric "buy K-YES and P-NO" strategy is the concern of upstream pair construction
//! (the calculator already decided which side is cheaper).

use crate::types::{ArbitrageOpportunity, LimitedBy, LiquidityAnalysis, LiquidityLevel, PriceLevel};

/// Fee inputs and the minimum-profit tolerance the walk stops at.
#[derive(Debug, Clone, Copy)]
pub struct LiquidityOptions {
    pub p_fee: f64,
    pub k_fee: f64,
    /// Percentage points; converted internally to a fractional `epsilon`.
    pub min_profit_pct: f64,
}

impl Default for LiquidityOptions {
    fn default() -> Self {
        Self { p_fee: 0.0, k_fee: 0.0, min_profit_pct: 0.0 }
    }
}

/// Walks `p_asks` (P's YES asks) against `k_asks` (K's NO asks) to find the maximum
/// executable size of the "buy P-YES and K-NO" strategy.
#[must_use]
pub fn analyze_liquidity(
    opportunity: ArbitrageOpportunity,
    p_asks: &[PriceLevel],
    k_asks: &[PriceLevel],
    options: LiquidityOptions,
) -> LiquidityAnalysis {
    let p_depth: f64 = p_asks.iter().map(|l| l.size).sum();
    let k_depth: f64 = k_asks.iter().map(|l| l.size).sum();

    if p_asks.is_empty() || k_asks.is_empty() {
        return LiquidityAnalysis {
            opportunity,
            max_contracts: 0.0,
            max_investment: 0.0,
            max_profit: 0.0,
            avg_profit_pct: 0.0,
            levels: Vec::new(),
            limited_by: LimitedBy::NoLiquidity,
            p_depth,
            k_depth,
            best_p_ask: p_asks.first().map(|l| l.price),
            best_k_ask: k_asks.first().map(|l| l.price),
            order_book_cost: None,
        };
    }

    let fees = options.p_fee + options.k_fee;
    let epsilon = options.min_profit_pct / 100.0;

    let best_p_ask = p_asks[0].price;
    let best_k_ask = k_asks[0].price;
    let c0 = best_p_ask + best_k_ask;

    if 1.0 - c0 - fees <= epsilon {
        return LiquidityAnalysis {
            opportunity,
            max_contracts: 0.0,
            max_investment: 0.0,
            max_profit: 0.0,
            avg_profit_pct: 0.0,
            levels: Vec::new(),
            limited_by: LimitedBy::SpreadClosed,
            p_depth,
            k_depth,
            best_p_ask: Some(best_p_ask),
            best_k_ask: Some(best_k_ask),
            order_book_cost: Some(c0),
        };
    }

    let mut i = 0usize;
    let mut j = 0usize;
    let mut p_remaining = p_asks[0].size;
    let mut k_remaining = k_asks[0].size;

    let mut levels = Vec::new();
    let mut cumulative_contracts = 0.0;
    let mut cumulative_cost = 0.0;
    let mut cumulative_profit = 0.0;

    while i < p_asks.len() && j < k_asks.len() {
        let cost = p_asks[i].price + k_asks[j].price;
        let profit = 1.0 - cost - fees;
        if profit <= epsilon {
            break;
        }

        let available = p_remaining.min(k_remaining);
        cumulative_contracts += available;
        cumulative_cost += available * cost;
        cumulative_profit += available * profit;

        levels.push(LiquidityLevel {
            contracts: available,
            p_price: p_asks[i].price,
            k_price: k_asks[j].price,
            cost_per_contract: cost,
            profit_per_contract: profit,
            cumulative_contracts,
            cumulative_cost,
            cumulative_profit,
        });

        p_remaining -= available;
        k_remaining -= available;

        if p_remaining <= 0.0 {
            i += 1;
            if i < p_asks.len() {
                p_remaining = p_asks[i].size;
            }
        }
        if k_remaining <= 0.0 {
            j += 1;
            if j < k_asks.len() {
                k_remaining = k_asks[j].size;
            }
        }
    }

    let limited_by = if cumulative_contracts <= 0.0 {
        LimitedBy::NoLiquidity
    } else if i >= p_asks.len() && j < k_asks.len() {
        LimitedBy::PLiquidity
    } else if j >= k_asks.len() && i < p_asks.len() {
        LimitedBy::KLiquidity
    } else {
        LimitedBy::SpreadExhausted
    };

    let avg_profit_pct = if cumulative_contracts > 0.0 { (cumulative_profit / cumulative_cost) * 100.0 } else { 0.0 };

    LiquidityAnalysis {
        opportunity,
        max_contracts: cumulative_contracts,
        max_investment: cumulative_cost,
        max_profit: cumulative_profit,
        avg_profit_pct,
        levels,
        limited_by,
        p_depth,
        k_depth,
        best_p_ask: Some(best_p_ask),
        best_k_ask: Some(best_k_ask),
        order_book_cost: Some(c0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::classify_pair;
    use arb_core::types::Category;
    use arb_matching::{KSide, MarketPair, PSide};

    fn sample_opportunity() -> ArbitrageOpportunity {
        let p = PSide { question: "p".to_string(), yes_price: 0.50, no_price: 0.50, token_ids: None, slug: None, end_date: None };
        let k = KSide { question: "k".to_string(), yes_price: 0.52, no_price: 0.48, ticker: None, series_ticker: None, image_url: None, end_date: None };
        let pair = MarketPair::new("X", "Event", Category::Sports, p, k, 1.0);
        classify_pair(pair).unwrap()
    }

    /// S3: liquidity walk, K-limited.
    #[test]
    fn test_s3_k_limited_walk() {
        let p_asks = vec![PriceLevel { price: 0.50, size: 100.0 }, PriceLevel { price: 0.51, size: 200.0 }];
        let k_asks = vec![PriceLevel { price: 0.48, size: 60.0 }];
        let analysis = analyze_liquidity(sample_opportunity(), &p_asks, &k_asks, LiquidityOptions::default());

        assert_eq!(analysis.levels.len(), 1);
        assert!((analysis.levels[0].contracts - 60.0).abs() < 1e-9);
        assert!((analysis.levels[0].cost_per_contract - 0.98).abs() < 1e-9);
        assert!((analysis.levels[0].profit_per_contract - 0.02).abs() < 1e-9);
        assert!((analysis.max_contracts - 60.0).abs() < 1e-9);
        assert!((analysis.max_investment - 58.8).abs() < 1e-9);
        assert!((analysis.max_profit - 1.2).abs() < 1e-9);
        assert_eq!(analysis.limited_by, LimitedBy::KLiquidity);
    }

    /// S4: spread closed.
    #[test]
    fn test_s4_spread_closed() {
        let p_asks = vec![PriceLevel { price: 0.52, size: 100.0 }];
        let k_asks = vec![PriceLevel { price: 0.50, size: 100.0 }];
        let analysis = analyze_liquidity(sample_opportunity(), &p_asks, &k_asks, LiquidityOptions::default());

        assert_eq!(analysis.limited_by, LimitedBy::SpreadClosed);
        assert!((analysis.max_contracts).abs() < 1e-9);
        assert_eq!(analysis.best_p_ask, Some(0.52));
        assert_eq!(analysis.best_k_ask, Some(0.50));
        assert!((analysis.order_book_cost.unwrap() - 1.02).abs() < 1e-9);
        assert!(analysis.levels.is_empty());
    }

    #[test]
    fn test_empty_book_is_no_liquidity() {
        let analysis = analyze_liquidity(sample_opportunity(), &[], &[PriceLevel { price: 0.5, size: 10.0 }], LiquidityOptions::default());
        assert_eq!(analysis.limited_by, LimitedBy::NoLiquidity);
        assert!((analysis.max_contracts).abs() < 1e-9);
    }

    #[test]
    fn test_cumulative_fields_are_running_sums() {
        let p_asks = vec![PriceLevel { price: 0.40, size: 10.0 }, PriceLevel { price: 0.42, size: 10.0 }];
        let k_asks = vec![PriceLevel { price: 0.40, size: 30.0 }];
        let analysis = analyze_liquidity(sample_opportunity(), &p_asks, &k_asks, LiquidityOptions::default());
        let mut running_contracts = 0.0;
        for level in &analysis.levels {
            running_contracts += level.contracts;
            assert!((level.cumulative_contracts - running_contracts).abs() < 1e-9);
        }
    }
}
