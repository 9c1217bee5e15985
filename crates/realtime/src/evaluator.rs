//! Pure per-pair opportunity evaluation (SPEC_FULL.md §4.8).
//!
//! Takes each venue's best ask (price and size) for the YES and NO sides, picks the
//! cheaper ask per side across venues, and reports the resulting spread if it is
//! profitable. No I/O, no state — the engine owns debounce timing and the
//! already-active/change-threshold gating; this module only answers "is there a spread
//! right now, and how big".

/// Best ask price and size available for one outcome side on one venue.
#[derive(Debug, Clone, Copy)]
pub struct BestAsk {
    pub price: f64,
    pub size: f64,
}

/// The two venues' best asks for one outcome side. Either may be absent (no book yet).
#[derive(Debug, Clone, Copy, Default)]
pub struct VenueAsks {
    pub p: Option<BestAsk>,
    pub k: Option<BestAsk>,
}

fn cheaper(asks: VenueAsks) -> Option<BestAsk> {
    match (asks.p, asks.k) {
        (Some(p), Some(k)) => Some(if p.price <= k.price { p } else { k }),
        (Some(p), None) => Some(p),
        (None, Some(k)) => Some(k),
        (None, None) => None,
    }
}

/// The result of one evaluation pass, before the active/debounce gating is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluatedSpread {
    pub spread_percent: f64,
    pub max_contracts: f64,
    pub potential_profit: f64,
}

/// Picks the cheaper YES ask and cheaper NO ask across both venues and, if their sum is
/// below 1, returns the resulting spread (SPEC_FULL.md §4.8). Returns `None` when either
/// side has no quote on any venue, or the spread is non-positive (no opportunity).
#[must_use]
pub fn evaluate(yes: VenueAsks, no: VenueAsks) -> Option<EvaluatedSpread> {
    let cheaper_yes = cheaper(yes)?;
    let cheaper_no = cheaper(no)?;
    let sum = cheaper_yes.price + cheaper_no.price;
    if sum >= 1.0 {
        return None;
    }
    let spread_percent = (1.0 - sum) * 100.0;
    let max_contracts = cheaper_yes.size.min(cheaper_no.size);
    let potential_profit = spread_percent * max_contracts / 100.0;
    Some(EvaluatedSpread { spread_percent, max_contracts, potential_profit })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(price: f64, size: f64) -> Option<BestAsk> {
        Some(BestAsk { price, size })
    }

    #[test]
    fn test_picks_cheaper_ask_from_either_venue() {
        let yes = VenueAsks { p: ask(0.48, 100.0), k: ask(0.50, 50.0) };
        let no = VenueAsks { p: ask(0.55, 20.0), k: ask(0.49, 60.0) };
        let result = evaluate(yes, no).unwrap();
        // cheaper yes = p at 0.48; cheaper no = k at 0.49; sum = 0.97 -> spread 3%.
        assert!((result.spread_percent - 3.0).abs() < 1e-9);
        assert!((result.max_contracts - 60.0).abs() < 1e-9);
        assert!((result.potential_profit - 1.8).abs() < 1e-9);
    }

    #[test]
    fn test_sum_at_or_above_one_yields_no_opportunity() {
        let yes = VenueAsks { p: ask(0.55, 10.0), k: None };
        let no = VenueAsks { p: None, k: ask(0.45, 10.0) };
        assert!(evaluate(yes, no).is_none());
    }

    #[test]
    fn test_missing_quote_on_either_side_yields_none() {
        let yes = VenueAsks { p: None, k: None };
        let no = VenueAsks { p: ask(0.4, 10.0), k: None };
        assert!(evaluate(yes, no).is_none());
    }

    #[test]
    fn test_max_contracts_is_limited_by_smaller_side() {
        let yes = VenueAsks { p: ask(0.40, 5.0), k: None };
        let no = VenueAsks { p: None, k: ask(0.40, 500.0) };
        let result = evaluate(yes, no).unwrap();
        assert!((result.max_contracts - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_venue_quoted_is_used_directly() {
        let yes = VenueAsks { p: ask(0.45, 10.0), k: None };
        let no = VenueAsks { p: None, k: ask(0.50, 10.0) };
        let result = evaluate(yes, no).unwrap();
        assert!((result.spread_percent - 5.0).abs() < 1e-9);
    }
}
