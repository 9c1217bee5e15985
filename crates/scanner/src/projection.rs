//! Opportunity projection (SPEC_FULL.md §4.9/§6, component C9).
//!
//! A pure function turning an internal [`OpportunityWithLiquidity`] plus the scan timestamp
//! into the external DTO. No I/O, no venue clients — everything needed is already on the
//! opportunity record.

use crate::catalog::strip_trailing_year;
use crate::types::OpportunityWithLiquidity;
use arb_arbitrage::{LimitedBy, OpportunityType};
use arb_core::types::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MAX_ID_LEN: usize = 64;

/// A `SERIES → url-path-segment` mapping for Kalshi's market URL scheme (SPEC_FULL.md §6).
/// Unlisted series fall back to their lowercased form.
const SERIES_SLUGS: &[(&str, &str)] = &[("KXNBAGAME", "professional-basketball-game")];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub p_yes: f64,
    pub p_no: f64,
    pub k_yes: f64,
    pub k_no: f64,
    pub order_book: Option<OrderBookSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub best_p_ask: Option<f64>,
    pub best_k_ask: Option<f64>,
    pub max_contracts: f64,
    pub limited_by: LimitedBy,
}

/// The externally consumed opportunity record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpportunityDto {
    pub id: String,
    pub event_name: String,
    pub matched_entity: String,
    pub category: Category,
    pub image_url: Option<String>,
    pub opportunity_type: OpportunityType,
    pub spread_pct: f64,
    pub action: String,
    pub potential_profit: f64,
    pub max_investment: Option<f64>,
    pub resolution_date: Option<DateTime<Utc>>,
    pub p_fee_pct: f64,
    pub k_fee_pct: f64,
    pub prices: PriceSnapshot,
    pub p_url: String,
    pub k_url: String,
    pub liquidity_status: String,
    pub roi: Option<f64>,
    pub apr: Option<f64>,
}

fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_was_dash = false;
    for ch in text.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }
    let trimmed = slug.trim_matches('-');
    trimmed.chars().take(MAX_ID_LEN).collect()
}

fn series_slug(series: &str) -> String {
    SERIES_SLUGS
        .iter()
        .find(|(k, _)| *k == series)
        .map(|(_, v)| (*v).to_string())
        .unwrap_or_else(|| series.to_lowercase())
}

/// Strips the trailing `-TEAM` segment from an NBA-style ticker of the form
/// `SERIES-DATE-TEAM` to obtain the event ticker (Open Question decision (d)).
fn strip_trailing_team(ticker: &str) -> &str {
    match ticker.rfind('-') {
        Some(pos) if ticker[..pos].contains('-') => &ticker[..pos],
        _ => ticker,
    }
}

fn p_url(slug: Option<&str>) -> String {
    match slug {
        Some(s) => format!("https://polymarket.com/event/{s}"),
        None => "https://polymarket.com".to_string(),
    }
}

fn k_url(ticker: Option<&str>, series: Option<&str>) -> String {
    let (Some(ticker), Some(series)) = (ticker, series) else {
        return "https://kalshi.com".to_string();
    };
    let series_lower = series.to_lowercase();
    let slug = series_slug(series);
    let event_ticker = strip_trailing_team(ticker);
    format!("https://kalshi.com/markets/{series_lower}/{slug}/{}", event_ticker.to_lowercase())
}

fn liquidity_status(item: &OpportunityWithLiquidity) -> String {
    match &item.liquidity {
        None => "unanalyzed".to_string(),
        Some(liq) => match liq.limited_by {
            LimitedBy::NoLiquidity => "no_liquidity".to_string(),
            LimitedBy::SpreadClosed => "closed".to_string(),
            _ if liq.max_profit > 0.0 => "available".to_string(),
            _ => "unprofitable".to_string(),
        },
    }
}

/// Projects one scan-internal opportunity into its external DTO.
#[must_use]
pub fn project(item: &OpportunityWithLiquidity, scanned_at: DateTime<Utc>, p_fee_pct: f64, k_fee_pct: f64) -> OpportunityDto {
    let pair = &item.opportunity.pair;

    let spread_pct = item.liquidity.as_ref().map(|l| l.avg_profit_pct).unwrap_or(item.opportunity.profit_pct);

    let potential_profit = item
        .liquidity
        .as_ref()
        .map(|l| l.max_profit)
        .unwrap_or_else(|| item.opportunity.guaranteed_profit.unwrap_or(0.0));

    let max_investment = item.liquidity.as_ref().map(|l| l.max_investment);

    let resolution_date = match (pair.p.end_date, pair.k.end_date) {
        (Some(p), Some(k)) => Some(p.min(k)),
        (Some(p), None) => Some(p),
        (None, Some(k)) => Some(k),
        (None, None) => None,
    };

    let roi = match max_investment {
        Some(invested) if invested > 0.0 => Some(potential_profit / invested),
        _ => None,
    };

    let apr = match (roi, resolution_date) {
        (Some(r), Some(date)) if r > 0.0 => {
            let days = (date - scanned_at).num_days().max(1) as f64;
            Some(r * (365.0 / days))
        }
        _ => None,
    };

    let order_book = item.liquidity.as_ref().map(|l| OrderBookSnapshot {
        best_p_ask: l.best_p_ask,
        best_k_ask: l.best_k_ask,
        max_contracts: l.max_contracts,
        limited_by: l.limited_by,
    });

    let event_name = strip_trailing_year(&pair.event_name);

    OpportunityDto {
        id: slugify(&format!("{}-{}", pair.event_name, pair.matched_entity)),
        event_name,
        matched_entity: pair.matched_entity.clone(),
        category: pair.category,
        image_url: pair.k.image_url.clone(),
        opportunity_type: item.opportunity.opportunity_type,
        spread_pct,
        action: item.opportunity.action.clone(),
        potential_profit,
        max_investment,
        resolution_date,
        p_fee_pct,
        k_fee_pct,
        prices: PriceSnapshot {
            p_yes: pair.p.yes_price,
            p_no: pair.p.no_price,
            k_yes: pair.k.yes_price,
            k_no: pair.k.no_price,
            order_book,
        },
        p_url: p_url(pair.p.slug.as_deref()),
        k_url: k_url(pair.k.ticker.as_deref(), pair.k.series_ticker.as_deref()),
        liquidity_status: liquidity_status(item),
        roi,
        apr,
    }
}

/// Projects and sorts a full scan's opportunities by `spread_pct` descending.
#[must_use]
pub fn project_all(items: &[OpportunityWithLiquidity], scanned_at: DateTime<Utc>, p_fee_pct: f64, k_fee_pct: f64) -> Vec<OpportunityDto> {
    let mut dtos: Vec<OpportunityDto> = items.iter().map(|i| project(i, scanned_at, p_fee_pct, k_fee_pct)).collect();
    dtos.sort_by(|a, b| b.spread_pct.partial_cmp(&a.spread_pct).unwrap_or(std::cmp::Ordering::Equal));
    dtos
}
