//! Catalog generator (SPEC_FULL.md §4.3, component C3).
//!
//! Expands static yearly patterns and date-templated dynamic patterns into concrete
//! `(pSlug, kTicker, kSeries)` tuples the orchestrator will fetch. A third generator expands
//! NBA game fixtures (team pairs for a given date) the same way, since the NBA matcher needs
//! per-game catalog entries that a date-template alone cannot express.

use arb_core::types::{CatalogEntry, CatalogType, Category};
use arb_matching::TeamInfo;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a trailing four-digit year immediately preceded by a month name or a "Q1"-"Q4"
/// quarter marker, optionally followed by a trailing `?`, at the end of a title.
static RE_TRAILING_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(january|february|march|april|may|june|july|august|september|october|november|december|q[1-4])\s+(?:19|20)\d{2}(\?)?\s*$",
    )
    .unwrap()
});

/// Strips a trailing four-digit year from a Kalshi event/market title, but only when it
/// immediately follows a month name or a quarter marker (SPEC_FULL.md §9 Open Question (d):
/// "in January 2026?" → "in January?"; "before 2027?" is left intact since "before" is
/// neither a month nor a quarter). Deliberately narrow — do not generalize to strip any
/// trailing year.
#[must_use]
pub fn strip_trailing_year(title: &str) -> String {
    match RE_TRAILING_YEAR.captures(title) {
        Some(caps) => {
            let month_or_quarter = &caps[1];
            let trailing_punct = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            let start = caps.get(0).unwrap().start();
            format!("{}{month_or_quarter}{trailing_punct}", &title[..start])
        }
        None => title.to_string(),
    }
}

/// A static, year-templated pairing (e.g. "championship winner, this year").
#[derive(Debug, Clone)]
pub struct YearlyPattern {
    pub name: String,
    pub category: Category,
    pub p_slug_pattern: String,
    pub k_ticker_pattern: String,
    pub k_series: Option<String>,
}

/// A date-templated pairing, expanded once per day in the catalog window.
#[derive(Debug, Clone)]
pub struct DynamicPattern {
    pub name: String,
    pub category: Category,
    /// Uses `{year}`, `{month}` (full lowercase name), `{day}` (no leading zero).
    pub p_slug_pattern: String,
    /// Uses `{yy}`, `{MON}` (three-letter upper), `{dd}` (zero-padded).
    pub k_ticker_pattern: String,
    pub k_series: Option<String>,
}

/// A scheduled NBA game to expand into a pair of per-team catalog entries.
#[derive(Debug, Clone)]
pub struct NbaGameFixture {
    pub p_slug_pattern: String,
    /// Uses `{yy}`, `{MON}`, `{dd}`, `{away}`, `{home}` (three-letter codes).
    pub k_ticker_pattern: String,
    pub k_series: String,
    pub away: TeamInfo,
    pub home: TeamInfo,
    pub date: DateTime<Utc>,
}

fn substitute_p(pattern: &str, date: DateTime<Utc>) -> String {
    let month = date.format("%B").to_string().to_lowercase();
    let day = date.format("%e").to_string().trim_start().to_string();
    pattern
        .replace("{year}", &date.format("%Y").to_string())
        .replace("{month}", &month)
        .replace("{day}", &day)
}

fn substitute_k(pattern: &str, date: DateTime<Utc>) -> String {
    pattern
        .replace("{yy}", &date.format("%y").to_string())
        .replace("{MON}", &date.format("%b").to_string().to_uppercase())
        .replace("{dd}", &date.format("%d").to_string())
}

/// Expands yearly patterns for the given year. Always produces `CatalogType::Static` entries.
#[must_use]
pub fn expand_yearly(patterns: &[YearlyPattern], year: i32) -> Vec<CatalogEntry> {
    patterns
        .iter()
        .map(|p| CatalogEntry {
            name: p.name.clone(),
            category: p.category,
            entry_type: CatalogType::Static,
            p_slug: p.p_slug_pattern.replace("{year}", &year.to_string()),
            k_ticker: p.k_ticker_pattern.replace("{year}", &year.to_string()),
            k_series: p.k_series.clone(),
            date: None,
        })
        .collect()
}

/// Expands dynamic patterns over `days` consecutive days starting at `start`.
#[must_use]
pub fn expand_dynamic(patterns: &[DynamicPattern], start: DateTime<Utc>, days: u32) -> Vec<CatalogEntry> {
    let mut out = Vec::with_capacity(patterns.len() * days as usize);
    for offset in 0..days {
        let date = start + Duration::days(i64::from(offset));
        for p in patterns {
            out.push(CatalogEntry {
                name: p.name.clone(),
                category: p.category,
                entry_type: CatalogType::Dynamic,
                p_slug: substitute_p(&p.p_slug_pattern, date),
                k_ticker: substitute_k(&p.k_ticker_pattern, date),
                k_series: p.k_series.clone(),
                date: Some(date),
            });
        }
    }
    out
}

/// Expands NBA fixtures into one catalog entry for the game (the matcher later splits it
/// into per-team pairs once the K side's per-team markets are fetched).
#[must_use]
pub fn expand_nba_games(fixtures: &[NbaGameFixture]) -> Vec<CatalogEntry> {
    fixtures
        .iter()
        .map(|f| {
            let k_ticker = substitute_k(&f.k_ticker_pattern, f.date)
                .replace("{away}", &f.away.code)
                .replace("{home}", &f.home.code);
            let p_slug = substitute_p(&f.p_slug_pattern, f.date)
                .replace("{away}", &f.away.code.to_lowercase())
                .replace("{home}", &f.home.code.to_lowercase());
            CatalogEntry {
                name: format!("{} at {}", f.away.full_name, f.home.full_name),
                category: Category::NbaGame,
                entry_type: CatalogType::Dynamic,
                p_slug,
                k_ticker,
                k_series: Some(f.k_series.clone()),
                date: Some(f.date),
            }
        })
        .collect()
}
