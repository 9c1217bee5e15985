//! Sports moneyline matcher (SPEC_FULL.md §4.4).
//!
//! Detects the league from the event name, canonicalizes each market's question to a team
//! name via a configured alias table, and pairs markets that canonicalize to the same team.

use crate::types::{KSide, MarketPair, PSide};
use arb_core::types::{Category, MarketShell, VenueId};

const LEAGUE_KEYWORDS: &[&str] = &["nfl", "nba", "nhl", "mlb", "soccer"];

/// Returns the league keyword found in the event name, if any.
#[must_use]
pub fn detect_league(event_name: &str) -> Option<&'static str> {
    let lower = event_name.to_lowercase();
    LEAGUE_KEYWORDS.iter().copied().find(|kw| lower.contains(kw))
}

/// A canonical team name plus the surface forms (full names, cities, nicknames, aliases,
/// codes) that should resolve to it. Longest-alias match wins among entries; an exact
/// canonical-name match takes precedence over an alias match of the same or shorter length.
#[derive(Debug, Clone)]
pub struct TeamAlias {
    pub canonical: String,
    pub aliases: Vec<String>,
}

/// The alias table used to canonicalize a market question into a team name.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    teams: Vec<TeamAlias>,
}

impl AliasTable {
    #[must_use]
    pub fn new(teams: Vec<TeamAlias>) -> Self {
        Self { teams }
    }

    /// A small starter table covering a sample of well-known franchises per league. Callers
    /// may extend it with [`AliasTable::new`] for a fuller roster.
    #[must_use]
    pub fn default_table() -> Self {
        Self::new(vec![
            TeamAlias {
                canonical: "Kansas City Chiefs".to_string(),
                aliases: vec!["chiefs".to_string(), "kc".to_string()],
            },
            TeamAlias {
                canonical: "Buffalo Bills".to_string(),
                aliases: vec!["bills".to_string()],
            },
            TeamAlias {
                canonical: "Los Angeles Lakers".to_string(),
                aliases: vec!["lakers".to_string(), "lal".to_string()],
            },
            TeamAlias {
                canonical: "Boston Celtics".to_string(),
                aliases: vec!["celtics".to_string(), "bos".to_string()],
            },
            TeamAlias {
                canonical: "New York Yankees".to_string(),
                aliases: vec!["yankees".to_string(), "nyy".to_string()],
            },
            TeamAlias {
                canonical: "Los Angeles Dodgers".to_string(),
                aliases: vec!["dodgers".to_string(), "lad".to_string()],
            },
            TeamAlias {
                canonical: "Edmonton Oilers".to_string(),
                aliases: vec!["oilers".to_string()],
            },
            TeamAlias {
                canonical: "Florida Panthers".to_string(),
                aliases: vec!["panthers".to_string()],
            },
        ])
    }

    /// Resolves free text to a canonical team name. An exact canonical-name substring match
    /// is preferred over an alias match; among matches of the same kind, the longest surface
    /// form wins.
    #[must_use]
    pub fn canonicalize(&self, text: &str) -> Option<String> {
        let lower = text.to_lowercase();

        let mut best_canonical: Option<(&str, usize)> = None;
        for team in &self.teams {
            let needle = team.canonical.to_lowercase();
            if lower.contains(&needle) {
                let len = needle.len();
                if best_canonical.map(|(_, l)| len > l).unwrap_or(true) {
                    best_canonical = Some((&team.canonical, len));
                }
            }
        }
        if let Some((name, _)) = best_canonical {
            return Some(name.to_string());
        }

        let mut best_alias: Option<(&str, usize)> = None;
        for team in &self.teams {
            for alias in &team.aliases {
                if lower.contains(alias.as_str()) {
                    let len = alias.len();
                    if best_alias.map(|(_, l)| len > l).unwrap_or(true) {
                        best_alias = Some((&team.canonical, len));
                    }
                }
            }
        }
        best_alias.map(|(name, _)| name.to_string())
    }
}

/// Matches binary moneyline/outcome markets within a sports event by canonical team name.
/// Returns one pair per team name that appears on both venues. Confidence is fixed at 1.0.
#[must_use]
pub fn match_sports(
    event_name: &str,
    p_markets: &[MarketShell],
    k_markets: &[MarketShell],
    aliases: &AliasTable,
) -> Vec<MarketPair> {
    if detect_league(event_name).is_none() {
        return Vec::new();
    }

    let mut pairs = Vec::new();
    for pm in p_markets {
        let Some(p_team) = aliases.canonicalize(&pm.question) else {
            continue;
        };
        for km in k_markets {
            let Some(k_team) = aliases.canonicalize(&km.question) else {
                continue;
            };
            if p_team != k_team {
                continue;
            }

            let p_side = PSide {
                question: pm.question.clone(),
                yes_price: pm.yes_price,
                no_price: pm.no_price_or_derived(),
                token_ids: match &pm.venue_id {
                    VenueId::PolymarketTokens { yes_id, no_id } => {
                        Some((yes_id.clone(), no_id.clone()))
                    }
                    VenueId::KalshiTicker(_) => None,
                },
                slug: None,
                end_date: pm.end_date,
            };
            let k_side = KSide {
                question: km.question.clone(),
                yes_price: km.yes_price,
                no_price: km.no_price_or_derived(),
                ticker: match &km.venue_id {
                    VenueId::KalshiTicker(t) => Some(t.clone()),
                    VenueId::PolymarketTokens { .. } => None,
                },
                series_ticker: None,
                image_url: None,
                end_date: km.end_date,
            };

            pairs.push(MarketPair::new(
                p_team.clone(),
                event_name,
                Category::Sports,
                p_side,
                k_side,
                1.0,
            ));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn shell(question: &str, yes_price: f64, venue_id: VenueId) -> MarketShell {
        MarketShell {
            question: question.to_string(),
            yes_price,
            no_price: None,
            volume: None,
            end_date: None,
            venue_id,
        }
    }

    #[test]
    fn test_detect_league_keywords() {
        assert_eq!(detect_league("NFL: Chiefs vs Bills"), Some("nfl"));
        assert_eq!(detect_league("NBA Finals Game 3"), Some("nba"));
        assert_eq!(detect_league("Premier League soccer match"), Some("soccer"));
        assert_eq!(detect_league("Fed rate decision"), None);
    }

    #[test]
    fn test_alias_canonicalize_exact_canonical_precedence() {
        let table = AliasTable::default_table();
        assert_eq!(
            table.canonicalize("Will the Kansas City Chiefs win?"),
            Some("Kansas City Chiefs".to_string())
        );
    }

    #[test]
    fn test_alias_canonicalize_via_alias() {
        let table = AliasTable::default_table();
        assert_eq!(table.canonicalize("Will the Chiefs win?"), Some("Kansas City Chiefs".to_string()));
    }

    #[test]
    fn test_alias_canonicalize_longest_alias_wins() {
        let table = AliasTable::new(vec![
            TeamAlias {
                canonical: "Team A".to_string(),
                aliases: vec!["cats".to_string()],
            },
            TeamAlias {
                canonical: "Team B".to_string(),
                aliases: vec!["wildcats".to_string()],
            },
        ]);
        // "wildcats" contains "cats" as a substring; the longer alias must win.
        assert_eq!(table.canonicalize("the wildcats play tonight"), Some("Team B".to_string()));
    }

    #[test]
    fn test_match_sports_pairs_by_team() {
        let aliases = AliasTable::default_table();
        let p_markets = vec![shell(
            "Will the Chiefs win?",
            0.55,
            VenueId::PolymarketTokens { yes_id: "py".to_string(), no_id: "pn".to_string() },
        )];
        let k_markets = vec![shell(
            "Kansas City Chiefs moneyline",
            0.58,
            VenueId::KalshiTicker("KXNFLGAME-KC".to_string()),
        )];

        let pairs = match_sports("NFL: Chiefs at Bills", &p_markets, &k_markets, &aliases);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].matched_entity, "Kansas City Chiefs");
        assert!((pairs[0].confidence - 1.0).abs() < 1e-9);
        let _ = Utc::now();
    }

    #[test]
    fn test_match_sports_no_league_keyword_yields_nothing() {
        let aliases = AliasTable::default_table();
        let p_markets = vec![shell("Will the Chiefs win?", 0.55, VenueId::KalshiTicker("X".to_string()))];
        let pairs = match_sports("Fed decision", &p_markets, &[], &aliases);
        assert!(pairs.is_empty());
    }
}
