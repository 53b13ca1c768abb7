//! Per-session result filtering and dense re-ranking.

use std::collections::HashSet;

use super::metadata::MetadataIndex;
use super::StandingsFilter;
use crate::storage::SessionResultRecord;

/// Normalised exclusion rules
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    team_tokens: Vec<String>,
    driver_numbers: HashSet<u32>,
}

impl Exclusions {
    /// Trim and lower-case team tokens, dropping empty ones.
    pub fn from_filter(filter: &StandingsFilter) -> Self {
        Self {
            team_tokens: normalize_team_tokens(&filter.exclude_teams),
            driver_numbers: filter.exclude_driver_numbers.iter().copied().collect(),
        }
    }

    /// Whether a driver, as resolved for one session, is excluded
    pub fn excludes(&self, driver_number: u32, team_name: &str) -> bool {
        if self.driver_numbers.contains(&driver_number) {
            return true;
        }
        if self.team_tokens.is_empty() {
            return false;
        }
        // Substring match so "red bull" catches "Red Bull Racing"
        let team = team_name.to_lowercase();
        self.team_tokens.iter().any(|token| team.contains(token.as_str()))
    }
}

/// Trimmed, lower-cased, non-empty team tokens
pub fn normalize_team_tokens(teams: &[String]) -> Vec<String> {
    teams
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// One surviving finisher with its post-exclusion rank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedFinisher {
    pub driver_number: u32,
    /// Dense 1-based rank
    pub rank: usize,
}

/// Whether a raw result is a classified finish
pub fn is_classified(result: &SessionResultRecord) -> bool {
    !result.dns && !result.dsq && result.position.is_some_and(|p| p > 0)
}

/// Filter one session's results and assign dense ranks 1..K.
///
/// Non-starters, disqualified and unclassified entries are dropped first,
/// then excluded drivers and teams. Survivors are ordered by raw position;
/// equal positions keep input order.
pub fn rank_session(
    session_key: i64,
    results: &[SessionResultRecord],
    metadata: &MetadataIndex,
    exclusions: &Exclusions,
) -> Vec<RankedFinisher> {
    let mut survivors: Vec<&SessionResultRecord> = results
        .iter()
        .filter(|r| is_classified(r))
        .filter(|r| {
            let team = metadata.team_for(session_key, r.driver_number);
            !exclusions.excludes(r.driver_number, team)
        })
        .collect();

    survivors.sort_by_key(|r| (r.position.is_none(), r.position));

    survivors
        .into_iter()
        .enumerate()
        .map(|(idx, r)| RankedFinisher {
            driver_number: r.driver_number,
            rank: idx + 1,
        })
        .collect()
}
