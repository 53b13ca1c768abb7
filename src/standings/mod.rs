//! Championship standings computation
//!
//! Recomputes a season's drivers' table from raw session results:
//! - Selects the season's race and sprint sessions
//! - Drops invalid and excluded results, then re-ranks each session densely
//! - Scores ranks with the race or sprint table and folds them per driver
//! - Orders drivers by points with positions 1..N
//!
//! The computation is pure over the data read from a [`SeasonStore`] and
//! keeps no state between calls.

pub mod aggregate;
pub mod metadata;
pub mod points;
pub mod ranking;
pub mod selector;
pub mod table;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::storage::{DriverRecord, SessionRecord, SessionResultRecord, StandingsRepository};
use aggregate::Aggregator;
use metadata::MetadataIndex;
use ranking::{rank_session, Exclusions};
use selector::{resolve_season, select_sessions, SelectedSeason};

pub use points::SessionKind;

/// Errors surfaced to standings callers
#[derive(Debug, Error)]
pub enum StandingsError {
    #[error("no sessions found in the database; run the import commands first")]
    NoData,

    #[error("no race or sprint sessions found for season {season}")]
    NoSeasonData { season: i32 },

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Read-only queries the standings computation needs
pub trait SeasonStore {
    /// Season of every stored session (duplicates allowed)
    fn session_years(&self) -> anyhow::Result<Vec<i32>>;

    /// Race and sprint sessions of one season
    fn scored_sessions(&self, season: i32) -> anyhow::Result<Vec<SessionRecord>>;

    fn results_for_sessions(&self, session_keys: &[i64]) -> anyhow::Result<Vec<SessionResultRecord>>;

    fn drivers_for_sessions(&self, session_keys: &[i64]) -> anyhow::Result<Vec<DriverRecord>>;
}

impl SeasonStore for StandingsRepository {
    fn session_years(&self) -> anyhow::Result<Vec<i32>> {
        StandingsRepository::session_years(self)
    }

    fn scored_sessions(&self, season: i32) -> anyhow::Result<Vec<SessionRecord>> {
        self.sessions_for_season(season, &SessionKind::SESSION_NAMES)
    }

    fn results_for_sessions(&self, session_keys: &[i64]) -> anyhow::Result<Vec<SessionResultRecord>> {
        StandingsRepository::results_for_sessions(self, session_keys)
    }

    fn drivers_for_sessions(&self, session_keys: &[i64]) -> anyhow::Result<Vec<DriverRecord>> {
        StandingsRepository::drivers_for_sessions(self, session_keys)
    }
}

/// Exclusion filter and season selection for one computation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsFilter {
    /// Case-insensitive substrings of team names to ignore
    #[serde(default)]
    pub exclude_teams: Vec<String>,
    /// Driver numbers to ignore
    #[serde(default)]
    pub exclude_driver_numbers: Vec<u32>,
    /// Season to aggregate; latest stored season when absent
    #[serde(default)]
    pub season: Option<i32>,
}

/// One row of the drivers' table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonStanding {
    pub position: usize,
    pub driver_number: u32,
    pub driver: String,
    pub nationality: String,
    pub team: String,
    pub points: u32,
    /// Grand Prix wins
    pub wins: u32,
    pub sprint_wins: u32,
    pub podiums: u32,
}

/// Drivers' table for one season, ordered by position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standings {
    pub season: i32,
    pub rows: Vec<SeasonStanding>,
}

/// Read a season from the store and compute its standings.
pub fn compute_standings<S>(store: &S, filter: &StandingsFilter) -> Result<Standings, StandingsError>
where
    S: SeasonStore + ?Sized,
{
    let years = store.session_years()?;
    let season = resolve_season(&years, filter.season)?;

    let selected = select_sessions(season, store.scored_sessions(season)?)?;
    let keys = selected.session_keys();
    let results = store.results_for_sessions(&keys)?;
    let drivers = store.drivers_for_sessions(&keys)?;

    debug!(
        season,
        sessions = keys.len(),
        results = results.len(),
        drivers = drivers.len(),
        "Loaded season data"
    );

    Ok(build_standings(&selected, results, drivers, filter))
}

/// Compute standings from already-loaded season data.
pub fn build_standings(
    season: &SelectedSeason,
    results: Vec<SessionResultRecord>,
    drivers: Vec<DriverRecord>,
    filter: &StandingsFilter,
) -> Standings {
    let metadata = MetadataIndex::build(drivers, season);
    let exclusions = Exclusions::from_filter(filter);

    let mut results_by_session: HashMap<i64, Vec<SessionResultRecord>> = HashMap::new();
    for result in results {
        results_by_session
            .entry(result.session_key)
            .or_default()
            .push(result);
    }

    let mut aggregator = Aggregator::new();
    for session in &season.chronological {
        let Some(kind) = session.kind() else {
            continue;
        };
        let session_results = results_by_session
            .get(&session.session_key)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let finishers = rank_session(session.session_key, session_results, &metadata, &exclusions);
        debug!(
            session_key = session.session_key,
            ?kind,
            raw = session_results.len(),
            ranked = finishers.len(),
            "Ranked session"
        );
        aggregator.fold_session(kind, &finishers);
    }

    debug!(season = season.season, drivers = aggregator.len(), "Season aggregated");

    Standings {
        season: season.season,
        rows: table::rank_standings(aggregator, &metadata),
    }
}
