//! Latest-known driver metadata per competitor.
//!
//! Driver snapshots are recorded per session, and a driver's team can change
//! mid-season. Lookups prefer the snapshot of the session being scored and
//! fall back to the chronologically latest snapshot of the season.

use std::collections::HashMap;

use super::selector::SelectedSeason;
use crate::storage::DriverRecord;

/// Team label for drivers without any snapshot
pub const UNKNOWN_TEAM: &str = "Unknown";
/// Nationality label for drivers without any snapshot
pub const UNKNOWN_NATIONALITY: &str = "UNK";

/// Display attributes for a standings row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverLabel {
    pub name: String,
    pub nationality: String,
    pub team: String,
}

impl DriverLabel {
    fn from_record(record: &DriverRecord) -> Self {
        Self {
            name: display_name(record),
            nationality: record.country_code.clone(),
            team: record.team_name.clone(),
        }
    }

    fn placeholder(driver_number: u32) -> Self {
        Self {
            name: format!("#{}", driver_number),
            nationality: UNKNOWN_NATIONALITY.to_string(),
            team: UNKNOWN_TEAM.to_string(),
        }
    }
}

/// "First Last", else the upstream full name, else "#<number>"
fn display_name(record: &DriverRecord) -> String {
    let joined = format!("{} {}", record.first_name.trim(), record.last_name.trim());
    let joined = joined.trim();
    if !joined.is_empty() {
        return joined.to_string();
    }
    let full = record.full_name.trim();
    if !full.is_empty() {
        return full.to_string();
    }
    format!("#{}", record.driver_number)
}

/// Per-session and season-latest driver snapshots
#[derive(Debug, Default)]
pub struct MetadataIndex {
    by_session: HashMap<i64, HashMap<u32, DriverRecord>>,
    latest: HashMap<u32, DriverRecord>,
}

impl MetadataIndex {
    /// Index snapshots by session, then replay sessions oldest-first so the
    /// last write per driver is the latest snapshot.
    pub fn build(drivers: Vec<DriverRecord>, season: &SelectedSeason) -> Self {
        let mut by_session: HashMap<i64, HashMap<u32, DriverRecord>> = HashMap::new();
        for driver in drivers {
            by_session
                .entry(driver.session_key)
                .or_default()
                .insert(driver.driver_number, driver);
        }

        let mut latest: HashMap<u32, DriverRecord> = HashMap::new();
        for session in &season.chronological {
            if let Some(snapshots) = by_session.get(&session.session_key) {
                for (number, record) in snapshots {
                    latest.insert(*number, record.clone());
                }
            }
        }

        Self { by_session, latest }
    }

    /// Snapshot for a driver in a session, else the season-latest snapshot
    pub fn for_session(&self, session_key: i64, driver_number: u32) -> Option<&DriverRecord> {
        self.by_session
            .get(&session_key)
            .and_then(|snapshots| snapshots.get(&driver_number))
            .or_else(|| self.latest(driver_number))
    }

    /// Team name used for exclusion matching in a session
    pub fn team_for(&self, session_key: i64, driver_number: u32) -> &str {
        self.for_session(session_key, driver_number)
            .map(|record| record.team_name.as_str())
            .unwrap_or(UNKNOWN_TEAM)
    }

    /// Chronologically latest snapshot of the season
    pub fn latest(&self, driver_number: u32) -> Option<&DriverRecord> {
        self.latest.get(&driver_number)
    }

    /// Display label for the final table
    pub fn label(&self, driver_number: u32) -> DriverLabel {
        self.latest(driver_number)
            .map(DriverLabel::from_record)
            .unwrap_or_else(|| DriverLabel::placeholder(driver_number))
    }
}
