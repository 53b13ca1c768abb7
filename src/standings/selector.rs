//! Season and session selection.

use chrono::{DateTime, FixedOffset};

use super::StandingsError;
use crate::storage::SessionRecord;

/// Scored sessions of one season
#[derive(Debug, Clone)]
pub struct SelectedSeason {
    pub season: i32,
    /// Sessions in the order the store returned them
    pub sessions: Vec<SessionRecord>,
    /// Same sessions sorted ascending by start time, ties in input order
    pub chronological: Vec<SessionRecord>,
}

impl SelectedSeason {
    pub fn session_keys(&self) -> Vec<i64> {
        self.sessions.iter().map(|s| s.session_key).collect()
    }
}

/// Pick the season to aggregate.
///
/// An explicit request wins; otherwise the latest season in the store.
pub fn resolve_season(years: &[i32], requested: Option<i32>) -> Result<i32, StandingsError> {
    let latest = years.iter().copied().max().ok_or(StandingsError::NoData)?;
    Ok(requested.unwrap_or(latest))
}

/// Keep the race and sprint sessions of `season` and order them by start.
pub fn select_sessions(
    season: i32,
    sessions: Vec<SessionRecord>,
) -> Result<SelectedSeason, StandingsError> {
    let sessions: Vec<SessionRecord> = sessions
        .into_iter()
        .filter(|s| s.year == season && s.kind().is_some())
        .collect();

    if sessions.is_empty() {
        return Err(StandingsError::NoSeasonData { season });
    }

    let mut chronological = sessions.clone();
    // Stable sort keeps store order for equal start times
    chronological.sort_by_key(start_sort_key);

    Ok(SelectedSeason {
        season,
        sessions,
        chronological,
    })
}

/// Parseable timestamps order by instant; unparseable ones sort after them, by text.
fn start_sort_key(session: &SessionRecord) -> (bool, i64, String) {
    match parse_start(&session.date_start) {
        Some(start) => (false, start.timestamp_millis(), String::new()),
        None => (true, 0, session.date_start.clone()),
    }
}

fn parse_start(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::repository::fixtures::session;

    #[test]
    fn test_resolve_latest_season() {
        assert_eq!(resolve_season(&[2023, 2025, 2024], None).unwrap(), 2025);
        assert_eq!(resolve_season(&[2023, 2025], Some(2023)).unwrap(), 2023);
    }

    #[test]
    fn test_resolve_season_empty_store() {
        assert!(matches!(
            resolve_season(&[], None),
            Err(StandingsError::NoData)
        ));
        assert!(matches!(
            resolve_season(&[], Some(2024)),
            Err(StandingsError::NoData)
        ));
    }

    #[test]
    fn test_select_sessions_skips_unscored() {
        let sessions = vec![
            session(1, 2024, "Qualifying", "2024-03-01T16:00:00+00:00"),
            session(2, 2024, "Race", "2024-03-02T15:00:00+00:00"),
            session(3, 2024, "Sprint", "2024-04-20T03:30:00+00:00"),
        ];
        let selected = select_sessions(2024, sessions).unwrap();
        assert_eq!(selected.session_keys(), vec![2, 3]);
    }

    #[test]
    fn test_select_sessions_no_scored_sessions() {
        let sessions = vec![session(1, 2024, "Qualifying", "2024-03-01T16:00:00+00:00")];
        assert!(matches!(
            select_sessions(2024, sessions),
            Err(StandingsError::NoSeasonData { season: 2024 })
        ));
    }

    #[test]
    fn test_chronological_order_uses_instant() {
        let sessions = vec![
            session(1, 2024, "Race", "2024-03-09T17:00:00+00:00"),
            // 15:00 at +03:00 is 12:00 UTC, before the next one
            session(2, 2024, "Race", "2024-03-02T15:00:00+03:00"),
            session(3, 2024, "Race", "2024-03-02T13:00:00+00:00"),
        ];
        let selected = select_sessions(2024, sessions).unwrap();
        let keys: Vec<i64> = selected.chronological.iter().map(|s| s.session_key).collect();
        assert_eq!(keys, vec![2, 3, 1]);
        // Store order is preserved separately
        assert_eq!(selected.session_keys(), vec![1, 2, 3]);
    }

    #[test]
    fn test_chronological_ties_keep_input_order() {
        let sessions = vec![
            session(7, 2024, "Sprint", "2024-05-04T16:00:00+00:00"),
            session(5, 2024, "Race", "2024-05-04T16:00:00+00:00"),
        ];
        let selected = select_sessions(2024, sessions).unwrap();
        let keys: Vec<i64> = selected.chronological.iter().map(|s| s.session_key).collect();
        assert_eq!(keys, vec![7, 5]);
    }
}
