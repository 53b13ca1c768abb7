//! Import jobs: fetch from OpenF1 and upsert into the local database.
//!
//! Jobs are sequential per session so the rate limiter governs the pace.
//! A failed row or session is logged and skipped; the job carries on.

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::{info, warn};

use super::client::OpenF1Client;
use super::schema::{ApiDriver, ApiSessionResult};
use crate::storage::StandingsRepository;

/// Earliest season OpenF1-style data can describe
const FIRST_SEASON: i32 = 1950;

/// Counts reported by an import job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub fetched: usize,
    pub upserted: usize,
    pub failed: usize,
    /// Sessions whose fetch failed and were skipped
    pub skipped_sessions: usize,
}

impl ImportSummary {
    fn merge(&mut self, other: ImportSummary) {
        self.fetched += other.fetched;
        self.upserted += other.upserted;
        self.failed += other.failed;
        self.skipped_sessions += other.skipped_sessions;
    }
}

/// Import the race and sprint sessions of a year
pub async fn import_sessions(
    client: &OpenF1Client,
    repo: &StandingsRepository,
    year: i32,
) -> Result<ImportSummary> {
    if year < FIRST_SEASON {
        bail!("Invalid year {}: seasons start in {}", year, FIRST_SEASON);
    }

    info!(year, "Fetching sessions");
    let sessions = client.sessions(year).await?;
    let fetched = sessions.len();

    let scored: Vec<_> = sessions.into_iter().filter(|s| s.is_scored_type()).collect();
    info!(
        fetched,
        importing = scored.len(),
        "Fetched sessions; importing race and sprint sessions"
    );

    let mut summary = ImportSummary {
        fetched,
        ..Default::default()
    };
    for session in scored {
        let key = session.session_key;
        match repo.upsert_session(&session.into_record()) {
            Ok(()) => summary.upserted += 1,
            Err(e) => {
                warn!(session_key = key, "Failed to upsert session: {:#}", e);
                summary.failed += 1;
            }
        }
    }

    info!(upserted = summary.upserted, "Sessions imported");
    Ok(summary)
}

/// Import results for every stored session, optionally one year only
pub async fn import_session_results(
    client: &OpenF1Client,
    repo: &StandingsRepository,
    year: Option<i32>,
) -> Result<ImportSummary> {
    let sessions = repo.all_sessions(year)?;
    if sessions.is_empty() {
        match year {
            Some(y) => warn!(year = y, "No sessions in the database for this year"),
            None => warn!("No sessions in the database; run import-sessions first"),
        }
        return Ok(ImportSummary::default());
    }

    info!(sessions = sessions.len(), "Importing session results");

    let mut summary = ImportSummary::default();
    for session in &sessions {
        info!(
            session_key = session.session_key,
            name = %session.session_name,
            "Fetching results"
        );

        let results = match client.session_results(session.session_key).await {
            Ok(results) => results,
            Err(e) => {
                warn!(session_key = session.session_key, "Skipping session: {:#}", e);
                summary.skipped_sessions += 1;
                continue;
            }
        };

        if results.is_empty() {
            info!(session_key = session.session_key, "No results");
            continue;
        }

        summary.merge(upsert_results(repo, results));
    }

    info!(
        upserted = summary.upserted,
        failed = summary.failed,
        skipped_sessions = summary.skipped_sessions,
        "Session results imported"
    );
    Ok(summary)
}

fn upsert_results(repo: &StandingsRepository, results: Vec<ApiSessionResult>) -> ImportSummary {
    let mut summary = ImportSummary {
        fetched: results.len(),
        ..Default::default()
    };
    for result in results {
        let (key, number) = (result.session_key, result.driver_number);
        match repo.upsert_result(&result.into_record()) {
            Ok(()) => summary.upserted += 1,
            Err(e) => {
                warn!(
                    session_key = key,
                    driver_number = number,
                    "Failed to upsert result: {:#}",
                    e
                );
                summary.failed += 1;
            }
        }
    }
    summary
}

/// Import driver snapshots for one session
pub async fn import_drivers(
    client: &OpenF1Client,
    repo: &StandingsRepository,
    session_key: i64,
) -> Result<ImportSummary> {
    if session_key <= 0 {
        bail!("Invalid session key {}", session_key);
    }

    info!(session_key, "Fetching drivers");
    let drivers = client.drivers(session_key).await?;
    let summary = upsert_drivers(repo, drivers);

    if summary.failed > 0 {
        warn!(
            session_key,
            failed = summary.failed,
            "Some drivers failed; import the session first if foreign keys are violated"
        );
    }
    info!(session_key, upserted = summary.upserted, "Drivers imported");
    Ok(summary)
}

/// Import driver snapshots for every stored session, optionally one year only
pub async fn import_drivers_for_season(
    client: &OpenF1Client,
    repo: &StandingsRepository,
    year: Option<i32>,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for session in repo.all_sessions(year)? {
        match import_drivers(client, repo, session.session_key).await {
            Ok(s) => summary.merge(s),
            Err(e) => {
                warn!(session_key = session.session_key, "Skipping session: {:#}", e);
                summary.skipped_sessions += 1;
            }
        }
    }
    Ok(summary)
}

fn upsert_drivers(repo: &StandingsRepository, drivers: Vec<ApiDriver>) -> ImportSummary {
    let mut summary = ImportSummary {
        fetched: drivers.len(),
        ..Default::default()
    };
    for driver in drivers {
        let (key, number) = (driver.session_key, driver.driver_number);
        match repo.upsert_driver(&driver.into_record()) {
            Ok(()) => summary.upserted += 1,
            Err(e) => {
                warn!(
                    session_key = key,
                    driver_number = number,
                    "Failed to upsert driver: {:#}",
                    e
                );
                summary.failed += 1;
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenF1Config;
    use crate::storage::repository::fixtures::session;

    fn api_result(session_key: i64, driver_number: u32, position: i32) -> ApiSessionResult {
        serde_json::from_value(serde_json::json!({
            "session_key": session_key,
            "meeting_key": 1229,
            "driver_number": driver_number,
            "position": position,
            "number_of_laps": 57,
            "dnf": false, "dns": false, "dsq": false,
            "duration": 5504.7, "gap_to_leader": 0
        }))
        .unwrap()
    }

    fn api_driver(session_key: i64, driver_number: u32) -> ApiDriver {
        serde_json::from_value(serde_json::json!({
            "session_key": session_key,
            "meeting_key": 1229,
            "driver_number": driver_number,
            "broadcast_name": "M VERSTAPPEN",
            "full_name": "Max VERSTAPPEN",
            "name_acronym": "VER",
            "team_name": "Red Bull Racing",
            "team_colour": "3671C6",
            "first_name": "Max",
            "last_name": "Verstappen",
            "country_code": "NED"
        }))
        .unwrap()
    }

    #[test]
    fn test_upsert_results_counts_failures() {
        let repo = StandingsRepository::in_memory().unwrap();
        repo.upsert_session(&session(9472, 2024, "Race", "2024-03-02T15:00:00+00:00"))
            .unwrap();

        // Second row references an unknown session
        let summary = upsert_results(&repo, vec![api_result(9472, 1, 1), api_result(1, 2, 2)]);
        assert_eq!(
            summary,
            ImportSummary { fetched: 2, upserted: 1, failed: 1, skipped_sessions: 0 }
        );
    }

    #[test]
    fn test_upsert_drivers() {
        let repo = StandingsRepository::in_memory().unwrap();
        repo.upsert_session(&session(9472, 2024, "Race", "2024-03-02T15:00:00+00:00"))
            .unwrap();

        let summary = upsert_drivers(&repo, vec![api_driver(9472, 1), api_driver(9472, 1)]);
        assert_eq!(summary.upserted, 2);
        assert_eq!(repo.drivers_for_sessions(&[9472]).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_invalid_arguments_before_fetching() {
        let repo = StandingsRepository::in_memory().unwrap();
        let client = OpenF1Client::new(&OpenF1Config {
            base_url: "http://127.0.0.1:9/v1".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert!(import_sessions(&client, &repo, 1949).await.is_err());
        assert!(import_drivers(&client, &repo, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_results_import_with_empty_database() {
        let repo = StandingsRepository::in_memory().unwrap();
        let client = OpenF1Client::new(&OpenF1Config::default()).unwrap();
        let summary = import_session_results(&client, &repo, Some(2024)).await.unwrap();
        assert_eq!(summary, ImportSummary::default());
    }
}
