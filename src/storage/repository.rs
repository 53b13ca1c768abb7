//! SQLite repository for imported sessions, results and driver snapshots

use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;

use super::schema::create_tables;
use crate::standings::SessionKind;

/// One upstream session row
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub session_key: i64,
    pub meeting_key: i64,
    pub location: String,
    pub date_start: String,
    pub date_end: String,
    pub session_type: String,
    pub session_name: String,
    pub country_key: i64,
    pub country_code: String,
    pub country_name: String,
    pub circuit_key: i64,
    pub circuit_short_name: String,
    pub gmt_offset: String,
    pub year: i32,
}

impl SessionRecord {
    /// Scored kind of this session, if any
    pub fn kind(&self) -> Option<SessionKind> {
        SessionKind::from_session_name(&self.session_name)
    }
}

/// One classified result row
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResultRecord {
    pub session_key: i64,
    pub driver_number: u32,
    /// Raw finishing position; `None` or non-positive means unclassified
    pub position: Option<i32>,
    pub number_of_laps: Option<i32>,
    pub dnf: bool,
    pub dns: bool,
    pub dsq: bool,
    pub duration: Option<f64>,
    pub gap_to_leader: Option<f64>,
    pub meeting_key: i64,
}

/// Driver snapshot as reported for one session
#[derive(Debug, Clone, PartialEq)]
pub struct DriverRecord {
    pub session_key: i64,
    pub meeting_key: i64,
    pub driver_number: u32,
    pub broadcast_name: String,
    pub country_code: String,
    pub first_name: String,
    pub full_name: String,
    pub headshot_url: Option<String>,
    pub last_name: String,
    pub name_acronym: String,
    pub team_colour: String,
    pub team_name: String,
}

/// Repository for imported session data
pub struct StandingsRepository {
    conn: Connection,
}

impl StandingsRepository {
    /// Create a new repository, initializing the database if needed
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create database directory")?;
            }
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;

        conn.execute("PRAGMA foreign_keys = ON", [])?;
        create_tables(&conn)?;

        Ok(Self { conn })
    }

    /// Create an in-memory repository (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        create_tables(&conn)?;
        Ok(Self { conn })
    }

    // ==================== Upsert Operations ====================

    /// Insert or update a session
    pub fn upsert_session(&self, session: &SessionRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO sessions
            (session_key, meeting_key, location, date_start, date_end, session_type,
             session_name, country_key, country_code, country_name, circuit_key,
             circuit_short_name, gmt_offset, year)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(session_key) DO UPDATE SET
                meeting_key = excluded.meeting_key,
                location = excluded.location,
                date_start = excluded.date_start,
                date_end = excluded.date_end,
                session_type = excluded.session_type,
                session_name = excluded.session_name,
                country_key = excluded.country_key,
                country_code = excluded.country_code,
                country_name = excluded.country_name,
                circuit_key = excluded.circuit_key,
                circuit_short_name = excluded.circuit_short_name,
                gmt_offset = excluded.gmt_offset,
                year = excluded.year
            "#,
            params![
                session.session_key,
                session.meeting_key,
                session.location,
                session.date_start,
                session.date_end,
                session.session_type,
                session.session_name,
                session.country_key,
                session.country_code,
                session.country_name,
                session.circuit_key,
                session.circuit_short_name,
                session.gmt_offset,
                session.year,
            ],
        )?;
        Ok(())
    }

    /// Insert or update a session result
    pub fn upsert_result(&self, result: &SessionResultRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO session_results
            (session_key, driver_number, position, number_of_laps, dnf, dns, dsq,
             duration, gap_to_leader, meeting_key)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(session_key, driver_number) DO UPDATE SET
                position = excluded.position,
                number_of_laps = excluded.number_of_laps,
                dnf = excluded.dnf,
                dns = excluded.dns,
                dsq = excluded.dsq,
                duration = excluded.duration,
                gap_to_leader = excluded.gap_to_leader,
                meeting_key = excluded.meeting_key
            "#,
            params![
                result.session_key,
                result.driver_number,
                result.position,
                result.number_of_laps,
                result.dnf,
                result.dns,
                result.dsq,
                result.duration,
                result.gap_to_leader,
                result.meeting_key,
            ],
        )?;
        Ok(())
    }

    /// Insert or update a driver snapshot
    pub fn upsert_driver(&self, driver: &DriverRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO drivers
            (session_key, meeting_key, driver_number, broadcast_name, country_code,
             first_name, full_name, headshot_url, last_name, name_acronym,
             team_colour, team_name)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(session_key, driver_number) DO UPDATE SET
                meeting_key = excluded.meeting_key,
                broadcast_name = excluded.broadcast_name,
                country_code = excluded.country_code,
                first_name = excluded.first_name,
                full_name = excluded.full_name,
                headshot_url = excluded.headshot_url,
                last_name = excluded.last_name,
                name_acronym = excluded.name_acronym,
                team_colour = excluded.team_colour,
                team_name = excluded.team_name
            "#,
            params![
                driver.session_key,
                driver.meeting_key,
                driver.driver_number,
                driver.broadcast_name,
                driver.country_code,
                driver.first_name,
                driver.full_name,
                driver.headshot_url,
                driver.last_name,
                driver.name_acronym,
                driver.team_colour,
                driver.team_name,
            ],
        )?;
        Ok(())
    }

    // ==================== Query Operations ====================

    /// Distinct seasons present in the sessions table
    pub fn session_years(&self) -> Result<Vec<i32>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT year FROM sessions ORDER BY year")?;
        let years = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<i32>, _>>()?;
        Ok(years)
    }

    /// Sessions of a season whose name is one of `session_names`
    pub fn sessions_for_season(
        &self,
        year: i32,
        session_names: &[&str],
    ) -> Result<Vec<SessionRecord>> {
        if session_names.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = placeholders(session_names.len(), 2);
        let sql = format!(
            "{} WHERE year = ?1 AND session_name IN ({}) ORDER BY date_start, session_key",
            SESSION_SELECT, placeholders
        );

        let mut values: Vec<rusqlite::types::Value> = vec![year.into()];
        values.extend(session_names.iter().map(|n| n.to_string().into()));

        let mut stmt = self.conn.prepare(&sql)?;
        let sessions = stmt
            .query_map(params_from_iter(values), session_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    /// All stored sessions, optionally restricted to one season
    pub fn all_sessions(&self, year: Option<i32>) -> Result<Vec<SessionRecord>> {
        let sessions = match year {
            Some(year) => {
                let sql = format!(
                    "{} WHERE year = ?1 ORDER BY date_start, session_key",
                    SESSION_SELECT
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([year], session_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let sql = format!("{} ORDER BY date_start, session_key", SESSION_SELECT);
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], session_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(sessions)
    }

    /// Results for a set of sessions
    pub fn results_for_sessions(&self, session_keys: &[i64]) -> Result<Vec<SessionResultRecord>> {
        if session_keys.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT session_key, driver_number, position, number_of_laps, dnf, dns, dsq,
                   duration, gap_to_leader, meeting_key
            FROM session_results
            WHERE session_key IN ({})
            ORDER BY session_key, driver_number
            "#,
            placeholders(session_keys.len(), 1)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let results = stmt
            .query_map(params_from_iter(session_keys.iter()), |row| {
                Ok(SessionResultRecord {
                    session_key: row.get(0)?,
                    driver_number: row.get(1)?,
                    position: row.get(2)?,
                    number_of_laps: row.get(3)?,
                    dnf: row.get(4)?,
                    dns: row.get(5)?,
                    dsq: row.get(6)?,
                    duration: row.get(7)?,
                    gap_to_leader: row.get(8)?,
                    meeting_key: row.get(9)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(results)
    }

    /// Driver snapshots for a set of sessions
    pub fn drivers_for_sessions(&self, session_keys: &[i64]) -> Result<Vec<DriverRecord>> {
        if session_keys.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT session_key, meeting_key, driver_number, broadcast_name, country_code,
                   first_name, full_name, headshot_url, last_name, name_acronym,
                   team_colour, team_name
            FROM drivers
            WHERE session_key IN ({})
            ORDER BY session_key, driver_number
            "#,
            placeholders(session_keys.len(), 1)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let drivers = stmt
            .query_map(params_from_iter(session_keys.iter()), |row| {
                Ok(DriverRecord {
                    session_key: row.get(0)?,
                    meeting_key: row.get(1)?,
                    driver_number: row.get(2)?,
                    broadcast_name: row.get(3)?,
                    country_code: row.get(4)?,
                    first_name: row.get(5)?,
                    full_name: row.get(6)?,
                    headshot_url: row.get(7)?,
                    last_name: row.get(8)?,
                    name_acronym: row.get(9)?,
                    team_colour: row.get(10)?,
                    team_name: row.get(11)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(drivers)
    }

    /// Get session count
    pub fn session_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(count)
    }
}

const SESSION_SELECT: &str = r#"
    SELECT session_key, meeting_key, location, date_start, date_end, session_type,
           session_name, country_key, country_code, country_name, circuit_key,
           circuit_short_name, gmt_offset, year
    FROM sessions"#;

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        session_key: row.get(0)?,
        meeting_key: row.get(1)?,
        location: row.get(2)?,
        date_start: row.get(3)?,
        date_end: row.get(4)?,
        session_type: row.get(5)?,
        session_name: row.get(6)?,
        country_key: row.get(7)?,
        country_code: row.get(8)?,
        country_name: row.get(9)?,
        circuit_key: row.get(10)?,
        circuit_short_name: row.get(11)?,
        gmt_offset: row.get(12)?,
        year: row.get(13)?,
    })
}

/// Numbered placeholders `?first, ?first+1, ...` for an IN clause
fn placeholders(count: usize, first: usize) -> String {
    (first..first + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}
