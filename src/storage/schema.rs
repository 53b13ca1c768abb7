//! SQLite schema definitions for imported session data
//!
//! Tables:
//! - sessions: Race and sprint sessions, one row per upstream session_key
//! - session_results: Classified results, keyed by (session_key, driver_number)
//! - drivers: Driver snapshot per session, keyed by (session_key, driver_number)

use rusqlite::{Connection, Result};

/// Create all tables in the database
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            session_key INTEGER PRIMARY KEY NOT NULL,
            meeting_key INTEGER NOT NULL,
            location TEXT NOT NULL,
            date_start TEXT NOT NULL,
            date_end TEXT NOT NULL,
            session_type TEXT NOT NULL,
            session_name TEXT NOT NULL,
            country_key INTEGER NOT NULL,
            country_code TEXT NOT NULL,
            country_name TEXT NOT NULL,
            circuit_key INTEGER NOT NULL,
            circuit_short_name TEXT NOT NULL,
            gmt_offset TEXT NOT NULL,
            year INTEGER NOT NULL
        )
        "#,
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS session_results (
            session_key INTEGER NOT NULL
                REFERENCES sessions(session_key) ON DELETE CASCADE,
            driver_number INTEGER NOT NULL,
            position INTEGER,
            number_of_laps INTEGER,
            dnf INTEGER NOT NULL DEFAULT 0,
            dns INTEGER NOT NULL DEFAULT 0,
            dsq INTEGER NOT NULL DEFAULT 0,
            duration REAL,
            gap_to_leader REAL,
            meeting_key INTEGER NOT NULL,
            PRIMARY KEY (session_key, driver_number)
        )
        "#,
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS drivers (
            session_key INTEGER NOT NULL
                REFERENCES sessions(session_key) ON DELETE CASCADE,
            meeting_key INTEGER NOT NULL,
            driver_number INTEGER NOT NULL,
            broadcast_name TEXT NOT NULL,
            country_code TEXT NOT NULL,
            first_name TEXT NOT NULL,
            full_name TEXT NOT NULL,
            headshot_url TEXT,
            last_name TEXT NOT NULL,
            name_acronym TEXT NOT NULL,
            team_colour TEXT NOT NULL,
            team_name TEXT NOT NULL,
            PRIMARY KEY (session_key, driver_number)
        )
        "#,
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_year ON sessions(year)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_session_results_session ON session_results(session_key)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_drivers_session ON drivers(session_key)",
        [],
    )?;

    Ok(())
}
