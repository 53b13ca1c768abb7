//! SQLite storage module for imported session data
//!
//! Persists the raw sessions, session results and per-session driver
//! snapshots fetched from OpenF1. Standings are never stored; they are
//! recomputed from these tables on every request.

pub mod repository;
pub mod schema;

pub use repository::{DriverRecord, SessionRecord, SessionResultRecord, StandingsRepository};
