//! OpenF1 data source
//!
//! Fetches sessions, session results and driver snapshots from
//! api.openf1.org and upserts them into the local database.

pub mod client;
pub mod import;
pub mod rate_limiter;
pub mod schema;

pub use client::OpenF1Client;
pub use import::ImportSummary;

/// Default API root
pub const BASE_URL: &str = "https://api.openf1.org/v1";

/// Build sessions-by-year URL
pub fn sessions_url(base_url: &str, year: i32) -> String {
    format!("{}/sessions?year={}", base_url.trim_end_matches('/'), year)
}

/// Build session results URL
pub fn session_result_url(base_url: &str, session_key: i64) -> String {
    format!(
        "{}/session_result?session_key={}",
        base_url.trim_end_matches('/'),
        session_key
    )
}

/// Build drivers-by-session URL
pub fn drivers_url(base_url: &str, session_key: i64) -> String {
    format!(
        "{}/drivers?session_key={}",
        base_url.trim_end_matches('/'),
        session_key
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sessions_url() {
        assert_eq!(
            sessions_url(BASE_URL, 2025),
            "https://api.openf1.org/v1/sessions?year=2025"
        );
    }

    #[test]
    fn test_session_urls() {
        assert_eq!(
            session_result_url(BASE_URL, 9928),
            "https://api.openf1.org/v1/session_result?session_key=9928"
        );
        assert_eq!(
            drivers_url("http://localhost:9000/v1/", 9928),
            "http://localhost:9000/v1/drivers?session_key=9928"
        );
    }
}
