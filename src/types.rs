//! Request and response types for the standings API.

use serde::{Deserialize, Serialize};

use crate::standings::{SeasonStanding, Standings, StandingsFilter};

/// Query string of `GET /standings`
///
/// Lists are comma separated: `?exclude_teams=McLaren,Red%20Bull&exclude_drivers=1,44`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StandingsQuery {
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub exclude_teams: Option<String>,
    #[serde(default)]
    pub exclude_drivers: Option<String>,
}

impl StandingsQuery {
    /// Parse into a filter; the error names the offending parameter
    pub fn into_filter(self) -> Result<StandingsFilter, String> {
        let season = match self.season.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<i32>()
                    .map_err(|_| format!("Invalid season: {}", raw))?,
            ),
        };

        let exclude_teams = split_list(self.exclude_teams.as_deref())
            .map(str::to_string)
            .collect();

        let exclude_driver_numbers = split_list(self.exclude_drivers.as_deref())
            .map(|raw| {
                raw.parse::<u32>()
                    .map_err(|_| format!("Invalid driver number: {}", raw))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StandingsFilter {
            exclude_teams,
            exclude_driver_numbers,
            season,
        })
    }
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Standings response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingsResponse {
    pub season: i32,
    pub excluded_teams: Vec<String>,
    pub excluded_drivers: Vec<u32>,
    pub standings: Vec<SeasonStanding>,
}

impl StandingsResponse {
    pub fn new(filter: &StandingsFilter, standings: Standings) -> Self {
        Self {
            season: standings.season,
            excluded_teams: filter.exclude_teams.clone(),
            excluded_drivers: filter.exclude_driver_numbers.clone(),
            standings: standings.rows,
        }
    }
}

/// Cache invalidation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevalidateResponse {
    pub invalidated: bool,
    pub removed: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
