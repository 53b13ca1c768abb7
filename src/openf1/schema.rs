//! OpenF1 API payloads and their conversion into storage records.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::storage::{DriverRecord, SessionRecord, SessionResultRecord};

/// `GET /sessions` item
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSession {
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

impl ApiSession {
    /// Race and sprint sessions are the only ones imported
    pub fn is_scored_type(&self) -> bool {
        matches!(self.session_type.as_str(), "Race" | "Sprint")
    }

    pub fn into_record(self) -> SessionRecord {
        SessionRecord {
            session_key: self.session_key,
            meeting_key: self.meeting_key,
            location: self.location,
            date_start: self.date_start,
            date_end: self.date_end,
            session_type: self.session_type,
            session_name: self.session_name,
            country_key: self.country_key,
            country_code: self.country_code,
            country_name: self.country_name,
            circuit_key: self.circuit_key,
            circuit_short_name: self.circuit_short_name,
            gmt_offset: self.gmt_offset,
            year: self.year,
        }
    }
}

/// `GET /session_result` item
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSessionResult {
    pub session_key: i64,
    pub meeting_key: i64,
    pub driver_number: u32,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub number_of_laps: Option<i32>,
    #[serde(default)]
    pub dnf: bool,
    #[serde(default)]
    pub dns: bool,
    #[serde(default)]
    pub dsq: bool,
    /// Seconds; lapped or multi-part values come through as `None`
    #[serde(default, deserialize_with = "lenient_f64")]
    pub duration: Option<f64>,
    /// Seconds; "+1 LAP" style values come through as `None`
    #[serde(default, deserialize_with = "lenient_f64")]
    pub gap_to_leader: Option<f64>,
}

impl ApiSessionResult {
    pub fn into_record(self) -> SessionResultRecord {
        SessionResultRecord {
            session_key: self.session_key,
            driver_number: self.driver_number,
            position: self.position,
            number_of_laps: self.number_of_laps,
            dnf: self.dnf,
            dns: self.dns,
            dsq: self.dsq,
            duration: self.duration,
            gap_to_leader: self.gap_to_leader,
            meeting_key: self.meeting_key,
        }
    }
}

/// `GET /drivers` item
#[derive(Debug, Clone, Deserialize)]
pub struct ApiDriver {
    pub session_key: i64,
    pub meeting_key: i64,
    pub driver_number: u32,
    #[serde(default)]
    pub broadcast_name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub name_acronym: String,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub team_colour: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub headshot_url: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

impl ApiDriver {
    pub fn into_record(self) -> DriverRecord {
        DriverRecord {
            session_key: self.session_key,
            meeting_key: self.meeting_key,
            driver_number: self.driver_number,
            broadcast_name: self.broadcast_name,
            country_code: self
                .country_code
                .unwrap_or_else(|| crate::standings::metadata::UNKNOWN_NATIONALITY.to_string()),
            first_name: self.first_name.unwrap_or_default(),
            full_name: self.full_name,
            headshot_url: self.headshot_url,
            last_name: self.last_name.unwrap_or_default(),
            name_acronym: self.name_acronym,
            team_colour: self.team_colour.unwrap_or_default(),
            team_name: self
                .team_name
                .unwrap_or_else(|| crate::standings::metadata::UNKNOWN_TEAM.to_string()),
        }
    }
}

/// Accept a JSON number; anything else (string, array, null) becomes `None`
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_f64))
}
