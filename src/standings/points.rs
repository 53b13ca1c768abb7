//! Position-to-points scoring tables.
//!
//! Ranks are the dense, post-exclusion ranks produced by the re-ranker.
//! Any rank past the end of a table scores zero.

/// Points for dense ranks 1-10 in a full-length race.
pub const RACE_POINTS: [u32; 10] = [25, 18, 15, 12, 10, 8, 6, 4, 2, 1];

/// Points for dense ranks 1-8 in a sprint.
pub const SPRINT_POINTS: [u32; 8] = [8, 7, 6, 5, 4, 3, 2, 1];

/// Ranks that count as a podium finish in either session kind.
pub const PODIUM_RANKS: std::ops::RangeInclusive<usize> = 1..=3;

/// Kind of scored session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    Race,
    Sprint,
}

impl SessionKind {
    /// Upstream `session_name` values that are scored
    pub const SESSION_NAMES: [&'static str; 2] = ["Race", "Sprint"];

    /// Map an upstream session name to a scored kind.
    ///
    /// Qualifying, practice and anything else return `None`.
    pub fn from_session_name(name: &str) -> Option<Self> {
        match name {
            "Race" => Some(SessionKind::Race),
            "Sprint" => Some(SessionKind::Sprint),
            _ => None,
        }
    }

    /// Scoring table for this kind
    pub fn points_table(&self) -> &'static [u32] {
        match self {
            SessionKind::Race => &RACE_POINTS,
            SessionKind::Sprint => &SPRINT_POINTS,
        }
    }

    /// Points for a dense 1-based rank
    pub fn points_for_rank(&self, rank: usize) -> u32 {
        points_for_rank(self.points_table(), rank)
    }
}

/// Look up a dense 1-based rank in a table, defaulting to zero outside it.
pub fn points_for_rank(table: &[u32], rank: usize) -> u32 {
    rank.checked_sub(1)
        .and_then(|idx| table.get(idx))
        .copied()
        .unwrap_or(0)
}
