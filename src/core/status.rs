//! Status classification over a window of ping history.

use serde::{Deserialize, Serialize};

use crate::core::probe::types::PingRecord;

/// Operational status level derived from a success ratio.
///
/// Serialized names are read back by the status page layer, so they stay
/// in the stored upper-case form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusLevel {
    Operational,
    Acceptable,
    Unstable,
    Critical,
}

impl StatusLevel {
    /// Map a success ratio in `[0, 1]` to a status level.
    ///
    /// Band lower bounds are inclusive: exactly 0.9 is acceptable and
    /// exactly 0.25 is unstable. Only a perfect ratio is operational.
    /// NaN falls through every comparison and lands on critical.
    pub fn from_success_ratio(ratio: f64) -> Self {
        if ratio == 1.0 {
            Self::Operational
        } else if ratio >= 0.9 {
            Self::Acceptable
        } else if ratio >= 0.25 {
            Self::Unstable
        } else {
            Self::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operational => "OPERATIONAL",
            Self::Acceptable => "ACCEPTABLE",
            Self::Unstable => "UNSTABLE",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Success ratio across every attempt in a record window.
///
/// An empty window (or one holding only zero-attempt records) yields 0.0.
pub fn overall_success_ratio(records: &[PingRecord]) -> f64 {
    let total: usize = records.iter().map(PingRecord::events_len).sum();
    if total == 0 {
        return 0.0;
    }
    let successes: usize = records.iter().map(PingRecord::success_count).sum();
    successes as f64 / total as f64
}
