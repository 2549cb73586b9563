//! Outcome of checking a station coordinate against a reference source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Coordinate, CoordinateFlag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    /// Existing coordinate within tolerance of the reference
    Verified,
    /// Existing coordinate replaced by the reference
    Corrected,
    /// No usable existing coordinate, reference taken as is
    Added,
    /// Reference missing or unusable
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub station_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_coordinate: Option<Coordinate>,

    /// Absent only for `not_found`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_coordinate: Option<Coordinate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_meters: Option<f64>,

    pub status: ReconciliationStatus,

    /// Why the result is `not_found`, or why an existing coordinate was ignored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<CoordinateFlag>,

    /// Additional rows with the same name that were folded into this result
    #[serde(default, skip_serializing_if = "is_zero")]
    pub duplicates: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// Counts for the verification report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub generated_at: DateTime<Utc>,
    pub verified: usize,
    pub corrected: usize,
    pub added: usize,
    pub not_found: usize,
    pub duplicate_names: usize,
}

impl ReconciliationSummary {
    pub fn from_results(results: &[ReconciliationResult]) -> Self {
        let count = |status| results.iter().filter(|r| r.status == status).count();
        Self {
            generated_at: Utc::now(),
            verified: count(ReconciliationStatus::Verified),
            corrected: count(ReconciliationStatus::Corrected),
            added: count(ReconciliationStatus::Added),
            not_found: count(ReconciliationStatus::NotFound),
            duplicate_names: results.iter().filter(|r| r.duplicates > 0).count(),
        }
    }

    pub fn total(&self) -> usize {
        self.verified + self.corrected + self.added + self.not_found
    }
}
