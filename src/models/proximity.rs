//! Per-TPU nearest-station results.

use serde::{Deserialize, Serialize};

use super::CensusYear;

/// Categorical distance band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProximityBucket {
    VeryClose,
    Close,
    Moderate,
    Far,
}

impl ProximityBucket {
    pub fn all() -> &'static [ProximityBucket] {
        &[
            ProximityBucket::VeryClose,
            ProximityBucket::Close,
            ProximityBucket::Moderate,
            ProximityBucket::Far,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProximityBucket::VeryClose => "very_close",
            ProximityBucket::Close => "close",
            ProximityBucket::Moderate => "moderate",
            ProximityBucket::Far => "far",
        }
    }
}

impl std::fmt::Display for ProximityBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record per (TPU, year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityRecord {
    pub tpu_id: String,
    pub year: CensusYear,
    pub nearest_station_name: String,
    pub distance_meters: f64,
    pub bucket: ProximityBucket,
}

/// Flattened `(year, bucket) -> count` entry for tabular output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCount {
    pub year: CensusYear,
    pub bucket: ProximityBucket,
    pub count: usize,
}
