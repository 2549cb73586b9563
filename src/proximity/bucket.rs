use serde::{Deserialize, Serialize};

use crate::models::ProximityBucket;

/// Distance bands. Each edge is the exclusive upper bound of its band and the
/// inclusive lower bound of the next one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketPolicy {
    pub very_close_below: f64,
    pub close_below: f64,
    pub moderate_below: f64,
}

impl Default for BucketPolicy {
    fn default() -> Self {
        Self {
            very_close_below: 500.0,
            close_below: 1000.0,
            moderate_below: 2000.0,
        }
    }
}

impl BucketPolicy {
    pub fn classify(&self, distance_meters: f64) -> ProximityBucket {
        if distance_meters < self.very_close_below {
            ProximityBucket::VeryClose
        } else if distance_meters < self.close_below {
            ProximityBucket::Close
        } else if distance_meters < self.moderate_below {
            ProximityBucket::Moderate
        } else {
            ProximityBucket::Far
        }
    }
}
