//! Analysis configuration: bounds, reconciliation tolerance and proximity bands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::BoundingBox;
use crate::proximity::BucketPolicy;

/// f64 carries about 15 significant decimal digits
pub const MAX_COORDINATE_PRECISION: u32 = 15;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub bounds: BoundingBox,
    pub reconcile: ReconcileConfig,
    pub proximity: ProximityConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Existing and reference coordinates closer than this are considered the same
    pub tolerance_meters: f64,
    /// Decimal places kept when a reference coordinate is written into a result
    pub coordinate_precision: u32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            tolerance_meters: 100.0,
            coordinate_precision: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    pub buckets: BucketPolicy,
    /// Distances closer than this are ties, broken by station name
    pub tie_epsilon_meters: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            buckets: BucketPolicy::default(),
            tie_epsilon_meters: 1e-6,
        }
    }
}

impl AnalysisConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: AnalysisConfig =
            toml::from_str(&content).context("Failed to parse config file")?;
        config.validate().context("Invalid config file")?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        let b = &self.bounds;
        let finite = [b.min_lat, b.max_lat, b.min_lon, b.max_lon]
            .iter()
            .all(|v| v.is_finite());
        if !finite || b.min_lat > b.max_lat || b.min_lon > b.max_lon {
            return Err(invalid("bounds", "expected finite min <= max on both axes"));
        }

        let tol = self.reconcile.tolerance_meters;
        if !(tol.is_finite() && tol > 0.0) {
            return Err(invalid("reconcile.tolerance_meters", "must be a positive number"));
        }

        if self.reconcile.coordinate_precision > MAX_COORDINATE_PRECISION {
            return Err(invalid(
                "reconcile.coordinate_precision",
                "at most 15 decimal places",
            ));
        }

        let p = &self.proximity.buckets;
        let edges = [p.very_close_below, p.close_below, p.moderate_below];
        if edges.iter().any(|e| !e.is_finite() || *e <= 0.0)
            || edges.windows(2).any(|w| w[0] >= w[1])
        {
            return Err(invalid(
                "proximity.buckets",
                "edges must be positive and strictly increasing",
            ));
        }

        let eps = self.proximity.tie_epsilon_meters;
        if !(eps.is_finite() && eps >= 0.0) {
            return Err(invalid("proximity.tie_epsilon_meters", "must be >= 0"));
        }

        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> Error {
    Error::InvalidConfig {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
