//! Station coordinate reconciliation against a reference source.
//!
//! Every station is checked independently: an existing coordinate within the
//! tolerance of the reference is verified, a farther one is corrected, a missing
//! one is added, and a station the reference does not know is reported as not
//! found. Nothing is written back; callers decide what to persist.

mod reference;

pub use reference::{ReferenceChain, ReferenceSource};

use hashbrown::{HashMap, HashSet};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{AnalysisConfig, ReconcileConfig};
use crate::error::{Error, Result};
use crate::geodesy::{distance, CoordinateValidator};
use crate::models::{
    Coordinate, CoordinateFlag, ReconciliationResult, ReconciliationStatus, Station,
};

pub struct Reconciler {
    validator: CoordinateValidator,
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(validator: CoordinateValidator, config: &ReconcileConfig) -> Self {
        Self {
            validator,
            config: config.clone(),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(CoordinateValidator::new(config.bounds), &config.reconcile)
    }

    /// Classify one station against its reference coordinate.
    ///
    /// `reference` is `None` when the source has no entry for `name`. An existing
    /// station without a usable coordinate takes the `added` path.
    pub fn reconcile(
        &self,
        name: &str,
        existing: Option<&Station>,
        reference: Option<Coordinate>,
    ) -> ReconciliationResult {
        let old_coordinate = existing.and_then(|s| s.coordinate);
        let usable = existing
            .and_then(Station::valid_coordinate)
            .filter(|c| self.validator.validate(c));
        let existing_flag = match (old_coordinate, usable) {
            (_, Some(_)) => None,
            (Some(_), None) => Some(CoordinateFlag::OutOfBounds),
            (None, None) => existing.map(|_| CoordinateFlag::Missing),
        };

        let mut result = ReconciliationResult {
            station_name: name.to_string(),
            old_coordinate,
            new_coordinate: None,
            delta_meters: None,
            status: ReconciliationStatus::NotFound,
            flag: None,
            duplicates: 0,
        };

        let reference = match reference {
            None => {
                result.flag = Some(CoordinateFlag::NameNotFound);
                return result;
            }
            Some(r) if !self.validator.validate(&r) => {
                debug!("Reference for {} is out of bounds: {}", name, r);
                result.flag = Some(CoordinateFlag::OutOfBounds);
                return result;
            }
            Some(r) => r,
        };
        let rounded = reference.rounded(self.config.coordinate_precision);

        match usable {
            None => {
                result.status = ReconciliationStatus::Added;
                result.new_coordinate = Some(rounded);
                result.flag = existing_flag;
            }
            Some(current) => {
                let delta = distance(&current, &reference);
                result.delta_meters = Some(delta);
                if delta <= self.config.tolerance_meters {
                    result.status = ReconciliationStatus::Verified;
                    result.new_coordinate = Some(current);
                } else {
                    debug!("{} is {:.0}m from its reference, correcting", name, delta);
                    result.status = ReconciliationStatus::Corrected;
                    result.new_coordinate = Some(rounded);
                }
            }
        }

        result
    }

    /// Reconcile a whole station table.
    ///
    /// Rows sharing a name are one logical station: each row is reconciled on
    /// its own, but only the first-seen row's result is reported, with the
    /// number of extra rows in `duplicates`. Results are sorted by name.
    pub fn reconcile_all(
        &self,
        stations: &[Station],
        reference: &dyn ReferenceSource,
    ) -> Result<Vec<ReconciliationResult>> {
        if stations.is_empty() {
            return Err(Error::EmptyBatch {
                what: "station table".to_string(),
            });
        }

        let mut slot: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<Vec<&Station>> = Vec::new();
        for station in stations {
            let idx = *slot.entry(station.name.as_str()).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[idx].push(station);
        }

        let mut results: Vec<ReconciliationResult> = groups
            .par_iter()
            .map(|group| {
                let name = group[0].name.as_str();
                let reference = reference.lookup(name);
                let mut first = self.reconcile(name, Some(group[0]), reference);
                for station in &group[1..] {
                    let other = self.reconcile(name, Some(*station), reference);
                    first.duplicates += 1;
                    if other.status != first.status {
                        debug!(
                            "Duplicate row for {} reconciled as {:?} (reported: {:?})",
                            name, other.status, first.status
                        );
                    }
                }
                first
            })
            .collect();

        results.sort_by(|a, b| a.station_name.cmp(&b.station_name));

        let count = |status| results.iter().filter(|r| r.status == status).count();
        info!(
            "Reconciled {} stations: {} verified, {} corrected, {} added, {} not found",
            results.len(),
            count(ReconciliationStatus::Verified),
            count(ReconciliationStatus::Corrected),
            count(ReconciliationStatus::Added),
            count(ReconciliationStatus::NotFound)
        );

        Ok(results)
    }
}

/// First-seen station per name with corrected/added coordinates applied and
/// validation flags refreshed. Stations without a result are passed through.
pub fn apply_reconciliation(
    stations: &[Station],
    results: &[ReconciliationResult],
    validator: &CoordinateValidator,
) -> Vec<Station> {
    let by_name: HashMap<&str, &ReconciliationResult> = results
        .iter()
        .map(|r| (r.station_name.as_str(), r))
        .collect();

    let mut seen = HashSet::new();
    stations
        .iter()
        .filter(|s| seen.insert(s.name.as_str()))
        .map(|s| {
            let mut station = s.clone();
            if let Some(result) = by_name.get(s.name.as_str()) {
                if matches!(
                    result.status,
                    ReconciliationStatus::Corrected | ReconciliationStatus::Added
                ) {
                    station.coordinate = result.new_coordinate;
                }
            }
            station.revalidate(validator);
            station
        })
        .collect()
}
