use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::ProximityConfig;
use crate::error::{Error, Result};
use crate::geodesy::{distance, CoordinateValidator};
use crate::models::{Coordinate, ProximityRecord, Station, Tpu};

/// Nearest-station lookup over a fixed, read-only set of valid stations.
pub struct NearestStationJoin<'s> {
    /// Sorted by name so that ties resolve the same way on every run
    stations: Vec<(&'s Station, Coordinate)>,
    validator: CoordinateValidator,
    config: ProximityConfig,
}

/// Records for the TPUs that worked, errors for the ones that did not.
#[derive(Debug, Default)]
pub struct JoinOutcome {
    pub records: Vec<ProximityRecord>,
    pub failures: Vec<Error>,
}

impl<'s> NearestStationJoin<'s> {
    /// Keep stations whose coordinate is unflagged and inside the validator's bounds.
    pub fn new(
        stations: &'s [Station],
        validator: &CoordinateValidator,
        config: &ProximityConfig,
    ) -> Result<Self> {
        let mut valid: Vec<(&Station, Coordinate)> = stations
            .iter()
            .filter_map(|s| s.valid_coordinate().map(|c| (s, c)))
            .filter(|(_, c)| validator.validate(c))
            .collect();

        if valid.is_empty() {
            return Err(Error::EmptyStationSet);
        }

        valid.sort_by(|a, b| a.0.name.cmp(&b.0.name));
        debug!(
            "Nearest-station join over {} of {} stations",
            valid.len(),
            stations.len()
        );

        Ok(Self {
            stations: valid,
            validator: *validator,
            config: config.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Closest station and its distance in meters. Every station within
    /// `tie_epsilon_meters` of the minimum counts as tied, and the tie goes to
    /// the smallest name.
    pub fn nearest(&self, target: &Coordinate) -> (&'s Station, f64) {
        let eps = self.config.tie_epsilon_meters;
        let distances: Vec<f64> = self
            .stations
            .iter()
            .map(|(_, coord)| distance(target, coord))
            .collect();
        let min = distances.iter().copied().fold(f64::INFINITY, f64::min);

        // stations are name-sorted, so the first one under the cutoff wins
        self.stations
            .iter()
            .zip(&distances)
            .find(|&(_, &d)| d <= min + eps)
            .map(|(&(station, _), &d)| (station, d))
            .unwrap_or((self.stations[0].0, distances[0]))
    }

    /// Proximity record for one TPU, from its cached centroid. A centroid
    /// outside the bounds (e.g. a dataset still in grid meters) is an error for
    /// that TPU, not a `far` record.
    pub fn record_for(&self, tpu: &Tpu) -> Result<ProximityRecord> {
        let centroid = tpu.centroid()?;
        if !self.validator.validate(&centroid) {
            return Err(Error::CentroidOutOfBounds {
                tpu_id: tpu.id.clone(),
                centroid,
            });
        }
        let (station, meters) = self.nearest(&centroid);
        Ok(ProximityRecord {
            tpu_id: tpu.id.clone(),
            year: tpu.year,
            nearest_station_name: station.name.clone(),
            distance_meters: meters,
            bucket: self.config.buckets.classify(meters),
        })
    }

    /// Join every TPU of one dataset. Each TPU is independent, so the work is
    /// spread across the rayon pool; results come back sorted by TPU id.
    ///
    /// A dataset where every TPU fails is an error; an empty dataset is not.
    pub fn join_dataset(&self, tpus: &[Tpu]) -> Result<JoinOutcome> {
        let results: Vec<Result<ProximityRecord>> =
            tpus.par_iter().map(|tpu| self.record_for(tpu)).collect();

        let mut outcome = JoinOutcome::default();
        for result in results {
            match result {
                Ok(record) => outcome.records.push(record),
                Err(e) => {
                    warn!("Skipping TPU: {}", e);
                    outcome.failures.push(e);
                }
            }
        }

        if let Some(first) = tpus.first() {
            if outcome.records.is_empty() {
                return Err(Error::NoValidPolygons { year: first.year });
            }
        }

        outcome
            .records
            .sort_by(|a, b| (a.year, &a.tpu_id).cmp(&(b.year, &b.tpu_id)));

        info!(
            "Joined {} TPUs to nearest stations ({} failed)",
            outcome.records.len(),
            outcome.failures.len()
        );

        Ok(outcome)
    }
}

/// One-shot nearest-station lookup.
pub fn nearest<'s>(
    target: &Coordinate,
    stations: &'s [Station],
    validator: &CoordinateValidator,
    config: &ProximityConfig,
) -> Result<(&'s Station, f64)> {
    NearestStationJoin::new(stations, validator, config).map(|join| join.nearest(target))
}
