//! Error types for the station/TPU analysis.
//!
//! Per-entity problems that are expected in noisy source data (out-of-bounds
//! coordinates, names missing from the reference source) are not errors; they
//! are carried as [`CoordinateFlag`](crate::models::CoordinateFlag) values.

use thiserror::Error;

use crate::models::{CensusYear, Coordinate};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("Nearest-station join needs at least one station with a valid coordinate")]
    EmptyStationSet,

    #[error("Degenerate polygon for TPU {tpu_id}: {reason}")]
    DegeneratePolygon { tpu_id: String, reason: String },

    #[error("Centroid {centroid} of TPU {tpu_id} lies outside the configured bounds")]
    CentroidOutOfBounds { tpu_id: String, centroid: Coordinate },

    #[error("Input batch is empty: {what}")]
    EmptyBatch { what: String },

    #[error("No TPU in the {year} dataset has a usable polygon")]
    NoValidPolygons { year: CensusYear },

    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
