//! Core data models for the station/TPU analysis.

pub mod coordinate;
pub mod proximity;
pub mod reconciliation;
pub mod station;
pub mod tpu;

pub use coordinate::{BoundingBox, Coordinate, CoordinateFlag};
pub use proximity::{BucketCount, ProximityBucket, ProximityRecord};
pub use reconciliation::{ReconciliationResult, ReconciliationStatus, ReconciliationSummary};
pub use station::{RejectedRow, Station, StationRow, StationTable};
pub use tpu::{BoundaryDataset, CensusYear, Tpu, TpuRow};
