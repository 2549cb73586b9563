//! mtr-tpu - MTR station proximity analysis for Hong Kong census tracts
//!
//! Reconciles station coordinates against a reference source, reduces Tertiary
//! Planning Unit boundaries to representative points, and joins each TPU to its
//! nearest station per census year. The `analyze` binary wires this library to
//! JSON/CSV files.

pub mod config;
pub mod error;
pub mod geodesy;
pub mod models;
pub mod pipeline;
pub mod pip;
pub mod proximity;
pub mod reconcile;

pub use config::AnalysisConfig;
pub use error::{Error, Result};
pub use models::{Coordinate, ProximityRecord, ReconciliationResult, Station, Tpu};
