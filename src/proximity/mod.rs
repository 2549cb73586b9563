//! Nearest-station spatial join, distance bands and per-year tabulation.

mod aggregate;
mod bucket;
mod join;

pub use aggregate::{aggregate, to_rows};
pub use bucket::BucketPolicy;
pub use join::{nearest, JoinOutcome, NearestStationJoin};
