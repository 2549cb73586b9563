//! Point-in-polygon support for TPU boundaries.
//!
//! Reduces boundaries to representative points and answers containment
//! lookups through an R-tree spatial index.

mod centroid;
mod index;

pub use centroid::extract_centroid;
pub use index::TpuIndex;
