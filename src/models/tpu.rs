//! Tertiary Planning Unit boundaries, one dataset per census year.

use std::sync::OnceLock;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::Coordinate;
use crate::error::{Error, Result};
use crate::pip::extract_centroid;

/// Census years with published TPU boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum CensusYear {
    Y2001,
    Y2006,
    Y2011,
    Y2016,
    /// Boundaries were not available from every portal
    Y2021,
}

impl CensusYear {
    pub fn all() -> &'static [CensusYear] {
        &[
            CensusYear::Y2001,
            CensusYear::Y2006,
            CensusYear::Y2011,
            CensusYear::Y2016,
            CensusYear::Y2021,
        ]
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CensusYear::Y2001 => 2001,
            CensusYear::Y2006 => 2006,
            CensusYear::Y2011 => 2011,
            CensusYear::Y2016 => 2016,
            CensusYear::Y2021 => 2021,
        }
    }
}

impl TryFrom<u16> for CensusYear {
    type Error = String;

    fn try_from(year: u16) -> std::result::Result<Self, Self::Error> {
        CensusYear::all()
            .iter()
            .copied()
            .find(|y| y.as_u16() == year)
            .ok_or_else(|| format!("{} is not a TPU census year", year))
    }
}

impl From<CensusYear> for u16 {
    fn from(year: CensusYear) -> u16 {
        year.as_u16()
    }
}

impl std::fmt::Display for CensusYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// Raw TPU feature: `polygons` follows MultiPolygon nesting
/// (polygon -> ring -> `[lon, lat]`), first ring of each polygon is the exterior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TpuRow {
    pub id: String,
    pub polygons: Vec<Vec<Vec<[f64; 2]>>>,
}

impl TpuRow {
    pub fn to_multi_polygon(&self) -> MultiPolygon<f64> {
        let polygons = self
            .polygons
            .iter()
            .filter_map(|rings| {
                let mut rings = rings.iter().map(|ring| {
                    LineString::new(ring.iter().map(|[x, y]| Coord { x: *x, y: *y }).collect())
                });
                let exterior = rings.next()?;
                Some(Polygon::new(exterior, rings.collect()))
            })
            .collect();
        MultiPolygon::new(polygons)
    }
}

/// One TPU in one census year. The centroid is computed on first use and cached.
#[derive(Debug, Clone)]
pub struct Tpu {
    pub id: String,
    pub year: CensusYear,
    pub boundary: MultiPolygon<f64>,
    centroid: OnceLock<Result<Coordinate>>,
}

impl Tpu {
    pub fn new(id: impl Into<String>, year: CensusYear, boundary: MultiPolygon<f64>) -> Self {
        Self {
            id: id.into(),
            year,
            boundary,
            centroid: OnceLock::new(),
        }
    }

    /// Representative point, guaranteed to lie within or on the boundary.
    pub fn centroid(&self) -> Result<Coordinate> {
        self.centroid
            .get_or_init(|| {
                extract_centroid(&self.boundary).map_err(|reason| Error::DegeneratePolygon {
                    tpu_id: self.id.clone(),
                    reason,
                })
            })
            .clone()
    }
}

/// Raw boundary dataset for one census year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryDataset {
    pub year: CensusYear,
    pub tpus: Vec<TpuRow>,
}

impl BoundaryDataset {
    /// Convert rows to TPUs. Ids are unique per year; repeats keep the first.
    pub fn load(&self) -> Vec<Tpu> {
        let mut seen = HashSet::new();
        let mut tpus = Vec::with_capacity(self.tpus.len());

        for row in &self.tpus {
            if !seen.insert(row.id.as_str()) {
                warn!("Duplicate TPU id {} in {} dataset, keeping first", row.id, self.year);
                continue;
            }
            tpus.push(Tpu::new(row.id.clone(), self.year, row.to_multi_polygon()));
        }

        info!("Loaded {} TPUs for {}", tpus.len(), self.year);
        tpus
    }
}
