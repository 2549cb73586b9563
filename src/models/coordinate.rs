//! WGS84 coordinates and the bounding region they are checked against.

use geo::Point;
use serde::{Deserialize, Serialize};

/// Geographic point in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Round both components to `decimals` places (source tables store 6).
    /// Anything past 15 places is beyond f64 precision and is capped there.
    pub fn rounded(&self, decimals: u32) -> Self {
        let factor = 10f64.powi(decimals.min(15) as i32);
        Self {
            lat: (self.lat * factor).round() / factor,
            lon: (self.lon * factor).round() / factor,
        }
    }

    /// geo uses x = lon, y = lat
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    pub fn from_point(point: Point<f64>) -> Self {
        Self {
            lat: point.y(),
            lon: point.x(),
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Inclusive latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Hong Kong, as used by every collection script.
    pub const HONG_KONG: BoundingBox = BoundingBox {
        min_lat: 22.0,
        max_lat: 23.0,
        min_lon: 113.0,
        max_lon: 115.0,
    };

    pub fn contains(&self, coord: &Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&coord.lat)
            && (self.min_lon..=self.max_lon).contains(&coord.lon)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::HONG_KONG
    }
}

/// Why a coordinate was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateFlag {
    /// No usable latitude/longitude in the source row
    Missing,
    /// Outside the configured bounding box
    OutOfBounds,
    /// Reference source had no entry for the station name
    NameNotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounded_caps_precision() {
        let c = Coordinate::new(22.284444, 114.158333);
        assert_eq!(c.rounded(400), c.rounded(15));
        assert!(c.rounded(u32::MAX).lat.is_finite());
    }

    #[test]
    fn test_rounded_to_six_places() {
        let c = Coordinate::new(22.2844444449, 114.1583333351).rounded(6);
        assert_eq!(c, Coordinate::new(22.284444, 114.158333));
    }

    #[test]
    fn test_point_axis_order() {
        let c = Coordinate::new(22.3, 114.2);
        let p = c.to_point();
        assert_eq!(p.x(), 114.2);
        assert_eq!(p.y(), 22.3);
        assert_eq!(Coordinate::from_point(p), c);
    }

    #[test]
    fn test_nan_is_never_contained() {
        let bbox = BoundingBox::default();
        assert!(!bbox.contains(&Coordinate::new(f64::NAN, 114.0)));
        assert!(!bbox.contains(&Coordinate::new(22.5, f64::NAN)));
    }
}
