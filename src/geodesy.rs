//! Coordinate validation and great-circle distance.

use geo::{Distance, Haversine};

use crate::models::{BoundingBox, Coordinate};

/// Checks coordinates against the configured bounding region.
///
/// A failed check is an expected outcome for scraped data: callers flag the
/// coordinate and carry on.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoordinateValidator {
    bounds: BoundingBox,
}

impl CoordinateValidator {
    pub fn new(bounds: BoundingBox) -> Self {
        Self { bounds }
    }

    /// True iff the coordinate lies inside the bounds (edges included).
    pub fn validate(&self, coord: &Coordinate) -> bool {
        self.bounds.contains(coord)
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }
}

/// Great-circle distance in meters (haversine on the mean Earth radius).
///
/// Works on the sphere rather than on raw degrees, so a degree of longitude
/// at Hong Kong's latitude is correctly shorter than a degree of latitude.
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    Haversine.distance(a.to_point(), b.to_point())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_bounds_inclusive() {
        let v = CoordinateValidator::default();
        assert!(v.validate(&Coordinate::new(22.3, 114.17)));
        assert!(v.validate(&Coordinate::new(22.0, 113.0)));
        assert!(v.validate(&Coordinate::new(23.0, 115.0)));
        assert!(!v.validate(&Coordinate::new(21.999, 114.0)));
        assert!(!v.validate(&Coordinate::new(22.5, 115.0001)));
        // Swapped lat/lon is a common scrape error
        assert!(!v.validate(&Coordinate::new(114.17, 22.3)));
    }

    #[test]
    fn test_validate_custom_bounds() {
        let v = CoordinateValidator::new(BoundingBox {
            min_lat: 22.15,
            max_lat: 22.56,
            min_lon: 113.83,
            max_lon: 114.41,
        });
        assert!(v.validate(&Coordinate::new(22.3, 114.17)));
        assert!(!v.validate(&Coordinate::new(22.9, 114.17)));
    }

    #[test]
    fn test_distance_symmetric_and_zero() {
        let a = Coordinate::new(22.2773, 114.1728);
        let b = Coordinate::new(22.264453, 114.237044);
        assert!((distance(&a, &b) - distance(&b, &a)).abs() < 1e-9);
        assert!(distance(&a, &a) < 1e-6);
    }

    #[test]
    fn test_longitude_foreshortening() {
        let origin = Coordinate::new(22.3, 114.0);
        let north = distance(&origin, &Coordinate::new(22.31, 114.0));
        let east = distance(&origin, &Coordinate::new(22.3, 114.01));
        // cos(22.3 deg) ~ 0.925
        assert!((east / north - 0.925).abs() < 0.005);
        assert!((north - 1112.0).abs() < 5.0);
    }
}
