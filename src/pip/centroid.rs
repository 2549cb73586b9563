//! Representative points for TPU boundaries.

use geo::{Area, Centroid, Closest, ClosestPoint, InteriorPoint, Intersects, MultiPolygon, Polygon};
use hashbrown::HashSet;
use tracing::debug;

use crate::models::Coordinate;

/// Reduce a boundary to a point that lies within or on it.
///
/// Tries the area-weighted centroid first. Concave shapes and shapes with holes
/// can put that outside the boundary, in which case the interior point is used,
/// then the closest boundary point as a last resort.
///
/// Parts with fewer than three distinct vertices are dropped. Returns the reason
/// as an error string when nothing usable remains.
pub fn extract_centroid(boundary: &MultiPolygon<f64>) -> Result<Coordinate, String> {
    let parts: Vec<Polygon<f64>> = boundary
        .iter()
        .filter(|p| has_three_distinct_vertices(p))
        .cloned()
        .collect();

    if parts.is_empty() {
        return Err("no polygon part with at least 3 distinct vertices".to_string());
    }

    let usable = MultiPolygon::new(parts);
    if usable.unsigned_area() <= 0.0 {
        return Err("polygon has zero area".to_string());
    }

    let centroid = usable
        .centroid()
        .ok_or_else(|| "centroid is undefined".to_string())?;

    if usable.intersects(&centroid) {
        return Ok(Coordinate::from_point(centroid));
    }

    debug!(
        "Centroid ({}, {}) falls outside its boundary, using interior point",
        centroid.y(),
        centroid.x()
    );

    if let Some(interior) = usable.interior_point() {
        if usable.intersects(&interior) {
            return Ok(Coordinate::from_point(interior));
        }
    }

    match usable.closest_point(&centroid) {
        Closest::Intersection(p) | Closest::SinglePoint(p) => Ok(Coordinate::from_point(p)),
        Closest::Indeterminate => Err("no representative point on boundary".to_string()),
    }
}

fn has_three_distinct_vertices(polygon: &Polygon<f64>) -> bool {
    let mut seen = HashSet::new();
    for c in polygon.exterior().coords() {
        seen.insert((c.x.to_bits(), c.y.to_bits()));
        if seen.len() >= 3 {
            return true;
        }
    }
    false
}
