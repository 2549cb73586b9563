//! Spatial index for "which TPU contains this point" lookups.

use geo::{BoundingRect, Intersects};
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use crate::models::{Coordinate, Tpu};

/// Wrapper for R-tree indexing of TPU boundaries
struct IndexedTpu<'a> {
    tpu: &'a Tpu,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedTpu<'_> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl<'a> IndexedTpu<'a> {
    fn new(tpu: &'a Tpu) -> Option<Self> {
        let rect = tpu.boundary.bounding_rect()?;
        Some(Self {
            tpu,
            envelope: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
        })
    }
}

/// R-tree over one year's TPU boundaries.
pub struct TpuIndex<'a> {
    tree: RTree<IndexedTpu<'a>>,
}

impl<'a> TpuIndex<'a> {
    pub fn build(tpus: &'a [Tpu]) -> Self {
        let indexed: Vec<IndexedTpu<'a>> = tpus.iter().filter_map(IndexedTpu::new).collect();
        let tree = RTree::bulk_load(indexed);
        info!("Spatial index built with {} TPUs", tree.size());
        Self { tree }
    }

    /// All TPUs whose boundary contains or touches the coordinate, ordered by id.
    pub fn containing(&self, coord: &Coordinate) -> Vec<&'a Tpu> {
        let point = coord.to_point();
        let query_envelope = AABB::from_point([coord.lon, coord.lat]);

        // Envelope candidates first, then the exact test
        let mut hits: Vec<&'a Tpu> = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|it| it.tpu.boundary.intersects(&point))
            .map(|it| it.tpu)
            .collect();
        hits.sort_by(|a, b| a.id.cmp(&b.id));
        hits
    }

    /// TPU containing the coordinate. Points on a shared edge go to the lowest id.
    pub fn locate(&self, coord: &Coordinate) -> Option<&'a Tpu> {
        self.containing(coord).into_iter().next()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CensusYear;
    use geo::{polygon, MultiPolygon};

    fn cell(id: &str, min_lon: f64, max_lon: f64) -> Tpu {
        let p = polygon![
            (x: min_lon, y: 22.31),
            (x: max_lon, y: 22.31),
            (x: max_lon, y: 22.32),
            (x: min_lon, y: 22.32),
        ];
        Tpu::new(id, CensusYear::Y2016, MultiPolygon::new(vec![p]))
    }

    #[test]
    fn test_locate() {
        let tpus = vec![cell("212", 114.16, 114.17), cell("213", 114.17, 114.18)];
        let index = TpuIndex::build(&tpus);
        assert_eq!(index.len(), 2);

        let hit = index.locate(&Coordinate::new(22.315, 114.165)).unwrap();
        assert_eq!(hit.id, "212");
        let hit = index.locate(&Coordinate::new(22.315, 114.175)).unwrap();
        assert_eq!(hit.id, "213");
        assert!(index.locate(&Coordinate::new(22.4, 114.165)).is_none());
    }

    #[test]
    fn test_shared_edge() {
        let tpus = vec![cell("213", 114.17, 114.18), cell("212", 114.16, 114.17)];
        let index = TpuIndex::build(&tpus);
        let on_edge = Coordinate::new(22.315, 114.17);
        assert_eq!(index.containing(&on_edge).len(), 2);
        assert_eq!(index.locate(&on_edge).unwrap().id, "212");
    }

    #[test]
    fn test_empty_index() {
        let index = TpuIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.locate(&Coordinate::new(22.3, 114.1)).is_none());
    }
}
