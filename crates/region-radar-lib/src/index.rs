//! R-tree spatial index over region bounding boxes
//!
//! The index owns no geometry: each entry is a bounding box plus the position
//! of its region in the store. Exact containment is resolved by the locate
//! path, which runs the point-in-polygon test only on bounding-box candidates.

use crate::Region;
use geo::{Coord, Rect};
use rstar::{AABB, RTree, RTreeObject};

/// One indexed region: its envelope and its position in the region store
#[derive(Debug, Clone, Copy)]
pub struct RegionEntry {
    envelope: AABB<[f64; 2]>,
    region: usize,
}

impl RTreeObject for RegionEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Bounding-box tree answering "which regions might contain this point/box"
///
/// Built once over the immutable region store; queries return candidate region
/// indices in a deterministic traversal order for a fixed tree. Candidate order
/// is what breaks ties for overlapping regions, so it must not change between
/// queries against the same tree.
#[derive(Debug, Clone)]
pub struct RegionIndex {
    tree: RTree<RegionEntry>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl RegionIndex {
    /// Bulk-load the index from the region store
    ///
    /// Zero-area (point) bounding boxes index normally. Regions whose bbox is
    /// non-finite can never match a query and are left out with a warning.
    pub fn build(regions: &[Region]) -> Self {
        #[cfg(feature = "profiling")]
        profiling::scope!("index::build");

        let entries: Vec<RegionEntry> = regions
            .iter()
            .enumerate()
            .filter_map(|(region, r)| {
                let (min, max) = (r.bbox().min(), r.bbox().max());
                if !(min.x.is_finite()
                    && min.y.is_finite()
                    && max.x.is_finite()
                    && max.y.is_finite())
                {
                    tracing::warn!(region, name = r.name(), "excluding non-finite bbox from index");
                    return None;
                }
                Some(RegionEntry {
                    envelope: AABB::from_corners([min.x, min.y], [max.x, max.y]),
                    region,
                })
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed regions
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Region indices whose bbox contains the point, in tree traversal order
    pub fn candidates_at(&self, point: Coord<f64>) -> impl Iterator<Item = usize> + '_ {
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([point.x, point.y]))
            .map(|entry| entry.region)
    }

    /// Region indices whose bbox intersects the query rectangle
    pub fn candidates_in(&self, rect: &Rect<f64>) -> impl Iterator<Item = usize> + '_ {
        let envelope = AABB::from_corners(
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        );
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.region)
    }

    /// Exact point location: first bounding-box candidate whose polygon
    /// actually contains the point, in index traversal order
    ///
    /// `regions` must be the same slice the index was built from; the stored
    /// entries are positions into it, so passing anything else yields wrong
    /// answers or panics on out-of-bounds indices.
    ///
    /// Bounding boxes are a superset filter, so candidates that fail the exact
    /// test are skipped. Overlapping regions resolve to whichever candidate
    /// the traversal yields first; no further tie-break is defined.
    pub fn locate(&self, regions: &[Region], point: Coord<f64>) -> Option<usize> {
        self.candidates_at(point).find(|&i| {
            debug_assert!(
                i < regions.len(),
                "index was built from a different region slice"
            );
            regions[i].contains(point)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Boundary, Region};
    use geo::{LineString, Polygon};

    fn square_region(name: &str, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Region {
        Region::new(
            name,
            name,
            Boundary::Polygon(Polygon::new(
                LineString::from(vec![
                    (min_x, min_y),
                    (max_x, min_y),
                    (max_x, max_y),
                    (min_x, max_y),
                ]),
                vec![],
            )),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_store_builds_valid_index() {
        let regions: Vec<Region> = vec![];
        let index = RegionIndex::build(&regions);
        assert!(index.is_empty());
        assert_eq!(index.candidates_at(Coord { x: 0.0, y: 0.0 }).count(), 0);
        assert_eq!(index.locate(&regions, Coord { x: 0.0, y: 0.0 }), None);
    }

    #[test]
    fn test_locate_inside_and_outside() {
        let regions = vec![
            square_region("A", 0.0, 0.0, 1.0, 1.0),
            square_region("B", 1.0, 0.0, 2.0, 1.0),
        ];
        let index = RegionIndex::build(&regions);
        assert_eq!(index.locate(&regions, Coord { x: 0.5, y: 0.5 }), Some(0));
        assert_eq!(index.locate(&regions, Coord { x: 1.5, y: 0.5 }), Some(1));
        // Far outside every bounding box.
        assert_eq!(index.locate(&regions, Coord { x: 50.0, y: 50.0 }), None);
    }

    #[test]
    fn test_bbox_hit_but_polygon_miss() {
        // A triangle occupying half of its bounding box: the opposite corner
        // is inside the bbox but outside the polygon.
        let triangle = Region::new(
            "0",
            "Tri",
            Boundary::Polygon(Polygon::new(
                LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]),
                vec![],
            )),
            None,
        )
        .unwrap();
        let regions = vec![triangle];
        let index = RegionIndex::build(&regions);
        assert_eq!(index.candidates_at(Coord { x: 0.9, y: 0.9 }).count(), 1);
        assert_eq!(index.locate(&regions, Coord { x: 0.9, y: 0.9 }), None);
        assert_eq!(index.locate(&regions, Coord { x: 0.2, y: 0.2 }), Some(0));
    }

    #[test]
    fn test_degenerate_point_bbox_is_retrievable() {
        // A zero-area bbox must survive bulk load and answer the identical
        // point query.
        let regions = vec![square_region("P", 3.0, 3.0, 3.0, 3.0)];
        let index = RegionIndex::build(&regions);
        assert_eq!(index.len(), 1);
        assert_eq!(
            index.candidates_at(Coord { x: 3.0, y: 3.0 }).collect::<Vec<_>>(),
            vec![0]
        );
    }

    #[test]
    fn test_non_finite_bbox_excluded_from_build() {
        // A boundary with an infinite coordinate yields a non-finite computed
        // bbox; the region can never match a query and must stay out of the
        // tree without breaking its neighbors.
        let bad = Region::new(
            "1",
            "Bad",
            Boundary::Polygon(Polygon::new(
                LineString::from(vec![(0.0, 0.0), (f64::INFINITY, 0.0), (0.0, 1.0)]),
                vec![],
            )),
            None,
        )
        .unwrap();
        let regions = vec![square_region("Good", 0.0, 0.0, 1.0, 1.0), bad];
        let index = RegionIndex::build(&regions);
        assert_eq!(index.len(), 1);
        assert_eq!(index.locate(&regions, Coord { x: 0.5, y: 0.5 }), Some(0));
    }

    #[test]
    #[should_panic]
    fn test_locate_with_foreign_slice_panics() {
        // The slice passed to locate must be the build-time slice; a shorter
        // one trips the pairing assertion.
        let regions = vec![square_region("A", 0.0, 0.0, 1.0, 1.0)];
        let index = RegionIndex::build(&regions);
        let unrelated: Vec<Region> = vec![];
        index.locate(&unrelated, Coord { x: 0.5, y: 0.5 });
    }

    #[test]
    fn test_locate_unaffected_by_trailing_unrelated_regions() {
        let mut regions = vec![square_region("A", 0.0, 0.0, 1.0, 1.0)];
        let index = RegionIndex::build(&regions);
        let p = Coord { x: 0.5, y: 0.5 };
        let before = index.locate(&regions, p).map(|i| regions[i].name().to_string());

        // Append distant, unrelated regions and rebuild.
        for i in 0..10 {
            let off = 100.0 + i as f64 * 5.0;
            regions.push(square_region(&format!("Far{i}"), off, off, off + 1.0, off + 1.0));
        }
        let index = RegionIndex::build(&regions);
        let after = index.locate(&regions, p).map(|i| regions[i].name().to_string());
        assert_eq!(before, after);
        assert_eq!(after.as_deref(), Some("A"));
    }

    #[test]
    fn test_overlapping_regions_resolve_by_traversal_order() {
        // Two identical squares overlap completely. Which one wins is decided
        // by index traversal order alone; the contract is only that repeated
        // queries against the same tree agree.
        let regions = vec![
            square_region("First", 0.0, 0.0, 1.0, 1.0),
            square_region("Second", 0.0, 0.0, 1.0, 1.0),
        ];
        let index = RegionIndex::build(&regions);
        let p = Coord { x: 0.5, y: 0.5 };
        let hit = index.locate(&regions, p);
        assert!(hit.is_some());
        for _ in 0..10 {
            assert_eq!(index.locate(&regions, p), hit);
        }
    }

    #[test]
    fn test_candidates_in_rect() {
        let regions = vec![
            square_region("A", 0.0, 0.0, 1.0, 1.0),
            square_region("B", 10.0, 10.0, 11.0, 11.0),
        ];
        let index = RegionIndex::build(&regions);
        let query = geo::Rect::new(Coord { x: -0.5, y: -0.5 }, Coord { x: 0.5, y: 0.5 });
        let hits: Vec<usize> = index.candidates_in(&query).collect();
        assert_eq!(hits, vec![0]);
    }
}
