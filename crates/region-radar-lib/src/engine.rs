//! RegionEngine - store, index, and the four-direction query boundary
//!
//! The engine owns the immutable region store and its spatial index, built
//! once at construction. Because construction *is* the load, a query can
//! never observe a half-built index.

use crate::{Crossing, ProbeConfig, Region, RegionIndex, Result, probe};
use geo::Coord;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One atomic answer for a position/heading update
///
/// All four directional results are computed against the same origin and
/// heading; a snapshot is never partially stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySnapshot {
    /// Name of the region containing the origin, if any
    pub current: Option<String>,
    /// Next crossing along the heading
    pub ahead: Option<Crossing>,
    /// Next crossing along heading + 180
    pub behind: Option<Crossing>,
    /// Next crossing along heading - 90
    pub left: Option<Crossing>,
    /// Next crossing along heading + 90
    pub right: Option<Crossing>,
}

/// Immutable spatial-reasoning engine over a loaded region store
#[derive(Debug, Clone)]
pub struct RegionEngine {
    regions: Vec<Region>,
    index: RegionIndex,
    config: ProbeConfig,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl RegionEngine {
    /// Build the engine from an already-loaded region store
    ///
    /// Bulk-loads the spatial index; this is the one-time blocking part of
    /// startup. The configuration is sanitized once here, so `config()`
    /// reports the values the probes actually use.
    pub fn new(regions: Vec<Region>, config: ProbeConfig) -> Self {
        #[cfg(feature = "profiling")]
        profiling::scope!("engine::new");

        let config = config.sanitized();
        let index = RegionIndex::build(&regions);
        tracing::info!(
            regions = regions.len(),
            indexed = index.len(),
            "region index built"
        );
        Self {
            regions,
            index,
            config,
        }
    }

    /// Build the engine from a GeoJSON FeatureCollection string
    pub fn from_geojson_str(data: &str, config: ProbeConfig) -> Result<Self> {
        Ok(Self::new(Region::from_geojson_str(data)?, config))
    }

    /// Build the engine from a GeoJSON file on disk
    pub fn from_geojson_path<P: AsRef<Path>>(path: P, config: ProbeConfig) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&data, config)
    }

    /// The loaded region store, in load order
    #[inline]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    #[inline]
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Name of the region containing `origin`, if any
    #[inline]
    pub fn locate(&self, origin: Coord<f64>) -> Option<&str> {
        self.index
            .locate(&self.regions, origin)
            .map(|i| self.regions[i].name())
    }

    /// Next crossing along an absolute bearing from `origin`
    #[inline]
    pub fn probe(&self, origin: Coord<f64>, bearing_deg: f64) -> Option<Crossing> {
        probe(&self.regions, &self.index, origin, bearing_deg, &self.config)
    }

    /// Full four-direction query for one position/heading update
    ///
    /// Runs the current-position locate plus one probe per relative direction
    /// (ahead, behind, left, right). The probes are independent and run in
    /// parallel; they all see the same immutable store, so the snapshot is
    /// consistent by construction.
    pub fn query(&self, origin: Coord<f64>, heading_deg: f64) -> QuerySnapshot {
        #[cfg(feature = "profiling")]
        profiling::scope!("engine::query");

        let ((current, (ahead, behind)), (left, right)) = rayon::join(
            || {
                rayon::join(
                    || self.locate(origin).map(str::to_string),
                    || {
                        rayon::join(
                            || self.probe(origin, heading_deg),
                            || self.probe(origin, heading_deg + 180.0),
                        )
                    },
                )
            },
            || {
                rayon::join(
                    || self.probe(origin, heading_deg - 90.0),
                    || self.probe(origin, heading_deg + 90.0),
                )
            },
        );

        QuerySnapshot {
            current,
            ahead,
            behind,
            left,
            right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Boundary;
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

    fn two_square_engine() -> RegionEngine {
        RegionEngine::new(
            vec![
                square_region("A", 0.0, 0.0, 1.0, 1.0),
                square_region("B", 1.0, 0.0, 2.0, 1.0),
            ],
            ProbeConfig {
                step_m: 500.0,
                max_radius_m: 100_000.0,
                cone_deg: 60.0,
            },
        )
    }

    #[test]
    fn test_locate_current_region() {
        let engine = two_square_engine();
        assert_eq!(engine.locate(Coord { x: 0.5, y: 0.5 }), Some("A"));
        assert_eq!(engine.locate(Coord { x: 1.5, y: 0.5 }), Some("B"));
        assert_eq!(engine.locate(Coord { x: 5.0, y: 5.0 }), None);
    }

    #[test]
    fn test_query_two_squares_heading_east() {
        let engine = two_square_engine();
        let snapshot = engine.query(Coord { x: 0.5, y: 0.5 }, 90.0);

        assert_eq!(snapshot.current.as_deref(), Some("A"));
        let ahead = snapshot.ahead.expect("B lies ahead");
        assert_eq!(ahead.name, "B");
        // B sits due east, so the 60-degree cones around north, south, and
        // west all exclude it and the remaining directions come back empty.
        assert_eq!(snapshot.behind, None);
        assert_eq!(snapshot.left, None);
        assert_eq!(snapshot.right, None);
    }

    #[test]
    fn test_query_is_idempotent() {
        let engine = two_square_engine();
        let origin = Coord { x: 0.5, y: 0.5 };
        let first = engine.query(origin, 90.0);
        for _ in 0..5 {
            assert_eq!(engine.query(origin, 90.0), first);
        }
    }

    #[test]
    fn test_query_empty_store() {
        let engine = RegionEngine::new(vec![], ProbeConfig::default());
        assert!(engine.is_empty());
        let snapshot = engine.query(Coord { x: 0.0, y: 0.0 }, 0.0);
        assert_eq!(snapshot.current, None);
        assert_eq!(snapshot.ahead, None);
        assert_eq!(snapshot.behind, None);
        assert_eq!(snapshot.left, None);
        assert_eq!(snapshot.right, None);
    }

    #[test]
    fn test_centroid_self_containment() {
        // Convex regions must locate their own bbox center back to
        // themselves. (Concave polygons may put their center outside the
        // boundary; that case is excluded here by using convex fixtures.)
        let regions: Vec<Region> = (0..16)
            .map(|i| {
                let x = (i % 4) as f64 * 2.0;
                let y = (i / 4) as f64 * 2.0;
                square_region(&format!("R{i}"), x, y, x + 1.0, y + 1.0)
            })
            .collect();
        let engine = RegionEngine::new(regions, ProbeConfig::default());
        for region in engine.regions() {
            let name = region.name().to_string();
            let center = region.bbox().center();
            assert_eq!(engine.locate(center), Some(name.as_str()));
        }
    }

    #[test]
    fn test_new_sanitizes_config() {
        // Construction normalizes the probe parameters, so even a CLI-supplied
        // zero step cannot reach the march loop.
        let engine = RegionEngine::new(
            vec![],
            ProbeConfig {
                step_m: 0.0,
                max_radius_m: -1.0,
                cone_deg: f64::NAN,
            },
        );
        assert_eq!(engine.config().step_m, 25.0);
        assert_eq!(engine.config().max_radius_m, 10_000.0);
        assert_eq!(engine.config().cone_deg, 60.0);
    }

    #[test]
    fn test_from_geojson_str() {
        let data = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "A"},
                 "geometry": {"type": "Polygon",
                   "coordinates": [[[0,0],[1,0],[1,1],[0,1]]]}}
            ]
        }"#;
        let engine = RegionEngine::from_geojson_str(data, ProbeConfig::default()).unwrap();
        assert_eq!(engine.locate(Coord { x: 0.5, y: 0.5 }), Some("A"));
    }

    #[test]
    fn test_snapshot_serializes() {
        let engine = two_square_engine();
        let snapshot = engine.query(Coord { x: 0.5, y: 0.5 }, 90.0);
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: QuerySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
