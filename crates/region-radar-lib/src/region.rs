//! Region storage and GeoJSON loading
//!
//! This module provides the `Region` struct for storing a labeled polygon
//! with its precomputed bounding box, and the loader that turns a GeoJSON
//! FeatureCollection into a region store. Features that fail validation are
//! skipped with a warning so one bad polygon never poisons the whole set.

use crate::{RadarError, Result};
use geo::{Contains, Coord, LineString, MultiPolygon, Point, Polygon, Rect};
use serde::Deserialize;
use serde_json::Value;

/// Boundary geometry of a region: one polygon or several disjoint ones
///
/// Both shapes expose a uniform list of constituent polygons so callers never
/// branch on the variant themselves.
#[derive(Clone, Debug)]
pub enum Boundary {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl Boundary {
    /// All constituent polygons, regardless of variant
    #[inline]
    pub fn polygons(&self) -> &[Polygon<f64>] {
        match self {
            Boundary::Polygon(p) => std::slice::from_ref(p),
            Boundary::MultiPolygon(mp) => &mp.0,
        }
    }
}

/// A named polygonal area with a precomputed bounding box
///
/// Regions are immutable after load; their identity elsewhere in the crate is
/// their position in the region vector.
#[derive(Clone, Debug)]
pub struct Region {
    id: String,
    name: String,
    boundary: Boundary,
    /// Tight axis-aligned bounds in lng/lat degrees (x = lng, y = lat)
    bbox: Rect<f64>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Region {
    /// Create a region, computing the bounding box from the boundary when
    /// `bbox` is absent or malformed (non-finite, or min > max)
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        boundary: Boundary,
        bbox: Option<Rect<f64>>,
    ) -> Result<Self> {
        let bbox = match bbox.filter(rect_is_well_formed) {
            Some(rect) => rect,
            None => compute_bbox(&boundary)?,
        };
        Ok(Self {
            id: id.into(),
            name: name.into(),
            boundary,
            bbox,
        })
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    #[inline]
    pub fn bbox(&self) -> &Rect<f64> {
        &self.bbox
    }

    /// Exact containment test against the full boundary
    ///
    /// A multi-polygon contains the point if any constituent polygon does.
    /// The bounding box is not consulted here; pre-filtering is the index's job.
    pub fn contains(&self, coord: Coord<f64>) -> bool {
        let point = Point::from(coord);
        self.boundary.polygons().iter().any(|p| p.contains(&point))
    }

    /// Load regions from a GeoJSON FeatureCollection string
    ///
    /// Expects `Polygon` or `MultiPolygon` features with a `properties.name`
    /// label. `properties.id` falls back to the feature ordinal when absent,
    /// and a well-formed feature-level `bbox` is trusted as-is. Invalid
    /// features (no name, unsupported geometry, degenerate or non-finite
    /// rings) are logged and skipped; only a document-level parse failure
    /// is an error.
    pub fn from_geojson_str(data: &str) -> Result<Vec<Region>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("region::from_geojson_str");

        let collection: RawFeatureCollection = serde_json::from_str(data)?;
        if collection.kind != "FeatureCollection" {
            return Err(RadarError::NotAFeatureCollection(collection.kind));
        }

        let total = collection.features.len();
        let mut regions = Vec::with_capacity(total);
        for (ordinal, feature) in collection.features.into_iter().enumerate() {
            match Region::from_feature(feature, ordinal) {
                Ok(region) => regions.push(region),
                Err(err) => {
                    tracing::warn!(ordinal, error = %err, "skipping invalid GeoJSON feature");
                }
            }
        }
        if regions.len() < total {
            tracing::warn!(
                loaded = regions.len(),
                skipped = total - regions.len(),
                "region collection loaded with skipped features"
            );
        }
        Ok(regions)
    }

    /// Build one region from a raw GeoJSON feature
    fn from_feature(feature: RawFeature, ordinal: usize) -> Result<Region> {
        let properties = feature.properties.unwrap_or_default();
        let name = properties
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| RadarError::MissingProperty("name".into()))?;
        let id = match properties.id {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => ordinal.to_string(),
        };

        let geometry = feature
            .geometry
            .ok_or_else(|| RadarError::InvalidGeometry("feature has no geometry".into()))?;
        let boundary = match geometry.kind.as_str() {
            "Polygon" => Boundary::Polygon(parse_polygon(&geometry.coordinates)?),
            "MultiPolygon" => {
                let outer = geometry.coordinates.as_array().ok_or_else(|| {
                    RadarError::InvalidGeometry("MultiPolygon coordinates are not an array".into())
                })?;
                let polygons = outer
                    .iter()
                    .map(parse_polygon)
                    .collect::<Result<Vec<_>>>()?;
                if polygons.is_empty() {
                    return Err(RadarError::InvalidGeometry("MultiPolygon has no polygons".into()));
                }
                Boundary::MultiPolygon(MultiPolygon::new(polygons))
            }
            other => {
                return Err(RadarError::InvalidGeometry(format!(
                    "unsupported geometry type {other:?}"
                )));
            }
        };

        Region::new(id, name, boundary, feature.bbox.as_deref().and_then(parse_bbox))
    }
}

/// Raw GeoJSON shapes; only the fields the loader needs
#[derive(Deserialize)]
struct RawFeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<RawProperties>,
    #[serde(default)]
    geometry: Option<RawGeometry>,
    #[serde(default)]
    bbox: Option<Vec<f64>>,
}

#[derive(Deserialize, Default)]
struct RawProperties {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    id: Option<Value>,
}

#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

/// Parse a `[minX, minY, maxX, maxY]` feature bbox; `None` when malformed
/// (the caller then computes the bbox from the geometry)
fn parse_bbox(raw: &[f64]) -> Option<Rect<f64>> {
    match raw {
        [min_x, min_y, max_x, max_y, ..]
            if raw[..4].iter().all(|v| v.is_finite())
                && min_x <= max_x
                && min_y <= max_y =>
        {
            Some(Rect::new(
                Coord { x: *min_x, y: *min_y },
                Coord { x: *max_x, y: *max_y },
            ))
        }
        _ => None,
    }
}

fn rect_is_well_formed(rect: &Rect<f64>) -> bool {
    let (min, max) = (rect.min(), rect.max());
    min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()
}

/// Parse one GeoJSON position into a lng/lat coordinate
fn parse_position(value: &Value) -> Result<Coord<f64>> {
    let parts = value
        .as_array()
        .ok_or_else(|| RadarError::InvalidGeometry("position is not an array".into()))?;
    if parts.len() < 2 {
        return Err(RadarError::InvalidGeometry("position has fewer than 2 values".into()));
    }
    let x = parts[0].as_f64();
    let y = parts[1].as_f64();
    match (x, y) {
        (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Ok(Coord { x, y }),
        _ => Err(RadarError::InvalidGeometry("non-numeric coordinate".into())),
    }
}

/// Parse one ring; tolerates both open and closed forms (`Polygon::new`
/// closes open rings), and rejects rings with fewer than 3 distinct vertices
fn parse_ring(value: &Value) -> Result<LineString<f64>> {
    let positions = value
        .as_array()
        .ok_or_else(|| RadarError::InvalidGeometry("ring is not an array".into()))?;
    let mut coords = positions
        .iter()
        .map(parse_position)
        .collect::<Result<Vec<_>>>()?;

    // Drop an explicit closing repeat before counting vertices.
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    if coords.len() < 3 {
        return Err(RadarError::InvalidGeometry(format!(
            "ring has {} distinct vertices, need at least 3",
            coords.len()
        )));
    }
    Ok(LineString::from(coords))
}

/// Parse one GeoJSON polygon: exterior ring followed by optional holes
fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let rings = value
        .as_array()
        .ok_or_else(|| RadarError::InvalidGeometry("Polygon coordinates are not an array".into()))?;
    let mut rings = rings.iter();
    let exterior = parse_ring(
        rings
            .next()
            .ok_or_else(|| RadarError::InvalidGeometry("Polygon has no rings".into()))?,
    )?;
    let interiors = rings.map(parse_ring).collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Tight bounding box over every coordinate of every ring
fn compute_bbox(boundary: &Boundary) -> Result<Rect<f64>> {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for polygon in boundary.polygons() {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            for coord in &ring.0 {
                min_x = min_x.min(coord.x);
                min_y = min_y.min(coord.y);
                max_x = max_x.max(coord.x);
                max_y = max_y.max(coord.y);
            }
        }
    }

    if min_x > max_x || min_y > max_y {
        return Err(RadarError::InvalidGeometry("boundary has no coordinates".into()));
    }
    Ok(Rect::new(
        Coord { x: min_x, y: min_y },
        Coord { x: max_x, y: max_y },
    ))
}
