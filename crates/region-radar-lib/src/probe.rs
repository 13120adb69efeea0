//! Directional crossing prediction
//!
//! Given an origin and an absolute bearing, the probe marches a virtual ray
//! outward in fixed steps, locating the region at each step, and reports the
//! first region-name change together with the distance traveled. When the
//! search radius is exhausted without a change (thin or disjoint region sets),
//! a fallback picks the nearest region whose bbox-center bearing lies within
//! an angular cone around the probe bearing.

use crate::{Region, RegionIndex, utils};
use geo::Coord;
use serde::{Deserialize, Serialize};

/// Tunable parameters of the directional probe
///
/// All three are externally settable; the defaults match a pedestrian-scale
/// use case (25 m resolution over a 10 km window, 60 degree fallback cone).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Ray-march step distance in meters (default 25)
    pub step_m: f64,
    /// Maximum search radius in meters before the fallback kicks in (default 10 000)
    pub max_radius_m: f64,
    /// Angular tolerance in degrees for fallback candidates (default 60)
    pub cone_deg: f64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            step_m: 25.0,
            max_radius_m: 10_000.0,
            cone_deg: 60.0,
        }
    }
}

impl ProbeConfig {
    /// Copy with unusable values replaced by the documented defaults
    ///
    /// A non-positive or non-finite step or radius would keep the march loop
    /// from ever covering the radius, so those fall back to the defaults (a
    /// zero cone is legal: it only empties the fallback). Every probe runs
    /// against a sanitized copy, so a bad caller-supplied configuration can
    /// degrade results but never hang the process.
    pub fn sanitized(&self) -> Self {
        let default = Self::default();
        let positive = |value: f64, fallback: f64, field: &'static str| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                tracing::warn!(field, value, fallback, "replacing invalid probe parameter");
                fallback
            }
        };
        let cone_deg = if self.cone_deg.is_finite() && self.cone_deg >= 0.0 {
            self.cone_deg
        } else {
            tracing::warn!(
                value = self.cone_deg,
                fallback = default.cone_deg,
                "replacing invalid cone_deg"
            );
            default.cone_deg
        };
        Self {
            step_m: positive(self.step_m, default.step_m, "step_m"),
            max_radius_m: positive(self.max_radius_m, default.max_radius_m, "max_radius_m"),
            cone_deg,
        }
    }
}

/// A predicted region crossing along one bearing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crossing {
    /// Name of the region entered (or suggested by the fallback)
    pub name: String,
    /// Step-aligned march distance, or clamped bbox distance for fallback hits
    pub distance_m: f64,
}

/// Find the nearest region change along `bearing_deg` from `origin`
///
/// Pure function of the store, index, and inputs: repeated calls with the
/// same arguments return the same result. The configuration is run through
/// [`ProbeConfig::sanitized`] first, so termination never depends on the
/// caller's parameter hygiene. Returns `None` when the radius is exhausted
/// and no fallback candidate survives the angular filter.
pub fn probe(
    regions: &[Region],
    index: &RegionIndex,
    origin: Coord<f64>,
    bearing_deg: f64,
    config: &ProbeConfig,
) -> Option<Crossing> {
    #[cfg(feature = "profiling")]
    profiling::scope!("probe");

    let config = &config.sanitized();
    let bearing = utils::normalize_bearing(bearing_deg);
    let start = index.locate(regions, origin).map(|i| regions[i].name());

    let (sin_b, cos_b) = bearing.to_radians().sin_cos();
    let mut pos = origin;
    let mut traveled = 0.0;
    while traveled < config.max_radius_m {
        // Degrees-per-meter factors track the current latitude so long
        // probes keep following the curvature rather than the origin's.
        pos.x += sin_b * config.step_m / utils::meters_per_deg_lng(pos.y);
        pos.y += cos_b * config.step_m / utils::METERS_PER_DEG_LAT;
        traveled += config.step_m;

        if let Some(i) = index.locate(regions, pos) {
            let name = regions[i].name();
            if Some(name) != start {
                tracing::debug!(bearing, name, distance_m = traveled, "crossing found");
                return Some(Crossing {
                    name: name.to_string(),
                    distance_m: traveled,
                });
            }
        }
    }

    nearest_in_cone(regions, origin, bearing, start, config)
}

/// Fallback: nearest region (by clamped bbox distance) whose bbox-center
/// bearing deviates from the probe bearing by at most the configured cone
///
/// Distance ties keep the first-seen candidate, so the result is stable for
/// a fixed store.
fn nearest_in_cone(
    regions: &[Region],
    origin: Coord<f64>,
    bearing: f64,
    start: Option<&str>,
    config: &ProbeConfig,
) -> Option<Crossing> {
    let mut best: Option<(&Region, f64)> = None;
    for region in regions {
        if Some(region.name()) == start {
            continue;
        }
        let center_bearing = utils::initial_bearing(origin, region.bbox().center());
        if utils::angle_diff(bearing, center_bearing) > config.cone_deg {
            continue;
        }
        let distance = utils::distance_to_rect_m(origin, region.bbox());
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((region, distance));
        }
    }

    let result = best.map(|(region, distance_m)| Crossing {
        name: region.name().to_string(),
        distance_m,
    });
    tracing::debug!(bearing, hit = result.is_some(), "radius exhausted, fallback evaluated");
    result
}
