//! Utility functions for bearings and the locally-flat planar approximation
//!
//! Degree-to-meter conversion treats small lat/lng deltas as locally flat
//! Cartesian meters, which holds to well under a percent over the
//! kilometer-scale distances the probe covers.

use geo::{Coord, Rect};

/// Meters per degree of latitude (near-constant on the WGS84 ellipsoid)
pub const METERS_PER_DEG_LAT: f64 = 110_540.0;

/// Meters per degree of longitude at the equator; scale by cos(latitude) elsewhere
pub const METERS_PER_DEG_LNG_EQUATOR: f64 = 111_320.0;

/// Meters per degree of longitude at the given latitude
#[inline(always)]
pub fn meters_per_deg_lng(lat_deg: f64) -> f64 {
    METERS_PER_DEG_LNG_EQUATOR * lat_deg.to_radians().cos()
}

/// Normalize a bearing in degrees into [0, 360)
#[inline(always)]
pub fn normalize_bearing(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Smallest angular difference between two bearings in degrees, always in [0, 180]
#[inline(always)]
pub fn angle_diff(a: f64, b: f64) -> f64 {
    let d = (a - b).abs() % 360.0;
    if d > 180.0 { 360.0 - d } else { d }
}

/// Initial great-circle bearing from `a` to `b`, in degrees normalized into [0, 360)
///
/// Uses the standard spherical forward-azimuth formula; over the short distances
/// involved this is effectively the planar bearing, but it stays stable for
/// far-away fallback candidates too.
pub fn initial_bearing(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let d_lng = (b.x - a.x).to_radians();
    let (lat_a, lat_b) = (a.y.to_radians(), b.y.to_radians());
    let y = d_lng.sin() * lat_b.cos();
    let x = lat_a.cos() * lat_b.sin() - lat_a.sin() * lat_b.cos() * d_lng.cos();
    normalize_bearing(y.atan2(x).to_degrees())
}

/// Planar distance in meters from a point to the nearest point of a lng/lat
/// rectangle (zero if the point lies inside it)
///
/// Degrees are converted to meters around `p`'s latitude, then the point is
/// clamped to the rectangle and the Euclidean distance to the clamp taken.
pub fn distance_to_rect_m(p: Coord<f64>, rect: &Rect<f64>) -> f64 {
    let mx = meters_per_deg_lng(p.y);
    let my = METERS_PER_DEG_LAT;

    let rx1 = (rect.min().x - p.x) * mx;
    let ry1 = (rect.min().y - p.y) * my;
    let rx2 = (rect.max().x - p.x) * mx;
    let ry2 = (rect.max().y - p.y) * my;

    let cx = 0f64.clamp(rx1.min(rx2), rx1.max(rx2));
    let cy = 0f64.clamp(ry1.min(ry2), ry1.max(ry2));
    cx.hypot(cy)
}
