//! Region Radar Library - Spatial Reasoning over Labeled Region Polygons
//!
//! This library answers two questions about a moving observer: which named region
//! (e.g. an administrative boundary) currently contains them, and which region they
//! would enter next in each of four relative directions, with the distance to that
//! crossing. The core is an R-tree over region bounding boxes plus a ray-marching
//! boundary search with an angular-cone fallback for sparse region sets.
//!
//! # Architecture
//!
//! - **[`Region`]**: Immutable labeled polygon with precomputed bounding box
//! - **[`RegionIndex`]**: R-tree spatial index over region bounding boxes
//! - **[`probe()`]**: Directional crossing predictor (ray marching + fallback)
//! - **[`RegionEngine`]**: High-level owner of the store, index, and configuration
//! - **[`LastKnownRegion`]**: One-slot sticky display memo owned by the caller
//!
//! # Performance Characteristics
//!
//! - **Build Time**: O(N log N) bulk load of N region bounding boxes
//! - **Locate Time**: O(log N + K) candidates, K exact point-in-polygon tests
//! - **Probe Time**: bounded by `max_radius_m / step_m` locate calls per direction
//!
//! All coordinates are WGS84 degrees with x = longitude and y = latitude, treated
//! as locally flat over distances of kilometers.

mod engine;
mod index;
mod probe;
mod region;
mod session;
pub mod utils;

// Public API exports
pub use engine::{QuerySnapshot, RegionEngine};
pub use index::RegionIndex;
pub use probe::{Crossing, ProbeConfig, probe};
pub use region::{Boundary, Region};
pub use session::LastKnownRegion;

/// Error types for region loading and engine construction
#[derive(Debug, thiserror::Error)]
pub enum RadarError {
    #[error("GeoJSON parsing error: {0}")]
    GeoJsonParse(#[from] serde_json::Error),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Not a FeatureCollection: found type {0:?}")]
    NotAFeatureCollection(String),

    #[error("Missing property: {0}")]
    MissingProperty(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RadarError>;
