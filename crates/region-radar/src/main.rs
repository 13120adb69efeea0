//! Region Radar session controller
//!
//! Thin consuming boundary around [`RegionEngine`]: loads a GeoJSON region
//! set, then answers either a single position/heading query or a stream of
//! updates read from stdin. Sensors, rate limiting, remote geocoding, and
//! persistence all live outside this binary.

use clap::Parser;
use geo::Coord;
use region_radar_lib::{
    LastKnownRegion, ProbeConfig, QuerySnapshot, RadarError, RegionEngine, utils,
};
use std::io::BufRead;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[clap(version, about, long_about = None)]
/// Region Radar - locate a moving observer and predict the next region in each direction
struct Settings {
    /// GeoJSON FeatureCollection with the region polygons
    regions: PathBuf,

    /// Observer longitude in degrees (one-shot mode)
    #[clap(long, allow_negative_numbers = true, required_unless_present = "follow")]
    lng: Option<f64>,

    /// Observer latitude in degrees (one-shot mode)
    #[clap(long, allow_negative_numbers = true, required_unless_present = "follow")]
    lat: Option<f64>,

    /// Heading in degrees (0 = north, clockwise)
    #[clap(long, default_value = "0.0", allow_negative_numbers = true)]
    heading: f64,

    /// Read "lng lat [heading]" lines from stdin and answer each one
    #[clap(long)]
    follow: bool,

    /// Ray-march step distance in meters
    #[clap(long, default_value = "25.0")]
    step_m: f64,

    /// Maximum search radius in meters before the fallback applies
    #[clap(long, default_value = "10000.0")]
    max_radius_m: f64,

    /// Angular tolerance in degrees for the fallback cone
    #[clap(long, default_value = "60.0")]
    cone_deg: f64,

    /// Emit one JSON object per update instead of text
    #[clap(long)]
    json: bool,
}

/// One parsed stdin update: position plus optional measured heading
#[derive(Debug, Clone, Copy, PartialEq)]
struct Update {
    coord: Coord<f64>,
    heading: Option<f64>,
}

/// Parse a "lng lat [heading]" line; `None` for anything malformed
fn parse_update(line: &str) -> Option<Update> {
    let mut parts = line.split_whitespace();
    let lng: f64 = parts.next()?.parse().ok()?;
    let lat: f64 = parts.next()?.parse().ok()?;
    let heading = match parts.next() {
        Some(raw) => Some(raw.parse::<f64>().ok().filter(|h| h.is_finite())?),
        None => None,
    };
    if parts.next().is_some() || !lng.is_finite() || !lat.is_finite() {
        return None;
    }
    Some(Update {
        coord: Coord { x: lng, y: lat },
        heading,
    })
}

fn emit(snapshot: &QuerySnapshot, display: Option<&str>, heading: f64, json: bool) {
    if json {
        let line = serde_json::json!({
            "heading": heading,
            "current": snapshot.current,
            "display": display,
            "ahead": snapshot.ahead,
            "behind": snapshot.behind,
            "left": snapshot.left,
            "right": snapshot.right,
        });
        println!("{line}");
        return;
    }

    println!("Region: {}  (heading {:.0}°)", display.unwrap_or("—"), heading);
    let directions = [
        ("ahead", &snapshot.ahead),
        ("behind", &snapshot.behind),
        ("left", &snapshot.left),
        ("right", &snapshot.right),
    ];
    for (label, crossing) in directions {
        match crossing {
            Some(c) => println!("  {label:>6}: Approaching {} in {} m", c.name, c.distance_m.round()),
            None => println!("  {label:>6}: —"),
        }
    }
}

/// Stream updates from stdin until EOF
///
/// A missing heading falls back to the bearing from the previous position,
/// or 0 on the very first update.
fn run_follow(engine: &RegionEngine, json: bool) -> Result<(), RadarError> {
    let mut memo = LastKnownRegion::new();
    let mut previous: Option<Coord<f64>> = None;

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(update) = parse_update(line) else {
            tracing::warn!(line, "ignoring unparseable update");
            continue;
        };

        let heading = update.heading.unwrap_or_else(|| {
            previous
                .map(|prev| utils::initial_bearing(prev, update.coord))
                .unwrap_or(0.0)
        });
        previous = Some(update.coord);

        let snapshot = engine.query(update.coord, heading);
        let display = memo.observe(snapshot.current.as_deref()).map(str::to_string);
        emit(&snapshot, display.as_deref(), heading, json);
    }
    Ok(())
}

fn main() -> Result<(), RadarError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::parse();
    let config = ProbeConfig {
        step_m: settings.step_m,
        max_radius_m: settings.max_radius_m,
        cone_deg: settings.cone_deg,
    };
    let engine = RegionEngine::from_geojson_path(&settings.regions, config)?;

    if settings.follow {
        run_follow(&engine, settings.json)
    } else {
        // clap enforces presence of --lng/--lat outside follow mode.
        let origin = Coord {
            x: settings.lng.expect("required by clap"),
            y: settings.lat.expect("required by clap"),
        };
        let snapshot = engine.query(origin, settings.heading);
        emit(&snapshot, snapshot.current.as_deref(), settings.heading, settings.json);
        Ok(())
    }
}
