//! Mission CLI - Command line tools over the mission engine.
//!
//! Binaries:
//! - survey: generate a survey mission document
//! - mission_info: summarize a mission file
//! - mission_status: decode a vehicle status word

pub mod config;
pub mod summary;

use mission_core::LatLon;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Log to stderr, filtered by `RUST_LOG` with the mission crates at `info`.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mission_core=info".parse()?)
                .add_directive("mission_cli=info".parse()?),
        )
        .init();
    Ok(())
}

/// Parse a `lat,lon` pair in decimal degrees.
pub fn parse_lat_lon(text: &str) -> Result<LatLon, String> {
    let (lat, lon) = text
        .split_once(',')
        .ok_or_else(|| format!("expected 'lat,lon', got '{text}'"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lon.trim()))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(format!("coordinates out of range: {lat}, {lon}"));
    }
    Ok(LatLon::new(lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lat_lon_pairs() {
        assert_eq!(
            parse_lat_lon("41.7772, 3.0331").unwrap(),
            LatLon::new(41.7772, 3.0331)
        );
        assert!(parse_lat_lon("41.7772").is_err());
        assert!(parse_lat_lon("north,3.0").is_err());
        assert!(parse_lat_lon("91.0,3.0").is_err());
    }
}
