//! CLI configuration from environment.

use mission_core::{Geodesy, ManeuverDefaults, SphericalGeodesic, SurveyParams, Wgs84Geodesic};
use std::env;

/// Earth model used for distances and projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeodesyModel {
    #[default]
    Wgs84,
    Sphere,
}

impl GeodesyModel {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "wgs84" => Some(GeodesyModel::Wgs84),
            "sphere" | "spherical" => Some(GeodesyModel::Sphere),
            _ => None,
        }
    }

    pub fn geodesy(&self) -> &'static dyn Geodesy {
        match self {
            GeodesyModel::Wgs84 => &Wgs84Geodesic,
            GeodesyModel::Sphere => &SphericalGeodesic,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub defaults: ManeuverDefaults,
    pub geodesy: GeodesyModel,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; missing or unparsable values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let number = |key: &str| lookup(key).and_then(|s| s.trim().parse::<f64>().ok());
        let mut defaults = ManeuverDefaults::default();

        if let Some(speed) = number("MISSION_SPEED") {
            defaults.speed = speed;
        }
        if let Some(z) = number("MISSION_Z") {
            defaults.z = z;
        }
        if let Some(altitude_mode) = lookup("MISSION_ALTITUDE_MODE").and_then(|s| parse_bool(&s)) {
            defaults.altitude_mode = altitude_mode;
        }
        if let Some(xy) = number("MISSION_TOLERANCE_XY") {
            defaults.tolerance.x = xy;
            defaults.tolerance.y = xy;
        }
        if let Some(z) = number("MISSION_TOLERANCE_Z") {
            defaults.tolerance.z = z;
        }

        Self {
            defaults,
            geodesy: lookup("MISSION_GEODESY")
                .and_then(|s| GeodesyModel::parse(&s))
                .unwrap_or_default(),
        }
    }

    pub fn survey_params(&self) -> SurveyParams {
        SurveyParams::from(&self.defaults)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
