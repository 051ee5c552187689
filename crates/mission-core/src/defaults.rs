//! Default maneuver settings for new missions and generated surveys.

use crate::models::{Position, Tolerance};
use serde::{Deserialize, Serialize};

/// Settings applied to a maneuver when nothing can be copied from a
/// neighbouring step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManeuverDefaults {
    /// Surge speed in meters per second
    pub speed: f64,
    /// Depth, or altitude when `altitude_mode` is set
    pub z: f64,
    pub altitude_mode: bool,
    pub tolerance: Tolerance,
    /// Hold time for park maneuvers (seconds)
    pub park_time: f64,
}

impl Default for ManeuverDefaults {
    fn default() -> Self {
        Self {
            speed: 0.5,
            z: 0.0,
            altitude_mode: false,
            tolerance: Tolerance::new(2.0, 2.0, 1.0),
            park_time: 0.0,
        }
    }
}

impl ManeuverDefaults {
    /// A position at the default vertical reference.
    pub fn position(&self, latitude: f64, longitude: f64) -> Position {
        Position::new(latitude, longitude, self.z, self.altitude_mode)
    }
}
