//! Core data models for AUV missions.

use crate::error::MissionError;
use crate::spatial::Geodesy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 2D geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A 3D target for a maneuver.
///
/// `z` is a depth (positive down) unless `altitude_mode` is set, in which case
/// it is the altitude above the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub z: f64,
    pub altitude_mode: bool,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64, z: f64, altitude_mode: bool) -> Self {
        Self {
            latitude,
            longitude,
            z,
            altitude_mode,
        }
    }

    pub fn lat_lon(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }

    /// Move horizontally, keeping `z` and `altitude_mode`.
    pub fn set_lat_lon(&mut self, point: LatLon) {
        self.latitude = point.lat;
        self.longitude = point.lon;
    }

    /// Same vertical reference as `self`, placed at `point`.
    pub fn moved_to(&self, point: LatLon) -> Self {
        Self {
            latitude: point.lat,
            longitude: point.lon,
            ..*self
        }
    }
}

/// Arrival acceptance radii per axis, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Tolerance {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaypointManeuver {
    pub position: Position,
    pub speed: f64,
    pub tolerance: Tolerance,
}

/// Travel along the segment from `initial_position` to `final_position`.
///
/// `initial_position` mirrors the effective position of the previous step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionManeuver {
    pub initial_position: Position,
    pub final_position: Position,
    pub speed: f64,
    pub tolerance: Tolerance,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParkManeuver {
    pub position: Position,
    pub speed: f64,
    /// Seconds to hold position
    pub time: f64,
    pub tolerance: Tolerance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManeuverKind {
    Waypoint,
    Section,
    Park,
}

impl ManeuverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManeuverKind::Waypoint => "waypoint",
            ManeuverKind::Section => "section",
            ManeuverKind::Park => "park",
        }
    }
}

impl fmt::Display for ManeuverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ManeuverKind {
    type Err = MissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "waypoint" => Ok(ManeuverKind::Waypoint),
            "section" => Ok(ManeuverKind::Section),
            "park" => Ok(ManeuverKind::Park),
            other => Err(MissionError::InvalidDocument(format!(
                "unknown maneuver type '{other}'"
            ))),
        }
    }
}

/// The geometric instruction executed at a mission step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Maneuver {
    Waypoint(WaypointManeuver),
    Section(SectionManeuver),
    Park(ParkManeuver),
}

impl Maneuver {
    pub fn waypoint(position: Position, speed: f64, tolerance: Tolerance) -> Self {
        Maneuver::Waypoint(WaypointManeuver {
            position,
            speed,
            tolerance,
        })
    }

    pub fn section(
        initial_position: Position,
        final_position: Position,
        speed: f64,
        tolerance: Tolerance,
    ) -> Self {
        Maneuver::Section(SectionManeuver {
            initial_position,
            final_position,
            speed,
            tolerance,
        })
    }

    pub fn park(position: Position, speed: f64, time: f64, tolerance: Tolerance) -> Self {
        Maneuver::Park(ParkManeuver {
            position,
            speed,
            time,
            tolerance,
        })
    }

    pub fn kind(&self) -> ManeuverKind {
        match self {
            Maneuver::Waypoint(_) => ManeuverKind::Waypoint,
            Maneuver::Section(_) => ManeuverKind::Section,
            Maneuver::Park(_) => ManeuverKind::Park,
        }
    }

    pub fn is_section(&self) -> bool {
        matches!(self, Maneuver::Section(_))
    }

    /// Where the vehicle is once the maneuver is done.
    pub fn position(&self) -> &Position {
        match self {
            Maneuver::Waypoint(wp) => &wp.position,
            Maneuver::Section(section) => &section.final_position,
            Maneuver::Park(park) => &park.position,
        }
    }

    pub fn position_mut(&mut self) -> &mut Position {
        match self {
            Maneuver::Waypoint(wp) => &mut wp.position,
            Maneuver::Section(section) => &mut section.final_position,
            Maneuver::Park(park) => &mut park.position,
        }
    }

    pub fn speed(&self) -> f64 {
        match self {
            Maneuver::Waypoint(wp) => wp.speed,
            Maneuver::Section(section) => section.speed,
            Maneuver::Park(park) => park.speed,
        }
    }

    pub fn tolerance(&self) -> &Tolerance {
        match self {
            Maneuver::Waypoint(wp) => &wp.tolerance,
            Maneuver::Section(section) => &section.tolerance,
            Maneuver::Park(park) => &park.tolerance,
        }
    }

    /// Initial position of a Section, `None` for the other kinds.
    pub fn initial_position(&self) -> Option<&Position> {
        match self {
            Maneuver::Section(section) => Some(&section.initial_position),
            Maneuver::Waypoint(_) | Maneuver::Park(_) => None,
        }
    }

    /// A maneuver of the same kind and settings placed at `point`.
    ///
    /// A Section starts from `self`'s effective position. `z` and
    /// `altitude_mode` come from `self`.
    pub fn following_at(&self, point: LatLon) -> Self {
        let target = self.position().moved_to(point);
        match *self {
            Maneuver::Waypoint(wp) => Maneuver::Waypoint(WaypointManeuver {
                position: target,
                ..wp
            }),
            Maneuver::Section(section) => Maneuver::Section(SectionManeuver {
                initial_position: section.final_position,
                final_position: target,
                ..section
            }),
            Maneuver::Park(park) => Maneuver::Park(ParkManeuver {
                position: target,
                ..park
            }),
        }
    }

    /// Same as [`Maneuver::following_at`] but used when the new maneuver is
    /// inserted *before* `self`. A Section source becomes a Waypoint since
    /// nothing precedes the new step.
    pub(crate) fn preceding_at(&self, point: LatLon) -> Self {
        let target = self.position().moved_to(point);
        match *self {
            Maneuver::Waypoint(wp) => Maneuver::Waypoint(WaypointManeuver {
                position: target,
                ..wp
            }),
            Maneuver::Section(section) => Maneuver::Waypoint(WaypointManeuver {
                position: target,
                speed: section.speed,
                tolerance: section.tolerance,
            }),
            Maneuver::Park(park) => Maneuver::Park(ParkManeuver {
                position: target,
                ..park
            }),
        }
    }
}

/// An opaque command executed at a step, e.g. a sensor trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub action_id: String,
    #[serde(default)]
    pub parameters: Vec<String>,
}

impl Action {
    pub fn new(action_id: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, value: impl Into<String>) -> Self {
        self.parameters.push(value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionStep {
    pub maneuver: Maneuver,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl MissionStep {
    pub fn new(maneuver: Maneuver) -> Self {
        Self {
            maneuver,
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}

/// Ordered list of steps. The first step is never a Section.
///
/// Missions are edited through [`crate::track::MissionTrack`]; only read
/// access is public here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    steps: Vec<MissionStep>,
}

impl Mission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mission from steps, rejecting a leading Section.
    pub fn from_steps(steps: Vec<MissionStep>) -> Result<Self, MissionError> {
        if steps
            .first()
            .is_some_and(|step| step.maneuver.is_section())
        {
            return Err(MissionError::LeadingSection);
        }
        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[MissionStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&MissionStep> {
        self.steps.get(index)
    }

    pub fn into_steps(self) -> Vec<MissionStep> {
        self.steps
    }

    pub(crate) fn push_step(&mut self, step: MissionStep) {
        self.steps.push(step);
    }

    pub(crate) fn insert_step(&mut self, index: usize, step: MissionStep) {
        self.steps.insert(index, step);
    }

    pub(crate) fn remove_step(&mut self, index: usize) -> MissionStep {
        self.steps.remove(index)
    }

    pub(crate) fn step_mut(&mut self, index: usize) -> Option<&mut MissionStep> {
        self.steps.get_mut(index)
    }

    /// Overwrite the initial position of the Section at `index` (if any) with
    /// the effective position of the step before it.
    ///
    /// Returns true when a Section was resynced.
    pub(crate) fn resync_section(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.steps.len() {
            return false;
        }
        let anchor = *self.steps[index - 1].maneuver.position();
        match &mut self.steps[index].maneuver {
            Maneuver::Section(section) => {
                section.initial_position = anchor;
                true
            }
            Maneuver::Waypoint(_) | Maneuver::Park(_) => false,
        }
    }

    /// Verify that every Section starts where its predecessor ends.
    pub fn check_section_links(&self) -> Result<(), MissionError> {
        if self.steps.first().is_some_and(|s| s.maneuver.is_section()) {
            return Err(MissionError::LeadingSection);
        }
        for (index, pair) in self.steps.windows(2).enumerate() {
            if let Some(initial) = pair[1].maneuver.initial_position() {
                if initial != pair[0].maneuver.position() {
                    return Err(MissionError::BrokenSectionLink { index: index + 1 });
                }
            }
        }
        Ok(())
    }

    /// Distance covered by the mission, in meters.
    ///
    /// A Section is measured from its own initial position, any other
    /// maneuver from the previous step's effective position.
    pub fn length(&self, geo: &dyn Geodesy) -> f64 {
        self.legs(geo).map(|(distance, _)| distance).sum()
    }

    /// Expected run time in seconds: travel time per leg plus park times.
    pub fn estimated_duration(&self, geo: &dyn Geodesy) -> f64 {
        let travel: f64 = self
            .legs(geo)
            .filter(|(_, speed)| *speed > 0.0)
            .map(|(distance, speed)| distance / speed)
            .sum();
        let parked: f64 = self
            .steps
            .iter()
            .filter_map(|step| match &step.maneuver {
                Maneuver::Park(park) => Some(park.time.max(0.0)),
                Maneuver::Waypoint(_) | Maneuver::Section(_) => None,
            })
            .sum();
        travel + parked
    }

    fn legs<'a>(&'a self, geo: &'a dyn Geodesy) -> impl Iterator<Item = (f64, f64)> + 'a {
        self.steps.windows(2).map(move |pair| {
            let to = &pair[1].maneuver;
            let from = to
                .initial_position()
                .unwrap_or_else(|| pair[0].maneuver.position());
            (
                geo.distance(from.lat_lon(), to.position().lat_lon()),
                to.speed(),
            )
        })
    }
}
