//! Mission summary printed by `mission_info`.

use mission_core::{Geodesy, ManeuverKind, Mission, ShapeHint};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionSummary {
    pub name: Option<String>,
    pub steps: usize,
    pub waypoints: usize,
    pub sections: usize,
    pub parks: usize,
    pub actions: usize,
    pub shape: ShapeHint,
    pub length_m: f64,
    pub duration_s: f64,
    /// `None` when every section starts where the previous step ends
    pub link_error: Option<String>,
}

impl MissionSummary {
    pub fn new(name: Option<String>, mission: &Mission, geo: &dyn Geodesy) -> Self {
        let count = |kind: ManeuverKind| {
            mission
                .steps()
                .iter()
                .filter(|step| step.maneuver.kind() == kind)
                .count()
        };
        Self {
            name,
            steps: mission.len(),
            waypoints: count(ManeuverKind::Waypoint),
            sections: count(ManeuverKind::Section),
            parks: count(ManeuverKind::Park),
            actions: mission.steps().iter().map(|step| step.actions.len()).sum(),
            shape: ShapeHint::for_step_count(mission.len()),
            length_m: mission.length(geo),
            duration_s: mission.estimated_duration(geo),
            link_error: mission.check_section_links().err().map(|e| e.to_string()),
        }
    }
}

impl fmt::Display for MissionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            writeln!(f, "Mission: {}", name)?;
        }
        writeln!(
            f,
            "Steps: {} ({} waypoints, {} sections, {} parks)",
            self.steps, self.waypoints, self.sections, self.parks
        )?;
        writeln!(f, "Actions: {}", self.actions)?;
        writeln!(f, "Shape: {:?}", self.shape)?;
        writeln!(f, "Length: {:.1} m", self.length_m)?;
        writeln!(f, "Estimated duration: {:.0} s", self.duration_s)?;
        match &self.link_error {
            None => write!(f, "Section links: ok"),
            Some(error) => write!(f, "Section links: {}", error),
        }
    }
}
