//! Mission editing for the map tools.
//!
//! [`MissionTrack`] owns a [`Mission`] and is the only way to modify it. Every
//! operation keeps two rules intact:
//!
//! - the first step is never a Section,
//! - a Section's `initial_position` equals the effective position of the step
//!   before it.
//!
//! Each successful operation returns the events it produced, in order, and
//! delivers them synchronously to every subscribed [`TrackListener`].
//! Listeners must not call back into the track while being notified.

use crate::defaults::ManeuverDefaults;
use crate::document;
use crate::error::MissionError;
use crate::models::{LatLon, Maneuver, Mission, MissionStep};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// How the mission geometry should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeHint {
    /// Zero or one step
    Point,
    /// Two or more steps
    Line,
}

impl ShapeHint {
    pub fn for_step_count(count: usize) -> Self {
        if count < 2 {
            ShapeHint::Point
        } else {
            ShapeHint::Line
        }
    }
}

/// Something that changed in the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrackEvent {
    /// Steps from this index on need to be redrawn. `None` when the mission
    /// became empty.
    MissionChanged { step_index: Option<usize> },
    StepRemoved { step_index: usize },
    ShapeHintChanged { hint: ShapeHint },
}

/// Events produced by one operation, in emission order.
pub type ChangeSet = Vec<TrackEvent>;

/// Receives track events as they happen.
pub trait TrackListener {
    fn on_mission_changed(&mut self, _step_index: Option<usize>) {}

    fn on_step_removed(&mut self, _step_index: usize) {}

    fn on_shape_hint_changed(&mut self, _hint: ShapeHint) {}
}

pub struct MissionTrack {
    mission: Mission,
    shape_hint: ShapeHint,
    defaults: ManeuverDefaults,
    name: Option<String>,
    file_path: Option<PathBuf>,
    modified: bool,
    saved: bool,
    listeners: Vec<Box<dyn TrackListener>>,
}

impl fmt::Debug for MissionTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MissionTrack")
            .field("mission", &self.mission)
            .field("shape_hint", &self.shape_hint)
            .field("defaults", &self.defaults)
            .field("name", &self.name)
            .field("file_path", &self.file_path)
            .field("modified", &self.modified)
            .field("saved", &self.saved)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for MissionTrack {
    fn default() -> Self {
        Self::new()
    }
}

impl MissionTrack {
    /// An empty track using [`ManeuverDefaults::default`].
    pub fn new() -> Self {
        Self::with_mission(Mission::new())
    }

    pub fn with_mission(mission: Mission) -> Self {
        Self {
            shape_hint: ShapeHint::for_step_count(mission.len()),
            mission,
            defaults: ManeuverDefaults::default(),
            name: None,
            file_path: None,
            modified: false,
            saved: false,
            listeners: Vec::new(),
        }
    }

    /// Settings used for the first step added to an empty mission.
    pub fn with_defaults(mut self, defaults: ManeuverDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Open a mission document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MissionError> {
        let path = path.as_ref();
        let mut track = Self::with_mission(document::load(path)?);
        track.name = mission_name_from_path(path);
        track.file_path = Some(path.to_path_buf());
        track.saved = true;
        Ok(track)
    }

    /// Write the mission to `path` and mark it as saved.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), MissionError> {
        let path = path.as_ref();
        document::save(&self.mission, path)?;
        if self.name.is_none() {
            self.name = mission_name_from_path(path);
        }
        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        self.saved = true;
        Ok(())
    }

    pub fn subscribe(&mut self, listener: Box<dyn TrackListener>) {
        self.listeners.push(listener);
    }

    pub fn mission(&self) -> &Mission {
        &self.mission
    }

    pub fn into_mission(self) -> Mission {
        self.mission
    }

    pub fn len(&self) -> usize {
        self.mission.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mission.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&MissionStep> {
        self.mission.step(index)
    }

    pub fn steps(&self) -> &[MissionStep] {
        self.mission.steps()
    }

    pub fn shape_hint(&self) -> ShapeHint {
        self.shape_hint
    }

    /// True once the mission has changed since it was last saved.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// True once the mission has been written to or read from a file.
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Insert a step at `point` before the step currently at `index`.
    ///
    /// The new maneuver copies its kind and settings from the step before it,
    /// or from the step it displaces when inserted first. A Section copied
    /// this way starts at the previous step's position.
    pub fn add_step(&mut self, index: usize, point: LatLon) -> Result<ChangeSet, MissionError> {
        let len = self.mission.len();
        if index > len {
            tracing::warn!("Rejected add_step at {} (mission has {} steps)", index, len);
            return Err(MissionError::IndexOutOfRange { index, len });
        }

        let maneuver = match index {
            _ if len == 0 => Maneuver::waypoint(
                self.defaults.position(point.lat, point.lon),
                self.defaults.speed,
                self.defaults.tolerance,
            ),
            0 => self.mission.steps()[0].maneuver.preceding_at(point),
            _ => self.mission.steps()[index - 1].maneuver.following_at(point),
        };

        self.mission.insert_step(index, MissionStep::new(maneuver));
        self.mission.resync_section(index + 1);
        tracing::debug!("Added {} step at {}", maneuver.kind(), index);

        let mut changes = Vec::new();
        if len <= 1 {
            changes.push(self.recompute_shape_hint());
        }
        changes.push(TrackEvent::MissionChanged {
            step_index: Some(index),
        });
        Ok(self.commit(changes))
    }

    /// Remove the step at `index`.
    ///
    /// Fails without touching the mission when the step is the first one and
    /// a Section follows it. Otherwise a following Section is re-anchored on
    /// the step before the removed one.
    pub fn remove_step(&mut self, index: usize) -> Result<ChangeSet, MissionError> {
        let len = self.mission.len();
        if index >= len {
            tracing::warn!("Rejected remove_step at {} (mission has {} steps)", index, len);
            return Err(MissionError::IndexOutOfRange { index, len });
        }

        let next_is_section = self
            .mission
            .step(index + 1)
            .is_some_and(|step| step.maneuver.is_section());
        if index == 0 && len > 1 && next_is_section {
            tracing::warn!("Rejected remove_step at 0: a section depends on it");
            return Err(MissionError::SectionAnchorRemoval { index });
        }

        let removed = self.mission.remove_step(index);
        if next_is_section {
            self.mission.resync_section(index);
        }
        tracing::debug!("Removed {} step at {}", removed.maneuver.kind(), index);

        let remaining = len - 1;
        let changed_at = if remaining == 0 {
            None
        } else if index == remaining {
            Some(index - 1)
        } else {
            Some(index)
        };

        let mut changes = vec![
            TrackEvent::StepRemoved { step_index: index },
            TrackEvent::MissionChanged {
                step_index: changed_at,
            },
        ];
        if len <= 2 {
            changes.push(self.recompute_shape_hint());
        }
        Ok(self.commit(changes))
    }

    /// Move the step at `index` to `point`, keeping its depth settings.
    pub fn change_position(
        &mut self,
        index: usize,
        point: LatLon,
    ) -> Result<ChangeSet, MissionError> {
        let len = self.mission.len();
        let Some(step) = self.mission.step_mut(index) else {
            tracing::warn!("Rejected change_position at {} (mission has {} steps)", index, len);
            return Err(MissionError::IndexOutOfRange { index, len });
        };
        step.maneuver.position_mut().set_lat_lon(point);
        self.mission.resync_section(index + 1);
        tracing::debug!("Moved step {} to {:.6}, {:.6}", index, point.lat, point.lon);

        Ok(self.commit(vec![TrackEvent::MissionChanged {
            step_index: Some(index),
        }]))
    }

    /// Replace several steps at once (multi-selection edits).
    ///
    /// Sections placed by the update, or following a replaced step, are
    /// re-anchored afterwards. A single `MissionChanged` is emitted at the
    /// lowest replaced index.
    pub fn update_steps(
        &mut self,
        indices: &[usize],
        steps: Vec<MissionStep>,
    ) -> Result<ChangeSet, MissionError> {
        if indices.len() != steps.len() {
            tracing::warn!(
                "Rejected update_steps: {} indices for {} steps",
                indices.len(),
                steps.len()
            );
            return Err(MissionError::MismatchedUpdate {
                indices: indices.len(),
                steps: steps.len(),
            });
        }
        let len = self.mission.len();
        if let Some(&index) = indices.iter().find(|&&index| index >= len) {
            tracing::warn!("Rejected update_steps at {} (mission has {} steps)", index, len);
            return Err(MissionError::IndexOutOfRange { index, len });
        }
        if indices
            .iter()
            .zip(&steps)
            .any(|(&index, step)| index == 0 && step.maneuver.is_section())
        {
            tracing::warn!("Rejected update_steps: would start the mission with a section");
            return Err(MissionError::LeadingSection);
        }
        let Some(&first) = indices.iter().min() else {
            return Ok(ChangeSet::new());
        };

        for (&index, step) in indices.iter().zip(steps) {
            if let Some(slot) = self.mission.step_mut(index) {
                *slot = step;
            }
        }
        for &index in indices {
            self.mission.resync_section(index);
            self.mission.resync_section(index + 1);
        }
        tracing::debug!("Updated {} steps starting at {}", indices.len(), first);

        Ok(self.commit(vec![TrackEvent::MissionChanged {
            step_index: Some(first),
        }]))
    }

    /// Remove every step, last first.
    pub fn clear(&mut self) -> Result<ChangeSet, MissionError> {
        let mut changes = ChangeSet::new();
        while let Some(last) = self.mission.len().checked_sub(1) {
            changes.extend(self.remove_step(last)?);
        }
        Ok(changes)
    }

    fn recompute_shape_hint(&mut self) -> TrackEvent {
        self.shape_hint = ShapeHint::for_step_count(self.mission.len());
        TrackEvent::ShapeHintChanged {
            hint: self.shape_hint,
        }
    }

    fn commit(&mut self, changes: ChangeSet) -> ChangeSet {
        self.modified = true;
        for event in &changes {
            for listener in self.listeners.iter_mut() {
                match *event {
                    TrackEvent::MissionChanged { step_index } => {
                        listener.on_mission_changed(step_index)
                    }
                    TrackEvent::StepRemoved { step_index } => listener.on_step_removed(step_index),
                    TrackEvent::ShapeHintChanged { hint } => listener.on_shape_hint_changed(hint),
                }
            }
        }
        changes
    }
}

fn mission_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ManeuverKind, Position, Tolerance};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn point(lat: f64, lon: f64) -> LatLon {
        LatLon::new(lat, lon)
    }

    fn tol() -> Tolerance {
        Tolerance::new(3.0, 3.0, 1.5)
    }

    /// Waypoint followed by sections through the given points.
    fn section_track(points: &[LatLon]) -> MissionTrack {
        let mut steps = Vec::new();
        let first = Position::new(points[0].lat, points[0].lon, 4.0, false);
        steps.push(MissionStep::new(Maneuver::waypoint(first, 1.2, tol())));
        for pair in points.windows(2) {
            let from = Position::new(pair[0].lat, pair[0].lon, 4.0, false);
            let to = Position::new(pair[1].lat, pair[1].lon, 4.0, false);
            steps.push(MissionStep::new(Maneuver::section(from, to, 1.2, tol())));
        }
        MissionTrack::with_mission(Mission::from_steps(steps).unwrap())
    }

    fn three_section_track() -> MissionTrack {
        section_track(&[point(0.0, 0.0), point(0.001, 0.0), point(0.002, 0.0)])
    }

    struct Recorder(Rc<RefCell<Vec<TrackEvent>>>);

    impl TrackListener for Recorder {
        fn on_mission_changed(&mut self, step_index: Option<usize>) {
            self.0
                .borrow_mut()
                .push(TrackEvent::MissionChanged { step_index });
        }

        fn on_step_removed(&mut self, step_index: usize) {
            self.0.borrow_mut().push(TrackEvent::StepRemoved { step_index });
        }

        fn on_shape_hint_changed(&mut self, hint: ShapeHint) {
            self.0.borrow_mut().push(TrackEvent::ShapeHintChanged { hint });
        }
    }

    #[test]
    fn first_step_uses_defaults() {
        let mut track = MissionTrack::new();
        let changes = track.add_step(0, point(41.0, 3.0)).unwrap();

        assert_eq!(
            changes,
            vec![
                TrackEvent::ShapeHintChanged {
                    hint: ShapeHint::Point
                },
                TrackEvent::MissionChanged {
                    step_index: Some(0)
                },
            ]
        );
        let Maneuver::Waypoint(wp) = track.step(0).unwrap().maneuver else {
            panic!("first step should be a waypoint");
        };
        assert_eq!(wp.position, Position::new(41.0, 3.0, 0.0, false));
        assert_eq!(wp.speed, 0.5);
        assert_eq!(wp.tolerance, Tolerance::new(2.0, 2.0, 1.0));
        assert!(track.is_modified());
        assert!(!track.is_saved());
    }

    #[test]
    fn second_step_switches_to_line() {
        let mut track = MissionTrack::new();
        track.add_step(0, point(41.0, 3.0)).unwrap();
        let changes = track.add_step(1, point(41.001, 3.0)).unwrap();

        assert_eq!(track.shape_hint(), ShapeHint::Line);
        assert_eq!(
            changes,
            vec![
                TrackEvent::ShapeHintChanged {
                    hint: ShapeHint::Line
                },
                TrackEvent::MissionChanged {
                    step_index: Some(1)
                },
            ]
        );

        let changes = track.add_step(2, point(41.002, 3.0)).unwrap();
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn appending_after_section_creates_linked_section() {
        let mut track = three_section_track();
        track.add_step(3, point(0.003, 0.0)).unwrap();

        let Maneuver::Section(added) = track.step(3).unwrap().maneuver else {
            panic!("expected a section");
        };
        assert_eq!(added.initial_position, *track.step(2).unwrap().maneuver.position());
        assert_eq!(added.final_position.lat_lon(), point(0.003, 0.0));
        assert_eq!(added.final_position.z, 4.0);
        assert_eq!(added.speed, 1.2);
        assert_eq!(added.tolerance, tol());
        track.mission().check_section_links().unwrap();
    }

    #[test]
    fn inserting_before_section_reanchors_it() {
        let mut track = three_section_track();
        track.add_step(1, point(0.0005, 0.0005)).unwrap();

        assert_eq!(track.len(), 4);
        assert_eq!(track.step(1).unwrap().maneuver.kind(), ManeuverKind::Waypoint);
        let Maneuver::Section(next) = track.step(2).unwrap().maneuver else {
            panic!("expected a section");
        };
        assert_eq!(next.initial_position.lat_lon(), point(0.0005, 0.0005));
        track.mission().check_section_links().unwrap();
    }

    #[test]
    fn inserting_first_copies_displaced_step() {
        let mut track = three_section_track();
        track.add_step(0, point(-0.001, 0.0)).unwrap();

        let Maneuver::Waypoint(wp) = track.step(0).unwrap().maneuver else {
            panic!("expected a waypoint");
        };
        assert_eq!(wp.speed, 1.2);
        assert_eq!(wp.position.z, 4.0);
        assert_eq!(track.step(1).unwrap().maneuver.kind(), ManeuverKind::Waypoint);
    }

    #[test]
    fn add_step_out_of_range() {
        let mut track = three_section_track();
        assert!(matches!(
            track.add_step(5, point(0.0, 0.0)),
            Err(MissionError::IndexOutOfRange { index: 5, len: 3 })
        ));
        assert!(!track.is_modified());
    }

    #[test]
    fn removing_section_anchor_is_rejected() {
        let mut track = three_section_track();
        let before = track.mission().clone();

        assert!(matches!(
            track.remove_step(0),
            Err(MissionError::SectionAnchorRemoval { index: 0 })
        ));
        assert_eq!(track.len(), 3);
        assert_eq!(track.mission(), &before);
        assert!(!track.is_modified());
    }

    #[test]
    fn removing_middle_step_reanchors_following_section() {
        let mut track = three_section_track();
        let changes = track.remove_step(1).unwrap();

        assert_eq!(
            changes,
            vec![
                TrackEvent::StepRemoved { step_index: 1 },
                TrackEvent::MissionChanged {
                    step_index: Some(1)
                },
            ]
        );
        let Maneuver::Section(section) = track.step(1).unwrap().maneuver else {
            panic!("expected a section");
        };
        assert_eq!(section.initial_position.lat_lon(), point(0.0, 0.0));
        track.mission().check_section_links().unwrap();
    }

    #[test]
    fn removing_last_step_reports_previous_index() {
        let mut track = three_section_track();
        let changes = track.remove_step(2).unwrap();
        assert_eq!(
            changes,
            vec![
                TrackEvent::StepRemoved { step_index: 2 },
                TrackEvent::MissionChanged {
                    step_index: Some(1)
                },
            ]
        );
    }

    #[test]
    fn shape_hint_follows_removals_down_to_empty() {
        let mut track = section_track(&[point(0.0, 0.0), point(0.001, 0.0)]);
        assert_eq!(track.shape_hint(), ShapeHint::Line);

        let changes = track.remove_step(1).unwrap();
        let hints: Vec<_> = changes
            .iter()
            .filter(|event| matches!(event, TrackEvent::ShapeHintChanged { .. }))
            .collect();
        assert_eq!(
            hints,
            vec![&TrackEvent::ShapeHintChanged {
                hint: ShapeHint::Point
            }]
        );

        let changes = track.remove_step(0).unwrap();
        assert_eq!(
            changes,
            vec![
                TrackEvent::StepRemoved { step_index: 0 },
                TrackEvent::MissionChanged { step_index: None },
                TrackEvent::ShapeHintChanged {
                    hint: ShapeHint::Point
                },
            ]
        );
        assert!(track.is_empty());
    }

    #[test]
    fn change_position_syncs_following_section() {
        let mut track = three_section_track();
        let changes = track.change_position(1, point(0.0011, 0.0002)).unwrap();

        assert_eq!(
            changes,
            vec![TrackEvent::MissionChanged {
                step_index: Some(1)
            }]
        );
        let moved = track.step(1).unwrap().maneuver.position();
        assert_eq!(moved.lat_lon(), point(0.0011, 0.0002));
        assert_eq!(moved.z, 4.0);
        assert_eq!(
            track.step(2).unwrap().maneuver.initial_position().unwrap(),
            moved
        );
    }

    #[test]
    fn update_steps_emits_single_change() {
        let mut track = three_section_track();
        let replacement = MissionStep::new(Maneuver::park(
            Position::new(0.0015, 0.0, 6.0, true),
            0.8,
            45.0,
            tol(),
        ));
        let kept = track.step(2).unwrap().clone();
        let changes = track.update_steps(&[2, 1], vec![kept, replacement]).unwrap();

        assert_eq!(
            changes,
            vec![TrackEvent::MissionChanged {
                step_index: Some(1)
            }]
        );
        assert_eq!(track.step(1).unwrap().maneuver.kind(), ManeuverKind::Park);
        assert_eq!(
            track.step(2).unwrap().maneuver.initial_position().unwrap(),
            &Position::new(0.0015, 0.0, 6.0, true)
        );
    }

    #[test]
    fn update_steps_rejects_leading_section_and_bad_input() {
        let mut track = three_section_track();
        let section = track.step(1).unwrap().clone();
        let before = track.mission().clone();

        assert!(matches!(
            track.update_steps(&[0], vec![section.clone()]),
            Err(MissionError::LeadingSection)
        ));
        assert!(matches!(
            track.update_steps(&[1, 2], vec![section.clone()]),
            Err(MissionError::MismatchedUpdate {
                indices: 2,
                steps: 1
            })
        ));
        assert!(matches!(
            track.update_steps(&[7], vec![section]),
            Err(MissionError::IndexOutOfRange { index: 7, len: 3 })
        ));
        assert_eq!(track.mission(), &before);
    }

    #[test]
    fn listeners_see_returned_events() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut track = MissionTrack::new();
        track.subscribe(Box::new(Recorder(events.clone())));

        let mut expected = Vec::new();
        expected.extend(track.add_step(0, point(1.0, 1.0)).unwrap());
        expected.extend(track.add_step(1, point(1.001, 1.0)).unwrap());
        expected.extend(track.remove_step(0).unwrap());
        expected.extend(track.clear().unwrap());

        assert_eq!(*events.borrow(), expected);
        assert!(track.is_empty());
    }

    #[test]
    fn clear_removes_from_the_end() {
        let mut track = three_section_track();
        let changes = track.clear().unwrap();

        let removed: Vec<_> = changes
            .iter()
            .filter_map(|event| match event {
                TrackEvent::StepRemoved { step_index } => Some(*step_index),
                _ => None,
            })
            .collect();
        assert_eq!(removed, vec![2, 1, 0]);
        assert_eq!(track.shape_hint(), ShapeHint::Point);
    }
}
