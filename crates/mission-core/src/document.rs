//! Reading and writing mission XML documents.
//!
//! ```xml
//! <mission>
//!   <mission_step>
//!     <maneuver type="waypoint">
//!       <position>
//!         <latitude>41.7777</latitude>
//!         <longitude>3.0333</longitude>
//!         <z>5.0</z>
//!         <altitude_mode>False</altitude_mode>
//!       </position>
//!       <speed>0.5</speed>
//!       <tolerance><x>2.0</x><y>2.0</y><z>1.0</z></tolerance>
//!     </maneuver>
//!     <actions_list>
//!       <action>
//!         <action_id>/camera/enable</action_id>
//!         <parameters><param>on</param></parameters>
//!       </action>
//!     </actions_list>
//!   </mission_step>
//! </mission>
//! ```
//!
//! Loading is all or nothing: a document either becomes a complete
//! [`Mission`] or an error.

use crate::error::MissionError;
use crate::models::{Action, Maneuver, ManeuverKind, Mission, MissionStep, Position, Tolerance};
use quick_xml::events::Event;
use quick_xml::se::Serializer;
use quick_xml::{DeError, Reader};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" ?>";

/// Load a mission from an XML file.
pub fn load(path: impl AsRef<Path>) -> Result<Mission, MissionError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let mission = from_xml_str(&text)?;
    tracing::debug!("Loaded mission with {} steps from {}", mission.len(), path.display());
    Ok(mission)
}

/// Write a mission to an XML file, replacing any existing content.
pub fn save(mission: &Mission, path: impl AsRef<Path>) -> Result<(), MissionError> {
    let path = path.as_ref();
    std::fs::write(path, to_xml_string(mission)?)?;
    tracing::debug!("Saved mission with {} steps to {}", mission.len(), path.display());
    Ok(())
}

/// Parse a mission document.
pub fn from_xml_str(text: &str) -> Result<Mission, MissionError> {
    let mut doc: MissionDoc = quick_xml::de::from_str(text)?;
    doc.restore_action_text(raw_action_text(text)?)?;
    Mission::try_from(doc)
}

/// Render a mission document, indented, with an XML declaration.
pub fn to_xml_string(mission: &Mission) -> Result<String, MissionError> {
    let doc = MissionDoc::from(mission);
    let mut body = String::new();
    let mut serializer = Serializer::new(&mut body);
    serializer.indent(' ', 2);
    doc.serialize(serializer)?;
    Ok(format!("{XML_DECLARATION}\n{body}\n"))
}

/// Decimal text with a trailing `.0` on integral values (`2.0`, not `2`).
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Decimal(f64);

impl Serialize for Decimal {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_decimal(self.0))
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.trim()
            .parse::<f64>()
            .map(Decimal)
            .map_err(|_| D::Error::custom(format!("invalid decimal value '{text}'")))
    }
}

/// `True` / `False` as written by the ground station.
mod title_case_bool {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "True" } else { "False" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let text = String::deserialize(deserializer)?;
        match text.trim() {
            "True" | "true" | "1" => Ok(true),
            "False" | "false" | "0" => Ok(false),
            other => Err(D::Error::custom(format!("invalid boolean value '{other}'"))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "mission")]
struct MissionDoc {
    #[serde(rename = "mission_step", default)]
    steps: Vec<StepDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StepDoc {
    maneuver: ManeuverDoc,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    actions_list: Option<ActionsDoc>,
}

// Field order is the element order on disk for every maneuver type.
#[derive(Debug, Serialize, Deserialize)]
struct ManeuverDoc {
    #[serde(rename = "@type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    initial_position: Option<PositionDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    final_position: Option<PositionDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<PositionDoc>,
    speed: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time: Option<Decimal>,
    tolerance: ToleranceDoc,
}

#[derive(Debug, Serialize, Deserialize)]
struct PositionDoc {
    latitude: Decimal,
    longitude: Decimal,
    z: Decimal,
    #[serde(with = "title_case_bool")]
    altitude_mode: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ToleranceDoc {
    x: Decimal,
    y: Decimal,
    z: Decimal,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ActionsDoc {
    #[serde(rename = "action", default)]
    actions: Vec<ActionDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ActionDoc {
    action_id: String,
    #[serde(default)]
    parameters: ParametersDoc,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ParametersDoc {
    #[serde(rename = "param", default)]
    values: Vec<String>,
}

/// Untrimmed text of the `action_id` and `param` elements inside actions, in
/// document order.
#[derive(Debug, Default)]
struct RawActionText {
    action_ids: Vec<String>,
    params: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ActionField {
    ActionId,
    Param,
}

impl ActionField {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"action_id" => Some(ActionField::ActionId),
            b"param" => Some(ActionField::Param),
            _ => None,
        }
    }
}

impl RawActionText {
    fn push(&mut self, field: ActionField, value: String) {
        match field {
            ActionField::ActionId => self.action_ids.push(value),
            ActionField::Param => self.params.push(value),
        }
    }
}

// The serde reader trims element text. Action ids and parameters are opaque,
// so they are read again here with whitespace kept.
fn raw_action_text(text: &str) -> Result<RawActionText, MissionError> {
    let mut reader = Reader::from_str(text);
    let mut raw = RawActionText::default();
    let mut in_action = false;
    let mut current: Option<(ActionField, String)> = None;

    loop {
        match reader.read_event().map_err(DeError::from)? {
            Event::Start(e) if e.name().as_ref() == b"action" => in_action = true,
            Event::Start(e) if in_action => {
                current = ActionField::from_name(e.name().as_ref()).map(|f| (f, String::new()));
            }
            Event::Empty(e) if in_action => {
                if let Some(field) = ActionField::from_name(e.name().as_ref()) {
                    raw.push(field, String::new());
                }
            }
            Event::Text(e) => {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(&e.unescape().map_err(DeError::from)?);
                }
            }
            Event::CData(e) => {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"action" {
                    in_action = false;
                }
                if let Some((field, value)) = current.take() {
                    raw.push(field, value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(raw)
}

impl MissionDoc {
    fn restore_action_text(&mut self, raw: RawActionText) -> Result<(), MissionError> {
        let actions = self
            .steps
            .iter_mut()
            .filter_map(|step| step.actions_list.as_mut())
            .flat_map(|list| list.actions.iter_mut());
        let mut action_ids = raw.action_ids.into_iter();
        let mut params = raw.params.into_iter();
        for action in actions {
            action.action_id = action_ids.next().ok_or_else(action_text_mismatch)?;
            for value in action.parameters.values.iter_mut() {
                *value = params.next().ok_or_else(action_text_mismatch)?;
            }
        }
        if action_ids.next().is_some() || params.next().is_some() {
            return Err(action_text_mismatch());
        }
        Ok(())
    }
}

fn action_text_mismatch() -> MissionError {
    MissionError::InvalidDocument("action elements do not match the mission structure".into())
}

impl From<&Position> for PositionDoc {
    fn from(position: &Position) -> Self {
        Self {
            latitude: Decimal(position.latitude),
            longitude: Decimal(position.longitude),
            z: Decimal(position.z),
            altitude_mode: position.altitude_mode,
        }
    }
}

impl From<PositionDoc> for Position {
    fn from(doc: PositionDoc) -> Self {
        Position::new(doc.latitude.0, doc.longitude.0, doc.z.0, doc.altitude_mode)
    }
}

impl From<&Tolerance> for ToleranceDoc {
    fn from(tolerance: &Tolerance) -> Self {
        Self {
            x: Decimal(tolerance.x),
            y: Decimal(tolerance.y),
            z: Decimal(tolerance.z),
        }
    }
}

impl From<ToleranceDoc> for Tolerance {
    fn from(doc: ToleranceDoc) -> Self {
        Tolerance::new(doc.x.0, doc.y.0, doc.z.0)
    }
}

impl From<&Maneuver> for ManeuverDoc {
    fn from(maneuver: &Maneuver) -> Self {
        let mut doc = ManeuverDoc {
            kind: maneuver.kind().as_str().to_string(),
            initial_position: None,
            final_position: None,
            position: None,
            speed: Decimal(maneuver.speed()),
            time: None,
            tolerance: maneuver.tolerance().into(),
        };
        match maneuver {
            Maneuver::Waypoint(wp) => doc.position = Some((&wp.position).into()),
            Maneuver::Section(section) => {
                doc.initial_position = Some((&section.initial_position).into());
                doc.final_position = Some((&section.final_position).into());
            }
            Maneuver::Park(park) => {
                doc.position = Some((&park.position).into());
                doc.time = Some(Decimal(park.time));
            }
        }
        doc
    }
}

impl From<&Mission> for MissionDoc {
    fn from(mission: &Mission) -> Self {
        let steps = mission
            .steps()
            .iter()
            .map(|step| StepDoc {
                maneuver: (&step.maneuver).into(),
                actions_list: (!step.actions.is_empty()).then(|| ActionsDoc {
                    actions: step
                        .actions
                        .iter()
                        .map(|action| ActionDoc {
                            action_id: action.action_id.clone(),
                            parameters: ParametersDoc {
                                values: action.parameters.clone(),
                            },
                        })
                        .collect(),
                }),
            })
            .collect();
        MissionDoc { steps }
    }
}

fn require<T>(
    field: Option<T>,
    name: &str,
    kind: ManeuverKind,
    step: usize,
) -> Result<T, MissionError> {
    field.ok_or_else(|| {
        MissionError::InvalidDocument(format!("{kind} maneuver at step {step} has no {name}"))
    })
}

fn maneuver_from_doc(doc: ManeuverDoc, step: usize) -> Result<Maneuver, MissionError> {
    let kind: ManeuverKind = doc.kind.parse()?;
    let speed = doc.speed.0;
    let tolerance = Tolerance::from(doc.tolerance);
    let maneuver = match kind {
        ManeuverKind::Waypoint => Maneuver::waypoint(
            require(doc.position, "position", kind, step)?.into(),
            speed,
            tolerance,
        ),
        ManeuverKind::Section => Maneuver::section(
            require(doc.initial_position, "initial_position", kind, step)?.into(),
            require(doc.final_position, "final_position", kind, step)?.into(),
            speed,
            tolerance,
        ),
        ManeuverKind::Park => Maneuver::park(
            require(doc.position, "position", kind, step)?.into(),
            speed,
            require(doc.time, "time", kind, step)?.0,
            tolerance,
        ),
    };
    Ok(maneuver)
}

impl TryFrom<MissionDoc> for Mission {
    type Error = MissionError;

    fn try_from(doc: MissionDoc) -> Result<Self, Self::Error> {
        let mut steps = Vec::with_capacity(doc.steps.len());
        for (index, step) in doc.steps.into_iter().enumerate() {
            let maneuver = maneuver_from_doc(step.maneuver, index)?;
            let actions = step
                .actions_list
                .unwrap_or_default()
                .actions
                .into_iter()
                .map(|action| Action {
                    action_id: action.action_id,
                    parameters: action.parameters.values,
                })
                .collect();
            steps.push(MissionStep { maneuver, actions });
        }
        Mission::from_steps(steps)
    }
}
