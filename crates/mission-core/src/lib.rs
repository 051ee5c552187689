pub mod defaults;
pub mod document;
pub mod error;
pub mod models;
pub mod spatial;
pub mod status;
pub mod survey;
pub mod track;

pub use defaults::ManeuverDefaults;
pub use document::{from_xml_str, load, save, to_xml_string};
pub use error::MissionError;
pub use models::{
    Action, LatLon, Maneuver, ManeuverKind, Mission, MissionStep, ParkManeuver, Position,
    SectionManeuver, Tolerance, WaypointManeuver,
};
pub use spatial::{Geodesy, SphericalGeodesic, Wgs84Geodesic};
pub use status::{
    decode_error_code, decode_status, LegacyErrorFlags, StatusFlags, StatusReport, StatusSeverity,
};
pub use survey::{
    compute_spiral_tracks, compute_tracks, generate_survey, rect_by_3_points, rectangle_tracks,
    track_to_mission, SpiralDirection, SurveyParams, SurveyPattern,
};
pub use track::{ChangeSet, MissionTrack, ShapeHint, TrackEvent, TrackListener};
