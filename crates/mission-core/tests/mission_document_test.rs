//! Mission document integration tests.
//!
//! Writes missions to disk and reads them back through the public API.

use mission_core::{
    generate_survey, load, save, Action, LatLon, Maneuver, Mission, MissionError, MissionStep,
    MissionTrack, Position, SpiralDirection, SurveyParams, SurveyPattern, Tolerance,
    Wgs84Geodesic,
};
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("mission-core-{}-{}.xml", std::process::id(), name))
}

fn survey_area() -> [LatLon; 3] {
    [
        LatLon::new(41.777_2, 3.033_1),
        LatLon::new(41.778_9, 3.033_1),
        LatLon::new(41.778_9, 3.035_4),
    ]
}

fn hand_built_mission() -> Mission {
    let tolerance = Tolerance::new(2.0, 2.0, 1.0);
    let start = Position::new(41.777_24, 3.030_11, 2.5, false);
    let mid = Position::new(41.777_81, 3.031_02, 2.5, false);
    let hold = Position::new(41.778_02, 3.031_97, 7.25, true);

    let steps = vec![
        MissionStep::new(Maneuver::waypoint(start, 0.5, tolerance)).with_action(
            Action::new("/sensors/camera/enable_trigger")
                .with_parameter("10")
                .with_parameter("true"),
        ),
        MissionStep::new(Maneuver::section(start, mid, 0.8, tolerance)),
        MissionStep::new(Maneuver::park(hold, 0.3, 120.0, tolerance))
            .with_action(Action::new("/sensors/camera/disable_trigger")),
    ];
    Mission::from_steps(steps).unwrap()
}

/// Test that a hand-built mission with actions and a park step survives a file round trip.
#[test]
fn test_hand_built_mission_round_trip() {
    let path = temp_path("hand-built");
    let mission = hand_built_mission();

    save(&mission, &path).unwrap();
    let loaded = load(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded, mission);
    assert_eq!(loaded.step(0).unwrap().actions[0].parameters, vec!["10", "true"]);
}

/// Test that generated survey missions survive a file round trip.
#[test]
fn test_generated_missions_round_trip() {
    let geo = Wgs84Geodesic;
    let params = SurveyParams {
        z: 3.0,
        altitude_mode: true,
        speed: 1.0,
        tolerance: Tolerance::new(3.0, 3.0, 1.5),
    };
    let patterns = [
        SurveyPattern::Lawnmower {
            num_across_tracks: 0,
        },
        SurveyPattern::Lawnmower {
            num_across_tracks: 3,
        },
        SurveyPattern::Spiral {
            direction: SpiralDirection::Inward,
        },
        SurveyPattern::Spiral {
            direction: SpiralDirection::Outward,
        },
    ];

    for (i, pattern) in patterns.into_iter().enumerate() {
        let mission = generate_survey(&geo, survey_area(), 30.0, pattern, &params).unwrap();
        let path = temp_path(&format!("survey-{i}"));

        save(&mission, &path).unwrap();
        let loaded = load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, mission, "pattern {pattern:?}");
        loaded.check_section_links().unwrap();
    }
}

/// Test that a track remembers where it was saved and reopens with the same steps.
#[test]
fn test_track_save_and_reopen() {
    let path = temp_path("track");
    let mut track = MissionTrack::with_mission(hand_built_mission());
    track.add_step(3, LatLon::new(41.778_5, 3.032_4)).unwrap();
    assert!(track.is_modified());
    assert!(!track.is_saved());

    track.save(&path).unwrap();
    assert!(!track.is_modified());
    assert!(track.is_saved());
    assert_eq!(track.file_path(), Some(path.as_path()));

    let reopened = MissionTrack::load(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(reopened.mission(), track.mission());
    assert_eq!(reopened.name(), path.file_stem().and_then(|stem| stem.to_str()));
    assert!(!reopened.is_modified());
}

/// Test that a truncated document is rejected as a whole.
#[test]
fn test_truncated_document_is_rejected() {
    let path = temp_path("truncated");
    save(&hand_built_mission(), &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let cut = text.find("<speed>").unwrap();
    std::fs::write(&path, &text[..cut]).unwrap();

    let result = load(&path);
    let _ = std::fs::remove_file(&path);
    assert!(result.is_err());
}

/// Test that a missing file surfaces as an IO error.
#[test]
fn test_missing_file_is_io_error() {
    let result = load(temp_path("does-not-exist"));
    assert!(matches!(result, Err(MissionError::Io(_))));
}
