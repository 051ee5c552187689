//! Survey pattern generators.
//!
//! A survey area is given by three corners: `P0 → P1` is the along-track
//! edge, `P1 → P2` the across-track edge. Every generator returns the
//! waypoints of the pattern, or `None` when the parameters cannot produce a
//! usable pattern. [`track_to_mission`] turns waypoints into a mission.

use crate::defaults::ManeuverDefaults;
use crate::models::{LatLon, Maneuver, Mission, MissionStep, Position, Tolerance};
use crate::spatial::{local_xy, normalize_bearing, planar_cross, Geodesy};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// Upper bound on legs per pattern; larger requests are rejected.
pub const MAX_TRACKS: usize = 10_000;

// Below this |sin| of the angle at P1 the three points are collinear.
const COLLINEAR_SIN_TOLERANCE: f64 = 1e-9;

/// Settings shared by every step of a generated mission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurveyParams {
    pub z: f64,
    pub altitude_mode: bool,
    pub speed: f64,
    pub tolerance: Tolerance,
}

impl From<&ManeuverDefaults> for SurveyParams {
    fn from(defaults: &ManeuverDefaults) -> Self {
        Self {
            z: defaults.z,
            altitude_mode: defaults.altitude_mode,
            speed: defaults.speed,
            tolerance: defaults.tolerance,
        }
    }
}

impl Default for SurveyParams {
    fn default() -> Self {
        Self::from(&ManeuverDefaults::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpiralDirection {
    /// Start on the area boundary at P0 and finish near the centre
    Inward,
    /// The inward path reversed, finishing at P0
    Outward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "pattern", rename_all = "lowercase")]
pub enum SurveyPattern {
    Lawnmower { num_across_tracks: u32 },
    Spiral { direction: SpiralDirection },
}

/// Along/across axes of a three-corner survey area.
#[derive(Debug, Clone, Copy)]
struct AreaAxes {
    dist_along: f64,
    bearing_along: f64,
    dist_across: f64,
    bearing_across: f64,
}

impl AreaAxes {
    fn measure(geo: &dyn Geodesy, area: &[LatLon; 3], track_spacing: f64) -> Option<Self> {
        if !(track_spacing.is_finite() && track_spacing > 0.0) {
            return None;
        }
        let [p0, p1, p2] = *area;
        let axes = Self {
            dist_along: geo.distance(p0, p1),
            bearing_along: geo.bearing(p0, p1),
            dist_across: geo.distance(p1, p2),
            bearing_across: geo.bearing(p1, p2),
        };
        if !(axes.dist_along.is_finite() && axes.dist_along > 0.0 && axes.dist_across.is_finite())
        {
            return None;
        }
        Some(axes)
    }
}

/// Classic lawn-mower: back-and-forth legs parallel to `P0 → P1`, spaced
/// `track_spacing` apart towards `P2`.
///
/// With `num_across_tracks > 0` a second set of legs crossing the first at
/// 90° is appended. They split the along-track length into
/// `num_across_tracks + 1` equal parts and span the across extent actually
/// covered by the first sweep plus one `track_spacing` on each side.
pub fn compute_tracks(
    geo: &dyn Geodesy,
    area: [LatLon; 3],
    track_spacing: f64,
    num_across_tracks: u32,
) -> Option<Vec<LatLon>> {
    let axes = AreaAxes::measure(geo, &area, track_spacing)?;
    let along_count = (axes.dist_across / track_spacing).ceil() + 1.0;
    if !along_count.is_finite()
        || along_count > MAX_TRACKS as f64
        || num_across_tracks as usize > MAX_TRACKS
    {
        return None;
    }
    let num_along_tracks = along_count as usize;

    let p0 = area[0];
    let mut points = Vec::with_capacity(2 * (num_along_tracks + num_across_tracks as usize) + 1);
    points.push(p0);
    let mut current = p0;
    let mut heading = axes.bearing_along;
    for leg in 0..num_along_tracks {
        current = geo.project(current, axes.dist_along, heading);
        points.push(current);
        if leg + 1 < num_along_tracks {
            current = geo.project(current, track_spacing, axes.bearing_across);
            points.push(current);
        }
        heading = normalize_bearing(heading + PI);
    }

    if num_across_tracks == 0 {
        return Some(points);
    }

    // Leg k runs from points[2k] to points[2k + 1]; even legs start on P0's side.
    let last_leg = num_along_tracks - 1;
    let ends_far_side = last_leg % 2 == 0;
    let near_index = if ends_far_side {
        2 * last_leg
    } else {
        2 * last_leg + 1
    };
    let real_dist_across = geo.distance(p0, points[near_index]);

    let segment = axes.dist_along / (f64::from(num_across_tracks) + 1.0);
    let along_inward = if ends_far_side {
        normalize_bearing(axes.bearing_along + PI)
    } else {
        axes.bearing_along
    };
    let leg_length = real_dist_across + 2.0 * track_spacing;

    current = geo.project(current, track_spacing, axes.bearing_across);
    points.push(current);
    let mut heading = normalize_bearing(axes.bearing_across + PI);
    for _ in 0..num_across_tracks {
        current = geo.project(current, segment, along_inward);
        points.push(current);
        current = geo.project(current, leg_length, heading);
        points.push(current);
        heading = normalize_bearing(heading + PI);
    }

    Some(points)
}

/// Rectangular spiral over the same axes as [`compute_tracks`].
///
/// Inward legs: along, across, along, then each pair of legs one
/// `track_spacing` shorter than the previous pair, until a leg would have no
/// length left.
pub fn compute_spiral_tracks(
    geo: &dyn Geodesy,
    area: [LatLon; 3],
    track_spacing: f64,
    direction: SpiralDirection,
) -> Option<Vec<LatLon>> {
    let axes = AreaAxes::measure(geo, &area, track_spacing)?;

    let mut points = vec![area[0]];
    let mut current = area[0];
    let mut finished = false;
    for leg in 0..2 * MAX_TRACKS {
        let (full_length, base_bearing) = if leg % 2 == 0 {
            (axes.dist_along, axes.bearing_along)
        } else {
            (axes.dist_across, axes.bearing_across)
        };
        let shrink = (leg.saturating_sub(1) / 2) as f64;
        let length = full_length - shrink * track_spacing;
        if length <= f64::EPSILON {
            finished = true;
            break;
        }
        // along, across, back along, back across, ...
        let bearing = if (leg / 2) % 2 == 1 {
            normalize_bearing(base_bearing + PI)
        } else {
            base_bearing
        };
        current = geo.project(current, length, bearing);
        points.push(current);
    }
    if !finished {
        return None;
    }

    if direction == SpiralDirection::Outward {
        points.reverse();
    }
    Some(points)
}

/// Perimeter of a four-corner rectangle starting at `initial_corner`, closed
/// back on that corner.
pub fn rectangle_tracks(corners: [LatLon; 4], initial_corner: usize) -> Option<Vec<LatLon>> {
    if initial_corner >= corners.len() {
        return None;
    }
    let mut points: Vec<LatLon> = (0..corners.len())
        .map(|offset| corners[(initial_corner + offset) % corners.len()])
        .collect();
    points.push(corners[initial_corner]);
    Some(points)
}

/// Rectangle with `p1 → p2` as one side and the opposite side on `p3`'s side.
///
/// The other sides are perpendicular to `p1 → p2` and as long as the
/// distance from `p2` to `p3`. Returns the corners in drawing order, or `None`
/// when the points are collinear.
pub fn rect_by_3_points(
    geo: &dyn Geodesy,
    p1: LatLon,
    p2: LatLon,
    p3: LatLon,
) -> Option<[LatLon; 4]> {
    let (bx, by) = local_xy(p2, p1);
    let (cx, cy) = local_xy(p3, p1);
    let lengths = (bx * bx + by * by).sqrt() * (cx * cx + cy * cy).sqrt();
    if !(lengths.is_finite() && lengths > 0.0) {
        return None;
    }
    let cross = planar_cross(p1, p2, p3);
    if (cross / lengths).abs() < COLLINEAR_SIN_TOLERANCE {
        return None;
    }

    // p3 on the left of p1 → p2 turns the sides counter-clockwise.
    let turn = if cross > 0.0 { -FRAC_PI_2 } else { FRAC_PI_2 };
    let width_m = geo.distance(p2, p3);
    let along_at_p1 = geo.bearing(p1, p2);
    let along_at_p2 = normalize_bearing(geo.bearing(p2, p1) + PI);

    let c3 = geo.project(p2, width_m, normalize_bearing(along_at_p2 + turn));
    let c4 = geo.project(p1, width_m, normalize_bearing(along_at_p1 + turn));
    Some([p1, p2, c3, c4])
}

/// Build a mission following `waypoints`: a Waypoint step on the first point
/// and a Section from each point to the next.
pub fn track_to_mission(waypoints: &[LatLon], params: &SurveyParams) -> Mission {
    let mut mission = Mission::new();
    let mut previous: Option<Position> = None;
    for point in waypoints {
        let position = Position::new(point.lat, point.lon, params.z, params.altitude_mode);
        let maneuver = match previous {
            None => Maneuver::waypoint(position, params.speed, params.tolerance),
            Some(initial) => Maneuver::section(initial, position, params.speed, params.tolerance),
        };
        mission.push_step(MissionStep::new(maneuver));
        previous = Some(position);
    }
    mission
}

/// Run a generator over a three-corner area and convert the result.
pub fn generate_survey(
    geo: &dyn Geodesy,
    area: [LatLon; 3],
    track_spacing: f64,
    pattern: SurveyPattern,
    params: &SurveyParams,
) -> Option<Mission> {
    let waypoints = match pattern {
        SurveyPattern::Lawnmower { num_across_tracks } => {
            compute_tracks(geo, area, track_spacing, num_across_tracks)?
        }
        SurveyPattern::Spiral { direction } => {
            compute_spiral_tracks(geo, area, track_spacing, direction)?
        }
    };
    tracing::debug!(
        "Generated {:?} survey with {} waypoints",
        pattern,
        waypoints.len()
    );
    Some(track_to_mission(&waypoints, params))
}
