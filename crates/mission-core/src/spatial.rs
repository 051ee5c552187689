//! Geodesic math used by the track controller and the survey generators.
//!
//! Every generator receives a [`Geodesy`] implementation so that all the
//! projections of one survey share the same earth model.

use crate::models::LatLon;
use std::f64::consts::PI;

/// Mean earth radius used by the spherical model.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// WGS84 ellipsoid parameters
pub const WGS84_SEMI_MAJOR_AXIS_M: f64 = 6_378_137.0;
pub const WGS84_INVERSE_FLATTENING: f64 = 298.257_223_563;
const WGS84_FLATTENING: f64 = 1.0 / WGS84_INVERSE_FLATTENING;
const WGS84_SEMI_MINOR_AXIS_M: f64 = WGS84_SEMI_MAJOR_AXIS_M * (1.0 - WGS84_FLATTENING);

const VINCENTY_MAX_ITERATIONS: usize = 200;
const VINCENTY_CONVERGENCE: f64 = 1e-12;

/// Distance, bearing and projection on some model of the earth.
///
/// Bearings are in radians, 0 = north, π/2 = east. Distances are in meters.
pub trait Geodesy {
    /// Distance between two points in meters.
    fn distance(&self, from: LatLon, to: LatLon) -> f64;

    /// Initial bearing from `from` towards `to`, in radians.
    fn bearing(&self, from: LatLon, to: LatLon) -> f64;

    /// Point reached travelling `distance_m` from `start` on `bearing_rad`.
    fn project(&self, start: LatLon, distance_m: f64, bearing_rad: f64) -> LatLon;
}

/// Great-circle math on a sphere of radius [`EARTH_RADIUS_M`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SphericalGeodesic;

impl Geodesy for SphericalGeodesic {
    fn distance(&self, from: LatLon, to: LatLon) -> f64 {
        haversine_distance(from.lat, from.lon, to.lat, to.lon)
    }

    fn bearing(&self, from: LatLon, to: LatLon) -> f64 {
        bearing(from.lat, from.lon, to.lat, to.lon)
    }

    fn project(&self, start: LatLon, distance_m: f64, bearing_rad: f64) -> LatLon {
        let (lat, lon) = offset_by_bearing(start.lat, start.lon, distance_m, bearing_rad);
        LatLon::new(lat, lon)
    }
}

/// Vincenty's formulae on the WGS84 ellipsoid.
///
/// The inverse problem does not converge for nearly antipodal points; in that
/// case the spherical solution is returned instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wgs84Geodesic;

impl Geodesy for Wgs84Geodesic {
    fn distance(&self, from: LatLon, to: LatLon) -> f64 {
        match vincenty_inverse(from, to) {
            Some(solution) => solution.distance_m,
            None => SphericalGeodesic.distance(from, to),
        }
    }

    fn bearing(&self, from: LatLon, to: LatLon) -> f64 {
        match vincenty_inverse(from, to) {
            Some(solution) => solution.initial_bearing_rad,
            None => SphericalGeodesic.bearing(from, to),
        }
    }

    fn project(&self, start: LatLon, distance_m: f64, bearing_rad: f64) -> LatLon {
        vincenty_direct(start, distance_m, bearing_rad)
    }
}

#[derive(Debug, Clone, Copy)]
struct InverseSolution {
    distance_m: f64,
    initial_bearing_rad: f64,
}

fn vincenty_inverse(from: LatLon, to: LatLon) -> Option<InverseSolution> {
    let a = WGS84_SEMI_MAJOR_AXIS_M;
    let b = WGS84_SEMI_MINOR_AXIS_M;
    let f = WGS84_FLATTENING;

    let l = (to.lon - from.lon).to_radians();
    let u1 = ((1.0 - f) * from.lat.to_radians().tan()).atan();
    let u2 = ((1.0 - f) * to.lat.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    let mut converged = false;
    let (mut sin_sigma, mut cos_sigma, mut sigma) = (0.0, 0.0, 0.0);
    let (mut cos_sq_alpha, mut cos_2sigma_m) = (0.0, 0.0);

    for _ in 0..VINCENTY_MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let cross = cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda;
        sin_sigma = ((cos_u2 * sin_lambda).powi(2) + cross.powi(2)).sqrt();
        if sin_sigma == 0.0 {
            // coincident points
            return Some(InverseSolution {
                distance_m: 0.0,
                initial_bearing_rad: 0.0,
            });
        }
        cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            // equatorial line
            0.0
        };
        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));
        if (lambda - previous).abs() < VINCENTY_CONVERGENCE {
            converged = true;
            break;
        }
    }

    if !converged {
        return None;
    }

    let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    let delta_sigma = sigma_correction(big_b, sin_sigma, cos_sigma, cos_2sigma_m);
    let distance_m = b * big_a * (sigma - delta_sigma);

    let (sin_lambda, cos_lambda) = lambda.sin_cos();
    let initial_bearing_rad =
        (cos_u2 * sin_lambda).atan2(cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda);

    Some(InverseSolution {
        distance_m,
        initial_bearing_rad,
    })
}

fn vincenty_direct(start: LatLon, distance_m: f64, bearing_rad: f64) -> LatLon {
    if distance_m.abs() <= f64::EPSILON {
        return start;
    }

    let a = WGS84_SEMI_MAJOR_AXIS_M;
    let b = WGS84_SEMI_MINOR_AXIS_M;
    let f = WGS84_FLATTENING;

    let (sin_alpha1, cos_alpha1) = bearing_rad.sin_cos();
    let tan_u1 = (1.0 - f) * start.lat.to_radians().tan();
    let cos_u1 = 1.0 / (1.0 + tan_u1 * tan_u1).sqrt();
    let sin_u1 = tan_u1 * cos_u1;
    let sigma1 = tan_u1.atan2(cos_alpha1);
    let sin_alpha = cos_u1 * sin_alpha1;
    let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
    let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));

    let base_sigma = distance_m / (b * big_a);
    let mut sigma = base_sigma;
    for _ in 0..VINCENTY_MAX_ITERATIONS {
        let cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
        let (sin_sigma, cos_sigma) = sigma.sin_cos();
        let next = base_sigma + sigma_correction(big_b, sin_sigma, cos_sigma, cos_2sigma_m);
        let done = (next - sigma).abs() < VINCENTY_CONVERGENCE;
        sigma = next;
        if done {
            break;
        }
    }

    let cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
    let (sin_sigma, cos_sigma) = sigma.sin_cos();
    let tmp = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
    let lat2 = (sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1)
        .atan2((1.0 - f) * (sin_alpha * sin_alpha + tmp * tmp).sqrt());
    let lambda =
        (sin_sigma * sin_alpha1).atan2(cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1);
    let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
    let l = lambda
        - (1.0 - c)
            * f
            * sin_alpha
            * (sigma
                + c * sin_sigma * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));
    let lon2 = normalize_lon_rad(start.lon.to_radians() + l);

    LatLon::new(lat2.to_degrees(), lon2.to_degrees())
}

fn sigma_correction(big_b: f64, sin_sigma: f64, cos_sigma: f64, cos_2sigma_m: f64) -> f64 {
    big_b
        * sin_sigma
        * (cos_2sigma_m
            + big_b / 4.0
                * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                    - big_b / 6.0
                        * cos_2sigma_m
                        * (-3.0 + 4.0 * sin_sigma.powi(2))
                        * (-3.0 + 4.0 * cos_2sigma_m.powi(2))))
}

fn normalize_lon_rad(lon: f64) -> f64 {
    (lon + PI).rem_euclid(2.0 * PI) - PI
}

/// Normalize a bearing to `[0, 2π)`.
pub fn normalize_bearing(bearing_rad: f64) -> f64 {
    bearing_rad.rem_euclid(2.0 * PI)
}

/// Calculate distance between two points in meters using Haversine formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Calculate initial great-circle bearing from point 1 to point 2 in radians.
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    x.atan2(y)
}

/// Offset a position by distance and bearing on the sphere.
///
/// # Returns
/// (new_lat, new_lon) in degrees
pub fn offset_by_bearing(lat: f64, lon: f64, distance_m: f64, bearing_rad: f64) -> (f64, f64) {
    if distance_m.abs() <= f64::EPSILON {
        return (lat, lon);
    }

    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let lon2 = normalize_lon_rad(lon1 + y.atan2(x));

    (lat2.to_degrees(), lon2.to_degrees())
}

// ==== Local planar projection ====
// Latitude-aware scaling between degrees and meters around a reference point.

/// Meters per degree of latitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// East/north offset of `point` from `origin`, in meters.
pub fn local_xy(point: LatLon, origin: LatLon) -> (f64, f64) {
    let ref_lat = origin.lat;
    (
        (point.lon - origin.lon) * meters_per_deg_lon(ref_lat),
        (point.lat - origin.lat) * meters_per_deg_lat(ref_lat),
    )
}

/// Z component of `(b - a) × (c - a)` in local meters around `a`.
///
/// Positive when `c` lies to the left (counter-clockwise) of `a → b`.
pub fn planar_cross(a: LatLon, b: LatLon, c: LatLon) -> f64 {
    let (bx, by) = local_xy(b, a);
    let (cx, cy) = local_xy(c, a);
    bx * cy - by * cx
}
