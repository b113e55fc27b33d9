//! Geographic primitives.

use crate::types::Coordinate;

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub fn to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

pub fn to_degrees(radians: f64) -> f64 {
    radians * 180.0 / std::f64::consts::PI
}

/// Great-circle distance between two points in kilometers.
pub fn haversine_km(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat1_rad = to_radians(from.lat);
    let lat2_rad = to_radians(to.lat);
    let delta_lat = to_radians(to.lat - from.lat);
    let delta_lng = to_radians(to.lng - from.lng);

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}
