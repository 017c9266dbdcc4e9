//! Great-circle distance on the earth's surface.

use super::types::GeoPoint;

/// Mean earth radius in meters (IUGG value).
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Calculates the great-circle distance between two points in meters.
///
/// Uses the haversine formula, which is numerically stable for the short
/// distances radius queries operate on.
///
/// # Example
///
/// ```
/// use geofence_core::geo::{distance_meters, GeoPoint};
///
/// let equator = GeoPoint::new(0.0, 0.0).unwrap();
/// let one_degree_north = GeoPoint::new(1.0, 0.0).unwrap();
///
/// // One degree of latitude is roughly 111 km.
/// let distance = distance_meters(equator, one_degree_north);
/// assert!((distance - 111_195.0).abs() < 100.0);
/// ```
#[must_use]
pub fn distance_meters(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_METERS * c
}

/// Returns whether `point` lies within `radius_meters` of `center`.
///
/// A point exactly at the radius boundary counts as inside.
#[must_use]
pub fn within_radius(point: GeoPoint, center: GeoPoint, radius_meters: f64) -> bool {
    distance_meters(point, center) <= radius_meters
}
