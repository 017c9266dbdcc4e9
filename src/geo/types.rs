//! Coordinate data types.

use serde::{Deserialize, Serialize};

use super::error::{GeoError, Result};

/// A point on the earth's surface.
///
/// Coordinates are stored in decimal degrees. Construction through
/// [`GeoPoint::new`] guarantees both components are finite and within
/// their valid ranges, so downstream distance math never sees NaN or
/// out-of-range values.
///
/// # Example
///
/// ```
/// use geofence_core::geo::GeoPoint;
///
/// let point = GeoPoint::new(37.7749, -122.4194).unwrap();
/// assert_eq!(point.latitude, 37.7749);
///
/// assert!(GeoPoint::new(91.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees, -90.0 to 90.0 inclusive.
    pub latitude: f64,
    /// Longitude in decimal degrees, -180.0 to 180.0 inclusive.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a validated point.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidLatitude`] or [`GeoError::InvalidLongitude`]
    /// if a component is non-finite or outside its valid range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Validates a query radius.
///
/// A radius must be a positive, finite number of meters.
///
/// # Errors
///
/// Returns [`GeoError::InvalidRadius`] otherwise.
pub fn validate_radius(radius_meters: f64) -> Result<f64> {
    if !radius_meters.is_finite() || radius_meters <= 0.0 {
        return Err(GeoError::InvalidRadius(radius_meters));
    }
    Ok(radius_meters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_valid_coordinates() {
        let point = GeoPoint::new(37.7749, -122.4194).unwrap();
        assert_eq!(point.latitude, 37.7749);
        assert_eq!(point.longitude, -122.4194);
    }

    #[test]
    fn new_accepts_boundaries() {
        assert!(GeoPoint::new(90.0, 0.0).is_ok());
        assert!(GeoPoint::new(-90.0, 0.0).is_ok());
        assert!(GeoPoint::new(0.0, 180.0).is_ok());
        assert!(GeoPoint::new(0.0, -180.0).is_ok());
    }

    #[test]
    fn new_rejects_out_of_range_latitude() {
        assert!(matches!(
            GeoPoint::new(90.1, 0.0),
            Err(GeoError::InvalidLatitude(_))
        ));
        assert!(matches!(
            GeoPoint::new(-90.1, 0.0),
            Err(GeoError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn new_rejects_out_of_range_longitude() {
        assert!(matches!(
            GeoPoint::new(0.0, 180.1),
            Err(GeoError::InvalidLongitude(_))
        ));
        assert!(matches!(
            GeoPoint::new(0.0, -180.1),
            Err(GeoError::InvalidLongitude(_))
        ));
    }

    #[test]
    fn new_rejects_non_finite_components() {
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::NAN).is_err());
        assert!(GeoPoint::new(f64::INFINITY, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn validate_radius_accepts_positive() {
        assert_eq!(validate_radius(200_000.0).unwrap(), 200_000.0);
    }

    #[test]
    fn validate_radius_rejects_zero_and_negative() {
        assert!(validate_radius(0.0).is_err());
        assert!(validate_radius(-1.0).is_err());
    }

    #[test]
    fn validate_radius_rejects_non_finite() {
        assert!(validate_radius(f64::NAN).is_err());
        assert!(validate_radius(f64::INFINITY).is_err());
    }

    #[test]
    fn geopoint_serde_roundtrip() {
        let point = GeoPoint::new(48.8566, 2.3522).unwrap();
        let json = serde_json::to_string(&point).unwrap();
        let back: GeoPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(point, back);
    }
}
