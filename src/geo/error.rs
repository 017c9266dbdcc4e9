//! Error types for coordinate validation and geohash encoding.

use thiserror::Error;

/// Error type for geospatial primitives.
#[derive(Error, Debug)]
pub enum GeoError {
    /// Latitude outside -90.0..=90.0 or non-finite.
    #[error("Invalid latitude: {0}")]
    InvalidLatitude(f64),

    /// Longitude outside -180.0..=180.0 or non-finite.
    #[error("Invalid longitude: {0}")]
    InvalidLongitude(f64),

    /// Radius not a positive, finite number of meters.
    #[error("Invalid radius: {0}")]
    InvalidRadius(f64),

    /// Geohash encoding failed.
    #[error("Geohash error: {0}")]
    Geohash(String),
}

/// Result type alias for geospatial operations.
pub type Result<T> = std::result::Result<T, GeoError>;
