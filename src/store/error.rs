//! Error types for location store operations.

use thiserror::Error;

use crate::geo::GeoError;

/// Error type for store operations.
///
/// Absence of a key is NOT an error: `get` reports it as `Ok(None)` and
/// `delete` of a missing key succeeds.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Input rejected before any backend interaction.
    #[error("Validation error: {0}")]
    Validation(#[from] GeoError),

    /// Connectivity, permission, or remote-store fault.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        let err = StoreError::Validation(GeoError::InvalidLatitude(95.0));
        assert_eq!(err.to_string(), "Validation error: Invalid latitude: 95");
    }

    #[test]
    fn backend_error_display() {
        let err = StoreError::Backend("connection refused".to_string());
        assert_eq!(err.to_string(), "Backend error: connection refused");
    }

    #[test]
    fn geo_error_converts_to_validation() {
        let err: StoreError = GeoError::InvalidRadius(0.0).into();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
