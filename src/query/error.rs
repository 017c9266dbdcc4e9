//! Error types for radius query operations.

use thiserror::Error;

use crate::geo::GeoError;
use crate::store::StoreError;

/// Error type for query configuration.
///
/// Runtime failures on the event path are not errors here; they surface
/// as a single [`MembershipEvent::Error`] on the stream.
///
/// [`MembershipEvent::Error`]: super::MembershipEvent::Error
#[derive(Error, Debug)]
pub enum QueryError {
    /// Invalid center or radius, rejected before touching the store.
    #[error("Validation error: {0}")]
    Validation(#[from] GeoError),

    /// The store failed during the configuration scan.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(geo) => Self::Validation(geo),
            StoreError::Backend(detail) => Self::Backend(detail),
        }
    }
}

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
