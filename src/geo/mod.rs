//! Geospatial primitives for the radius query engine.
//!
//! Provides:
//! - Validated coordinate and radius types
//! - Great-circle (haversine) distance for membership testing
//! - Geohash encoding and circle-covering prefix computation for
//!   bucketed store scans
//!
//! Membership is always decided by exact great-circle distance; geohash
//! buckets only narrow which records a scan has to look at.

pub mod cover;
pub mod distance;
pub mod error;
pub mod types;

pub use cover::{covering_prefixes, encode_geohash, STORED_GEOHASH_PRECISION};
pub use distance::{distance_meters, within_radius};
pub use error::{GeoError, Result};
pub use types::{validate_radius, GeoPoint};
