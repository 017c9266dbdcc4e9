//! Core types for the location store.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// A stored entity location.
///
/// The record keeps the coordinates the caller wrote plus the geohash the
/// backend indexes them under. The geohash is derived from the coordinates
/// at write time and is what bucketed scans match against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Unique entity key.
    pub id: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Geohash index value for bucketed range reads.
    pub geohash: String,
}

impl LocationRecord {
    /// Returns the record's position as a point.
    #[must_use]
    pub const fn position(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// A single change observation from the backend's watch stream.
///
/// Observations arrive one at a time, in commit order. A watcher that
/// falls behind misses observations rather than receiving them late; the
/// query engine treats that the same as any other gap and relies on a
/// fresh configure for reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    /// A record was written or overwritten.
    Put(LocationRecord),
    /// A record was removed.
    Delete {
        /// Key of the removed record.
        id: String,
    },
    /// The backend connection was lost; no further observations follow
    /// until it recovers.
    Disconnected {
        /// Backend-provided failure description.
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> LocationRecord {
        LocationRecord {
            id: "rider-1".to_string(),
            latitude: 37.7749,
            longitude: -122.4194,
            geohash: "9q8yyk8ytp".to_string(),
        }
    }

    #[test]
    fn position_matches_fields() {
        let rec = record();
        let pos = rec.position();
        assert_eq!(pos.latitude, rec.latitude);
        assert_eq!(pos.longitude, rec.longitude);
    }

    #[test]
    fn record_serde_roundtrip() {
        let rec = record();
        let json = serde_json::to_string(&rec).unwrap();
        let back: LocationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, back);
    }

    #[test]
    fn record_json_field_names() {
        let json = serde_json::to_string(&record()).unwrap();
        assert!(json.contains("\"id\""));
        assert!(json.contains("\"latitude\""));
        assert!(json.contains("\"longitude\""));
        assert!(json.contains("\"geohash\""));
    }

    #[test]
    fn change_variants_compare() {
        let put = StoreChange::Put(record());
        assert_eq!(put, StoreChange::Put(record()));
        assert_ne!(
            put,
            StoreChange::Delete {
                id: "rider-1".to_string()
            }
        );
    }
}
