//! Validating location store over a backend handle.

use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::broadcast;
use tracing::debug;

use crate::geo::{
    covering_prefixes, encode_geohash, within_radius, GeoPoint, STORED_GEOHASH_PRECISION,
};

use super::backend::StoreBackend;
use super::error::Result;
use super::types::{LocationRecord, StoreChange};

/// Keyed location storage bound to one backend root.
///
/// The store validates coordinates before any backend interaction, derives
/// the geohash index value for each write, and exposes the bucketed radius
/// scan the query engine's initial sync runs on.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use geofence_core::store::{LocationStore, MemoryBackend};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let store = LocationStore::new(Arc::new(MemoryBackend::new()), "couriers");
///
/// store.put("courier-7", 52.5200, 13.4050).await.unwrap();
/// let record = store.get("courier-7").await.unwrap().unwrap();
/// assert_eq!(record.latitude, 52.5200);
///
/// store.delete("courier-7").await.unwrap();
/// assert!(store.get("courier-7").await.unwrap().is_none());
/// # });
/// ```
pub struct LocationStore {
    backend: Arc<dyn StoreBackend>,
    root: String,
}

impl LocationStore {
    /// Creates a store bound to `root` on the given backend.
    pub fn new(backend: Arc<dyn StoreBackend>, root: impl Into<String>) -> Self {
        Self {
            backend,
            root: root.into(),
        }
    }

    /// Returns the backend root this store is bound to.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Writes or overwrites the location for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for out-of-range coordinates
    /// (rejected before any backend interaction) or
    /// [`StoreError::Backend`] on a backend fault.
    ///
    /// [`StoreError::Validation`]: super::StoreError::Validation
    /// [`StoreError::Backend`]: super::StoreError::Backend
    pub async fn put(&self, id: &str, latitude: f64, longitude: f64) -> Result<()> {
        let point = GeoPoint::new(latitude, longitude)?;
        let geohash = encode_geohash(point, STORED_GEOHASH_PRECISION)?;

        debug!(root = %self.root, id, "put location");
        self.backend
            .put(
                &self.root,
                LocationRecord {
                    id: id.to_string(),
                    latitude,
                    longitude,
                    geohash,
                },
            )
            .await
    }

    /// Removes the location for `id`. Absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on a backend fault.
    ///
    /// [`StoreError::Backend`]: super::StoreError::Backend
    pub async fn delete(&self, id: &str) -> Result<()> {
        debug!(root = %self.root, id, "delete location");
        self.backend.delete(&self.root, id).await
    }

    /// Reads the location for `id`. Absent keys yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on a backend fault.
    ///
    /// [`StoreError::Backend`]: super::StoreError::Backend
    pub async fn get(&self, id: &str) -> Result<Option<LocationRecord>> {
        self.backend.get(&self.root, id).await
    }

    /// Returns every record within `radius_meters` of `center`, in bucket
    /// scan order.
    ///
    /// Reads only the geohash buckets that can contain members, then
    /// filters by exact great-circle distance (a record exactly at the
    /// radius is a member).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on a backend fault.
    ///
    /// [`StoreError::Backend`]: super::StoreError::Backend
    pub async fn scan_radius(
        &self,
        center: GeoPoint,
        radius_meters: f64,
    ) -> Result<Vec<LocationRecord>> {
        let prefixes = covering_prefixes(center, radius_meters);
        debug!(
            root = %self.root,
            buckets = prefixes.len(),
            "radius scan"
        );

        let buckets = try_join_all(
            prefixes
                .iter()
                .map(|prefix| self.backend.scan_prefix(&self.root, prefix)),
        )
        .await?;

        Ok(buckets
            .into_iter()
            .flatten()
            .filter(|record| within_radius(record.position(), center, radius_meters))
            .collect())
    }

    /// Subscribes to change observations for this store's root.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on a backend fault.
    ///
    /// [`StoreError::Backend`]: super::StoreError::Backend
    pub async fn watch(&self) -> Result<broadcast::Receiver<StoreChange>> {
        self.backend.watch(&self.root).await
    }
}
