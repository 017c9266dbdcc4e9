//! In-memory reference backend.
//!
//! Keeps every root's records in a key-ordered map and broadcasts change
//! observations to watchers. Used as the default backend and by the test
//! suites; a remote document-store client replaces it behind the same
//! trait in production deployments.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use super::backend::StoreBackend;
use super::error::{Result, StoreError};
use super::types::{LocationRecord, StoreChange};

/// Capacity of each root's change-observation channel.
///
/// A watcher that falls more than this far behind starts missing
/// observations, the same failure mode a disconnected remote watch has.
const WATCH_CHANNEL_CAPACITY: usize = 256;

/// In-memory [`StoreBackend`] with simulated-outage support.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use geofence_core::store::{LocationStore, MemoryBackend};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let backend = Arc::new(MemoryBackend::new());
/// let store = LocationStore::new(backend, "drivers");
/// store.put("driver-1", 37.7749, -122.4194).await.unwrap();
/// assert!(store.get("driver-1").await.unwrap().is_some());
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    /// Records per root, ordered by key.
    roots: RwLock<HashMap<String, BTreeMap<String, LocationRecord>>>,
    /// Change broadcasters per root.
    watchers: RwLock<HashMap<String, broadcast::Sender<StoreChange>>>,
    /// When set, every operation fails with this detail.
    outage: RwLock<Option<String>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a backend outage.
    ///
    /// All subsequent operations fail with `detail` until [`Self::restore`]
    /// is called, and every watcher receives one
    /// [`StoreChange::Disconnected`] observation.
    pub async fn simulate_outage(&self, detail: &str) {
        *self.outage.write().await = Some(detail.to_string());

        let watchers = self.watchers.read().await;
        for sender in watchers.values() {
            let _ = sender.send(StoreChange::Disconnected {
                detail: detail.to_string(),
            });
        }
    }

    /// Clears a simulated outage. Missed mutations are not replayed.
    pub async fn restore(&self) {
        *self.outage.write().await = None;
    }

    async fn check_available(&self) -> Result<()> {
        match self.outage.read().await.as_ref() {
            Some(detail) => Err(StoreError::Backend(detail.clone())),
            None => Ok(()),
        }
    }

    async fn notify(&self, root: &str, change: StoreChange) {
        let watchers = self.watchers.read().await;
        if let Some(sender) = watchers.get(root) {
            // Send only fails when no watcher is subscribed.
            let _ = sender.send(change);
        }
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn put(&self, root: &str, record: LocationRecord) -> Result<()> {
        self.check_available().await?;

        {
            let mut roots = self.roots.write().await;
            roots
                .entry(root.to_string())
                .or_default()
                .insert(record.id.clone(), record.clone());
        }

        self.notify(root, StoreChange::Put(record)).await;
        Ok(())
    }

    async fn delete(&self, root: &str, id: &str) -> Result<()> {
        self.check_available().await?;

        let removed = {
            let mut roots = self.roots.write().await;
            roots
                .get_mut(root)
                .and_then(|records| records.remove(id))
                .is_some()
        };

        if removed {
            self.notify(root, StoreChange::Delete { id: id.to_string() })
                .await;
        }
        Ok(())
    }

    async fn get(&self, root: &str, id: &str) -> Result<Option<LocationRecord>> {
        self.check_available().await?;

        let roots = self.roots.read().await;
        Ok(roots.get(root).and_then(|records| records.get(id)).cloned())
    }

    async fn scan_prefix(&self, root: &str, prefix: &str) -> Result<Vec<LocationRecord>> {
        self.check_available().await?;

        let roots = self.roots.read().await;
        let Some(records) = roots.get(root) else {
            return Ok(Vec::new());
        };

        Ok(records
            .values()
            .filter(|record| record.geohash.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn watch(&self, root: &str) -> Result<broadcast::Receiver<StoreChange>> {
        self.check_available().await?;

        let mut watchers = self.watchers.write().await;
        let sender = watchers
            .entry(root.to_string())
            .or_insert_with(|| broadcast::channel(WATCH_CHANNEL_CAPACITY).0);
        Ok(sender.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, lat: f64, lng: f64, geohash: &str) -> LocationRecord {
        LocationRecord {
            id: id.to_string(),
            latitude: lat,
            longitude: lng,
            geohash: geohash.to_string(),
        }
    }

    #[tokio::test]
    async fn put_then_get_returns_record() {
        let backend = MemoryBackend::new();
        let rec = record("a", 1.0, 2.0, "s00twy01mt");

        backend.put("root", rec.clone()).await.unwrap();
        let got = backend.get("root", "a").await.unwrap();

        assert_eq!(got, Some(rec));
    }

    #[tokio::test]
    async fn get_absent_key_returns_none() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("root", "missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_absent_key_succeeds() {
        let backend = MemoryBackend::new();
        assert!(backend.delete("root", "missing").await.is_ok());
    }

    #[tokio::test]
    async fn roots_are_isolated() {
        let backend = MemoryBackend::new();
        backend
            .put("a", record("k", 1.0, 1.0, "s00twy01mt"))
            .await
            .unwrap();

        assert_eq!(backend.get("b", "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn scan_prefix_filters_by_geohash() {
        let backend = MemoryBackend::new();
        backend
            .put("root", record("near", 0.0, 0.0, "s000000000"))
            .await
            .unwrap();
        backend
            .put("root", record("far", 10.0, 10.0, "s1z0gs3y0z"))
            .await
            .unwrap();

        let hits = backend.scan_prefix("root", "s0").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "near");
    }

    #[tokio::test]
    async fn scan_empty_prefix_returns_everything_in_key_order() {
        let backend = MemoryBackend::new();
        backend
            .put("root", record("b", 1.0, 1.0, "s00twy01mt"))
            .await
            .unwrap();
        backend
            .put("root", record("a", 2.0, 2.0, "s037ms06g7"))
            .await
            .unwrap();

        let all = backend.scan_prefix("root", "").await.unwrap();
        let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn watch_observes_put_and_delete() {
        let backend = MemoryBackend::new();
        let mut changes = backend.watch("root").await.unwrap();

        let rec = record("a", 1.0, 2.0, "s00twy01mt");
        backend.put("root", rec.clone()).await.unwrap();
        backend.delete("root", "a").await.unwrap();

        assert_eq!(changes.recv().await.unwrap(), StoreChange::Put(rec));
        assert_eq!(
            changes.recv().await.unwrap(),
            StoreChange::Delete {
                id: "a".to_string()
            }
        );
    }

    #[tokio::test]
    async fn watch_does_not_replay_past_mutations() {
        let backend = MemoryBackend::new();
        backend
            .put("root", record("a", 1.0, 2.0, "s00twy01mt"))
            .await
            .unwrap();

        let mut changes = backend.watch("root").await.unwrap();
        backend.delete("root", "a").await.unwrap();

        // The only observation is the delete that happened after subscribing.
        assert_eq!(
            changes.recv().await.unwrap(),
            StoreChange::Delete {
                id: "a".to_string()
            }
        );
    }

    #[tokio::test]
    async fn delete_of_absent_key_emits_no_observation() {
        let backend = MemoryBackend::new();
        let mut changes = backend.watch("root").await.unwrap();

        backend.delete("root", "ghost").await.unwrap();
        backend
            .put("root", record("a", 1.0, 2.0, "s00twy01mt"))
            .await
            .unwrap();

        // First observation is the put; the no-op delete was silent.
        assert!(matches!(
            changes.recv().await.unwrap(),
            StoreChange::Put(_)
        ));
    }

    #[tokio::test]
    async fn outage_fails_operations_and_notifies_watchers() {
        let backend = MemoryBackend::new();
        let mut changes = backend.watch("root").await.unwrap();

        backend.simulate_outage("connection reset").await;

        let err = backend
            .put("root", record("a", 1.0, 2.0, "s00twy01mt"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        assert_eq!(
            changes.recv().await.unwrap(),
            StoreChange::Disconnected {
                detail: "connection reset".to_string()
            }
        );
    }

    #[tokio::test]
    async fn restore_clears_outage() {
        let backend = MemoryBackend::new();
        backend.simulate_outage("gone").await;
        backend.restore().await;

        assert!(backend
            .put("root", record("a", 1.0, 2.0, "s00twy01mt"))
            .await
            .is_ok());
    }
}
