//! Host-facing facade mirroring the plugin call surface.
//!
//! Operations return booleans and error-as-value results so a bridge
//! layer can forward them verbatim over a method-call channel: backend
//! faults resolve to `false` (or an error message), never a panic across
//! the boundary.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use tracing::warn;

use crate::geo::GeoPoint;
use crate::query::{MembershipEvent, RadiusQueryEngine};
use crate::store::{LocationStore, MemoryBackend, StoreBackend};

/// Result of a location lookup, as the host sees it.
///
/// Either both coordinates are present, or `error` carries a message.
/// An absent key is reported through `error` as a normal outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSnapshot {
    /// Latitude, when the key was found.
    pub latitude: Option<f64>,
    /// Longitude, when the key was found.
    pub longitude: Option<f64>,
    /// Failure or absence message, when the key was not found.
    pub error: Option<String>,
}

impl LocationSnapshot {
    fn found(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            latitude: None,
            longitude: None,
            error: Some(error.into()),
        }
    }

    /// Returns whether the lookup produced coordinates.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        self.error.is_none()
    }
}

/// Main entry point for host-driven geofencing.
///
/// Binds a store handle, forwards point mutations, and owns the radius
/// query engine whose event stream the host subscribes to.
///
/// # Example
///
/// ```
/// use geofence_core::{GeofenceCore, MembershipEvent};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let core = GeofenceCore::in_memory();
/// assert!(core.start("fleet").await);
/// assert!(core.set_location("bike-1", 0.1, 0.1).await);
///
/// let mut events = core.subscribe().await.unwrap();
/// assert!(core.configure_query(0.0, 0.0, 50_000.0).await);
///
/// assert!(matches!(
///     events.recv().await.unwrap(),
///     MembershipEvent::Entered { .. }
/// ));
/// # });
/// ```
pub struct GeofenceCore {
    backend: Arc<dyn StoreBackend>,
    store: RwLock<Option<Arc<LocationStore>>>,
    engine: RwLock<Option<Arc<RadiusQueryEngine>>>,
}

impl GeofenceCore {
    /// Creates a core over the given backend. No store handle is bound
    /// until [`start`](Self::start).
    #[must_use]
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self {
            backend,
            store: RwLock::new(None),
            engine: RwLock::new(None),
        }
    }

    /// Creates a core over a fresh in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Binds the store handle at `path` and returns whether it was
    /// acquired.
    ///
    /// Starting again rebinds the handle; a query configured against a
    /// previous handle is discarded with its subscriptions and must be
    /// configured afresh.
    pub async fn start(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }

        let store = Arc::new(LocationStore::new(Arc::clone(&self.backend), path));
        let engine = Arc::new(RadiusQueryEngine::new(Arc::clone(&store)));
        *self.store.write().await = Some(store);
        *self.engine.write().await = Some(engine);
        true
    }

    /// Writes the location for `id`. Validation and backend failures
    /// resolve to `false`.
    pub async fn set_location(&self, id: &str, latitude: f64, longitude: f64) -> bool {
        let Some(store) = self.current_store().await else {
            return false;
        };
        match store.put(id, latitude, longitude).await {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, id, "set location failed");
                false
            }
        }
    }

    /// Removes the location for `id`. Absence still counts as success.
    pub async fn remove_location(&self, id: &str) -> bool {
        let Some(store) = self.current_store().await else {
            return false;
        };
        match store.delete(id).await {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, id, "remove location failed");
                false
            }
        }
    }

    /// Looks up the location for `id`.
    ///
    /// An absent key yields a message in the snapshot's `error` field,
    /// never a panic.
    pub async fn get_location(&self, id: &str) -> LocationSnapshot {
        let Some(store) = self.current_store().await else {
            return LocationSnapshot::failed("The store has not been started");
        };
        match store.get(id).await {
            Ok(Some(record)) => LocationSnapshot::found(record.latitude, record.longitude),
            Ok(None) => {
                LocationSnapshot::failed(format!("There is no location for key {id} in the store"))
            }
            Err(err) => {
                LocationSnapshot::failed(format!("There was an error getting the location: {err}"))
            }
        }
    }

    /// Configures or re-centers the radius query. Returns whether the
    /// query is configured.
    ///
    /// `radius_meters` must be positive; coordinates must be in range.
    pub async fn configure_query(&self, latitude: f64, longitude: f64, radius_meters: f64) -> bool {
        let Some(engine) = self.current_engine().await else {
            return false;
        };
        let Ok(center) = GeoPoint::new(latitude, longitude) else {
            return false;
        };
        match engine.configure(center, radius_meters).await {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "configure query failed");
                false
            }
        }
    }

    /// Attaches the event-stream subscriber.
    ///
    /// Returns `None` until [`start`](Self::start) has bound a handle.
    /// A later call replaces the previous subscriber, whose stream ends.
    pub async fn subscribe(&self) -> Option<mpsc::UnboundedReceiver<MembershipEvent>> {
        let engine = self.current_engine().await?;
        Some(engine.subscribe().await)
    }

    /// Returns the sorted member keys of the live query, the snapshot a
    /// bridge pushes alongside `Ready`.
    pub async fn query_member_keys(&self) -> Vec<String> {
        match self.current_engine().await {
            Some(engine) => engine.member_keys().await,
            None => Vec::new(),
        }
    }

    /// Tears down the live query and its subscription. Idempotent;
    /// always reports success.
    pub async fn teardown(&self) -> bool {
        if let Some(engine) = self.current_engine().await {
            engine.teardown().await;
        }
        true
    }

    async fn current_store(&self) -> Option<Arc<LocationStore>> {
        self.store.read().await.clone()
    }

    async fn current_engine(&self) -> Option<Arc<RadiusQueryEngine>> {
        self.engine.read().await.clone()
    }
}

impl Default for GeofenceCore {
    fn default() -> Self {
        Self::in_memory()
    }
}
