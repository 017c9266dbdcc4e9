//! The radius query engine.
//!
//! Owns at most one live circle query against a [`LocationStore`] and
//! keeps its membership set consistent with the store, emitting ordered
//! [`MembershipEvent`]s to the attached subscriber.
//!
//! All query state lives behind one async mutex, so configure calls and
//! mutation evaluation serialize; the watch loop applies store
//! observations strictly one at a time.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::geo::{validate_radius, within_radius, GeoPoint};
use crate::store::{LocationStore, StoreChange};

use super::error::{QueryError, Result};
use super::types::{MembershipEvent, QueryState};

/// The one live circle query.
///
/// Re-configuration mutates these fields in place; the struct is never
/// swapped out while listeners are attached, so subscriptions stay valid
/// across re-centering.
struct CircleQuery {
    center: GeoPoint,
    radius_meters: f64,
    /// Current members with their last known positions. Positions are
    /// needed to suppress `Moved` events for writes that do not change
    /// a member's location.
    members: HashMap<String, GeoPoint>,
    state: QueryState,
}

impl CircleQuery {
    fn new(center: GeoPoint, radius_meters: f64) -> Self {
        Self {
            center,
            radius_meters,
            members: HashMap::new(),
            state: QueryState::Initializing,
        }
    }
}

/// The subscriber sink. Exactly one subscriber is active at a time; a new
/// subscription replaces the sender, closing the previous receiver's
/// stream.
type EventSink = Arc<Mutex<Option<mpsc::UnboundedSender<MembershipEvent>>>>;

/// Delivers an event to the active subscriber, if any.
///
/// Events emitted with no subscriber attached are discarded. A closed
/// receiver detaches the sink so later events stop trying.
async fn emit(sink: &EventSink, event: MembershipEvent) {
    let mut guard = sink.lock().await;
    if let Some(sender) = guard.as_ref() {
        if sender.send(event).is_err() {
            *guard = None;
        }
    }
}

/// Applies one store observation to the query, emitting the membership
/// delta it causes.
///
/// Observations with no query configured, or after the query errored,
/// are silently discarded.
async fn apply_change(
    query: &Mutex<Option<CircleQuery>>,
    sink: &EventSink,
    change: StoreChange,
) {
    let mut guard = query.lock().await;
    let Some(active) = guard.as_mut() else {
        return;
    };
    if !active.state.is_tracking() {
        return;
    }

    match change {
        StoreChange::Put(record) => {
            let position = record.position();
            let was_in = active.members.contains_key(&record.id);
            let is_in = within_radius(position, active.center, active.radius_meters);

            match (was_in, is_in) {
                (false, true) => {
                    active.members.insert(record.id.clone(), position);
                    emit(
                        sink,
                        MembershipEvent::Entered {
                            id: record.id,
                            latitude: record.latitude,
                            longitude: record.longitude,
                        },
                    )
                    .await;
                }
                (true, false) => {
                    active.members.remove(&record.id);
                    emit(sink, MembershipEvent::Exited { id: record.id }).await;
                }
                (true, true) => {
                    // Moved only when the position actually changed.
                    let previous = active.members.insert(record.id.clone(), position);
                    if previous != Some(position) {
                        emit(
                            sink,
                            MembershipEvent::Moved {
                                id: record.id,
                                latitude: record.latitude,
                                longitude: record.longitude,
                            },
                        )
                        .await;
                    }
                }
                (false, false) => {}
            }
        }
        StoreChange::Delete { id } => {
            if active.members.remove(&id).is_some() {
                emit(sink, MembershipEvent::Exited { id }).await;
            }
        }
        StoreChange::Disconnected { detail } => {
            warn!(%detail, "store watch disconnected");
            active.state = QueryState::Errored;
            emit(sink, MembershipEvent::Error { detail }).await;
        }
    }
}

/// Maintains one live circle query and streams membership changes.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use geofence_core::geo::GeoPoint;
/// use geofence_core::query::{MembershipEvent, RadiusQueryEngine};
/// use geofence_core::store::{LocationStore, MemoryBackend};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let store = Arc::new(LocationStore::new(Arc::new(MemoryBackend::new()), "fleet"));
/// store.put("van-1", 0.1, 0.1).await.unwrap();
///
/// let engine = RadiusQueryEngine::new(Arc::clone(&store));
/// let mut events = engine.subscribe().await;
///
/// let center = GeoPoint::new(0.0, 0.0).unwrap();
/// engine.configure(center, 50_000.0).await.unwrap();
///
/// assert!(matches!(
///     events.recv().await.unwrap(),
///     MembershipEvent::Entered { .. }
/// ));
/// assert_eq!(events.recv().await.unwrap(), MembershipEvent::Ready);
/// # });
/// ```
pub struct RadiusQueryEngine {
    store: Arc<LocationStore>,
    query: Arc<Mutex<Option<CircleQuery>>>,
    sink: EventSink,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl RadiusQueryEngine {
    /// Creates an engine over the given store. No query is configured yet.
    #[must_use]
    pub fn new(store: Arc<LocationStore>) -> Self {
        Self {
            store,
            query: Arc::new(Mutex::new(None)),
            sink: Arc::new(Mutex::new(None)),
            watcher: Mutex::new(None),
        }
    }

    /// Configures the circle query, creating it on first call and
    /// mutating center and radius in place afterwards.
    ///
    /// On a fresh query, every qualifying record is announced as
    /// `Entered` in scan order, followed by one `Ready`. On
    /// re-configuration only the symmetric-difference deltas against the
    /// previous membership are emitted (new members `Entered`, dropped
    /// members `Exited`, unaffected ids silent), again followed by
    /// `Ready`. A configure after a backend failure performs the same
    /// delta pass against the last consistent membership, which is the
    /// reconciliation path.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Validation`] for a non-positive radius, or
    /// [`QueryError::Backend`] when the scan fails — in which case the
    /// query is left in the errored state and a single
    /// [`MembershipEvent::Error`] is emitted.
    pub async fn configure(&self, center: GeoPoint, radius_meters: f64) -> Result<()> {
        let radius_meters = validate_radius(radius_meters)?;

        let mut guard = self.query.lock().await;
        let query = guard.get_or_insert_with(|| CircleQuery::new(center, radius_meters));
        query.center = center;
        query.radius_meters = radius_meters;
        query.state = QueryState::Initializing;
        let previous = std::mem::take(&mut query.members);

        let scan_result = match self.ensure_watching().await {
            Ok(()) => self
                .store
                .scan_radius(center, radius_meters)
                .await
                .map_err(QueryError::from),
            Err(err) => Err(err),
        };
        let scanned = match scan_result {
            Ok(records) => records,
            Err(err) => {
                // Keep the last consistent membership: stale, not corrupted.
                query.members = previous;
                query.state = QueryState::Errored;
                emit(
                    &self.sink,
                    MembershipEvent::Error {
                        detail: err.to_string(),
                    },
                )
                .await;
                return Err(err);
            }
        };

        let mut next: HashMap<String, GeoPoint> = HashMap::with_capacity(scanned.len());
        for record in &scanned {
            next.insert(record.id.clone(), record.position());
        }

        for record in &scanned {
            if !previous.contains_key(&record.id) {
                emit(
                    &self.sink,
                    MembershipEvent::Entered {
                        id: record.id.clone(),
                        latitude: record.latitude,
                        longitude: record.longitude,
                    },
                )
                .await;
            }
        }

        let mut exited: Vec<String> = previous
            .keys()
            .filter(|id| !next.contains_key(id.as_str()))
            .cloned()
            .collect();
        exited.sort();
        for id in exited {
            emit(&self.sink, MembershipEvent::Exited { id }).await;
        }

        debug!(members = next.len(), "query configured");
        query.members = next;
        query.state = QueryState::Ready;
        emit(&self.sink, MembershipEvent::Ready).await;
        Ok(())
    }

    /// Attaches a subscriber and returns its event stream.
    ///
    /// Only one subscriber is active at a time: a later call replaces the
    /// sink and the previous receiver's stream ends. Re-subscribing does
    /// not disturb the query itself.
    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<MembershipEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        *self.sink.lock().await = Some(sender);
        receiver
    }

    /// Tears the query down: detaches the subscriber and returns to the
    /// unconfigured state.
    ///
    /// Idempotent. Store observations arriving afterwards are silently
    /// discarded until the next configure.
    pub async fn teardown(&self) {
        self.sink.lock().await.take();
        if self.query.lock().await.take().is_some() {
            debug!("query torn down");
        }
    }

    /// Returns the query's lifecycle state.
    pub async fn state(&self) -> QueryState {
        self.query
            .lock()
            .await
            .as_ref()
            .map_or(QueryState::Unconfigured, |query| query.state)
    }

    /// Returns the currently-known member keys, sorted.
    ///
    /// This is the snapshot a bridge layer pushes alongside the `Ready`
    /// event.
    pub async fn member_keys(&self) -> Vec<String> {
        let guard = self.query.lock().await;
        let mut keys: Vec<String> = guard
            .as_ref()
            .map(|query| query.members.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Spawns the store watch loop once per engine.
    async fn ensure_watching(&self) -> Result<()> {
        let mut watcher = self.watcher.lock().await;
        if watcher.is_some() {
            return Ok(());
        }

        let mut changes = self.store.watch().await.map_err(QueryError::from)?;
        let query = Arc::clone(&self.query);
        let sink = Arc::clone(&self.sink);

        let handle = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => apply_change(&query, &sink, change).await,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        // Missed observations are not replayed; the caller
                        // reconciles with a fresh configure.
                        warn!(missed, "watch stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        *watcher = Some(handle);
        Ok(())
    }
}

impl Drop for RadiusQueryEngine {
    fn drop(&mut self) {
        if let Ok(mut watcher) = self.watcher.try_lock() {
            if let Some(handle) = watcher.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;

    fn engine() -> RadiusQueryEngine {
        let backend = Arc::new(MemoryBackend::new());
        RadiusQueryEngine::new(Arc::new(LocationStore::new(backend, "test")))
    }

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    #[tokio::test]
    async fn starts_unconfigured() {
        assert_eq!(engine().state().await, QueryState::Unconfigured);
    }

    #[tokio::test]
    async fn configure_rejects_non_positive_radius() {
        let engine = engine();
        let err = engine.configure(point(0.0, 0.0), 0.0).await.unwrap_err();
        assert!(matches!(err, QueryError::Validation(_)));
        assert_eq!(engine.state().await, QueryState::Unconfigured);
    }

    #[tokio::test]
    async fn configure_reaches_ready_on_empty_store() {
        let engine = engine();
        engine.configure(point(0.0, 0.0), 1_000.0).await.unwrap();
        assert_eq!(engine.state().await, QueryState::Ready);
        assert!(engine.member_keys().await.is_empty());
    }

    #[tokio::test]
    async fn teardown_is_idempotent() {
        let engine = engine();
        engine.configure(point(0.0, 0.0), 1_000.0).await.unwrap();

        engine.teardown().await;
        engine.teardown().await;
        assert_eq!(engine.state().await, QueryState::Unconfigured);
    }

    #[tokio::test]
    async fn subscribe_replaces_previous_sink() {
        let engine = engine();
        let mut first = engine.subscribe().await;
        let mut second = engine.subscribe().await;

        engine.configure(point(0.0, 0.0), 1_000.0).await.unwrap();

        // The replaced stream ended; the active one got Ready.
        assert!(first.recv().await.is_none());
        assert_eq!(second.recv().await.unwrap(), MembershipEvent::Ready);
    }

    #[tokio::test]
    async fn events_without_subscriber_are_discarded() {
        let engine = engine();
        engine.configure(point(0.0, 0.0), 1_000.0).await.unwrap();

        // Subscribing after the fact yields a live but empty stream.
        let mut events = engine.subscribe().await;
        engine.teardown().await;
        assert!(events.recv().await.is_none());
    }
}
