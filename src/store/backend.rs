//! The document-store backend seam.
//!
//! The remote document store (persistence, replication, authentication) is
//! an external collaborator. The crate only depends on this trait, so a
//! real client binds at the same seam the in-memory reference backend does.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::error::Result;
use super::types::{LocationRecord, StoreChange};

/// Asynchronous keyed location storage with change notification.
///
/// All operations complete exactly once, asynchronously. `root` namespaces
/// records the way a document path does; records under different roots are
/// invisible to each other.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Writes or overwrites a record under `root`.
    async fn put(&self, root: &str, record: LocationRecord) -> Result<()>;

    /// Removes a record. Removing an absent key succeeds.
    async fn delete(&self, root: &str, id: &str) -> Result<()>;

    /// Reads a record by key. Absent keys yield `Ok(None)`.
    async fn get(&self, root: &str, id: &str) -> Result<Option<LocationRecord>>;

    /// Returns all records whose geohash starts with `prefix`, in key order.
    ///
    /// An empty prefix matches every record under the root. A real backend
    /// serves this as an indexed range read on the geohash value; the
    /// caller narrows the prefix set with circle covering.
    async fn scan_prefix(&self, root: &str, prefix: &str) -> Result<Vec<LocationRecord>>;

    /// Subscribes to change observations for `root`.
    ///
    /// Observations are delivered in commit order, starting from the
    /// moment of subscription. Past mutations are not replayed.
    async fn watch(&self, root: &str) -> Result<broadcast::Receiver<StoreChange>>;
}
