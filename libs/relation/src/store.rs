//! Relation store interface and in-memory implementation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::RelationError;
use crate::record::EndpointRecord;

/// Opaque identifier for one established relation instance.
///
/// Multiple relations of the same type may exist concurrently, one per
/// consumer application; each carries its own data payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationHandle(pub u32);

impl fmt::Display for RelationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "relation-{}", self.0)
    }
}

/// Per-handle key-value access to the relation data bus.
///
/// The bus itself lives in the external runtime; implementations of this
/// trait adapt it. Operations are synchronous hook-tool style calls and may
/// fail independently of each other.
pub trait RelationStore: Send + Sync {
    /// All currently established relation handles of the declared type.
    fn handles(&self) -> Vec<RelationHandle>;

    /// Read this side's data payload for a relation.
    ///
    /// # Errors
    ///
    /// Returns [`RelationError::NotEstablished`] when the handle does not
    /// refer to an established relation.
    fn get(&self, handle: RelationHandle) -> Result<BTreeMap<String, String>, RelationError>;

    /// Overwrite this side's data payload for a relation.
    ///
    /// # Errors
    ///
    /// Returns [`RelationError::NotEstablished`] when the handle does not
    /// refer to an established relation, or [`RelationError::Store`] when
    /// the underlying bus rejects the write.
    fn put(
        &self,
        handle: RelationHandle,
        data: BTreeMap<String, String>,
    ) -> Result<(), RelationError>;
}

/// In-memory relation store for tests and local drivers.
#[derive(Default)]
pub struct InMemoryRelationStore {
    relations: Mutex<BTreeMap<RelationHandle, BTreeMap<String, String>>>,

    /// Count of `put` calls, for asserting idempotence.
    writes: AtomicU64,
}

impl InMemoryRelationStore {
    /// Create an empty store with no established relations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Establish a relation with an empty data payload.
    pub fn add_relation(&self, handle: RelationHandle) {
        let mut relations = self.relations.lock().unwrap_or_else(|e| e.into_inner());
        relations.entry(handle).or_default();
    }

    /// Number of writes performed so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }
}

impl RelationStore for InMemoryRelationStore {
    fn handles(&self) -> Vec<RelationHandle> {
        let relations = self.relations.lock().unwrap_or_else(|e| e.into_inner());
        relations.keys().copied().collect()
    }

    fn get(&self, handle: RelationHandle) -> Result<BTreeMap<String, String>, RelationError> {
        let relations = self.relations.lock().unwrap_or_else(|e| e.into_inner());
        relations
            .get(&handle)
            .cloned()
            .ok_or(RelationError::NotEstablished(handle))
    }

    fn put(
        &self,
        handle: RelationHandle,
        data: BTreeMap<String, String>,
    ) -> Result<(), RelationError> {
        let mut relations = self.relations.lock().unwrap_or_else(|e| e.into_inner());
        let entry = relations
            .get_mut(&handle)
            .ok_or(RelationError::NotEstablished(handle))?;
        *entry = data;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Requirer-side view of a remote application's published endpoint.
///
/// Reports an endpoint only once all four record keys are present in the
/// relation data; partial data is treated as "not yet available".
pub struct EndpointView<'a> {
    store: &'a dyn RelationStore,
}

impl<'a> EndpointView<'a> {
    /// Create a view over a store holding the remote side's data.
    pub fn new(store: &'a dyn RelationStore) -> Self {
        Self { store }
    }

    /// The remote endpoint, if fully published.
    pub fn endpoint(&self) -> Option<EndpointRecord> {
        let handle = self.store.handles().into_iter().next()?;
        let data = self.store.get(handle).ok()?;
        EndpointRecord::from_map(&data)
    }

    /// Whether a complete endpoint record has been published.
    pub fn endpoint_available(&self) -> bool {
        self.endpoint().is_some()
    }
}
