//! Leader-gated, idempotent endpoint publishing.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::RelationError;
use crate::record::EndpointRecord;
use crate::store::{RelationHandle, RelationStore};

/// What a single publish did to the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publish {
    /// The record was written.
    Written,

    /// The stored record already matched; no write performed.
    Unchanged,
}

/// Result of a best-effort fan-out across all established relations.
#[derive(Debug, Default)]
pub struct PublishOutcome {
    /// Handles that were attempted.
    pub attempted: usize,

    /// Handles whose stored record already matched (no write performed).
    pub unchanged: usize,

    /// Per-handle failures. Non-empty means a partial publish: the
    /// remaining handles were still attempted.
    pub failures: Vec<(RelationHandle, RelationError)>,
}

impl PublishOutcome {
    /// Whether every attempted handle now holds the record.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Publishes [`EndpointRecord`]s into the relation data bus.
///
/// Leadership is an injected capability: the election itself happens in the
/// external runtime, this side only sees the outcome. Non-leaders are
/// rejected before any store access.
pub struct EndpointPublisher {
    store: Arc<dyn RelationStore>,
    is_leader: bool,
}

impl EndpointPublisher {
    /// Create a publisher over a store with a pre-computed leadership flag.
    pub fn new(store: Arc<dyn RelationStore>, is_leader: bool) -> Self {
        Self { store, is_leader }
    }

    /// Whether this unit holds leadership.
    pub fn is_leader(&self) -> bool {
        self.is_leader
    }

    /// Write `record` into one relation, skipping the write when the stored
    /// data already matches field-for-field.
    ///
    /// The idempotence check prevents redundant relation-data churn: every
    /// write fans out as a change event to the remote side, so rewriting an
    /// identical record would cause event storms in the external runtime.
    ///
    /// # Errors
    ///
    /// [`RelationError::NotLeader`] when this unit is not the leader,
    /// [`RelationError::NotEstablished`] when the handle is unknown, or a
    /// store error from the underlying bus.
    pub fn publish(
        &self,
        handle: RelationHandle,
        record: &EndpointRecord,
    ) -> Result<Publish, RelationError> {
        if !self.is_leader {
            return Err(RelationError::NotLeader);
        }

        let current = self.store.get(handle)?;
        if EndpointRecord::from_map(&current).as_ref() == Some(record) {
            debug!(%handle, "Endpoint record unchanged, skipping write");
            return Ok(Publish::Unchanged);
        }

        self.store.put(handle, record.to_map())?;
        info!(
            %handle,
            fqdn = %record.fqdn,
            port = %record.port,
            "Published endpoint record"
        );
        Ok(Publish::Written)
    }

    /// Publish `record` to every established relation, best-effort.
    ///
    /// A failure on one handle never prevents attempts on the others;
    /// failures are collected in the returned [`PublishOutcome`].
    ///
    /// # Errors
    ///
    /// [`RelationError::NotLeader`] when this unit is not the leader.
    pub fn publish_all(&self, record: &EndpointRecord) -> Result<PublishOutcome, RelationError> {
        if !self.is_leader {
            return Err(RelationError::NotLeader);
        }

        let mut outcome = PublishOutcome::default();
        for handle in self.store.handles() {
            outcome.attempted += 1;
            match self.publish(handle, record) {
                Ok(Publish::Written) => {}
                Ok(Publish::Unchanged) => outcome.unchanged += 1,
                Err(e) => {
                    warn!(%handle, error = %e, "Failed to publish endpoint record");
                    outcome.failures.push((handle, e));
                }
            }
        }
        Ok(outcome)
    }
}
