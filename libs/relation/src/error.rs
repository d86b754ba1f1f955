//! Error types for relation data access.

use thiserror::Error;

use crate::store::RelationHandle;

/// Errors that can occur when reading or writing relation data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelationError {
    /// The relation handle does not refer to an established relation.
    ///
    /// Given the runtime's delivery guarantees (a relation-joined event
    /// always refers to an existing relation) this indicates a contract
    /// violation on the caller's side, not a transient condition.
    #[error("relation {0} not established")]
    NotEstablished(RelationHandle),

    /// The caller is not the elected leader and may not write relation data.
    #[error("only the leader unit may write relation data")]
    NotLeader,

    /// The underlying store failed.
    #[error("relation store error: {0}")]
    Store(String),
}
