//! # nf-relation
//!
//! Relation data bus abstraction for 5G network-function operators.
//!
//! A *relation* is a declared communication channel between two applications
//! managed by the external runtime, carrying a small key-value payload per
//! side. This library models that bus as an explicit store interface rather
//! than ambient global state:
//!
//! - [`RelationStore`]: per-handle key-value access to the bus
//! - [`EndpointRecord`]: the fixed-shape endpoint payload published by an NRF
//! - [`EndpointPublisher`]: leader-gated, idempotent publishing with
//!   best-effort fan-out across all established relations
//! - [`EndpointView`]: the requirer-side read-only view of a remote endpoint
//!
//! ## Invariants
//!
//! - Writes are single-writer: only the elected leader publishes.
//! - Publishing is idempotent: a record that already matches the stored data
//!   field-for-field performs zero writes.
//! - Fan-out is best-effort: one relation failing never aborts the rest.

mod error;
mod publisher;
mod record;
mod store;

pub use error::RelationError;
pub use publisher::{EndpointPublisher, Publish, PublishOutcome};
pub use record::{
    EndpointRecord, KEY_API_VERSION, KEY_FQDN, KEY_IPV4_ADDRESS, KEY_PORT,
};
pub use store::{EndpointView, InMemoryRelationStore, RelationHandle, RelationStore};
