//! NRF Operator Library
//!
//! Operator for the OAI 5G Core NRF (Network Repository Function). It
//! renders the workload configuration file, pushes it into the workload
//! container, (re)starts the NRF under the container supervisor, and
//! publishes the NRF endpoint to consumer applications over the relation
//! data bus once the workload is ready.
//!
//! ## Architecture
//!
//! - **Operator**: Event-dispatch driver; executes decided actions through
//!   the adapters and tracks unit status
//! - **Reconciler** (`nf-reconcile`): Pure decision core
//! - **Workload Supervisor**: Abstracts the container supervisor (mock in
//!   dev, real transport in prod)
//! - **Relation bus** (`nf-relation`): Idempotent, leader-gated endpoint
//!   publishing
//!
//! ## Modules
//!
//! - `config`: Operator and workload configuration
//! - `render`: `nrf.conf` document renderer
//! - `layer`: Supervision layer builder
//! - `workload`: Supervisor adapter trait and mock
//! - `probe`: Pluggable readiness probes
//! - `expose`: Service port declaration
//! - `operator`: The event loop driver

pub mod config;
pub mod expose;
pub mod layer;
pub mod operator;
pub mod probe;
pub mod render;
pub mod workload;

// Re-export commonly used types
pub use config::{Config, ConfigError, ServiceConfig};
pub use operator::{Operator, OperatorError};
pub use probe::{AlwaysListening, ReadinessProbe, StaticProbe, TcpProbe};
pub use workload::{MockSupervisor, SupervisorError, WorkloadSupervisor};
