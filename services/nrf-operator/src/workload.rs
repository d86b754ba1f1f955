//! Workload supervisor interface and mock implementation.
//!
//! The supervisor interface abstracts the container supervisor the workload
//! runs under:
//! - Pushing files into the container
//! - Applying supervision layers and restarting services
//! - Connectivity and service-state checks
//!
//! The operator never inspects the underlying mechanism; it only sees these
//! capabilities. A mock implementation is provided for testing and
//! development.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::layer::SupervisionLayer;

/// I/O or process-management failures from the container supervisor.
///
/// All variants are retryable: the triggering event is deferred and
/// redelivered rather than discarded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SupervisorError {
    /// The supervisor is not reachable.
    #[error("cannot reach workload supervisor: {0}")]
    Unreachable(String),

    /// A file push failed.
    #[error("failed to push {path}: {reason}")]
    Push { path: String, reason: String },

    /// Applying the supervision layer failed.
    #[error("failed to apply supervision layer: {0}")]
    Layer(String),

    /// Restarting a service failed.
    #[error("failed to restart service {service}: {reason}")]
    Restart { service: String, reason: String },
}

/// Container supervisor interface.
///
/// All operations are potentially blocking I/O against the workload's
/// execution environment and may fail independently of each other.
#[async_trait]
pub trait WorkloadSupervisor: Send + Sync {
    /// Whether the supervisor is reachable.
    async fn can_connect(&self) -> bool;

    /// Push a file into the workload container.
    async fn push_config(&self, path: &str, content: &str) -> Result<(), SupervisorError>;

    /// Whether a file exists in the workload container.
    async fn config_exists(&self, path: &str) -> bool;

    /// Apply a supervision layer, replacing any previous layer of the same
    /// service.
    async fn apply_layer(&self, layer: &SupervisionLayer) -> Result<(), SupervisorError>;

    /// Whether a supervised service reports running.
    async fn is_service_running(&self, service: &str) -> bool;

    /// Restart a supervised service.
    async fn restart_service(&self, service: &str) -> Result<(), SupervisorError>;
}

#[derive(Default)]
struct MockState {
    files: BTreeMap<String, String>,
    layers: Vec<SupervisionLayer>,
    running: BTreeSet<String>,
    restarts: Vec<String>,
}

/// Mock supervisor for testing and development.
///
/// Records pushed files, applied layers and restarts in memory. A restarted
/// service is considered running afterwards.
pub struct MockSupervisor {
    state: Mutex<MockState>,

    /// Whether the supervisor is reachable.
    connected: AtomicBool,

    /// Whether pushes and restarts should fail.
    fail_io: AtomicBool,
}

impl MockSupervisor {
    /// Create a reachable mock supervisor.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            connected: AtomicBool::new(true),
            fail_io: AtomicBool::new(false),
        }
    }

    /// Create a mock supervisor that is not reachable.
    pub fn disconnected() -> Self {
        let mock = Self::new();
        mock.connected.store(false, Ordering::SeqCst);
        mock
    }

    /// Create a mock supervisor whose I/O operations fail.
    pub fn failing() -> Self {
        let mock = Self::new();
        mock.fail_io.store(true, Ordering::SeqCst);
        mock
    }

    /// Toggle reachability.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Toggle I/O failures.
    pub fn set_fail_io(&self, fail: bool) {
        self.fail_io.store(fail, Ordering::SeqCst);
    }

    /// Content of a pushed file, if any.
    pub fn pushed(&self, path: &str) -> Option<String> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.files.get(path).cloned()
    }

    /// Layers applied so far, oldest first.
    pub fn layers(&self) -> Vec<SupervisionLayer> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.layers.clone()
    }

    /// Number of restarts issued for a service.
    pub fn restart_count(&self, service: &str) -> usize {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.restarts.iter().filter(|s| s.as_str() == service).count()
    }
}

impl Default for MockSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkloadSupervisor for MockSupervisor {
    async fn can_connect(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn push_config(&self, path: &str, content: &str) -> Result<(), SupervisorError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SupervisorError::Unreachable("[mock] disconnected".to_string()));
        }
        if self.fail_io.load(Ordering::SeqCst) {
            return Err(SupervisorError::Push {
                path: path.to_string(),
                reason: "[mock] configured to fail".to_string(),
            });
        }

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.files.insert(path.to_string(), content.to_string());
        debug!(path, "[MOCK] Pushed file");
        Ok(())
    }

    async fn config_exists(&self, path: &str) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.files.contains_key(path)
    }

    async fn apply_layer(&self, layer: &SupervisionLayer) -> Result<(), SupervisorError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SupervisorError::Unreachable("[mock] disconnected".to_string()));
        }
        if self.fail_io.load(Ordering::SeqCst) {
            return Err(SupervisorError::Layer("[mock] configured to fail".to_string()));
        }

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.layers.push(layer.clone());
        debug!(summary = %layer.summary, "[MOCK] Applied supervision layer");
        Ok(())
    }

    async fn is_service_running(&self, service: &str) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.running.contains(service)
    }

    async fn restart_service(&self, service: &str) -> Result<(), SupervisorError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SupervisorError::Unreachable("[mock] disconnected".to_string()));
        }
        if self.fail_io.load(Ordering::SeqCst) {
            return Err(SupervisorError::Restart {
                service: service.to_string(),
                reason: "[mock] configured to fail".to_string(),
            });
        }

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.restarts.push(service.to_string());
        state.running.insert(service.to_string());
        info!(service, "[MOCK] Restarted service");
        Ok(())
    }
}
