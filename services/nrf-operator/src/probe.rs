//! Pluggable workload readiness probes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

/// Predicate for "is the workload ready to serve".
///
/// A probe is a hint, not a hard guarantee: the workload may stop serving
/// between the probe and the action gated on it.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Whether the workload is listening on its SBI port.
    async fn is_listening(&self) -> bool;
}

/// Probe that unconditionally reports listening.
///
/// This is the default wiring: the workload image exposes no health
/// endpoint, so there is nothing cheap to ask. [`TcpProbe`] implements the
/// intended real check.
pub struct AlwaysListening;

#[async_trait]
impl ReadinessProbe for AlwaysListening {
    async fn is_listening(&self) -> bool {
        true
    }
}

/// TCP connect probe against the SBI port.
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    /// Create a probe for `host:port` with a one second connect timeout.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: Duration::from_secs(1),
        }
    }
}

#[async_trait]
impl ReadinessProbe for TcpProbe {
    async fn is_listening(&self) -> bool {
        let addr = format!("{}:{}", self.host, self.port);
        let connect = tokio::net::TcpStream::connect(&addr);
        match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(%addr, error = %e, "TCP probe failed");
                false
            }
            Err(_) => {
                debug!(%addr, "TCP probe timed out");
                false
            }
        }
    }
}

/// Probe with an externally settable answer, for tests.
#[derive(Default)]
pub struct StaticProbe {
    listening: AtomicBool,
}

impl StaticProbe {
    /// Create a probe with a fixed initial answer.
    pub fn new(listening: bool) -> Self {
        Self {
            listening: AtomicBool::new(listening),
        }
    }

    /// Change the answer.
    pub fn set_listening(&self, listening: bool) {
        self.listening.store(listening, Ordering::SeqCst);
    }
}

#[async_trait]
impl ReadinessProbe for StaticProbe {
    async fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
}
