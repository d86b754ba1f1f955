//! Service port exposure.
//!
//! The NRF advertises two SBI ports for ingress. Actually patching the
//! cluster service is an external collaborator's job; the operator only
//! declares the ports.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ServiceConfig;

/// A port to expose on the cluster service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePort {
    pub name: String,
    pub port: u16,
    pub protocol: String,
}

/// The ports the NRF exposes: SBI HTTP/1 and the HTTP/2 variant.
pub fn service_ports(config: &ServiceConfig) -> Vec<ServicePort> {
    vec![
        ServicePort {
            name: "http1".to_string(),
            port: config.sbi_port,
            protocol: "TCP".to_string(),
        },
        ServicePort {
            name: "http2".to_string(),
            port: config.sbi_http2_port,
            protocol: "TCP".to_string(),
        },
    ]
}

/// External service-exposure collaborator.
pub trait ServiceExposure: Send + Sync {
    /// Declare the ports the workload serves on.
    fn declare_ports(&self, ports: &[ServicePort]) -> anyhow::Result<()>;
}

/// Exposure implementation that only logs the declaration, for local
/// drivers and tests.
pub struct LoggingExposure;

impl ServiceExposure for LoggingExposure {
    fn declare_ports(&self, ports: &[ServicePort]) -> anyhow::Result<()> {
        for port in ports {
            info!(name = %port.name, port = port.port, protocol = %port.protocol, "Declared service port");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_ports() {
        let ports = service_ports(&ServiceConfig::default());

        assert_eq!(
            ports,
            vec![
                ServicePort {
                    name: "http1".to_string(),
                    port: 80,
                    protocol: "TCP".to_string(),
                },
                ServicePort {
                    name: "http2".to_string(),
                    port: 9090,
                    protocol: "TCP".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_logging_exposure_accepts_ports() {
        let ports = service_ports(&ServiceConfig::default());
        assert!(LoggingExposure.declare_ports(&ports).is_ok());
    }
}
