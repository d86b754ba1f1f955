//! Supervision layer specification for the NRF service.
//!
//! The layer is a declarative descriptor the container supervisor consumes:
//! how to run the workload binary, when to start it, and the environment it
//! sees. The operator only builds the descriptor; applying it is the
//! supervisor adapter's job.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;

/// Path of the NRF binary inside the workload container.
const NRF_BINARY: &str = "/openair-nrf/bin/oai_nrf";

/// A declarative process-supervision layer with one service entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisionLayer {
    pub summary: String,
    pub description: String,
    pub services: BTreeMap<String, ServiceSpec>,
}

/// One supervised service entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// How this entry combines with existing layers (`replace`).
    #[serde(rename = "override")]
    pub override_mode: String,

    pub summary: String,

    /// Command line the supervisor runs.
    pub command: String,

    /// Startup policy (`enabled`).
    pub startup: String,

    /// Environment exported to the workload process.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

/// Build the NRF supervision layer.
///
/// The command points the workload at the rendered config file; the
/// environment repeats the same six configuration values as the upper-case
/// variables the workload image expects.
pub fn nrf_layer(service_name: &str, config: &ServiceConfig, config_path: &str) -> SupervisionLayer {
    let environment = BTreeMap::from([
        ("INSTANCE".to_string(), config.instance_id.to_string()),
        ("PID_DIRECTORY".to_string(), config.pid_directory.clone()),
        (
            "NRF_INTERFACE_NAME_FOR_SBI".to_string(),
            config.interface_name.clone(),
        ),
        (
            "NRF_INTERFACE_PORT_FOR_SBI".to_string(),
            config.sbi_port.to_string(),
        ),
        (
            "NRF_INTERFACE_HTTP2_PORT_FOR_SBI".to_string(),
            config.sbi_http2_port.to_string(),
        ),
        ("NRF_API_VERSION".to_string(), config.api_version.clone()),
    ]);

    let spec = ServiceSpec {
        override_mode: "replace".to_string(),
        summary: service_name.to_string(),
        command: format!("{NRF_BINARY} -c {config_path} -o"),
        startup: "enabled".to_string(),
        environment,
    };

    SupervisionLayer {
        summary: format!("{service_name} layer"),
        description: format!("supervision layer for {service_name}"),
        services: BTreeMap::from([(service_name.to_string(), spec)]),
    }
}
