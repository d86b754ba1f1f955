//! Configuration for the NRF operator.

use anyhow::Result;
use thiserror::Error;

/// Default SBI interface name inside the workload container.
pub const DEFAULT_INTERFACE_NAME: &str = "eth0";

/// Default SBI HTTP/1 port.
pub const DEFAULT_SBI_PORT: u16 = 80;

/// Default SBI HTTP/2 port.
pub const DEFAULT_SBI_HTTP2_PORT: u16 = 9090;

/// Default NRF API version.
pub const DEFAULT_API_VERSION: &str = "v1";

/// Path of the rendered configuration file inside the container.
pub const DEFAULT_CONFIG_PATH: &str = "/openair-nrf/etc/nrf.conf";

/// Configuration validation errors. Fatal to the current reconciliation
/// pass: an invalid config is not retried blindly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required field is empty.
    #[error("missing required config field: {0}")]
    Missing(&'static str),

    /// A field holds an out-of-range or malformed value.
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Workload configuration rendered into the NRF's config file.
///
/// Rebuilt fresh from the configuration source on every event, never cached
/// across passes. Only the interface name is expected to vary per
/// deployment; the remaining fields default to the values the workload
/// image ships with, but all of them are exposed as options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// NRF instance identifier.
    pub instance_id: u32,

    /// Directory the workload writes its pid file into.
    pub pid_directory: String,

    /// Network interface the SBI binds to.
    pub interface_name: String,

    /// SBI HTTP/1 port.
    pub sbi_port: u16,

    /// SBI HTTP/2 port.
    pub sbi_http2_port: u16,

    /// SBI API version.
    pub api_version: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            instance_id: 0,
            pid_directory: "/var/run".to_string(),
            interface_name: DEFAULT_INTERFACE_NAME.to_string(),
            sbi_port: DEFAULT_SBI_PORT,
            sbi_http2_port: DEFAULT_SBI_HTTP2_PORT,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Check the rendering invariants: all fields present and non-empty,
    /// ports valid TCP ports.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pid_directory.is_empty() {
            return Err(ConfigError::Missing("pid_directory"));
        }
        if self.interface_name.is_empty() {
            return Err(ConfigError::Missing("interface_name"));
        }
        if self.api_version.is_empty() {
            return Err(ConfigError::Missing("api_version"));
        }
        if self.sbi_port == 0 {
            return Err(ConfigError::Invalid {
                field: "sbi_port",
                reason: "port must be non-zero".to_string(),
            });
        }
        if self.sbi_http2_port == 0 {
            return Err(ConfigError::Invalid {
                field: "sbi_http2_port",
                reason: "port must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Which readiness probe to wire in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    /// The stub probe: unconditionally reports listening.
    Stub,

    /// TCP connect against the SBI port.
    Tcp,
}

/// Operator process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the supervised service (and its container).
    pub service_name: String,

    /// Application name, used in the published FQDN.
    pub app_name: String,

    /// Model (namespace) name, used in the published FQDN.
    pub model_name: String,

    /// Path of the rendered config file inside the container.
    pub config_path: String,

    /// Interval between redelivery passes over deferred events, in seconds.
    pub redeliver_interval_secs: u64,

    /// Readiness probe selection.
    pub probe: ProbeKind,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Workload configuration.
    pub service: ServiceConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let service_name =
            std::env::var("NRF_SERVICE_NAME").unwrap_or_else(|_| "nrf".to_string());

        let app_name = std::env::var("NRF_APP_NAME").unwrap_or_else(|_| "nrf".to_string());

        let model_name = std::env::var("NRF_MODEL_NAME").unwrap_or_else(|_| "5g-core".to_string());

        let config_path =
            std::env::var("NRF_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let redeliver_interval_secs = std::env::var("NRF_REDELIVER_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let probe = match std::env::var("NRF_PROBE").as_deref() {
            Ok("tcp") => ProbeKind::Tcp,
            _ => ProbeKind::Stub,
        };

        let log_level = std::env::var("NRF_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let service = ServiceConfig {
            instance_id: std::env::var("NRF_INSTANCE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            pid_directory: std::env::var("NRF_PID_DIRECTORY")
                .unwrap_or_else(|_| "/var/run".to_string()),
            interface_name: std::env::var("NRF_INTERFACE_NAME")
                .unwrap_or_else(|_| DEFAULT_INTERFACE_NAME.to_string()),
            sbi_port: std::env::var("NRF_SBI_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SBI_PORT),
            sbi_http2_port: std::env::var("NRF_SBI_HTTP2_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SBI_HTTP2_PORT),
            api_version: std::env::var("NRF_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string()),
        };
        service.validate()?;

        Ok(Self {
            service_name,
            app_name,
            model_name,
            config_path,
            redeliver_interval_secs,
            probe,
            log_level,
            service,
        })
    }

    /// The FQDN under which the NRF service is reachable in-cluster.
    pub fn fqdn(&self) -> String {
        format!("{}.{}.svc.cluster.local", self.app_name, self.model_name)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sbi_port, 80);
        assert_eq!(config.sbi_http2_port, 9090);
        assert_eq!(config.api_version, "v1");
    }

    #[rstest]
    #[case::interface(ServiceConfig { interface_name: String::new(), ..Default::default() }, "interface_name")]
    #[case::pid_dir(ServiceConfig { pid_directory: String::new(), ..Default::default() }, "pid_directory")]
    #[case::api_version(ServiceConfig { api_version: String::new(), ..Default::default() }, "api_version")]
    fn test_empty_field_is_missing(#[case] config: ServiceConfig, #[case] field: &'static str) {
        assert_eq!(config.validate(), Err(ConfigError::Missing(field)));
    }

    #[test]
    fn test_zero_port_is_invalid() {
        let config = ServiceConfig {
            sbi_port: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "sbi_port", .. })
        ));
    }

    #[test]
    fn test_fqdn() {
        let config = Config {
            service_name: "nrf".to_string(),
            app_name: "nrf".to_string(),
            model_name: "core".to_string(),
            config_path: DEFAULT_CONFIG_PATH.to_string(),
            redeliver_interval_secs: 5,
            probe: ProbeKind::Stub,
            log_level: "info".to_string(),
            service: ServiceConfig::default(),
        };
        assert_eq!(config.fqdn(), "nrf.core.svc.cluster.local");
    }
}
