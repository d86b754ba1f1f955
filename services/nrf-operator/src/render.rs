//! Renders the NRF configuration document.

use std::fmt::Write;

use sha2::{Digest, Sha256};

use crate::config::{ConfigError, ServiceConfig};

/// The SBI interface address is discovered by the workload at startup
/// rather than rendered into the file.
const IPV4_ADDRESS_SENTINEL: &str = "read";

/// A rendered configuration document.
///
/// Carries a sha256 content digest for logging and change detection;
/// identical inputs always produce byte-identical documents, so the digest
/// doubles as a cheap equality check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    text: String,
    digest: String,
}

impl ConfigDocument {
    /// The document text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The content digest, `sha256:`-prefixed.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

/// Render the `nrf.conf` document from a workload configuration.
///
/// Pure and deterministic: the same input renders to byte-identical output,
/// which keeps the config push idempotent and the document golden-file
/// testable. Never partially renders.
///
/// # Errors
///
/// [`ConfigError`] when the configuration violates its invariants.
pub fn render(config: &ServiceConfig) -> Result<ConfigDocument, ConfigError> {
    config.validate()?;

    let mut text = String::new();
    // Infallible: writing into a String cannot fail.
    let _ = writeln!(text, "NRF =");
    let _ = writeln!(text, "{{");
    let _ = writeln!(text, "    INSTANCE = {};", config.instance_id);
    let _ = writeln!(text, "    PID_DIRECTORY = \"{}\";", config.pid_directory);
    let _ = writeln!(text);
    let _ = writeln!(text, "    SBI_INTERFACE :");
    let _ = writeln!(text, "    {{");
    let _ = writeln!(text, "        INTERFACE_NAME = \"{}\";", config.interface_name);
    let _ = writeln!(text, "        IPV4_ADDRESS = \"{}\";", IPV4_ADDRESS_SENTINEL);
    let _ = writeln!(text, "        PORT = {};", config.sbi_port);
    let _ = writeln!(text, "        HTTP2_PORT = {};", config.sbi_http2_port);
    let _ = writeln!(text, "        API_VERSION = \"{}\";", config.api_version);
    let _ = writeln!(text, "    }};");
    let _ = writeln!(text, "}};");

    let digest = content_digest(&text);
    Ok(ConfigDocument { text, digest })
}

fn content_digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let result = hasher.finalize();
    format!("sha256:{}", hex::encode(&result[..16]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_is_deterministic() {
        let config = ServiceConfig::default();

        let a = render(&config).unwrap();
        let b = render(&config).unwrap();

        assert_eq!(a.text(), b.text());
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn test_render_golden_lines() {
        let config = ServiceConfig {
            instance_id: 0,
            pid_directory: "/var/run".to_string(),
            interface_name: "eth0".to_string(),
            sbi_port: 80,
            sbi_http2_port: 9090,
            api_version: "v1".to_string(),
        };

        let doc = render(&config).unwrap();
        let lines: Vec<&str> = doc.text().lines().map(str::trim_start).collect();

        for expected in [
            "INSTANCE = 0;",
            "PID_DIRECTORY = \"/var/run\";",
            "INTERFACE_NAME = \"eth0\";",
            "IPV4_ADDRESS = \"read\";",
            "PORT = 80;",
            "HTTP2_PORT = 9090;",
            "API_VERSION = \"v1\";",
        ] {
            assert!(lines.contains(&expected), "missing line: {expected}");
        }
    }

    #[test]
    fn test_render_full_document() {
        let doc = render(&ServiceConfig::default()).unwrap();

        let expected = "\
NRF =
{
    INSTANCE = 0;
    PID_DIRECTORY = \"/var/run\";

    SBI_INTERFACE :
    {
        INTERFACE_NAME = \"eth0\";
        IPV4_ADDRESS = \"read\";
        PORT = 80;
        HTTP2_PORT = 9090;
        API_VERSION = \"v1\";
    };
};
";
        assert_eq!(doc.text(), expected);
    }

    #[test]
    fn test_render_rejects_invalid_config() {
        let config = ServiceConfig {
            interface_name: String::new(),
            ..Default::default()
        };

        assert_eq!(render(&config), Err(ConfigError::Missing("interface_name")));
    }

    #[test]
    fn test_digest_tracks_content() {
        let a = render(&ServiceConfig::default()).unwrap();
        let b = render(&ServiceConfig {
            interface_name: "eth1".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_ne!(a.digest(), b.digest());
        assert!(a.digest().starts_with("sha256:"));
    }
}
