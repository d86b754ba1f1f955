//! The endpoint record published over the NRF relation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Relation data key for the NRF IPv4 address.
pub const KEY_IPV4_ADDRESS: &str = "nrf_ipv4_address";

/// Relation data key for the NRF FQDN.
pub const KEY_FQDN: &str = "nrf_fqdn";

/// Relation data key for the NRF SBI port.
pub const KEY_PORT: &str = "nrf_port";

/// Relation data key for the NRF API version.
pub const KEY_API_VERSION: &str = "nrf_api_version";

/// The externally visible address of an NRF workload.
///
/// All fields are strings on the wire: the relation bus carries a flat
/// string-to-string mapping per side. Consumers treat the record as
/// read-only; it is owned exclusively by the publishing side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRecord {
    /// IPv4 address the NRF serves on.
    pub ipv4_address: String,

    /// Cluster-internal fully qualified domain name.
    pub fqdn: String,

    /// SBI port, as a string.
    pub port: String,

    /// SBI API version (e.g. `v1`).
    pub api_version: String,
}

impl EndpointRecord {
    /// Flatten the record into the wire mapping.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (KEY_IPV4_ADDRESS.to_string(), self.ipv4_address.clone()),
            (KEY_FQDN.to_string(), self.fqdn.clone()),
            (KEY_PORT.to_string(), self.port.clone()),
            (KEY_API_VERSION.to_string(), self.api_version.clone()),
        ])
    }

    /// Rebuild a record from the wire mapping.
    ///
    /// Returns `None` unless all four keys are present: partial data is not
    /// an endpoint and must never be surfaced as one.
    pub fn from_map(data: &BTreeMap<String, String>) -> Option<Self> {
        Some(Self {
            ipv4_address: data.get(KEY_IPV4_ADDRESS)?.clone(),
            fqdn: data.get(KEY_FQDN)?.clone(),
            port: data.get(KEY_PORT)?.clone(),
            api_version: data.get(KEY_API_VERSION)?.clone(),
        })
    }
}
