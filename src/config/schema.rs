//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the presets file.
//! The session core only ever sees the resolved [`EndpointConfig`] values.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::ledger::types::{ConnectionResult, EndpointPair, GasPrice};
use crate::ledger::wallet::DEFAULT_HD_PATH;

/// Root configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Ledger client settings shared by every session.
    pub client: ClientSettings,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,

    /// Named network targets, e.g. `secret-mainnet`.
    pub presets: BTreeMap<String, EndpointConfig>,
}

/// A named network target.
///
/// Sessions are keyed on `(rpc_endpoint, rest_endpoint)`; the remaining
/// fields only feed session construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Tendermint RPC endpoint.
    pub rpc_endpoint: String,

    /// REST (LCD) query endpoint.
    pub rest_endpoint: String,

    /// Chain identifier, e.g. `secret-4`.
    pub chain_id: String,

    /// Bech32 human-readable prefix for account addresses.
    pub address_prefix: String,

    /// Gas price as decimal text in `denom` units.
    #[serde(deserialize_with = "decimal_text")]
    pub gas_price: String,

    /// Smallest-denomination unit, e.g. `uscrt`.
    #[serde(alias = "micro_denom")]
    pub denom: String,

    /// BIP-44 path for local mnemonic accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hd_path: Option<String>,
}

impl EndpointConfig {
    /// The endpoint pair sessions built from this config are bound to.
    pub fn endpoints(&self) -> EndpointPair {
        EndpointPair::new(self.rpc_endpoint.clone(), self.rest_endpoint.clone())
    }

    /// Derivation path for local accounts.
    pub fn hd_path(&self) -> &str {
        self.hd_path.as_deref().unwrap_or(DEFAULT_HD_PATH)
    }

    /// Gas price built from `gas_price` and `denom`.
    pub fn gas_price(&self) -> ConnectionResult<GasPrice> {
        GasPrice::new(&self.gas_price, &self.denom)
    }
}

/// Ledger client settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Query `/node_info` while building a client.
    pub probe_on_connect: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            probe_on_connect: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// `pretty` or `json`.
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Accept `gas_price = 0.25` as well as `gas_price = "0.25"`.
fn decimal_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(u64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Integer(value) => value.to_string(),
        Raw::Float(value) => value.to_string(),
    })
}
