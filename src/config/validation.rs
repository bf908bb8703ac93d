//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Endpoint URLs, chain ids, address prefixes, gas prices, HD paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ConnectorConfig → Result<(), Vec<ValidationError>>
//! - Runs before a config is published to the preset store

use std::fmt;

use bitcoin::bech32::Hrp;

use crate::config::schema::{ConnectorConfig, EndpointConfig};
use crate::ledger::client::parse_endpoint;
use crate::ledger::types::{is_decimal, is_valid_denom};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the whole configuration.
pub fn validate_config(config: &ConnectorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.client.request_timeout_secs == 0 {
        errors.push(ValidationError::new("client.request_timeout_secs", "must be greater than 0"));
    }
    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}'", config.observability.log_format),
        ));
    }
    for (name, preset) in &config.presets {
        validate_endpoint(&format!("presets.{}", name), preset, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate one endpoint config, appending problems under `scope`.
pub fn validate_endpoint(scope: &str, config: &EndpointConfig, errors: &mut Vec<ValidationError>) {
    for (field, value) in [
        ("rpc_endpoint", &config.rpc_endpoint),
        ("rest_endpoint", &config.rest_endpoint),
    ] {
        if let Err(message) = parse_endpoint(value) {
            errors.push(ValidationError::new(format!("{}.{}", scope, field), message));
        }
    }

    if config.chain_id.trim().is_empty() {
        errors.push(ValidationError::new(format!("{}.chain_id", scope), "must not be empty"));
    }

    let prefix_ok = Hrp::parse(&config.address_prefix).is_ok()
        && config.address_prefix == config.address_prefix.to_lowercase();
    if !prefix_ok {
        errors.push(ValidationError::new(
            format!("{}.address_prefix", scope),
            format!("'{}' is not a valid bech32 prefix", config.address_prefix),
        ));
    }

    if !is_decimal(config.gas_price.trim()) {
        errors.push(ValidationError::new(
            format!("{}.gas_price", scope),
            format!("'{}' is not a non-negative decimal", config.gas_price),
        ));
    }
    if !is_valid_denom(&config.denom) {
        errors.push(ValidationError::new(
            format!("{}.denom", scope),
            format!("'{}' is not a valid denomination", config.denom),
        ));
    }

    if let Some(path) = &config.hd_path {
        if !is_hd_path(path) {
            errors.push(ValidationError::new(
                format!("{}.hd_path", scope),
                format!("'{}' is not a BIP-32 path", path),
            ));
        }
    }
}

fn is_hd_path(path: &str) -> bool {
    let mut segments = path.split('/');
    if segments.next() != Some("m") {
        return false;
    }
    let mut count = 0;
    for segment in segments {
        let index = segment.strip_suffix('\'').unwrap_or(segment);
        if index.is_empty() || index.parse::<u32>().map_or(true, |i| i >= 1 << 31) {
            return false;
        }
        count += 1;
    }
    count > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_endpoint() -> EndpointConfig {
        EndpointConfig {
            rpc_endpoint: "https://rpc.example.com".to_string(),
            rest_endpoint: "https://lcd.example.com".to_string(),
            chain_id: "secret-4".to_string(),
            address_prefix: "secret".to_string(),
            gas_price: "0.25".to_string(),
            denom: "uscrt".to_string(),
            hd_path: None,
        }
    }

    #[test]
    fn test_valid_config() {
        let mut config = ConnectorConfig::default();
        config.presets.insert("secret-mainnet".to_string(), valid_endpoint());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut bad = valid_endpoint();
        bad.rest_endpoint = "lcd.example.com".to_string();
        bad.chain_id = " ".to_string();
        bad.address_prefix = "Secret".to_string();
        bad.gas_price = "-1".to_string();
        bad.hd_path = Some("m/44'/x".to_string());

        let mut config = ConnectorConfig::default();
        config.client.request_timeout_secs = 0;
        config.presets.insert("broken".to_string(), bad);

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "client.request_timeout_secs",
                "presets.broken.rest_endpoint",
                "presets.broken.chain_id",
                "presets.broken.address_prefix",
                "presets.broken.gas_price",
                "presets.broken.hd_path",
            ]
        );
    }

    #[test]
    fn test_hd_paths() {
        assert!(is_hd_path("m/44'/118'/0'/0/0"));
        assert!(is_hd_path("m/0"));
        assert!(!is_hd_path("m"));
        assert!(!is_hd_path("44'/118'"));
        assert!(!is_hd_path("m/2147483648"));
    }
}
