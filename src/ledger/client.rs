//! Ledger client capability and its default REST implementation.
//!
//! # Responsibilities
//! - Define the query/signing client surface the session layer hands out
//! - Build clients against a node's REST endpoint
//! - Optionally probe the node at construction time
//!
//! The session layer only ever goes through [`LedgerClientFactory`]; nothing
//! here knows about caching.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::config::schema::{ClientSettings, EndpointConfig};
use crate::ledger::signer::{EncryptionUtils, SignerBundle};
use crate::ledger::types::{ConnectionError, ConnectionResult, GasPrice};

/// Node identity reported by `/node_info`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeInfo {
    /// Chain id the node serves.
    pub network: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub moniker: String,
}

/// Read-only ledger client.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// REST endpoint this client talks to.
    fn rest_endpoint(&self) -> &str;

    /// GET a path relative to the REST endpoint and decode it as JSON.
    async fn get_json(&self, path: &str) -> ConnectionResult<serde_json::Value>;

    /// Fetch the node's identity.
    async fn node_info(&self) -> ConnectionResult<NodeInfo> {
        let value = self.get_json("node_info").await?;
        let info = value.get("node_info").cloned().unwrap_or(value);
        serde_json::from_value(info)
            .map_err(|e| ConnectionError::Query(format!("Malformed node_info response: {}", e)))
    }
}

/// Ledger client bound to one account and its signer.
#[async_trait]
pub trait SigningClient: QueryClient {
    /// Account address this client signs for.
    fn address(&self) -> &str;

    /// Gas price attached to every transaction.
    fn gas_price(&self) -> &GasPrice;

    /// Encryption capability for private contract messages.
    fn encryption(&self) -> &EncryptionUtils;

    /// Sign a serialized sign doc with the bound signer.
    async fn sign(&self, sign_doc: &[u8]) -> ConnectionResult<Vec<u8>>;
}

/// Creates ledger clients for the session layer.
#[async_trait]
pub trait LedgerClientFactory: Send + Sync {
    async fn connect_query(&self, config: &EndpointConfig) -> ConnectionResult<Arc<dyn QueryClient>>;

    async fn connect_signing(
        &self,
        config: &EndpointConfig,
        address: &str,
        bundle: SignerBundle,
        gas_price: GasPrice,
    ) -> ConnectionResult<Arc<dyn SigningClient>>;
}

/// [`LedgerClientFactory`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct RestClientFactory {
    http: reqwest::Client,
    settings: ClientSettings,
}

impl RestClientFactory {
    pub fn new(settings: ClientSettings) -> ConnectionResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| {
                ConnectionError::QueryClientConstructionFailed(format!("HTTP client setup failed: {}", e))
            })?;
        Ok(Self { http, settings })
    }

    fn build_rest_client(&self, config: &EndpointConfig) -> Result<RestQueryClient, String> {
        let base = parse_endpoint(&config.rest_endpoint)?;
        Ok(RestQueryClient {
            http: self.http.clone(),
            base,
            rest_endpoint: config.rest_endpoint.clone(),
            timeout_secs: self.settings.request_timeout_secs,
        })
    }

    /// Probe the node; unreachable nodes fail construction, a chain id
    /// mismatch is only reported.
    async fn probe(&self, client: &RestQueryClient, config: &EndpointConfig) -> ConnectionResult<()> {
        if !self.settings.probe_on_connect {
            return Ok(());
        }
        let info = client.node_info().await?;
        if info.network != config.chain_id {
            tracing::warn!(
                rest = %config.rest_endpoint,
                expected = %config.chain_id,
                actual = %info.network,
                "Node serves a different chain than configured"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerClientFactory for RestClientFactory {
    async fn connect_query(&self, config: &EndpointConfig) -> ConnectionResult<Arc<dyn QueryClient>> {
        let client = self
            .build_rest_client(config)
            .map_err(ConnectionError::QueryClientConstructionFailed)?;

        self.probe(&client, config).await.map_err(|e| match e {
            ConnectionError::Query(reason) => ConnectionError::QueryClientConstructionFailed(reason),
            other => other,
        })?;

        tracing::debug!(rest = %config.rest_endpoint, "Query client ready");
        Ok(Arc::new(client))
    }

    async fn connect_signing(
        &self,
        config: &EndpointConfig,
        address: &str,
        bundle: SignerBundle,
        gas_price: GasPrice,
    ) -> ConnectionResult<Arc<dyn SigningClient>> {
        let query = self
            .build_rest_client(config)
            .map_err(ConnectionError::SigningClientConstructionFailed)?;

        self.probe(&query, config).await.map_err(|e| match e {
            ConnectionError::Query(reason) => ConnectionError::SigningClientConstructionFailed(reason),
            other => other,
        })?;

        tracing::debug!(
            rest = %config.rest_endpoint,
            address = %address,
            gas_price = %gas_price,
            "Signing client ready"
        );
        Ok(Arc::new(RestSigningClient {
            query,
            address: address.to_string(),
            bundle,
            gas_price,
        }))
    }
}

/// Query client speaking the node's REST API.
#[derive(Debug, Clone)]
pub struct RestQueryClient {
    http: reqwest::Client,
    base: Url,
    rest_endpoint: String,
    timeout_secs: u64,
}

#[async_trait]
impl QueryClient for RestQueryClient {
    fn rest_endpoint(&self) -> &str {
        &self.rest_endpoint
    }

    async fn get_json(&self, path: &str) -> ConnectionResult<serde_json::Value> {
        let url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ConnectionError::Query(format!("Invalid query path '{}': {}", path, e)))?;

        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ConnectionError::EndpointUnreachable {
                    endpoint: self.rest_endpoint.clone(),
                    reason: format!("timed out after {} seconds", self.timeout_secs),
                }
            } else if e.is_connect() {
                ConnectionError::EndpointUnreachable {
                    endpoint: self.rest_endpoint.clone(),
                    reason: e.to_string(),
                }
            } else {
                ConnectionError::Query(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectionError::Query(format!(
                "{} returned status {}",
                self.rest_endpoint, status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ConnectionError::Query(format!("Invalid JSON response: {}", e)))
    }
}

/// Signing client: a REST query client plus the resolved credentials.
pub struct RestSigningClient {
    query: RestQueryClient,
    address: String,
    bundle: SignerBundle,
    gas_price: GasPrice,
}

#[async_trait]
impl QueryClient for RestSigningClient {
    fn rest_endpoint(&self) -> &str {
        self.query.rest_endpoint()
    }

    async fn get_json(&self, path: &str) -> ConnectionResult<serde_json::Value> {
        self.query.get_json(path).await
    }
}

#[async_trait]
impl SigningClient for RestSigningClient {
    fn address(&self) -> &str {
        &self.address
    }

    fn gas_price(&self) -> &GasPrice {
        &self.gas_price
    }

    fn encryption(&self) -> &EncryptionUtils {
        &self.bundle.encryption
    }

    async fn sign(&self, sign_doc: &[u8]) -> ConnectionResult<Vec<u8>> {
        self.bundle.signer.sign_direct(&self.address, sign_doc).await
    }
}

impl std::fmt::Debug for RestSigningClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestSigningClient")
            .field("rest_endpoint", &self.query.rest_endpoint)
            .field("address", &self.address)
            .field("gas_price", &self.gas_price)
            .field("source", &self.bundle.source)
            .finish()
    }
}

/// Parse an http(s) endpoint and make sure relative joins append to its path.
pub(crate) fn parse_endpoint(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw).map_err(|e| format!("Invalid endpoint URL '{}': {}", raw, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("Unsupported endpoint scheme '{}' in '{}'", url.scheme(), raw));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
