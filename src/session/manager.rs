//! Connection manager: the public entry point for sessions.
//!
//! # Responsibilities
//! - Hand out the shared query session and per-account signing sessions
//! - Rebuild a session only when its endpoint pair changes (or on forced
//!   refresh for queries)
//! - Run every construction on its own task so a caller that gives up does
//!   not cancel the build for callers still waiting on it

use std::sync::Arc;

use crate::config::schema::{ClientSettings, EndpointConfig};
use crate::ledger::client::{LedgerClientFactory, RestClientFactory};
use crate::ledger::extension::SignerExtension;
use crate::ledger::types::{ConnectionError, ConnectionResult};
use crate::observability::metrics;
use crate::session::account::AccountDescriptor;
use crate::session::cache::{Claim, SessionCache};
use crate::session::credentials::CredentialResolver;
use crate::session::types::{QuerySession, SigningSession};

struct Inner {
    cache: SessionCache,
    resolver: CredentialResolver,
    factory: Arc<dyn LedgerClientFactory>,
}

/// Broker for query and signing sessions.
///
/// Cheap to clone; clones share one cache. Must be used from within a Tokio
/// runtime.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Manager without a signer extension; extension accounts fail with
    /// `ExtensionUnavailable`.
    pub fn new(factory: Arc<dyn LedgerClientFactory>) -> Self {
        Self::build(factory, None)
    }

    /// Manager that resolves extension accounts through `extension`.
    pub fn with_extension(factory: Arc<dyn LedgerClientFactory>, extension: Arc<dyn SignerExtension>) -> Self {
        Self::build(factory, Some(extension))
    }

    /// Manager backed by the REST client factory.
    pub fn from_settings(settings: ClientSettings) -> ConnectionResult<Self> {
        Ok(Self::new(Arc::new(RestClientFactory::new(settings)?)))
    }

    fn build(factory: Arc<dyn LedgerClientFactory>, extension: Option<Arc<dyn SignerExtension>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache: SessionCache::new(),
                resolver: CredentialResolver::new(extension),
                factory,
            }),
        }
    }

    /// Read access to the session cache.
    pub fn cache(&self) -> &SessionCache {
        &self.inner.cache
    }

    /// The credential resolver used for signing sessions.
    pub fn resolver(&self) -> &CredentialResolver {
        &self.inner.resolver
    }

    /// Get the query session for `config`, building it if needed.
    ///
    /// `force_refresh` rebuilds even when the cached session matches; a
    /// build already running for the same endpoints is joined instead.
    pub async fn get_query_session(
        &self,
        config: &EndpointConfig,
        force_refresh: bool,
    ) -> ConnectionResult<Arc<QuerySession>> {
        match self.inner.cache.claim_query(config, force_refresh) {
            Claim::Ready(session) => {
                metrics::record_session_request("query", "hit");
                tracing::trace!(rest = %config.rest_endpoint, "Query session cache hit");
                Ok(session)
            }
            Claim::Join(waiter) => {
                metrics::record_session_request("query", "joined");
                waiter.wait().await
            }
            Claim::Lead(ticket) => {
                let waiter = ticket.subscribe();
                let inner = self.inner.clone();
                let config = config.clone();

                tokio::spawn(async move {
                    let result = inner.build_query(&config).await;
                    record_build("query", &result);
                    inner.cache.complete_query(ticket, result);
                });

                waiter.wait().await
            }
        }
    }

    /// Get the signing session for `account` on `config`, building it if needed.
    ///
    /// There is no forced refresh here: rebuilding means resolving
    /// credentials again, which for extension accounts prompts the user.
    pub async fn get_signing_session(
        &self,
        account: &AccountDescriptor,
        config: &EndpointConfig,
    ) -> ConnectionResult<Arc<SigningSession>> {
        let address = account.address();
        if address.trim().is_empty() {
            return Err(ConnectionError::UnsupportedAccountType(format!(
                "{} account without an address",
                account.kind()
            )));
        }

        match self.inner.cache.claim_signing(address, config) {
            Claim::Ready(session) => {
                metrics::record_session_request("signing", "hit");
                tracing::trace!(address = %address, "Signing session cache hit");
                Ok(session)
            }
            Claim::Join(waiter) => {
                metrics::record_session_request("signing", "joined");
                tracing::debug!(address = %address, "Joining in-flight signing session build");
                waiter.wait().await
            }
            Claim::Lead(ticket) => {
                let waiter = ticket.subscribe();
                let inner = self.inner.clone();
                let account = account.clone();
                let config = config.clone();

                tokio::spawn(async move {
                    let result = inner.build_signing(&account, &config).await;
                    record_build("signing", &result);
                    inner.cache.complete_signing(account.address(), ticket, result);
                });

                waiter.wait().await
            }
        }
    }
}

impl Inner {
    async fn build_query(&self, config: &EndpointConfig) -> ConnectionResult<Arc<QuerySession>> {
        tracing::info!(
            rpc = %config.rpc_endpoint,
            rest = %config.rest_endpoint,
            "Building query session"
        );
        let client = self.factory.connect_query(config).await?;
        Ok(Arc::new(QuerySession::new(client, config.endpoints())))
    }

    async fn build_signing(
        &self,
        account: &AccountDescriptor,
        config: &EndpointConfig,
    ) -> ConnectionResult<Arc<SigningSession>> {
        let address = account.address();
        tracing::info!(
            address = %address,
            kind = account.kind(),
            chain_id = %config.chain_id,
            rpc = %config.rpc_endpoint,
            rest = %config.rest_endpoint,
            "Building signing session"
        );

        // Checked before resolving so a bad preset never triggers an approval prompt.
        let gas_price = config.gas_price()?;
        let bundle = self.resolver.resolve(account, config).await?;
        let client = self
            .factory
            .connect_signing(config, address, bundle, gas_price)
            .await?;

        Ok(Arc::new(SigningSession::new(client, address, config.endpoints())))
    }
}

fn record_build<S>(kind: &'static str, result: &ConnectionResult<S>) {
    match result {
        Ok(_) => metrics::record_session_request(kind, "built"),
        Err(e) => {
            metrics::record_session_request(kind, "failed");
            tracing::warn!(kind = kind, error = %e, error_kind = e.kind(), "Session construction failed");
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("cache", &self.inner.cache)
            .field("resolver", &self.inner.resolver)
            .finish()
    }
}
