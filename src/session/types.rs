//! Session handles returned to callers.

use std::fmt;
use std::sync::Arc;

use crate::ledger::client::{QueryClient, SigningClient};
use crate::ledger::types::EndpointPair;

/// Anything the cache stores: a client bound to an endpoint pair.
pub trait Session: Send + Sync + 'static {
    /// Endpoint pair the session was built against.
    fn endpoints(&self) -> &EndpointPair;
}

/// Read-only session shared by every caller.
pub struct QuerySession {
    client: Arc<dyn QueryClient>,
    endpoints: EndpointPair,
}

impl QuerySession {
    pub fn new(client: Arc<dyn QueryClient>, endpoints: EndpointPair) -> Self {
        Self { client, endpoints }
    }

    /// The underlying query client.
    pub fn client(&self) -> &dyn QueryClient {
        self.client.as_ref()
    }
}

impl Session for QuerySession {
    fn endpoints(&self) -> &EndpointPair {
        &self.endpoints
    }
}

impl fmt::Debug for QuerySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySession")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

/// Authenticated session bound to one account address.
pub struct SigningSession {
    client: Arc<dyn SigningClient>,
    address: String,
    endpoints: EndpointPair,
}

impl SigningSession {
    pub fn new(client: Arc<dyn SigningClient>, address: impl Into<String>, endpoints: EndpointPair) -> Self {
        Self {
            client,
            address: address.into(),
            endpoints,
        }
    }

    /// The underlying signing client.
    pub fn client(&self) -> &dyn SigningClient {
        self.client.as_ref()
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Session for SigningSession {
    fn endpoints(&self) -> &EndpointPair {
        &self.endpoints
    }
}

impl fmt::Debug for SigningSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningSession")
            .field("address", &self.address)
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}
