//! Ledger connection manager library.

pub mod config;
pub mod ledger;
pub mod observability;
pub mod session;

pub use config::schema::{ConnectorConfig, EndpointConfig};
pub use ledger::types::{ConnectionError, ConnectionResult};
pub use session::{AccountDescriptor, ConnectionManager, QuerySession, SigningSession};
