//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! get_query_session(config, force_refresh)
//!     → cache.rs (hit / join in-flight / lead new build)
//!     → LedgerClientFactory::connect_query
//!     → cache.rs (store if still current, wake waiters)
//!
//! get_signing_session(account, config)
//!     → cache.rs (keyed by address)
//!     → credentials.rs (local mnemonic or signer extension)
//!     → LedgerClientFactory::connect_signing
//!     → cache.rs (store if still current, wake waiters)
//! ```
//!
//! # Design Decisions
//! - A session is valid while its endpoint pair equals the requested one
//! - Builds run on spawned tasks; dropping a request never cancels them
//! - A failed build leaves the cache as it was

pub mod account;
pub mod cache;
pub mod credentials;
pub mod manager;
pub mod types;

pub use account::{AccountDescriptor, AccountRecord};
pub use cache::SessionCache;
pub use credentials::CredentialResolver;
pub use manager::ConnectionManager;
pub use types::{QuerySession, Session, SigningSession};
