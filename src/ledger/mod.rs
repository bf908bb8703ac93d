//! Ledger client capability.
//!
//! # Data Flow
//! ```text
//! EndpointConfig
//!     → client.rs (LedgerClientFactory: REST query / signing clients)
//!
//! Account credentials
//!     → wallet.rs (mnemonic → secp256k1 key → bech32 address)
//!     → extension.rs (external signer: enable, signer, encryption)
//!     → signer.rs (SignerBundle handed to the signing client)
//! ```
//!
//! # Design Decisions
//! - Clients are trait objects so the session layer never sees transport details
//! - Errors are cloneable so one failed build can be shared by every waiter

pub mod client;
pub mod extension;
pub mod signer;
pub mod types;
pub mod wallet;

pub use client::{LedgerClientFactory, NodeInfo, QueryClient, RestClientFactory, SigningClient};
pub use extension::SignerExtension;
pub use signer::{CredentialSource, EncryptionUtils, OfflineSigner, SignerBundle};
pub use types::{ConnectionError, ConnectionResult, EndpointPair, ErrorClass, GasPrice};
pub use wallet::{LocalWallet, Mnemonic};
