//! Signer and encryption capabilities consumed by signing clients.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::ledger::types::ConnectionResult;

/// Public account information exposed by a signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountData {
    /// Bech32 account address.
    pub address: String,
    /// Compressed secp256k1 public key.
    pub pubkey: Vec<u8>,
    /// Signing algorithm name.
    pub algo: String,
}

/// A signer that never exposes its key material.
#[async_trait]
pub trait OfflineSigner: Send + Sync {
    /// Accounts this signer can sign for.
    async fn get_accounts(&self) -> ConnectionResult<Vec<AccountData>>;

    /// Sign a serialized sign doc for `signer_address`.
    ///
    /// Returns the 64-byte compact `r || s` signature.
    async fn sign_direct(&self, signer_address: &str, sign_doc: &[u8]) -> ConnectionResult<Vec<u8>>;
}

/// Transaction-encryption helper owned by a signer extension.
#[async_trait]
pub trait EncryptionUtility: Send + Sync {
    /// Public key used to derive per-transaction encryption keys.
    async fn pubkey(&self) -> ConnectionResult<Vec<u8>>;
}

/// Locally generated encryption seed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionSeed([u8; 32]);

impl EncryptionSeed {
    /// Generate a fresh random seed.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        Self(seed)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for EncryptionSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionSeed(***REDACTED***)")
    }
}

/// Encryption capability attached to a signing session.
#[derive(Clone)]
pub enum EncryptionUtils {
    /// Random seed for locally held accounts.
    Seed(EncryptionSeed),
    /// Utility handed out by the signer extension.
    Extension(Arc<dyn EncryptionUtility>),
}

impl fmt::Debug for EncryptionUtils {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncryptionUtils::Seed(seed) => f.debug_tuple("Seed").field(seed).finish(),
            EncryptionUtils::Extension(_) => f.write_str("Extension(..)"),
        }
    }
}

/// Which credential source produced a [`SignerBundle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Local,
    Extension,
}

/// Everything a signing client needs from the credential resolver.
#[derive(Clone)]
pub struct SignerBundle {
    pub signer: Arc<dyn OfflineSigner>,
    pub encryption: EncryptionUtils,
    pub source: CredentialSource,
}

impl fmt::Debug for SignerBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerBundle")
            .field("source", &self.source)
            .field("encryption", &self.encryption)
            .finish_non_exhaustive()
    }
}
