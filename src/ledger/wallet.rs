//! Local mnemonic wallet and signing.
//!
//! # Security
//! - Mnemonics are zeroized on drop and redacted from `Debug`
//! - Key material is never logged or serialized
//! - Only the derived account address leaves this module

use std::fmt;

use alloy::primitives::B256;
use alloy::signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use alloy::signers::Signer;
use async_trait::async_trait;
use bitcoin::bech32::{self, Bech32, Hrp};
use bitcoin::hashes::{hash160, Hash};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::ledger::signer::{AccountData, OfflineSigner};
use crate::ledger::types::{ConnectionError, ConnectionResult};

/// Default BIP-44 path for secp256k1 ledger accounts (coin type 118).
pub const DEFAULT_HD_PATH: &str = "m/44'/118'/0'/0/0";

/// Environment variable the CLI reads a mnemonic from.
pub const MNEMONIC_ENV_VAR: &str = "LEDGER_CONNECT_MNEMONIC";

/// A BIP-39 phrase held as secret material.
#[derive(Clone, PartialEq, Eq, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Mnemonic(String);

impl Mnemonic {
    pub fn new(phrase: impl Into<String>) -> Self {
        Self(phrase.into())
    }

    /// Load a mnemonic from `LEDGER_CONNECT_MNEMONIC`.
    pub fn from_env() -> ConnectionResult<Self> {
        std::env::var(MNEMONIC_ENV_VAR).map(Self).map_err(|_| {
            ConnectionError::InvalidCredential(format!(
                "Environment variable {} not set",
                MNEMONIC_ENV_VAR
            ))
        })
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Mnemonic(***REDACTED***)")
    }
}

/// Wallet derived from a mnemonic, bound to one address prefix.
#[derive(Clone)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
    pubkey: Vec<u8>,
    address: String,
}

impl LocalWallet {
    /// Derive the key at `hd_path` and render its address with `prefix`.
    pub fn from_mnemonic(mnemonic: &Mnemonic, prefix: &str, hd_path: &str) -> ConnectionResult<Self> {
        if mnemonic.is_empty() {
            return Err(ConnectionError::InvalidCredential("Mnemonic is empty".to_string()));
        }

        let signer = MnemonicBuilder::<English>::default()
            .phrase(mnemonic.expose().trim())
            .derivation_path(hd_path)
            .map_err(|e| {
                ConnectionError::InvalidCredential(format!("Invalid derivation path '{}': {}", hd_path, e))
            })?
            .build()
            .map_err(|e| ConnectionError::InvalidCredential(format!("Key derivation failed: {}", e)))?;

        let pubkey = signer.credential().verifying_key().to_sec1_bytes().to_vec();
        let address = bech32_address(prefix, &pubkey)?;

        tracing::debug!(address = %address, "Local wallet derived");

        Ok(Self {
            signer,
            pubkey,
            address,
        })
    }

    /// Bech32 account address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Compressed secp256k1 public key.
    pub fn public_key(&self) -> &[u8] {
        &self.pubkey
    }

    /// Sign `sha256(bytes)` and return the compact 64-byte signature.
    pub async fn sign_bytes(&self, bytes: &[u8]) -> ConnectionResult<[u8; 64]> {
        let digest = B256::from_slice(&Sha256::digest(bytes));
        let signature = self
            .signer
            .sign_hash(&digest)
            .await
            .map_err(|e| ConnectionError::InvalidCredential(format!("Signing failed: {}", e)))?;

        let mut compact = [0u8; 64];
        compact.copy_from_slice(&signature.as_bytes()[..64]);
        Ok(compact)
    }
}

impl fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl OfflineSigner for LocalWallet {
    async fn get_accounts(&self) -> ConnectionResult<Vec<AccountData>> {
        Ok(vec![AccountData {
            address: self.address.clone(),
            pubkey: self.pubkey.clone(),
            algo: "secp256k1".to_string(),
        }])
    }

    async fn sign_direct(&self, signer_address: &str, sign_doc: &[u8]) -> ConnectionResult<Vec<u8>> {
        if signer_address != self.address {
            return Err(ConnectionError::InvalidCredential(format!(
                "Address {} not found in wallet",
                signer_address
            )));
        }
        Ok(self.sign_bytes(sign_doc).await?.to_vec())
    }
}

/// `bech32(prefix, ripemd160(sha256(pubkey)))`.
pub fn bech32_address(prefix: &str, pubkey: &[u8]) -> ConnectionResult<String> {
    let hrp = Hrp::parse(prefix).map_err(|e| {
        ConnectionError::InvalidCredential(format!("Invalid address prefix '{}': {}", prefix, e))
    })?;
    let hash = hash160::Hash::hash(pubkey);
    bech32::encode::<Bech32>(hrp, hash.as_byte_array())
        .map_err(|e| ConnectionError::InvalidCredential(format!("Address encoding failed: {}", e)))
}
