//! Credential resolution per account type.
//!
//! Local accounts derive a signer from their mnemonic and get a fresh random
//! encryption seed; no round trip leaves the process. Extension accounts ask
//! the signer extension to enable the chain, which may block on the user's
//! approval, and then borrow its signer and encryption utility.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::ledger::extension::SignerExtension;
use crate::ledger::signer::{CredentialSource, EncryptionSeed, EncryptionUtils, SignerBundle};
use crate::config::schema::EndpointConfig;
use crate::ledger::types::{ConnectionError, ConnectionResult};
use crate::ledger::wallet::LocalWallet;
use crate::session::account::AccountDescriptor;

/// Turns account descriptors into signer bundles.
pub struct CredentialResolver {
    extension: Option<Arc<dyn SignerExtension>>,
    resolutions: AtomicU64,
}

impl CredentialResolver {
    pub fn new(extension: Option<Arc<dyn SignerExtension>>) -> Self {
        Self {
            extension,
            resolutions: AtomicU64::new(0),
        }
    }

    /// Number of resolutions attempted so far.
    pub fn resolutions(&self) -> u64 {
        self.resolutions.load(Ordering::Relaxed)
    }

    /// Resolve the signer and encryption capability for `account` on `config`'s chain.
    pub async fn resolve(
        &self,
        account: &AccountDescriptor,
        config: &EndpointConfig,
    ) -> ConnectionResult<SignerBundle> {
        self.resolutions.fetch_add(1, Ordering::Relaxed);

        match account {
            AccountDescriptor::Local { address, mnemonic } => {
                let mnemonic = mnemonic.clone();
                let prefix = config.address_prefix.clone();
                let hd_path = config.hd_path().to_string();

                // PBKDF2 + BIP-32 derivation is CPU work, keep it off the reactor.
                let wallet = tokio::task::spawn_blocking(move || {
                    LocalWallet::from_mnemonic(&mnemonic, &prefix, &hd_path)
                })
                .await
                .map_err(|e| ConnectionError::Internal(format!("Key derivation task failed: {}", e)))??;

                if wallet.address() != address.as_str() {
                    tracing::warn!(
                        address = %address,
                        derived = %wallet.address(),
                        "Mnemonic derives a different address than the account record"
                    );
                }

                tracing::debug!(address = %address, "Resolved local signer");
                Ok(SignerBundle {
                    signer: Arc::new(wallet),
                    encryption: EncryptionUtils::Seed(EncryptionSeed::generate()),
                    source: CredentialSource::Local,
                })
            }
            AccountDescriptor::Extension { address } => {
                let extension = self.extension.as_ref().ok_or_else(|| {
                    ConnectionError::ExtensionUnavailable("No signer extension is installed".to_string())
                })?;
                let chain_id = config.chain_id.as_str();

                tracing::info!(address = %address, chain_id = %chain_id, "Requesting signer extension approval");
                extension.enable(chain_id).await?;

                let signer = extension.offline_signer(chain_id).await?;
                let encryption = extension.encryption_utility(chain_id).await?;

                tracing::debug!(address = %address, chain_id = %chain_id, "Resolved extension signer");
                Ok(SignerBundle {
                    signer,
                    encryption: EncryptionUtils::Extension(encryption),
                    source: CredentialSource::Extension,
                })
            }
        }
    }
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("extension", &self.extension.is_some())
            .field("resolutions", &self.resolutions())
            .finish()
    }
}
