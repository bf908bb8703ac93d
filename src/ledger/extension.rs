//! Contract of the external signer extension.
//!
//! The extension lives out of process and gates every chain behind a user
//! approval prompt. `enable` may therefore suspend for as long as the user
//! takes to answer; timeouts are the implementation's business.

use std::sync::Arc;

use async_trait::async_trait;

use crate::ledger::signer::{EncryptionUtility, OfflineSigner};
use crate::ledger::types::ConnectionResult;

/// Capability exposed by a browser-style signer extension.
///
/// Implementations report `ExtensionUnavailable` when the extension cannot
/// be reached and `ExtensionRejected` when the user declines.
#[async_trait]
pub trait SignerExtension: Send + Sync {
    /// Ask the extension to enable `chain_id` for this client.
    async fn enable(&self, chain_id: &str) -> ConnectionResult<()>;

    /// Offline signer for `chain_id`. Only valid after [`enable`](Self::enable).
    async fn offline_signer(&self, chain_id: &str) -> ConnectionResult<Arc<dyn OfflineSigner>>;

    /// Encryption utility for `chain_id`. Only valid after [`enable`](Self::enable).
    async fn encryption_utility(
        &self,
        chain_id: &str,
    ) -> ConnectionResult<Arc<dyn EncryptionUtility>>;
}
