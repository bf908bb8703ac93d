//! Account descriptors handed in by the account store.

use std::fmt;

use serde::Deserialize;

use crate::ledger::types::ConnectionError;
use crate::ledger::wallet::Mnemonic;

/// Where an account's signing authority comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum AccountDescriptor {
    /// Key material held locally as a mnemonic.
    Local { address: String, mnemonic: Mnemonic },
    /// Key held by the signer extension, looked up by chain id.
    Extension { address: String },
}

impl AccountDescriptor {
    pub fn local(address: impl Into<String>, mnemonic: Mnemonic) -> Self {
        Self::Local {
            address: address.into(),
            mnemonic,
        }
    }

    pub fn extension(address: impl Into<String>) -> Self {
        Self::Extension {
            address: address.into(),
        }
    }

    /// Stable cache key for the account's signing session.
    pub fn address(&self) -> &str {
        match self {
            Self::Local { address, .. } | Self::Extension { address } => address,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::Extension { .. } => "extension",
        }
    }
}

impl fmt::Debug for AccountDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountDescriptor")
            .field("kind", &self.kind())
            .field("address", &self.address())
            .finish()
    }
}

/// Loosely typed account record as stored by the wallet.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
    #[serde(default)]
    pub mnemonic: Option<Mnemonic>,
}

impl TryFrom<AccountRecord> for AccountDescriptor {
    type Error = ConnectionError;

    fn try_from(record: AccountRecord) -> Result<Self, Self::Error> {
        if record.address.trim().is_empty() {
            return Err(ConnectionError::UnsupportedAccountType(format!(
                "{} account without an address",
                record.kind
            )));
        }

        match record.kind.to_ascii_lowercase().as_str() {
            "basic" | "local" => match record.mnemonic {
                Some(mnemonic) if !mnemonic.is_empty() => Ok(Self::local(record.address, mnemonic)),
                _ => Err(ConnectionError::UnsupportedAccountType(format!(
                    "local account {} has no mnemonic",
                    record.address
                ))),
            },
            "keplr" | "extension" => Ok(Self::extension(record.address)),
            other => Err(ConnectionError::UnsupportedAccountType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> AccountRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_basic_record_is_local() {
        let account = AccountDescriptor::try_from(record(
            r#"{"type": "Basic", "address": "secret1abc", "mnemonic": "word word"}"#,
        ))
        .unwrap();
        assert_eq!(account.kind(), "local");
        assert_eq!(account.address(), "secret1abc");
    }

    #[test]
    fn test_keplr_record_is_extension() {
        let account =
            AccountDescriptor::try_from(record(r#"{"type": "keplr", "address": "secret1abc"}"#)).unwrap();
        assert_eq!(account, AccountDescriptor::extension("secret1abc"));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = AccountDescriptor::try_from(record(r#"{"type": "ledger", "address": "secret1abc"}"#))
            .unwrap_err();
        assert_eq!(err, ConnectionError::UnsupportedAccountType("ledger".to_string()));
    }

    #[test]
    fn test_local_without_mnemonic_rejected() {
        let err = AccountDescriptor::try_from(record(r#"{"type": "basic", "address": "secret1abc"}"#))
            .unwrap_err();
        assert!(matches!(err, ConnectionError::UnsupportedAccountType(_)));
    }

    #[test]
    fn test_empty_address_rejected() {
        let err =
            AccountDescriptor::try_from(record(r#"{"type": "keplr", "address": " "}"#)).unwrap_err();
        assert!(err.to_string().contains("without an address"));
    }

    #[test]
    fn test_debug_hides_mnemonic() {
        let account = AccountDescriptor::local("secret1abc", Mnemonic::new("very secret words"));
        assert!(!format!("{:?}", account).contains("secret words"));
    }
}
