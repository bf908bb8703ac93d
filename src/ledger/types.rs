//! Ledger-facing value types and the error taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while acquiring a query or signing session.
///
/// Cloneable so a single construction failure can be handed to every caller
/// that joined the same in-flight build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// Account record carries a credential source this crate does not know.
    #[error("Unsupported account type: {0}")]
    UnsupportedAccountType(String),

    /// Signer extension is not installed or not reachable.
    #[error("Signer extension unavailable: {0}")]
    ExtensionUnavailable(String),

    /// User declined the extension's approval prompt.
    #[error("Signer extension rejected chain {chain_id}: {reason}")]
    ExtensionRejected { chain_id: String, reason: String },

    /// Network node could not be reached.
    #[error("Endpoint {endpoint} unreachable: {reason}")]
    EndpointUnreachable { endpoint: String, reason: String },

    /// Query client could not be built from the endpoint configuration.
    #[error("Query client construction failed: {0}")]
    QueryClientConstructionFailed(String),

    /// Signing client could not be built from the endpoint configuration.
    #[error("Signing client construction failed: {0}")]
    SigningClientConstructionFailed(String),

    /// Query against an established client failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Local key material could not be turned into a signer.
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// Construction task ended without reporting a result.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// How a caller should react to a [`ConnectionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Programmer error. Report and stop.
    Fatal,
    /// Needs a fresh user action (install, approve) before retrying.
    UserAction,
    /// Transient; re-invoking the same call is safe.
    Retryable,
}

impl ConnectionError {
    /// Classify the error for caller-side handling.
    pub fn class(&self) -> ErrorClass {
        match self {
            ConnectionError::UnsupportedAccountType(_) | ConnectionError::Internal(_) => {
                ErrorClass::Fatal
            }
            ConnectionError::ExtensionUnavailable(_)
            | ConnectionError::ExtensionRejected { .. }
            | ConnectionError::InvalidCredential(_) => ErrorClass::UserAction,
            ConnectionError::EndpointUnreachable { .. }
            | ConnectionError::QueryClientConstructionFailed(_)
            | ConnectionError::SigningClientConstructionFailed(_)
            | ConnectionError::Query(_) => ErrorClass::Retryable,
        }
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectionError::UnsupportedAccountType(_) => "unsupported_account_type",
            ConnectionError::ExtensionUnavailable(_) => "extension_unavailable",
            ConnectionError::ExtensionRejected { .. } => "extension_rejected",
            ConnectionError::EndpointUnreachable { .. } => "endpoint_unreachable",
            ConnectionError::QueryClientConstructionFailed(_) => "query_client_construction",
            ConnectionError::SigningClientConstructionFailed(_) => "signing_client_construction",
            ConnectionError::Query(_) => "query",
            ConnectionError::InvalidCredential(_) => "invalid_credential",
            ConnectionError::Internal(_) => "internal",
        }
    }
}

/// Result type for session operations.
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// The `(rpc, rest)` endpoints a session was built against.
///
/// Two sessions are interchangeable iff their pairs are equal; every other
/// endpoint field only matters at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointPair {
    pub rpc: String,
    pub rest: String,
}

impl EndpointPair {
    pub fn new(rpc: impl Into<String>, rest: impl Into<String>) -> Self {
        Self {
            rpc: rpc.into(),
            rest: rest.into(),
        }
    }
}

impl fmt::Display for EndpointPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rpc={} rest={}", self.rpc, self.rest)
    }
}

/// Fee price per unit of gas in the chain's smallest denomination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasPrice {
    amount: String,
    denom: String,
}

impl GasPrice {
    /// Build a gas price from a decimal amount and a denomination.
    ///
    /// The amount must be a non-negative decimal (`12`, `0.25`); the denom
    /// follows the ledger's coin denomination rules.
    pub fn new(amount: &str, denom: &str) -> ConnectionResult<Self> {
        let amount = amount.trim();
        if !is_decimal(amount) {
            return Err(ConnectionError::SigningClientConstructionFailed(format!(
                "Invalid gas price amount '{}'",
                amount
            )));
        }
        if !is_valid_denom(denom) {
            return Err(ConnectionError::SigningClientConstructionFailed(format!(
                "Invalid gas price denom '{}'",
                denom
            )));
        }
        Ok(Self {
            amount: amount.to_string(),
            denom: denom.to_string(),
        })
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn denom(&self) -> &str {
        &self.denom
    }
}

impl fmt::Display for GasPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// `digits` or `digits.digits`.
pub(crate) fn is_decimal(value: &str) -> bool {
    let mut parts = value.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let frac = parts.next();
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && frac.map_or(true, digits)
}

pub(crate) fn is_valid_denom(denom: &str) -> bool {
    let bytes = denom.as_bytes();
    if !(3..=128).contains(&bytes.len()) || !bytes[0].is_ascii_alphabetic() {
        return false;
    }
    bytes[1..]
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'/' | b':' | b'.' | b'_' | b'-'))
}
