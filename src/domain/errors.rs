//! Error taxonomy shared by every layer of the client.
//!
//! Each variant maps to one user-visible error name (see [`SdkError::name`]),
//! which the CLI raw mode emits as `{ok:false, error:{name, message}}`.

use std::fmt;

use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

/// Result alias used across the library.
pub type SdkResult<T> = Result<T, SdkError>;

/// Which bridge bound rejected a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitBound {
    /// Below `minPerTx`.
    MinPerTx,
    /// Above `maxPerTx`.
    MaxPerTx,
    /// Would exceed `dailyLimit` for the current bridge day.
    DailyLimit,
}

impl fmt::Display for LimitBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinPerTx => write!(f, "minPerTx"),
            Self::MaxPerTx => write!(f, "maxPerTx"),
            Self::DailyLimit => write!(f, "dailyLimit"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Configuration(String),

    #[error("missing signer: {operation} requires a signing key")]
    MissingSigner { operation: &'static str },

    #[error("insufficient funds: requested {required} {unit} but only {available} {unit} available (missing {shortfall} {unit})")]
    InsufficientFunds {
        required: U256,
        available: U256,
        shortfall: U256,
        unit: &'static str,
    },

    #[error("{address} is not whitelisted on this enterprise chain")]
    NotWhitelisted { address: Address },

    #[error("bridge {bound} rejects {amount}: limit {limit}, already spent today {spent_today}")]
    BridgeLimit {
        bound: LimitBound,
        amount: U256,
        limit: U256,
        spent_today: U256,
    },

    #[error("transaction {tx_hash} reverted")]
    TransactionReverted { tx_hash: B256 },

    #[error("transaction {tx_hash} not confirmed: expected event {event} missing from receipt")]
    TransactionNotConfirmed { tx_hash: B256, event: &'static str },

    #[error("bridge transfer {source_tx_hash} was sent but did not complete: {source}")]
    Bridge {
        source_tx_hash: B256,
        /// Destination block to resume the receive watch from, when known.
        watch_from: Option<u64>,
        #[source]
        source: Box<SdkError>,
    },

    #[error("RPC call failed: {0}")]
    Rpc(String),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("operation aborted")]
    Aborted,
}

impl SdkError {
    /// Stable error name surfaced to CLI consumers.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::Configuration(_) => "ConfigurationError",
            Self::MissingSigner { .. } => "MissingSignerError",
            Self::InsufficientFunds { .. } => "InsufficientFundsError",
            Self::NotWhitelisted { .. } => "NotWhitelistedError",
            Self::BridgeLimit { .. } => "BridgeLimitError",
            Self::TransactionReverted { .. } => "TransactionRevertedError",
            Self::TransactionNotConfirmed { .. } => "TransactionNotConfirmedError",
            Self::Bridge { .. } => "BridgeError",
            Self::Rpc(_) => "RpcError",
            Self::Gateway(_) => "GatewayError",
            Self::Aborted => "AbortError",
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Wrap a transport error with the call it came from.
    pub fn rpc(context: &str, err: impl fmt::Display) -> Self {
        Self::Rpc(format!("{context}: {err}"))
    }

    /// Build an `InsufficientFunds` error from the two sides of a failed guard.
    pub fn insufficient(required: U256, available: U256, unit: &'static str) -> Self {
        Self::InsufficientFunds {
            required,
            available,
            shortfall: required.saturating_sub(available),
            unit,
        }
    }

    /// Attach an already-sent source transaction to a bridge failure.
    ///
    /// An error that already carries a source hash is returned unchanged.
    pub fn after_bridge_send(self, source_tx_hash: B256, watch_from: Option<u64>) -> Self {
        match self {
            Self::Bridge { .. } => self,
            other => Self::Bridge {
                source_tx_hash,
                watch_from,
                source: Box::new(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_names_shortfall() {
        let err = SdkError::insufficient(U256::from(150), U256::from(100), "nRLC");
        match &err {
            SdkError::InsufficientFunds { shortfall, .. } => {
                assert_eq!(*shortfall, U256::from(50));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.name(), "InsufficientFundsError");
        assert!(err.to_string().contains("missing 50 nRLC"));
    }

    #[test]
    fn test_bridge_wrap_is_idempotent() {
        let hash = B256::repeat_byte(0xab);
        let wrapped = SdkError::Aborted.after_bridge_send(hash, Some(12));
        let rewrapped = wrapped.after_bridge_send(B256::ZERO, None);
        match rewrapped {
            SdkError::Bridge { source_tx_hash, watch_from, source } => {
                assert_eq!(source_tx_hash, hash);
                assert_eq!(watch_from, Some(12));
                assert!(matches!(*source, SdkError::Aborted));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
