//! # Domain Errors
//!
//! Error types surfaced by the ledger adapter.
//!
//! Failures are never retried here. A failed write is reported to the caller
//! and is not resubmitted.

use thiserror::Error;

use crate::abi::AbiError;

/// Errors produced by ledger operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// No provider, no connected account, or the endpoint is unreachable.
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    /// The ledger or wallet rejected the call, or the transaction reverted.
    #[error("Submission failed: {reason}")]
    Submission {
        /// Revert reason or provider message.
        reason: String,
    },

    /// The ledger reverted with an access-control reason.
    #[error("Unauthorized: {reason}")]
    Unauthorized {
        /// Revert reason reported by the ledger.
        reason: String,
    },

    /// A read targeted a batch that does not exist or an out-of-range index.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A value could not be encoded for the ledger.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The ledger or provider returned data that could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The provider is connected to a different chain than configured.
    #[error("Chain mismatch: expected chain {expected}, provider reports {actual}")]
    ChainMismatch {
        /// Chain id from configuration.
        expected: u64,
        /// Chain id reported by the provider.
        actual: u64,
    },
}

impl LedgerError {
    /// True for every remote rejection of a write, authorization failures included.
    pub fn is_submission_failure(&self) -> bool {
        matches!(self, Self::Submission { .. } | Self::Unauthorized { .. })
    }

    /// True when the batch or event does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<AbiError> for LedgerError {
    fn from(err: AbiError) -> Self {
        Self::Decode(err.to_string())
    }
}
