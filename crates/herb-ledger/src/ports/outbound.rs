//! # Outbound Ports
//!
//! The provider the ledger client talks to: an injected wallet or a node
//! reachable over JSON-RPC. Only the handful of Ethereum calls the client
//! needs are modelled.

use async_trait::async_trait;
use thiserror::Error;

use crate::abi::decode_revert;
use crate::domain::{Address, Hash32};

/// JSON-RPC error code for a user-rejected wallet request (EIP-1193).
pub const USER_REJECTED_CODE: i64 = 4001;

/// JSON-RPC error code nodes use for an execution revert.
pub const EXECUTION_REVERTED_CODE: i64 = 3;

/// JSON-RPC error code for an unsupported method.
pub const METHOD_NOT_FOUND_CODE: i64 = -32601;

/// Provider failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The endpoint could not be reached.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered with a JSON-RPC error.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message.
        message: String,
        /// Revert payload, when the node returned one.
        data: Option<Vec<u8>>,
    },

    /// The provider answered with something that is not a valid response.
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// True if the failure is an execution revert.
    pub fn is_revert(&self) -> bool {
        match self {
            Self::Rpc { code, message, data } => {
                *code == EXECUTION_REVERTED_CODE
                    || message.to_ascii_lowercase().contains("revert")
                    || data.as_deref().and_then(decode_revert).is_some()
            }
            _ => false,
        }
    }

    /// True if the wallet user declined to sign.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Rpc { code, .. } if *code == USER_REJECTED_CODE)
    }

    /// The revert reason, decoded from `Error(string)` data or taken from the
    /// message after `execution reverted:`.
    pub fn revert_reason(&self) -> Option<String> {
        let Self::Rpc { message, data, .. } = self else {
            return None;
        };
        if let Some(reason) = data.as_deref().and_then(decode_revert) {
            return Some(reason);
        }
        message
            .split_once("reverted:")
            .map(|(_, reason)| reason.trim().to_string())
            .filter(|reason| !reason.is_empty())
    }

    /// Best human-readable description: the revert reason if there is one.
    pub fn reason(&self) -> String {
        match self {
            Self::Rpc { message, .. } => self.revert_reason().unwrap_or_else(|| message.clone()),
            Self::Unavailable(msg) | Self::Malformed(msg) => msg.clone(),
        }
    }
}

/// Log entry of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawLog {
    /// Emitting contract.
    pub address: Address,
    /// Indexed topics, event signature first.
    pub topics: Vec<Hash32>,
    /// ABI-encoded non-indexed parameters.
    pub data: Vec<u8>,
}

/// Receipt of a mined transaction, before event decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawReceipt {
    /// Transaction hash.
    pub tx_hash: Hash32,
    /// Block number.
    pub block_number: u64,
    /// Gas used.
    pub gas_used: u64,
    /// `true` if execution succeeded.
    pub status: bool,
    /// Emitted logs.
    pub logs: Vec<RawLog>,
}

/// Ledger provider - outbound port.
#[async_trait]
pub trait LedgerProvider: Send + Sync {
    /// Ask the wallet for its accounts (`eth_requestAccounts`).
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// Chain id the provider is connected to (`eth_chainId`).
    async fn chain_id(&self) -> Result<u64, ProviderError>;

    /// Execute a read-only call against the latest block (`eth_call`).
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ProviderError>;

    /// Sign and submit a transaction from `from` (`eth_sendTransaction`).
    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Vec<u8>,
    ) -> Result<Hash32, ProviderError>;

    /// Receipt of a transaction, `None` while it is pending
    /// (`eth_getTransactionReceipt`).
    async fn transaction_receipt(&self, tx_hash: Hash32)
        -> Result<Option<RawReceipt>, ProviderError>;
}
