//! Ledger client configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::domain::Address;

/// Contract address used when none is configured.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x1234567890123456789012345678901234567890";

/// Default receipt polling interval.
pub const DEFAULT_RECEIPT_POLL: Duration = Duration::from_millis(1_000);

/// Default timeout for node queries. Wallet prompts are not bounded.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds an unusable value.
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Networks the contract is deployed on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Network {
    /// Sepolia test network.
    #[default]
    Sepolia,
    /// Local development node on port 8545.
    Localhost,
}

impl Network {
    /// EIP-155 chain id.
    pub const fn chain_id(&self) -> u64 {
        match self {
            Network::Sepolia => 0xaa36a7,
            Network::Localhost => 0x539,
        }
    }

    /// Human-readable chain name.
    pub const fn chain_name(&self) -> &'static str {
        match self {
            Network::Sepolia => "Sepolia Test Network",
            Network::Localhost => "Localhost 8545",
        }
    }

    /// Default RPC endpoint.
    pub const fn rpc_url(&self) -> &'static str {
        match self {
            Network::Sepolia => "https://sepolia.infura.io/v3/",
            Network::Localhost => "http://localhost:8545",
        }
    }

    /// Block explorer, if the network has one.
    pub const fn block_explorer(&self) -> Option<&'static str> {
        match self {
            Network::Sepolia => Some("https://sepolia.etherscan.io/"),
            Network::Localhost => None,
        }
    }

    /// Network whose chain id is `chain_id`.
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        [Network::Sepolia, Network::Localhost]
            .into_iter()
            .find(|n| n.chain_id() == chain_id)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Sepolia => write!(f, "sepolia"),
            Network::Localhost => write!(f, "localhost"),
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sepolia" => Ok(Network::Sepolia),
            "localhost" | "local" => Ok(Network::Localhost),
            other => Err(format!("unknown network '{other}' (expected sepolia or localhost)")),
        }
    }
}

/// Configuration for a ledger session.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    /// Target network.
    pub network: Network,
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    /// Deployed HerbTraceability contract.
    pub contract: Address,
    /// Interval between receipt polls after a submission.
    pub receipt_poll_interval: Duration,
    /// Timeout for node queries; transaction submission waits on the wallet
    /// without a deadline.
    pub request_timeout: Duration,
    /// Reject providers connected to a different chain.
    pub verify_chain: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::for_network(Network::default())
    }
}

impl LedgerConfig {
    /// Defaults for `network`.
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            rpc_url: network.rpc_url().to_string(),
            contract: Address::new(DEFAULT_CONTRACT),
            receipt_poll_interval: DEFAULT_RECEIPT_POLL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            verify_chain: true,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `HERB_NETWORK`: `sepolia` or `localhost` (default: sepolia)
    /// - `HERB_RPC_URL`: JSON-RPC endpoint (default: the network's endpoint)
    /// - `HERB_CONTRACT_ADDRESS`: contract address (default: 0x1234...7890)
    /// - `HERB_RECEIPT_POLL_MS`: receipt poll interval (default: 1000)
    /// - `HERB_REQUEST_TIMEOUT_SECS`: query timeout (default: 30)
    /// - `HERB_VERIFY_CHAIN`: check the provider's chain id (default: true)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Create configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network = match lookup("HERB_NETWORK") {
            Some(value) => value.parse().map_err(|reason| ConfigError::InvalidValue {
                var: "HERB_NETWORK",
                value,
                reason,
            })?,
            None => Network::default(),
        };
        let mut config = Self::for_network(network);

        if let Some(url) = lookup("HERB_RPC_URL").filter(|u| !u.trim().is_empty()) {
            config.rpc_url = url;
        }
        if let Some(value) = lookup("HERB_CONTRACT_ADDRESS") {
            config.contract = value.parse().map_err(|e: crate::domain::LedgerError| {
                ConfigError::InvalidValue {
                    var: "HERB_CONTRACT_ADDRESS",
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(value) = lookup("HERB_RECEIPT_POLL_MS") {
            config.receipt_poll_interval =
                Duration::from_millis(parse_number("HERB_RECEIPT_POLL_MS", &value)?);
        }
        if let Some(value) = lookup("HERB_REQUEST_TIMEOUT_SECS") {
            config.request_timeout =
                Duration::from_secs(parse_number("HERB_REQUEST_TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = lookup("HERB_VERIFY_CHAIN") {
            config.verify_chain = value.eq_ignore_ascii_case("true") || value == "1";
        }

        Ok(config)
    }
}

const DEFAULT_CONTRACT: [u8; 20] = [
    0x12, 0x34, 0x56, 0x78, 0x90, 0x12, 0x34, 0x56, 0x78, 0x90, 0x12, 0x34, 0x56, 0x78, 0x90,
    0x12, 0x34, 0x56, 0x78, 0x90,
];

fn parse_number(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    let parsed: u64 = value.trim().parse().map_err(|e: std::num::ParseIntError| {
        ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: e.to_string(),
        }
    })?;
    if parsed == 0 {
        return Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(parsed)
}
