//! Ledger session: one provider handle, one contract, one connected account.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::domain::{Address, LedgerError};
use crate::ports::{LedgerProvider, ProviderError};

/// A connection to the contract through a provider.
///
/// Cloning is cheap; clones share the provider handle.
pub struct LedgerSession<P: LedgerProvider> {
    provider: Arc<P>,
    contract: Address,
    account: Option<Address>,
}

impl<P: LedgerProvider> Clone for LedgerSession<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            contract: self.contract,
            account: self.account,
        }
    }
}

impl<P: LedgerProvider> std::fmt::Debug for LedgerSession<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerSession")
            .field("contract", &self.contract)
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl<P: LedgerProvider> LedgerSession<P> {
    /// Connect using the wallet's first account.
    ///
    /// Fails with `TransportUnavailable` if the provider cannot be reached or
    /// exposes no account, and with `ChainMismatch` if `verify_chain` is set
    /// and the provider is on another network.
    pub async fn connect(provider: Arc<P>, config: &LedgerConfig) -> Result<Self, LedgerError> {
        Self::establish(provider, config, None).await
    }

    /// Connect using a specific account held by the wallet.
    pub async fn connect_as(
        provider: Arc<P>,
        config: &LedgerConfig,
        account: Address,
    ) -> Result<Self, LedgerError> {
        Self::establish(provider, config, Some(account)).await
    }

    /// A session without an account; only reads are possible.
    pub fn read_only(provider: Arc<P>, contract: Address) -> Self {
        Self {
            provider,
            contract,
            account: None,
        }
    }

    async fn establish(
        provider: Arc<P>,
        config: &LedgerConfig,
        wanted: Option<Address>,
    ) -> Result<Self, LedgerError> {
        if config.verify_chain {
            let actual = provider.chain_id().await.map_err(transport_error)?;
            let expected = config.network.chain_id();
            if actual != expected {
                warn!(expected, actual, "Provider connected to unexpected chain");
                return Err(LedgerError::ChainMismatch { expected, actual });
            }
        }

        let accounts = provider.request_accounts().await.map_err(transport_error)?;
        debug!(count = accounts.len(), "Wallet accounts available");

        let account = match wanted {
            Some(wanted) if accounts.contains(&wanted) => wanted,
            Some(wanted) => {
                return Err(LedgerError::TransportUnavailable(format!(
                    "account {wanted} not available in wallet"
                )))
            }
            None => *accounts.first().ok_or_else(|| {
                LedgerError::TransportUnavailable("wallet exposes no accounts".to_string())
            })?,
        };

        info!(
            account = %account.short(),
            contract = %config.contract,
            network = %config.network,
            "Wallet connected"
        );

        Ok(Self {
            provider,
            contract: config.contract,
            account: Some(account),
        })
    }

    /// Provider handle.
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Contract address.
    pub fn contract(&self) -> Address {
        self.contract
    }

    /// Connected account, if any.
    pub fn account(&self) -> Option<Address> {
        self.account
    }

    /// True if writes can be signed.
    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    /// The connected account, or `TransportUnavailable`.
    pub fn require_account(&self) -> Result<Address, LedgerError> {
        self.account
            .ok_or_else(|| LedgerError::TransportUnavailable("wallet not connected".to_string()))
    }
}

fn transport_error(err: ProviderError) -> LedgerError {
    LedgerError::TransportUnavailable(err.reason())
}
