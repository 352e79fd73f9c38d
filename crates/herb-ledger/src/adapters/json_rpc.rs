//! JSON-RPC provider speaking to a node or wallet endpoint over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use super::rpc_types::{
    CallRequest, HexBytes, JsonRpcRequest, JsonRpcResponse, Quantity, RpcReceipt,
    SendTransactionRequest,
};
use crate::config::LedgerConfig;
use crate::domain::{Address, Hash32};
use crate::ports::{LedgerProvider, ProviderError, RawReceipt, METHOD_NOT_FOUND_CODE};

/// Ledger provider backed by an HTTP JSON-RPC endpoint.
///
/// The endpoint must be able to sign for the accounts it reports
/// (a wallet bridge or a development node with unlocked accounts).
pub struct JsonRpcProvider {
    client: Client,
    endpoint: String,
    read_timeout: Duration,
    request_id: AtomicU64,
}

/// Methods that wait on the wallet user. They run without a deadline.
const WALLET_METHODS: &[&str] = &["eth_requestAccounts", "eth_sendTransaction"];

/// Upper bound on establishing the TCP connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

impl JsonRpcProvider {
    /// Create a provider for `endpoint`.
    ///
    /// `read_timeout` bounds node queries (`eth_call`, receipts, chain id).
    /// Wallet prompts are only bounded by the connect timeout.
    pub fn new(endpoint: impl Into<String>, read_timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .connect_timeout(read_timeout.min(CONNECT_TIMEOUT))
            .build()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            read_timeout,
            request_id: AtomicU64::new(1),
        })
    }

    /// Create a provider from the ledger configuration.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, ProviderError> {
        Self::new(config.rpc_url.clone(), config.request_timeout)
    }

    /// Endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Call a JSON-RPC method whose result may be `null`.
    async fn request_nullable<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<Option<R>, ProviderError> {
        let id = self.next_id();
        let request = JsonRpcRequest::new(method, params, id);
        trace!(method, id, "JSON-RPC request");

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if !WALLET_METHODS.contains(&method) {
            builder = builder.timeout(self.read_timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    ProviderError::Unavailable(format!("Cannot reach {}: {}", self.endpoint, e))
                } else {
                    ProviderError::Malformed(e.to_string())
                }
            })?;

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        if let Some(error) = rpc_response.error {
            debug!(method, code = error.code, message = %error.message, "JSON-RPC error");
            return Err(ProviderError::Rpc {
                code: error.code,
                data: error.revert_data(),
                message: error.message,
            });
        }

        Ok(rpc_response.result)
    }

    /// Call a JSON-RPC method that must return a result.
    async fn request<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, ProviderError> {
        self.request_nullable(method, params)
            .await?
            .ok_or_else(|| ProviderError::Malformed(format!("Missing result for {method}")))
    }
}

#[async_trait]
impl LedgerProvider for JsonRpcProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        match self
            .request::<[(); 0], Vec<Address>>("eth_requestAccounts", [])
            .await
        {
            Err(ProviderError::Rpc { code, .. }) if code == METHOD_NOT_FOUND_CODE => {
                debug!("eth_requestAccounts unsupported, falling back to eth_accounts");
                self.request::<[(); 0], Vec<Address>>("eth_accounts", []).await
            }
            other => other,
        }
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        let id: Quantity = self.request("eth_chainId", [(); 0]).await?;
        Ok(id.0)
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ProviderError> {
        let request = CallRequest {
            to,
            data: HexBytes(data),
        };
        let result: HexBytes = self.request("eth_call", (request, "latest")).await?;
        Ok(result.0)
    }

    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Vec<u8>,
    ) -> Result<Hash32, ProviderError> {
        let request = SendTransactionRequest {
            from,
            to,
            data: HexBytes(data),
        };
        self.request("eth_sendTransaction", [request]).await
    }

    async fn transaction_receipt(
        &self,
        tx_hash: Hash32,
    ) -> Result<Option<RawReceipt>, ProviderError> {
        let receipt: Option<RpcReceipt> = self
            .request_nullable("eth_getTransactionReceipt", [tx_hash])
            .await?;
        Ok(receipt.map(RawReceipt::from))
    }
}
