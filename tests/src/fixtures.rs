//! Shared fixtures: well-known accounts, a seeded in-memory ledger and an
//! axum JSON-RPC bridge in front of any provider.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use herb_ledger::{
    Address, Coordinates, HerbTraceService, InMemoryLedger, LedgerConfig, LedgerProvider,
    LedgerSession, Moisture, NewBatch, NewEvent, NewQualityTest, ProviderError,
};

pub const CONTRACT: Address = Address::new([0x12; 20]);
pub const OWNER: Address = Address::new([0xa0; 20]);
pub const COLLECTOR: Address = Address::new([0xc0; 20]);
pub const PROCESSOR: Address = Address::new([0xd0; 20]);
pub const LAB: Address = Address::new([0xe0; 20]);

pub const HARVEST_SITE: Coordinates = Coordinates::new(26.9124, 75.7873);
pub const FACILITY: Coordinates = Coordinates::new(28.6139, 77.209);

pub fn config() -> LedgerConfig {
    LedgerConfig {
        contract: CONTRACT,
        receipt_poll_interval: Duration::from_millis(1),
        ..LedgerConfig::default()
    }
}

/// Ledger owned by [`OWNER`] whose wallet holds every fixture account.
pub fn ledger() -> Arc<InMemoryLedger> {
    let ledger = InMemoryLedger::new(CONTRACT, OWNER);
    for account in [COLLECTOR, PROCESSOR, LAB] {
        ledger.add_account(account);
    }
    ledger.set_time(1_648_771_200);
    Arc::new(ledger)
}

pub async fn service_as<P: LedgerProvider>(
    provider: &Arc<P>,
    account: Address,
) -> HerbTraceService<P> {
    let config = config();
    let session = LedgerSession::connect_as(Arc::clone(provider), &config, account)
        .await
        .expect("fixture account must be in the wallet");
    HerbTraceService::with_config(session, &config)
}

pub fn harvest(batch_id: &str) -> NewBatch {
    NewBatch {
        batch_id: batch_id.to_string(),
        species: "Ashwagandha".to_string(),
        event_id: "EVT-001".to_string(),
        metadata_ref: "QmHarvest".to_string(),
        location: HARVEST_SITE,
    }
}

pub fn step(batch_id: &str, event_type: &str) -> NewEvent {
    NewEvent {
        batch_id: batch_id.to_string(),
        event_id: format!("PROC-{event_type}"),
        event_type: event_type.to_string(),
        metadata_ref: "{}".to_string(),
        location: FACILITY,
    }
}

pub fn quality(batch_id: &str, test_type: &str, percent: f64) -> NewQualityTest {
    NewQualityTest {
        batch_id: batch_id.to_string(),
        event_id: format!("LAB-{test_type}"),
        test_type: test_type.to_string(),
        measurement: Moisture(percent),
        metadata_ref: "{}".to_string(),
        location: FACILITY,
    }
}

// =============================================================================
// JSON-RPC BRIDGE
// =============================================================================

/// Serve `provider` over HTTP JSON-RPC on a random local port.
///
/// Returns the endpoint URL and the server task handle.
pub async fn spawn_rpc_bridge<P: LedgerProvider + 'static>(
    provider: Arc<P>,
) -> std::io::Result<(String, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let endpoint = format!("http://{}", listener.local_addr()?);
    let router = Router::new()
        .route("/", post(handle_rpc::<P>))
        .with_state(provider);
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "JSON-RPC bridge stopped");
        }
    });
    Ok((endpoint, handle))
}

async fn handle_rpc<P: LedgerProvider>(
    State(provider): State<Arc<P>>,
    Json(request): Json<Value>,
) -> Json<Value> {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request["method"].as_str().unwrap_or_default();
    Json(
        match dispatch(provider.as_ref(), method, &request["params"]).await {
            Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
            Err(error) => json!({"jsonrpc": "2.0", "id": id, "error": error}),
        },
    )
}

fn hex_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn param_bytes(value: &Value) -> Vec<u8> {
    let s = value.as_str().unwrap_or_default();
    hex::decode(s.trim_start_matches("0x")).unwrap_or_default()
}

fn param_address(value: &Value) -> Address {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Address::ZERO)
}

fn rpc_error(err: ProviderError) -> Value {
    match err {
        ProviderError::Rpc {
            code,
            message,
            data,
        } => json!({
            "code": code,
            "message": message,
            "data": data.map(|d| hex_data(&d)),
        }),
        other => json!({"code": -32603, "message": other.to_string()}),
    }
}

async fn dispatch<P: LedgerProvider>(
    provider: &P,
    method: &str,
    params: &Value,
) -> Result<Value, Value> {
    match method {
        "eth_chainId" => {
            let id = provider.chain_id().await.map_err(rpc_error)?;
            Ok(json!(format!("0x{id:x}")))
        }
        "eth_requestAccounts" | "eth_accounts" => {
            let accounts = provider.request_accounts().await.map_err(rpc_error)?;
            Ok(json!(accounts))
        }
        "eth_call" => {
            let tx = &params[0];
            let output = provider
                .call(param_address(&tx["to"]), param_bytes(&tx["data"]))
                .await
                .map_err(rpc_error)?;
            Ok(json!(hex_data(&output)))
        }
        "eth_sendTransaction" => {
            let tx = &params[0];
            let hash = provider
                .send_transaction(
                    param_address(&tx["from"]),
                    param_address(&tx["to"]),
                    param_bytes(&tx["data"]),
                )
                .await
                .map_err(rpc_error)?;
            Ok(json!(hash))
        }
        "eth_getTransactionReceipt" => {
            let hash = params[0]
                .as_str()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| json!({"code": -32602, "message": "invalid hash"}))?;
            let receipt = provider.transaction_receipt(hash).await.map_err(rpc_error)?;
            Ok(match receipt {
                None => Value::Null,
                Some(r) => json!({
                    "transactionHash": r.tx_hash,
                    "blockNumber": format!("0x{:x}", r.block_number),
                    "gasUsed": format!("0x{:x}", r.gas_used),
                    "status": if r.status { "0x1" } else { "0x0" },
                    "logs": r.logs.iter().map(|log| json!({
                        "address": log.address,
                        "topics": log.topics,
                        "data": hex_data(&log.data),
                    })).collect::<Vec<_>>(),
                }),
            })
        }
        other => Err(json!({"code": -32601, "message": format!("method {other} not found")})),
    }
}
