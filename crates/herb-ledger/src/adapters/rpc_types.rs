//! JSON-RPC wire types for the Ethereum methods the client uses.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::value_objects::decode_prefixed_hex;
use crate::domain::{Address, Hash32};
use crate::ports::{RawLog, RawReceipt};

/// Outgoing JSON-RPC 2.0 call.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<T> {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: T,
    pub id: u64,
}

impl<T> JsonRpcRequest<T> {
    pub fn new(method: impl Into<String>, params: T, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// Incoming JSON-RPC 2.0 reply; exactly one of `result` and `error` is set.
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    /// Revert payload carried in `data`.
    ///
    /// Nodes return either the hex string directly or an object with a
    /// `data` field holding it.
    pub fn revert_data(&self) -> Option<Vec<u8>> {
        let hex = match self.data.as_ref()? {
            serde_json::Value::String(s) => s.as_str(),
            serde_json::Value::Object(map) => map.get("data")?.as_str()?,
            _ => return None,
        };
        decode_prefixed_hex(hex).ok()
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// Hex-encoded byte string (`0x...`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

impl Serialize for HexBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(&self.0)))
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode_prefixed_hex(&s)
            .map(HexBytes)
            .map_err(serde::de::Error::custom)
    }
}

/// Hex-encoded quantity (`0x1a`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Quantity(pub u64);

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| serde::de::Error::custom(format!("quantity {s} lacks 0x prefix")))?;
        if digits.is_empty() {
            return Ok(Quantity(0));
        }
        u64::from_str_radix(digits, 16)
            .map(Quantity)
            .map_err(serde::de::Error::custom)
    }
}

/// `eth_call` transaction object.
#[derive(Debug, Serialize)]
pub struct CallRequest {
    pub to: Address,
    pub data: HexBytes,
}

/// `eth_sendTransaction` transaction object.
#[derive(Debug, Serialize)]
pub struct SendTransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: HexBytes,
}

/// Log as returned inside a receipt.
#[derive(Debug, Deserialize)]
pub struct RpcLog {
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<Hash32>,
    #[serde(default)]
    pub data: HexBytes,
}

/// `eth_getTransactionReceipt` result.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub transaction_hash: Hash32,
    pub block_number: Quantity,
    pub gas_used: Quantity,
    /// Absent on pre-Byzantium chains, treated as success.
    #[serde(default)]
    pub status: Option<Quantity>,
    #[serde(default)]
    pub logs: Vec<RpcLog>,
}

impl From<RpcReceipt> for RawReceipt {
    fn from(receipt: RpcReceipt) -> Self {
        RawReceipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.0,
            gas_used: receipt.gas_used.0,
            status: receipt.status.map_or(true, |s| s.0 == 1),
            logs: receipt
                .logs
                .into_iter()
                .map(|log| RawLog {
                    address: log.address,
                    topics: log.topics,
                    data: log.data.0,
                })
                .collect(),
        }
    }
}
