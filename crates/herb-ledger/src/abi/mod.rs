//! # ABI Module
//!
//! Solidity ABI encoding for the HerbTraceability contract: the word codec,
//! the function table and the event log layouts.

pub mod codec;
pub mod events;
pub mod functions;

pub use codec::{AbiError, ParamType, Token};
pub use events::{decode_log, encode_log, EventSignature};
pub use functions::{function_for_calldata, Function, Mutability};

use sha3::{Digest, Keccak256};

use crate::domain::Hash32;

/// Selector of the standard `Error(string)` revert payload.
pub const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Keccak-256 digest.
pub fn keccak256(data: &[u8]) -> Hash32 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    Hash32::new(hasher.finalize().into())
}

/// Topic value of an indexed `string` parameter.
pub fn string_topic(value: &str) -> Hash32 {
    keccak256(value.as_bytes())
}

/// Build an `Error(string)` revert payload.
pub fn encode_revert(reason: &str) -> Vec<u8> {
    let mut data = ERROR_SELECTOR.to_vec();
    data.extend_from_slice(&codec::encode(&[Token::String(reason.to_string())]));
    data
}

/// Extract the reason from an `Error(string)` revert payload.
pub fn decode_revert(data: &[u8]) -> Option<String> {
    let body = data.strip_prefix(&ERROR_SELECTOR[..])?;
    codec::decode(&[ParamType::String], body)
        .ok()?
        .pop()?
        .into_string()
        .ok()
}
