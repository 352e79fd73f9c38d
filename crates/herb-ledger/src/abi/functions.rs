//! # Contract Functions
//!
//! The HerbTraceability function table. Signatures, selectors and parameter
//! layouts must match the deployed contract bit for bit.

use super::codec::{decode, encode, AbiError, ParamType, Token};
use super::keccak256;

use super::codec::ParamType::{Address as A, Bool as B, Bytes32 as B32, Int256 as I, String as S, Uint256 as U};

/// Whether a function changes ledger state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutability {
    /// Submitted as a transaction.
    NonPayable,
    /// Answered by `eth_call`.
    View,
}

/// One contract function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Function {
    /// Solidity name.
    pub name: &'static str,
    /// Input parameter types.
    pub inputs: &'static [ParamType],
    /// Return types.
    pub outputs: &'static [ParamType],
    /// State mutability.
    pub mutability: Mutability,
}

impl Function {
    /// Canonical signature, e.g. `recallBatch(string)`.
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.inputs.iter().map(ParamType::canonical).collect();
        format!("{}({})", self.name, params.join(","))
    }

    /// First four bytes of the keccak-256 of the signature.
    pub fn selector(&self) -> [u8; 4] {
        let hash = keccak256(self.signature().as_bytes());
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&hash.as_bytes()[..4]);
        selector
    }

    /// True for read-only functions.
    pub fn is_view(&self) -> bool {
        self.mutability == Mutability::View
    }

    /// Build calldata: selector followed by the encoded arguments.
    pub fn encode_input(&self, args: &[Token]) -> Result<Vec<u8>, AbiError> {
        check_layout(self.inputs, args)?;
        let mut calldata = self.selector().to_vec();
        calldata.extend_from_slice(&encode(args));
        Ok(calldata)
    }

    /// Decode calldata produced for this function.
    pub fn decode_input(&self, calldata: &[u8]) -> Result<Vec<Token>, AbiError> {
        let selector = split_selector(calldata)?;
        if selector != self.selector() {
            return Err(AbiError::UnknownSelector(selector));
        }
        decode(self.inputs, &calldata[4..])
    }

    /// Encode return values.
    pub fn encode_output(&self, values: &[Token]) -> Result<Vec<u8>, AbiError> {
        check_layout(self.outputs, values)?;
        Ok(encode(values))
    }

    /// Decode return data.
    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<Token>, AbiError> {
        decode(self.outputs, data)
    }
}

fn check_layout(types: &[ParamType], tokens: &[Token]) -> Result<(), AbiError> {
    if types.len() != tokens.len() {
        return Err(AbiError::Arity {
            expected: types.len(),
            got: tokens.len(),
        });
    }
    for (expected, token) in types.iter().zip(tokens) {
        if token.param_type() != *expected {
            return Err(AbiError::TypeMismatch {
                expected: *expected,
                found: token.param_type(),
            });
        }
    }
    Ok(())
}

/// Extract the selector from calldata.
pub fn split_selector(calldata: &[u8]) -> Result<[u8; 4], AbiError> {
    let mut selector = [0u8; 4];
    let head = calldata.get(..4).ok_or(AbiError::Truncated {
        needed: 4,
        available: calldata.len(),
    })?;
    selector.copy_from_slice(head);
    Ok(selector)
}

// =============================================================================
// STATE-CHANGING FUNCTIONS
// =============================================================================

/// `createBatch(batchId, species, eventId, metaCID, lat, lon)`
pub const CREATE_BATCH: Function = Function {
    name: "createBatch",
    inputs: &[S, S, S, S, I, I],
    outputs: &[],
    mutability: Mutability::NonPayable,
};

/// `addEvent(batchId, eventId, eventType, metaCID, lat, lon)`
pub const ADD_EVENT: Function = Function {
    name: "addEvent",
    inputs: &[S, S, S, S, I, I],
    outputs: &[],
    mutability: Mutability::NonPayable,
};

/// `addQualityTest(batchId, eventId, testType, numericValue, metaCID, lat, lon)`
pub const ADD_QUALITY_TEST: Function = Function {
    name: "addQualityTest",
    inputs: &[S, S, S, U, S, I, I],
    outputs: &[],
    mutability: Mutability::NonPayable,
};

/// `grantAccess(batchId, who)`
pub const GRANT_ACCESS: Function = Function {
    name: "grantAccess",
    inputs: &[S, A],
    outputs: &[],
    mutability: Mutability::NonPayable,
};

/// `recallBatch(batchId)`
pub const RECALL_BATCH: Function = Function {
    name: "recallBatch",
    inputs: &[S],
    outputs: &[],
    mutability: Mutability::NonPayable,
};

/// `setGeoFence(species, minLat, maxLat, minLon, maxLon)`
pub const SET_GEO_FENCE: Function = Function {
    name: "setGeoFence",
    inputs: &[S, I, I, I, I],
    outputs: &[],
    mutability: Mutability::NonPayable,
};

/// `setMoistureThreshold(species, scaledValue)`
pub const SET_MOISTURE_THRESHOLD: Function = Function {
    name: "setMoistureThreshold",
    inputs: &[S, U],
    outputs: &[],
    mutability: Mutability::NonPayable,
};

// =============================================================================
// VIEW FUNCTIONS
// =============================================================================

/// `getBatchSummary(batchId) -> (species, creator, rootHash, createdAt, recalled, eventsCount)`
pub const GET_BATCH_SUMMARY: Function = Function {
    name: "getBatchSummary",
    inputs: &[S],
    outputs: &[S, A, B32, U, B, U],
    mutability: Mutability::View,
};

/// `getEvent(batchId, index) -> (eventId, eventType, actor, metaCID, lat, lon, timestamp, qualityPass)`
pub const GET_EVENT: Function = Function {
    name: "getEvent",
    inputs: &[S, U],
    outputs: &[S, S, A, S, I, I, U, B],
    mutability: Mutability::View,
};

/// `authorized(batchId, account) -> bool`
pub const AUTHORIZED: Function = Function {
    name: "authorized",
    inputs: &[S, A],
    outputs: &[B],
    mutability: Mutability::View,
};

/// `batchEventCount(batchId) -> uint256`
pub const BATCH_EVENT_COUNT: Function = Function {
    name: "batchEventCount",
    inputs: &[S],
    outputs: &[U],
    mutability: Mutability::View,
};

/// `geofences(species) -> (minLat, maxLat, minLon, maxLon, active)`
pub const GEOFENCES: Function = Function {
    name: "geofences",
    inputs: &[S],
    outputs: &[I, I, I, I, B],
    mutability: Mutability::View,
};

/// `moistureThreshold(species) -> uint256`
pub const MOISTURE_THRESHOLD: Function = Function {
    name: "moistureThreshold",
    inputs: &[S],
    outputs: &[U],
    mutability: Mutability::View,
};

/// `owner() -> address`
pub const OWNER: Function = Function {
    name: "owner",
    inputs: &[],
    outputs: &[A],
    mutability: Mutability::View,
};

/// Every function in the contract ABI.
pub const ALL_FUNCTIONS: &[Function] = &[
    CREATE_BATCH,
    ADD_EVENT,
    ADD_QUALITY_TEST,
    GRANT_ACCESS,
    RECALL_BATCH,
    SET_GEO_FENCE,
    SET_MOISTURE_THRESHOLD,
    GET_BATCH_SUMMARY,
    GET_EVENT,
    AUTHORIZED,
    BATCH_EVENT_COUNT,
    GEOFENCES,
    MOISTURE_THRESHOLD,
    OWNER,
];

/// Look up a function by the selector at the start of `calldata`.
pub fn function_for_calldata(calldata: &[u8]) -> Result<&'static Function, AbiError> {
    let selector = split_selector(calldata)?;
    ALL_FUNCTIONS
        .iter()
        .find(|f| f.selector() == selector)
        .ok_or(AbiError::UnknownSelector(selector))
}
