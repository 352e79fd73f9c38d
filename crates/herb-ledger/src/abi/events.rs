//! # Contract Events
//!
//! Log layouts emitted by the contract and their decoding into
//! [`LedgerEvent`]. Topic 0 is the keccak-256 of the event signature; indexed
//! `string` parameters are stored as the keccak-256 of their bytes.

use super::codec::{decode, decode_static, encode, static_word, AbiError, ParamType, Token};
use super::{keccak256, string_topic};
use crate::domain::{Address, Hash32, LedgerEvent};
use crate::ports::RawLog;

/// Event parameter description.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventParam {
    /// Parameter type.
    pub kind: ParamType,
    /// Whether the value is carried in a topic.
    pub indexed: bool,
}

const fn indexed(kind: ParamType) -> EventParam {
    EventParam {
        kind,
        indexed: true,
    }
}

const fn data(kind: ParamType) -> EventParam {
    EventParam {
        kind,
        indexed: false,
    }
}

/// One contract event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventSignature {
    /// Solidity name.
    pub name: &'static str,
    /// Parameters in declaration order.
    pub params: &'static [EventParam],
}

impl EventSignature {
    /// Canonical signature, e.g. `BatchRecalled(string)`.
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.params.iter().map(|p| p.kind.canonical()).collect();
        format!("{}({})", self.name, params.join(","))
    }

    /// Topic 0 for this event.
    pub fn topic0(&self) -> Hash32 {
        keccak256(self.signature().as_bytes())
    }

    fn data_types(&self) -> Vec<ParamType> {
        self.params
            .iter()
            .filter(|p| !p.indexed)
            .map(|p| p.kind)
            .collect()
    }
}

/// `BatchCreated(string indexed batchId, address indexed creator)`
pub const BATCH_CREATED: EventSignature = EventSignature {
    name: "BatchCreated",
    params: &[indexed(ParamType::String), indexed(ParamType::Address)],
};

/// `EventAdded(string indexed batchId, uint256 indexed index, string eventId, string eventType, address actor)`
pub const EVENT_ADDED: EventSignature = EventSignature {
    name: "EventAdded",
    params: &[
        indexed(ParamType::String),
        indexed(ParamType::Uint256),
        data(ParamType::String),
        data(ParamType::String),
        data(ParamType::Address),
    ],
};

/// `AccessGranted(string indexed batchId, address indexed who)`
pub const ACCESS_GRANTED: EventSignature = EventSignature {
    name: "AccessGranted",
    params: &[indexed(ParamType::String), indexed(ParamType::Address)],
};

/// `BatchRecalled(string indexed batchId)`
pub const BATCH_RECALLED: EventSignature = EventSignature {
    name: "BatchRecalled",
    params: &[indexed(ParamType::String)],
};

/// Every event in the contract ABI.
pub const ALL_EVENTS: &[EventSignature] = &[BATCH_CREATED, EVENT_ADDED, ACCESS_GRANTED, BATCH_RECALLED];

/// Decode a contract log.
///
/// Returns `Ok(None)` for logs whose topic 0 is not one of the contract's events.
pub fn decode_log(log: &RawLog) -> Result<Option<LedgerEvent>, AbiError> {
    let Some(topic0) = log.topics.first() else {
        return Ok(None);
    };
    let Some(event) = ALL_EVENTS.iter().find(|e| e.topic0() == *topic0) else {
        return Ok(None);
    };

    let indexed_count = event.params.iter().filter(|p| p.indexed).count();
    if log.topics.len() != indexed_count + 1 {
        return Err(AbiError::MalformedLog(format!(
            "{} expects {} topics, got {}",
            event.name,
            indexed_count + 1,
            log.topics.len()
        )));
    }

    let batch_topic = log.topics[1];
    let decoded = match event.name {
        "BatchCreated" => LedgerEvent::BatchCreated {
            batch_topic,
            creator: topic_address(&log.topics[2])?,
        },
        "AccessGranted" => LedgerEvent::AccessGranted {
            batch_topic,
            who: topic_address(&log.topics[2])?,
        },
        "BatchRecalled" => LedgerEvent::BatchRecalled { batch_topic },
        _ => {
            let index = decode_static(ParamType::Uint256, log.topics[2].as_bytes())?.into_u64()?;
            let mut values = decode(&event.data_types(), &log.data)?.into_iter();
            let mut next = || {
                values
                    .next()
                    .ok_or_else(|| AbiError::MalformedLog("missing EventAdded data".to_string()))
            };
            LedgerEvent::EventAdded {
                batch_topic,
                index,
                event_id: next()?.into_string()?,
                event_type: next()?.into_string()?,
                actor: next()?.into_address()?,
            }
        }
    };
    Ok(Some(decoded))
}

fn topic_address(topic: &Hash32) -> Result<Address, AbiError> {
    decode_static(ParamType::Address, topic.as_bytes())?.into_address()
}

/// Build the log a contract would emit for `event`.
///
/// Used by the in-memory ledger; takes the batch id in clear so the indexed
/// topic can be derived.
pub fn encode_log(contract: Address, batch_id: &str, event: &LedgerEvent) -> RawLog {
    let batch_topic = string_topic(batch_id);
    let (topics, data) = match event {
        LedgerEvent::BatchCreated { creator, .. } => (
            vec![
                BATCH_CREATED.topic0(),
                batch_topic,
                Hash32::new(static_word(&Token::Address(*creator))),
            ],
            Vec::new(),
        ),
        LedgerEvent::AccessGranted { who, .. } => (
            vec![
                ACCESS_GRANTED.topic0(),
                batch_topic,
                Hash32::new(static_word(&Token::Address(*who))),
            ],
            Vec::new(),
        ),
        LedgerEvent::BatchRecalled { .. } => (vec![BATCH_RECALLED.topic0(), batch_topic], Vec::new()),
        LedgerEvent::EventAdded {
            index,
            event_id,
            event_type,
            actor,
            ..
        } => (
            vec![
                EVENT_ADDED.topic0(),
                batch_topic,
                Hash32::new(static_word(&Token::uint(*index))),
            ],
            encode(&[
                Token::String(event_id.clone()),
                Token::String(event_type.clone()),
                Token::Address(*actor),
            ]),
        ),
    };
    RawLog {
        address: contract,
        topics,
        data,
    }
}
