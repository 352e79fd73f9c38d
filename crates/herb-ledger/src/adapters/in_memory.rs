//! In-Memory Ledger
//!
//! Implements the `LedgerProvider` port by emulating the HerbTraceability
//! contract locally. Calldata is decoded with the same ABI table the client
//! uses, so every request goes through the real encoding path.
//!
//! Used by tests and the CLI demo mode.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::abi::codec::{encode, Token, TokenReader};
use crate::abi::functions::{self, function_for_calldata};
use crate::abi::{encode_log, encode_revert, keccak256, AbiError};
use crate::domain::{Address, Hash32, LedgerEvent, ScaledBounds};
use crate::ports::{
    LedgerProvider, ProviderError, RawLog, RawReceipt, EXECUTION_REVERTED_CODE,
    USER_REJECTED_CODE,
};

/// EIP-1193 code for a request from an account the wallet does not hold.
const UNAUTHORIZED_ACCOUNT_CODE: i64 = 4100;

/// Sepolia chain id, the default network.
const DEFAULT_CHAIN_ID: u64 = 11_155_111;

/// Base gas charged per transaction.
const BASE_GAS: u64 = 21_000;

/// Emulated HerbTraceability contract behind a wallet.
pub struct InMemoryLedger {
    contract: Address,
    chain_id: u64,
    /// Accounts the emulated wallet can sign for.
    accounts: RwLock<Vec<Address>>,
    state: RwLock<LedgerState>,
    /// Block timestamp used for new records.
    current_time: RwLock<u64>,
    available: AtomicBool,
    reject_signatures: AtomicBool,
    mine_reverts: AtomicBool,
    pending_polls: AtomicU64,
}

/// Contract storage.
#[derive(Clone, Default)]
struct ContractStorage {
    owner: Address,
    batches: HashMap<String, StoredBatch>,
    authorized: HashSet<(String, Address)>,
    geofences: HashMap<String, (ScaledBounds, bool)>,
    thresholds: HashMap<String, u64>,
}

/// Contract storage plus chain bookkeeping.
#[derive(Default)]
struct LedgerState {
    storage: ContractStorage,
    receipts: HashMap<Hash32, RawReceipt>,
    /// Receipt polls left before a transaction shows as mined.
    pending: HashMap<Hash32, u64>,
    block_number: u64,
    nonce: u64,
}

#[derive(Clone, Debug)]
struct StoredBatch {
    species: String,
    creator: Address,
    root_hash: Hash32,
    created_at: u64,
    recalled: bool,
    events: Vec<StoredEvent>,
}

#[derive(Clone, Debug)]
struct StoredEvent {
    event_id: String,
    event_type: String,
    actor: Address,
    metadata_ref: String,
    lat: i64,
    lon: i64,
    timestamp: u64,
    quality_pass: bool,
}

/// A contract revert with its reason string.
#[derive(Debug)]
struct Revert(String);

impl From<AbiError> for Revert {
    fn from(err: AbiError) -> Self {
        Revert(err.to_string())
    }
}

impl Revert {
    fn into_provider_error(self) -> ProviderError {
        ProviderError::Rpc {
            code: EXECUTION_REVERTED_CODE,
            message: format!("execution reverted: {}", self.0),
            data: Some(encode_revert(&self.0)),
        }
    }
}

fn require(condition: bool, reason: &str) -> Result<(), Revert> {
    if condition {
        Ok(())
    } else {
        Err(Revert(reason.to_string()))
    }
}

impl InMemoryLedger {
    /// Create a ledger deployed at `contract`, owned by `owner`.
    ///
    /// The emulated wallet holds the owner account only.
    pub fn new(contract: Address, owner: Address) -> Self {
        Self {
            contract,
            chain_id: DEFAULT_CHAIN_ID,
            accounts: RwLock::new(vec![owner]),
            state: RwLock::new(LedgerState {
                storage: ContractStorage {
                    owner,
                    ..ContractStorage::default()
                },
                ..LedgerState::default()
            }),
            current_time: RwLock::new(1_700_000_000),
            available: AtomicBool::new(true),
            reject_signatures: AtomicBool::new(false),
            mine_reverts: AtomicBool::new(false),
            pending_polls: AtomicU64::new(0),
        }
    }

    /// Report a different chain id.
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Contract address.
    pub fn contract(&self) -> Address {
        self.contract
    }

    /// Contract owner.
    pub fn owner(&self) -> Address {
        self.state.read().storage.owner
    }

    /// Replace the accounts the wallet can sign for.
    pub fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.write() = accounts;
    }

    /// Add an account the wallet can sign for.
    pub fn add_account(&self, account: Address) {
        let mut accounts = self.accounts.write();
        if !accounts.contains(&account) {
            accounts.push(account);
        }
    }

    /// Set current block time for testing.
    pub fn set_time(&self, time: u64) {
        *self.current_time.write() = time;
    }

    /// Advance block time for testing.
    pub fn advance_time(&self, secs: u64) {
        *self.current_time.write() += secs;
    }

    /// Simulate the endpoint going away.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Simulate the wallet user declining every signature request.
    pub fn set_reject_signatures(&self, reject: bool) {
        self.reject_signatures.store(reject, Ordering::SeqCst);
    }

    /// Mine reverting transactions with status 0 instead of rejecting them
    /// at submission.
    pub fn set_mine_reverts(&self, mine: bool) {
        self.mine_reverts.store(mine, Ordering::SeqCst);
    }

    /// Number of receipt polls each new transaction stays pending for.
    pub fn set_pending_polls(&self, polls: u64) {
        self.pending_polls.store(polls, Ordering::SeqCst);
    }

    /// Current block number.
    pub fn block_number(&self) -> u64 {
        self.state.read().block_number
    }

    fn ensure_available(&self) -> Result<(), ProviderError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ProviderError::Unavailable("provider disconnected".to_string()))
        }
    }

    /// Run a state-changing call against `state`.
    fn execute(
        &self,
        state: &mut ContractStorage,
        from: Address,
        calldata: &[u8],
    ) -> Result<Vec<RawLog>, Revert> {
        let function = function_for_calldata(calldata)?;
        let mut args = TokenReader::new(function.decode_input(calldata)?);
        let now = *self.current_time.read();

        let (batch_id, event) = match function.name {
            "createBatch" => {
                let batch_id = args.string()?;
                let species = args.string()?;
                let event_id = args.string()?;
                let metadata_ref = args.string()?;
                let lat = args.int()?;
                let lon = args.int()?;

                require(!batch_id.is_empty(), "Empty batch id")?;
                require(!state.batches.contains_key(&batch_id), "Batch exists")?;
                if let Some((bounds, true)) = state.geofences.get(&species) {
                    require(bounds.contains(lat, lon), "Location outside geofence")?;
                }

                let root_hash = keccak256(&encode(&[
                    Token::String(batch_id.clone()),
                    Token::String(species.clone()),
                    Token::String(event_id),
                    Token::String(metadata_ref),
                    Token::Int(lat),
                    Token::Int(lon),
                    Token::Address(from),
                    Token::uint(now),
                ]));
                state.batches.insert(
                    batch_id.clone(),
                    StoredBatch {
                        species,
                        creator: from,
                        root_hash,
                        created_at: now,
                        recalled: false,
                        events: Vec::new(),
                    },
                );
                state.authorized.insert((batch_id.clone(), from));
                let event = LedgerEvent::BatchCreated {
                    batch_topic: Hash32::ZERO,
                    creator: from,
                };
                (batch_id, event)
            }
            "addEvent" | "addQualityTest" => {
                let batch_id = args.string()?;
                let event_id = args.string()?;
                let event_type = args.string()?;
                let measurement = if function.name == "addQualityTest" {
                    Some(args.u64()?)
                } else {
                    None
                };
                let metadata_ref = args.string()?;
                let lat = args.int()?;
                let lon = args.int()?;

                let owner = state.owner;
                let may_append = state.authorized.contains(&(batch_id.clone(), from));
                let threshold = {
                    let batch = state
                        .batches
                        .get(&batch_id)
                        .ok_or_else(|| Revert("Batch not found".to_string()))?;
                    require(!batch.recalled, "Batch recalled")?;
                    require(may_append || from == owner, "Not authorized")?;
                    state.thresholds.get(&batch.species).copied().unwrap_or(0)
                };

                let quality_pass = match measurement {
                    Some(value) => threshold == 0 || value <= threshold,
                    None => true,
                };
                let batch = state
                    .batches
                    .get_mut(&batch_id)
                    .ok_or_else(|| Revert("Batch not found".to_string()))?;
                let index = batch.events.len() as u64;
                batch.events.push(StoredEvent {
                    event_id: event_id.clone(),
                    event_type: event_type.clone(),
                    actor: from,
                    metadata_ref,
                    lat,
                    lon,
                    timestamp: now,
                    quality_pass,
                });
                let event = LedgerEvent::EventAdded {
                    batch_topic: Hash32::ZERO,
                    index,
                    event_id,
                    event_type,
                    actor: from,
                };
                (batch_id, event)
            }
            "grantAccess" => {
                let batch_id = args.string()?;
                let who = args.address()?;
                let owner = state.owner;
                let batch = state
                    .batches
                    .get(&batch_id)
                    .ok_or_else(|| Revert("Batch not found".to_string()))?;
                require(from == batch.creator || from == owner, "Not authorized")?;
                state.authorized.insert((batch_id.clone(), who));
                (
                    batch_id,
                    LedgerEvent::AccessGranted {
                        batch_topic: Hash32::ZERO,
                        who,
                    },
                )
            }
            "recallBatch" => {
                let batch_id = args.string()?;
                let owner = state.owner;
                let batch = state
                    .batches
                    .get_mut(&batch_id)
                    .ok_or_else(|| Revert("Batch not found".to_string()))?;
                require(from == batch.creator || from == owner, "Not authorized")?;
                batch.recalled = true;
                (
                    batch_id,
                    LedgerEvent::BatchRecalled {
                        batch_topic: Hash32::ZERO,
                    },
                )
            }
            "setGeoFence" => {
                let species = args.string()?;
                let bounds = ScaledBounds {
                    min_lat: args.int()?,
                    max_lat: args.int()?,
                    min_lon: args.int()?,
                    max_lon: args.int()?,
                };
                require(from == state.owner, "Only owner")?;
                state.geofences.insert(species, (bounds, true));
                return Ok(Vec::new());
            }
            "setMoistureThreshold" => {
                let species = args.string()?;
                let value = args.u64()?;
                require(from == state.owner, "Only owner")?;
                state.thresholds.insert(species, value);
                return Ok(Vec::new());
            }
            // A transaction to a view function runs without effects.
            _ => {
                self.view(state, calldata)?;
                return Ok(Vec::new());
            }
        };

        Ok(vec![encode_log(self.contract, &batch_id, &event)])
    }

    /// Answer a read-only call.
    fn view(&self, state: &ContractStorage, calldata: &[u8]) -> Result<Vec<u8>, Revert> {
        let function = function_for_calldata(calldata)?;
        let mut args = TokenReader::new(function.decode_input(calldata)?);

        let values = match function.name {
            "getBatchSummary" => {
                let batch_id = args.string()?;
                // Missing keys read as zeroed storage.
                match state.batches.get(&batch_id) {
                    Some(batch) => vec![
                        Token::String(batch.species.clone()),
                        Token::Address(batch.creator),
                        Token::FixedBytes(batch.root_hash),
                        Token::uint(batch.created_at),
                        Token::Bool(batch.recalled),
                        Token::uint(batch.events.len() as u64),
                    ],
                    None => vec![
                        Token::String(String::new()),
                        Token::Address(Address::ZERO),
                        Token::FixedBytes(Hash32::ZERO),
                        Token::uint(0),
                        Token::Bool(false),
                        Token::uint(0),
                    ],
                }
            }
            "getEvent" => {
                let batch_id = args.string()?;
                let index = args.u64()?;
                let event = state
                    .batches
                    .get(&batch_id)
                    .and_then(|batch| batch.events.get(index as usize))
                    .ok_or_else(|| Revert("Index out of range".to_string()))?;
                vec![
                    Token::String(event.event_id.clone()),
                    Token::String(event.event_type.clone()),
                    Token::Address(event.actor),
                    Token::String(event.metadata_ref.clone()),
                    Token::Int(event.lat),
                    Token::Int(event.lon),
                    Token::uint(event.timestamp),
                    Token::Bool(event.quality_pass),
                ]
            }
            "authorized" => {
                let batch_id = args.string()?;
                let account = args.address()?;
                vec![Token::Bool(state.authorized.contains(&(batch_id, account)))]
            }
            "batchEventCount" => {
                let batch_id = args.string()?;
                let count = state.batches.get(&batch_id).map_or(0, |b| b.events.len());
                vec![Token::uint(count as u64)]
            }
            "geofences" => {
                let species = args.string()?;
                let (bounds, active) = state.geofences.get(&species).copied().unwrap_or_default();
                vec![
                    Token::Int(bounds.min_lat),
                    Token::Int(bounds.max_lat),
                    Token::Int(bounds.min_lon),
                    Token::Int(bounds.max_lon),
                    Token::Bool(active),
                ]
            }
            "moistureThreshold" => {
                let species = args.string()?;
                vec![Token::uint(state.thresholds.get(&species).copied().unwrap_or(0))]
            }
            "owner" => vec![Token::Address(state.owner)],
            other => return Err(Revert(format!("{other} is not a view"))),
        };

        Ok(function.encode_output(&values)?)
    }
}

#[async_trait]
impl LedgerProvider for InMemoryLedger {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.ensure_available()?;
        Ok(self.accounts.read().clone())
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        self.ensure_available()?;
        Ok(self.chain_id)
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ProviderError> {
        self.ensure_available()?;
        if to != self.contract {
            // No code at the address.
            return Ok(Vec::new());
        }
        let state = self.state.read();
        self.view(&state.storage, &data).map_err(Revert::into_provider_error)
    }

    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Vec<u8>,
    ) -> Result<Hash32, ProviderError> {
        self.ensure_available()?;
        if !self.accounts.read().contains(&from) {
            return Err(ProviderError::Rpc {
                code: UNAUTHORIZED_ACCOUNT_CODE,
                message: format!("The requested account {from} has not been authorized by the user"),
                data: None,
            });
        }
        if self.reject_signatures.load(Ordering::SeqCst) {
            return Err(ProviderError::Rpc {
                code: USER_REJECTED_CODE,
                message: "User denied transaction signature".to_string(),
                data: None,
            });
        }

        let mut state = self.state.write();
        let outcome = if to == self.contract {
            // Run against a scratch copy so a revert leaves storage untouched.
            let mut scratch = state.storage.clone();
            self.execute(&mut scratch, from, &data)
                .map(|logs| (scratch, logs))
        } else {
            Err(Revert("no contract at target address".to_string()))
        };

        let (status, logs) = match outcome {
            Ok((scratch, logs)) => {
                state.storage = scratch;
                (true, logs)
            }
            Err(revert) if self.mine_reverts.load(Ordering::SeqCst) => {
                debug!(reason = %revert.0, "Mining reverted transaction");
                (false, Vec::new())
            }
            Err(revert) => {
                debug!(reason = %revert.0, "Transaction rejected at submission");
                return Err(revert.into_provider_error());
            }
        };

        state.nonce += 1;
        state.block_number += 1;
        let mut preimage = from.as_bytes().to_vec();
        preimage.extend_from_slice(&state.nonce.to_be_bytes());
        preimage.extend_from_slice(&data);
        let tx_hash = keccak256(&preimage);

        let receipt = RawReceipt {
            tx_hash,
            block_number: state.block_number,
            gas_used: BASE_GAS + 16 * data.len() as u64,
            status,
            logs,
        };
        info!(
            tx_hash = %tx_hash,
            block = receipt.block_number,
            status,
            "Mined transaction"
        );
        state.receipts.insert(tx_hash, receipt);
        let polls = self.pending_polls.load(Ordering::SeqCst);
        if polls > 0 {
            state.pending.insert(tx_hash, polls);
        }

        Ok(tx_hash)
    }

    async fn transaction_receipt(
        &self,
        tx_hash: Hash32,
    ) -> Result<Option<RawReceipt>, ProviderError> {
        self.ensure_available()?;
        let mut state = self.state.write();
        if let Some(remaining) = state.pending.get_mut(&tx_hash) {
            *remaining -= 1;
            if *remaining == 0 {
                state.pending.remove(&tx_hash);
            }
            return Ok(None);
        }
        Ok(state.receipts.get(&tx_hash).cloned())
    }
}
