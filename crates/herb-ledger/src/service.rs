//! # HerbTrace Service
//!
//! Implements [`HerbTraceApi`] over a [`LedgerSession`].
//!
//! Writes are encoded, handed to the wallet with `eth_sendTransaction`, and
//! the receipt is polled until the transaction is mined. Reads are a single
//! `eth_call`. Nothing is cached and nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use herb_telemetry::{
    log_batch_event, log_tx_event, metric_inc, time_histogram, QUERIES, RECEIPT_POLLS,
    RECEIPT_WAIT, SUBMISSIONS,
};
use tracing::{debug, warn};

use crate::abi::codec::{Token, TokenReader};
use crate::abi::functions::{self, Function};
use crate::abi::decode_log;
use crate::config::{LedgerConfig, DEFAULT_RECEIPT_POLL};
use crate::domain::{
    Address, BatchSummary, EventRecord, GeoBounds, GeoFence, Hash32, LedgerError, Moisture,
    NewBatch, NewEvent, NewQualityTest, ScaledBounds, ScaledCoordinates, TransactionReceipt,
};
use crate::ports::{HerbTraceApi, LedgerProvider, ProviderError, RawReceipt};
use crate::session::LedgerSession;

/// Revert reason fragments that indicate an access-control failure.
const ACCESS_DENIED_PATTERNS: &[&str] = &[
    "not authorized",
    "unauthorized",
    "not owner",
    "only owner",
    "onlyowner",
    "caller is not",
    "access denied",
    "not allowed",
];

/// HerbTraceability client.
pub struct HerbTraceService<P: LedgerProvider> {
    session: LedgerSession<P>,
    receipt_poll_interval: Duration,
}

impl<P: LedgerProvider> HerbTraceService<P> {
    /// Create a service over an established session.
    pub fn new(session: LedgerSession<P>) -> Self {
        Self {
            session,
            receipt_poll_interval: DEFAULT_RECEIPT_POLL,
        }
    }

    /// Create a service using the polling interval from `config`.
    pub fn with_config(session: LedgerSession<P>, config: &LedgerConfig) -> Self {
        Self::new(session).with_poll_interval(config.receipt_poll_interval)
    }

    /// Set the receipt polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self
    }

    /// Underlying session.
    pub fn session(&self) -> &LedgerSession<P> {
        &self.session
    }

    // =========================================================================
    // WRITE PATH
    // =========================================================================

    async fn submit(
        &self,
        function: &Function,
        args: Vec<Token>,
        subject: &str,
    ) -> Result<TransactionReceipt, LedgerError> {
        let result = self.submit_inner(function, args, subject).await;
        metric_inc!(SUBMISSIONS, &[function.name, outcome_label(&result)]);
        if let Err(err) = &result {
            warn!(operation = function.name, subject, error = %err, "Submission failed");
        }
        result
    }

    async fn submit_inner(
        &self,
        function: &Function,
        args: Vec<Token>,
        subject: &str,
    ) -> Result<TransactionReceipt, LedgerError> {
        let from = self.session.require_account()?;
        let calldata = function
            .encode_input(&args)
            .map_err(|e| LedgerError::InvalidInput(e.to_string()))?;

        let tx_hash = self
            .session
            .provider()
            .send_transaction(from, self.session.contract(), calldata)
            .await
            .map_err(classify_write_error)?;
        log_tx_event!(info, function.name, "Transaction submitted", tx_hash, subject = subject);

        let raw = self.wait_for_receipt(tx_hash).await?;
        if !raw.status {
            return Err(LedgerError::Submission {
                reason: format!("transaction {tx_hash} reverted in block {}", raw.block_number),
            });
        }

        let receipt = self.decode_receipt(raw);
        log_tx_event!(
            info,
            function.name,
            "Transaction mined",
            receipt.tx_hash,
            block = receipt.block_number,
            events = receipt.events.len()
        );
        Ok(receipt)
    }

    /// Poll until the transaction is mined. No deadline is applied here.
    async fn wait_for_receipt(&self, tx_hash: Hash32) -> Result<RawReceipt, LedgerError> {
        let _timer = time_histogram!(RECEIPT_WAIT);
        loop {
            metric_inc!(RECEIPT_POLLS);
            let receipt = self
                .session
                .provider()
                .transaction_receipt(tx_hash)
                .await
                .map_err(classify_write_error)?;
            match receipt {
                Some(receipt) => return Ok(receipt),
                None => {
                    debug!(tx_hash = %tx_hash, "Receipt pending");
                    tokio::time::sleep(self.receipt_poll_interval).await;
                }
            }
        }
    }

    /// Decode contract logs, skipping logs from other addresses.
    fn decode_receipt(&self, raw: RawReceipt) -> TransactionReceipt {
        let contract = self.session.contract();
        let events = raw
            .logs
            .iter()
            .filter(|log| log.address == contract)
            .filter_map(|log| match decode_log(log) {
                Ok(event) => event,
                Err(e) => {
                    warn!(tx_hash = %raw.tx_hash, error = %e, "Skipping undecodable log");
                    None
                }
            })
            .collect();

        TransactionReceipt {
            tx_hash: raw.tx_hash,
            block_number: raw.block_number,
            gas_used: raw.gas_used,
            events,
        }
    }

    // =========================================================================
    // READ PATH
    // =========================================================================

    async fn query(&self, function: &Function, args: Vec<Token>) -> Result<TokenReader, LedgerError> {
        let result = self.query_inner(function, args).await;
        metric_inc!(QUERIES, &[function.name, outcome_label(&result)]);
        result
    }

    async fn query_inner(
        &self,
        function: &Function,
        args: Vec<Token>,
    ) -> Result<TokenReader, LedgerError> {
        let calldata = function
            .encode_input(&args)
            .map_err(|e| LedgerError::InvalidInput(e.to_string()))?;
        let data = self
            .session
            .provider()
            .call(self.session.contract(), calldata)
            .await
            .map_err(classify_read_error)?;
        if data.is_empty() {
            return Err(LedgerError::Decode(format!(
                "{} returned no data; is the contract deployed at {}?",
                function.name,
                self.session.contract()
            )));
        }
        Ok(TokenReader::new(function.decode_output(&data)?))
    }
}

#[async_trait]
impl<P: LedgerProvider> HerbTraceApi for HerbTraceService<P> {
    async fn create_batch(&self, batch: NewBatch) -> Result<TransactionReceipt, LedgerError> {
        let location = batch.location.scaled()?;
        log_batch_event!(info, "createBatch", "Creating batch", batch.batch_id, species = %batch.species);
        let subject = batch.batch_id.clone();
        let args = vec![
            Token::String(batch.batch_id),
            Token::String(batch.species),
            Token::String(batch.event_id),
            Token::String(batch.metadata_ref),
            Token::Int(location.lat),
            Token::Int(location.lon),
        ];
        self.submit(&functions::CREATE_BATCH, args, &subject).await
    }

    async fn add_event(&self, event: NewEvent) -> Result<TransactionReceipt, LedgerError> {
        let location = event.location.scaled()?;
        log_batch_event!(info, "addEvent", "Adding event", event.batch_id, event_type = %event.event_type);
        let subject = event.batch_id.clone();
        let args = vec![
            Token::String(event.batch_id),
            Token::String(event.event_id),
            Token::String(event.event_type),
            Token::String(event.metadata_ref),
            Token::Int(location.lat),
            Token::Int(location.lon),
        ];
        self.submit(&functions::ADD_EVENT, args, &subject).await
    }

    async fn add_quality_test(
        &self,
        test: NewQualityTest,
    ) -> Result<TransactionReceipt, LedgerError> {
        let location = test.location.scaled()?;
        let value = test.measurement.scaled()?;
        log_batch_event!(
            info,
            "addQualityTest",
            "Adding quality test",
            test.batch_id,
            test_type = %test.test_type,
            scaled_value = value
        );
        let subject = test.batch_id.clone();
        let args = vec![
            Token::String(test.batch_id),
            Token::String(test.event_id),
            Token::String(test.test_type),
            Token::uint(value),
            Token::String(test.metadata_ref),
            Token::Int(location.lat),
            Token::Int(location.lon),
        ];
        self.submit(&functions::ADD_QUALITY_TEST, args, &subject).await
    }

    async fn recall_batch(&self, batch_id: &str) -> Result<TransactionReceipt, LedgerError> {
        log_batch_event!(info, "recallBatch", "Recalling batch", batch_id);
        let args = vec![Token::String(batch_id.to_string())];
        self.submit(&functions::RECALL_BATCH, args, batch_id).await
    }

    async fn grant_access(
        &self,
        batch_id: &str,
        account: Address,
    ) -> Result<TransactionReceipt, LedgerError> {
        log_batch_event!(info, "grantAccess", "Granting access", batch_id, account = %account);
        let args = vec![Token::String(batch_id.to_string()), Token::Address(account)];
        self.submit(&functions::GRANT_ACCESS, args, batch_id).await
    }

    async fn set_geo_fence(
        &self,
        species: &str,
        bounds: GeoBounds,
    ) -> Result<TransactionReceipt, LedgerError> {
        let scaled = bounds.scaled()?;
        let args = vec![
            Token::String(species.to_string()),
            Token::Int(scaled.min_lat),
            Token::Int(scaled.max_lat),
            Token::Int(scaled.min_lon),
            Token::Int(scaled.max_lon),
        ];
        self.submit(&functions::SET_GEO_FENCE, args, species).await
    }

    async fn set_moisture_threshold(
        &self,
        species: &str,
        threshold: Moisture,
    ) -> Result<TransactionReceipt, LedgerError> {
        let value = threshold.scaled()?;
        let args = vec![Token::String(species.to_string()), Token::uint(value)];
        self.submit(&functions::SET_MOISTURE_THRESHOLD, args, species).await
    }

    async fn get_batch_summary(&self, batch_id: &str) -> Result<BatchSummary, LedgerError> {
        log_batch_event!(debug, "getBatchSummary", "Reading batch summary", batch_id);
        let mut values = self
            .query(&functions::GET_BATCH_SUMMARY, vec![Token::String(batch_id.to_string())])
            .await?;
        let summary = BatchSummary {
            batch_id: batch_id.to_string(),
            species: values.string()?,
            creator: values.address()?,
            root_hash: values.bytes32()?,
            created_at: values.u64()?,
            recalled: values.bool()?,
            events_count: values.u64()?,
        };
        // Unknown batches read back as zeroed storage.
        if summary.creator.is_zero() {
            return Err(LedgerError::NotFound(format!("batch {batch_id}")));
        }
        Ok(summary)
    }

    async fn get_event(&self, batch_id: &str, index: u64) -> Result<EventRecord, LedgerError> {
        log_batch_event!(debug, "getEvent", "Reading event", batch_id, index = index);
        let args = vec![Token::String(batch_id.to_string()), Token::uint(index)];
        let mut values = self.query(&functions::GET_EVENT, args).await.map_err(|err| match err {
            LedgerError::NotFound(reason) => {
                LedgerError::NotFound(format!("event {index} of batch {batch_id}: {reason}"))
            }
            other => other,
        })?;
        Ok(EventRecord {
            batch_id: batch_id.to_string(),
            index,
            event_id: values.string()?,
            event_type: values.string()?,
            actor: values.address()?,
            metadata_ref: values.string()?,
            location: ScaledCoordinates {
                lat: values.int()?,
                lon: values.int()?,
            }
            .unscaled(),
            timestamp: values.u64()?,
            quality_pass: values.bool()?,
        })
    }

    async fn authorized(&self, batch_id: &str, account: Address) -> Result<bool, LedgerError> {
        let args = vec![Token::String(batch_id.to_string()), Token::Address(account)];
        Ok(self.query(&functions::AUTHORIZED, args).await?.bool()?)
    }

    async fn batch_event_count(&self, batch_id: &str) -> Result<u64, LedgerError> {
        let args = vec![Token::String(batch_id.to_string())];
        Ok(self.query(&functions::BATCH_EVENT_COUNT, args).await?.u64()?)
    }

    async fn geofence(&self, species: &str) -> Result<GeoFence, LedgerError> {
        let mut values = self
            .query(&functions::GEOFENCES, vec![Token::String(species.to_string())])
            .await?;
        let bounds = ScaledBounds {
            min_lat: values.int()?,
            max_lat: values.int()?,
            min_lon: values.int()?,
            max_lon: values.int()?,
        };
        Ok(GeoFence {
            bounds: bounds.unscaled(),
            active: values.bool()?,
        })
    }

    async fn moisture_threshold(&self, species: &str) -> Result<Moisture, LedgerError> {
        let args = vec![Token::String(species.to_string())];
        let value = self.query(&functions::MOISTURE_THRESHOLD, args).await?.u64()?;
        Ok(Moisture::from_scaled(value))
    }

    async fn owner(&self) -> Result<Address, LedgerError> {
        Ok(self.query(&functions::OWNER, Vec::new()).await?.address()?)
    }
}

// =============================================================================
// ERROR CLASSIFICATION
// =============================================================================

fn is_access_denied(reason: &str) -> bool {
    let reason = reason.to_ascii_lowercase();
    ACCESS_DENIED_PATTERNS.iter().any(|p| reason.contains(p))
}

/// Map a provider failure during a write.
fn classify_write_error(err: ProviderError) -> LedgerError {
    match err {
        ProviderError::Unavailable(msg) => LedgerError::TransportUnavailable(msg),
        ProviderError::Malformed(msg) => LedgerError::Decode(msg),
        rpc @ ProviderError::Rpc { .. } => {
            let reason = rpc.reason();
            if rpc.is_revert() && is_access_denied(&reason) {
                LedgerError::Unauthorized { reason }
            } else {
                LedgerError::Submission { reason }
            }
        }
    }
}

/// Map a provider failure during a read. Reverting views mean the record is absent.
fn classify_read_error(err: ProviderError) -> LedgerError {
    match err {
        ProviderError::Unavailable(msg) => LedgerError::TransportUnavailable(msg),
        ProviderError::Malformed(msg) => LedgerError::Decode(msg),
        rpc if rpc.is_revert() => LedgerError::NotFound(rpc.reason()),
        rpc => LedgerError::Submission {
            reason: rpc.reason(),
        },
    }
}

fn outcome_label<T>(result: &Result<T, LedgerError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(LedgerError::TransportUnavailable(_)) => "unavailable",
        Err(LedgerError::Submission { .. }) => "reverted",
        Err(LedgerError::Unauthorized { .. }) => "unauthorized",
        Err(LedgerError::NotFound(_)) => "not_found",
        Err(LedgerError::InvalidInput(_)) => "invalid",
        Err(LedgerError::Decode(_)) => "decode",
        Err(LedgerError::ChainMismatch { .. }) => "chain_mismatch",
    }
}
