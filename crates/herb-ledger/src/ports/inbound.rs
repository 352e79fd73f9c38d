//! # Inbound Ports
//!
//! API trait defining what the HerbTraceability client can do. Writes return
//! once the transaction is mined; reads go straight to the latest block and
//! are never cached.

use async_trait::async_trait;

use crate::domain::{
    Address, BatchSummary, EventRecord, GeoBounds, GeoFence, LedgerError, Moisture, NewBatch,
    NewEvent, NewQualityTest, TransactionReceipt,
};

/// HerbTraceability API - inbound port.
#[async_trait]
pub trait HerbTraceApi: Send + Sync {
    /// Register a new batch together with its collection event.
    async fn create_batch(&self, batch: NewBatch) -> Result<TransactionReceipt, LedgerError>;

    /// Append a processing or custody event to a batch.
    async fn add_event(&self, event: NewEvent) -> Result<TransactionReceipt, LedgerError>;

    /// Append a quality test; the ledger decides pass or fail.
    async fn add_quality_test(
        &self,
        test: NewQualityTest,
    ) -> Result<TransactionReceipt, LedgerError>;

    /// Mark a batch as recalled.
    async fn recall_batch(&self, batch_id: &str) -> Result<TransactionReceipt, LedgerError>;

    /// Allow `account` to append events to a batch.
    async fn grant_access(
        &self,
        batch_id: &str,
        account: Address,
    ) -> Result<TransactionReceipt, LedgerError>;

    /// Set the allowed collection area for a species.
    async fn set_geo_fence(
        &self,
        species: &str,
        bounds: GeoBounds,
    ) -> Result<TransactionReceipt, LedgerError>;

    /// Set the maximum acceptable moisture for a species.
    async fn set_moisture_threshold(
        &self,
        species: &str,
        threshold: Moisture,
    ) -> Result<TransactionReceipt, LedgerError>;

    /// Read a batch summary.
    async fn get_batch_summary(&self, batch_id: &str) -> Result<BatchSummary, LedgerError>;

    /// Read one event by zero-based index.
    async fn get_event(&self, batch_id: &str, index: u64) -> Result<EventRecord, LedgerError>;

    /// Whether `account` may append to a batch.
    async fn authorized(&self, batch_id: &str, account: Address) -> Result<bool, LedgerError>;

    /// Number of events recorded for a batch.
    async fn batch_event_count(&self, batch_id: &str) -> Result<u64, LedgerError>;

    /// Geofence configured for a species.
    async fn geofence(&self, species: &str) -> Result<GeoFence, LedgerError>;

    /// Moisture threshold configured for a species.
    async fn moisture_threshold(&self, species: &str) -> Result<Moisture, LedgerError>;

    /// Contract owner.
    async fn owner(&self) -> Result<Address, LedgerError>;
}
