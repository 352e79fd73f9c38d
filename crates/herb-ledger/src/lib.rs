//! # Herb Ledger
//!
//! Client for the HerbTraceability smart contract: batch creation, event
//! recording, quality tests, access control, recalls and the read-only views.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Record the supply chain of medicinal herbs on an EVM ledger:
//! - Collectors create a batch at the harvest site
//! - Processors and laboratories append events to its history
//! - Consumers read the full provenance trail back
//!
//! ## Fixed-Point Encoding
//!
//! | Quantity | Scale | Ledger type |
//! |----------|-------|-------------|
//! | Latitude / longitude | × 1,000,000 | `int256` |
//! | Moisture / numeric test value | × 100 | `uint256` |
//!
//! Scaling happens in this crate; callers always pass decimal values.
//!
//! ## Module Structure
//!
//! ```text
//! herb-ledger/
//! ├── domain/          # Address, Coordinates, BatchSummary, LedgerError
//! ├── abi/             # Solidity ABI codec, function and event tables
//! ├── ports/           # HerbTraceApi, LedgerProvider
//! ├── adapters/        # JSON-RPC provider, in-memory ledger
//! ├── algorithms/      # Provenance trail, identifiers, metadata
//! ├── session.rs       # Connected account + contract
//! └── service.rs       # HerbTraceApi implementation
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let config = LedgerConfig::from_env()?;
//! let provider = Arc::new(JsonRpcProvider::from_config(&config)?);
//! let session = LedgerSession::connect(provider, &config).await?;
//! let herbs = HerbTraceService::with_config(session, &config);
//!
//! let receipt = herbs.create_batch(batch).await?;
//! let trail = fetch_provenance(&herbs, "ASH123456").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod abi;
pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;
pub mod session;

// Re-exports
pub use adapters::{InMemoryLedger, JsonRpcProvider};
pub use algorithms::{
    classify_event, fetch_provenance, generate_herb_id, lab_event_id, parse_moisture,
    processing_event_id, EventClass, EventMetadata, LabMetadata, ProcessingMetadata,
    ProvenanceTrail,
};
pub use config::{ConfigError, LedgerConfig, Network};
pub use domain::{
    Address, BatchSummary, Coordinates, EventRecord, GeoBounds, GeoFence, Hash32, LedgerError,
    LedgerEvent, Moisture, NewBatch, NewEvent, NewQualityTest, TransactionReceipt,
};
pub use ports::{HerbTraceApi, LedgerProvider, ProviderError, RawLog, RawReceipt};
pub use service::HerbTraceService;
pub use session::LedgerSession;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
