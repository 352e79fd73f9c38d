//! # Domain Entities
//!
//! Batch, event and geofence records as the client sees them: every scaled
//! field has already been converted back to decimal units.

use serde::{Deserialize, Serialize};

use super::errors::LedgerError;
use super::scaling::{scale_coordinate, unscale_coordinate, MAX_LATITUDE, MAX_LONGITUDE};
use super::value_objects::{check_degrees, Address, Coordinates, Hash32, Moisture};

// =============================================================================
// BATCH
// =============================================================================

/// Summary of a tracked batch, as returned by `getBatchSummary`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Batch identifier the summary was requested for.
    pub batch_id: String,
    /// Herb species.
    pub species: String,
    /// Account that created the batch.
    pub creator: Address,
    /// Content digest assigned by the ledger.
    pub root_hash: Hash32,
    /// Creation time, seconds since the Unix epoch.
    pub created_at: u64,
    /// One-way recall flag.
    pub recalled: bool,
    /// Number of events appended so far.
    pub events_count: u64,
}

// =============================================================================
// EVENT
// =============================================================================

/// One entry of a batch's append-only history, as returned by `getEvent`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Owning batch.
    pub batch_id: String,
    /// Zero-based position in the batch history.
    pub index: u64,
    /// Caller-supplied event identifier.
    pub event_id: String,
    /// Event type (`Collection`, `Drying`, a test type, ...).
    pub event_type: String,
    /// Account that submitted the event.
    pub actor: Address,
    /// Opaque off-ledger content reference.
    pub metadata_ref: String,
    /// Unscaled position.
    pub location: Coordinates,
    /// Ledger-assigned time, seconds since the Unix epoch.
    pub timestamp: u64,
    /// Quality verdict computed by the ledger.
    pub quality_pass: bool,
}

/// Parameters for `createBatch`.
#[derive(Clone, Debug, PartialEq)]
pub struct NewBatch {
    /// Unique batch identifier.
    pub batch_id: String,
    /// Herb species.
    pub species: String,
    /// Identifier of the initial collection event.
    pub event_id: String,
    /// Opaque metadata reference.
    pub metadata_ref: String,
    /// Collection position.
    pub location: Coordinates,
}

/// Parameters for `addEvent`.
#[derive(Clone, Debug, PartialEq)]
pub struct NewEvent {
    /// Target batch.
    pub batch_id: String,
    /// Caller-supplied event identifier.
    pub event_id: String,
    /// Event type.
    pub event_type: String,
    /// Opaque metadata reference.
    pub metadata_ref: String,
    /// Event position.
    pub location: Coordinates,
}

/// Parameters for `addQualityTest`.
#[derive(Clone, Debug, PartialEq)]
pub struct NewQualityTest {
    /// Target batch.
    pub batch_id: String,
    /// Caller-supplied event identifier.
    pub event_id: String,
    /// Test type, recorded as the event type.
    pub test_type: String,
    /// Raw measurement; scaled by 100 before sending.
    pub measurement: Moisture,
    /// Opaque metadata reference.
    pub metadata_ref: String,
    /// Laboratory position.
    pub location: Coordinates,
}

// =============================================================================
// GEOFENCE
// =============================================================================

/// Allowed bounding box for a species, in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    /// Southern edge.
    pub min_lat: f64,
    /// Northern edge.
    pub max_lat: f64,
    /// Western edge.
    pub min_lon: f64,
    /// Eastern edge.
    pub max_lon: f64,
}

/// A bounding box scaled by 10^6, in the order the ledger expects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScaledBounds {
    /// Southern edge.
    pub min_lat: i64,
    /// Northern edge.
    pub max_lat: i64,
    /// Western edge.
    pub min_lon: i64,
    /// Eastern edge.
    pub max_lon: i64,
}

impl GeoBounds {
    /// Validate and scale for transmission.
    pub fn scaled(&self) -> Result<ScaledBounds, LedgerError> {
        check_degrees("min latitude", self.min_lat, MAX_LATITUDE)?;
        check_degrees("max latitude", self.max_lat, MAX_LATITUDE)?;
        check_degrees("min longitude", self.min_lon, MAX_LONGITUDE)?;
        check_degrees("max longitude", self.max_lon, MAX_LONGITUDE)?;
        if self.min_lat > self.max_lat || self.min_lon > self.max_lon {
            return Err(LedgerError::InvalidInput(
                "geofence minimum exceeds maximum".to_string(),
            ));
        }
        Ok(ScaledBounds {
            min_lat: scale_coordinate(self.min_lat),
            max_lat: scale_coordinate(self.max_lat),
            min_lon: scale_coordinate(self.min_lon),
            max_lon: scale_coordinate(self.max_lon),
        })
    }

    /// True if the position lies inside the box, edges included.
    pub fn contains(&self, point: Coordinates) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lon..=self.max_lon).contains(&point.lon)
    }
}

impl ScaledBounds {
    /// Convert back to degrees.
    pub fn unscaled(&self) -> GeoBounds {
        GeoBounds {
            min_lat: unscale_coordinate(self.min_lat),
            max_lat: unscale_coordinate(self.max_lat),
            min_lon: unscale_coordinate(self.min_lon),
            max_lon: unscale_coordinate(self.max_lon),
        }
    }

    /// True if the scaled position lies inside the box, edges included.
    pub fn contains(&self, lat: i64, lon: i64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

/// A species geofence as stored by the ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoFence {
    /// Allowed area.
    pub bounds: GeoBounds,
    /// Whether the ledger enforces it.
    pub active: bool,
}

// =============================================================================
// RECEIPTS AND LEDGER EVENTS
// =============================================================================

/// Decoded contract event emitted during a transaction.
///
/// Indexed `string` parameters are only available as their keccak-256 digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "PascalCase")]
pub enum LedgerEvent {
    /// A batch was created.
    BatchCreated {
        /// keccak-256 of the batch id.
        batch_topic: Hash32,
        /// Creating account.
        creator: Address,
    },
    /// An event was appended to a batch.
    EventAdded {
        /// keccak-256 of the batch id.
        batch_topic: Hash32,
        /// Index assigned to the event.
        index: u64,
        /// Caller-supplied event identifier.
        event_id: String,
        /// Event type.
        event_type: String,
        /// Submitting account.
        actor: Address,
    },
    /// An account was allowed to append to a batch.
    AccessGranted {
        /// keccak-256 of the batch id.
        batch_topic: Hash32,
        /// Account granted access.
        who: Address,
    },
    /// A batch was recalled.
    BatchRecalled {
        /// keccak-256 of the batch id.
        batch_topic: Hash32,
    },
}

impl LedgerEvent {
    /// Digest of the batch id this event refers to.
    pub fn batch_topic(&self) -> Hash32 {
        match self {
            Self::BatchCreated { batch_topic, .. }
            | Self::EventAdded { batch_topic, .. }
            | Self::AccessGranted { batch_topic, .. }
            | Self::BatchRecalled { batch_topic } => *batch_topic,
        }
    }

    /// True if this event was emitted for `batch_id`.
    pub fn concerns_batch(&self, batch_id: &str) -> bool {
        self.batch_topic() == crate::abi::string_topic(batch_id)
    }
}

/// Outcome of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Transaction hash.
    pub tx_hash: Hash32,
    /// Block the transaction was mined in.
    pub block_number: u64,
    /// Gas consumed.
    pub gas_used: u64,
    /// Contract events emitted by the transaction.
    pub events: Vec<LedgerEvent>,
}
