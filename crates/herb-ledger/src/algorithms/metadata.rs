//! Off-ledger metadata carried in the `metaCID` field.
//!
//! The ledger treats the reference as an opaque string. Dashboards store a
//! small JSON object there instead of a content id.

use serde::{Deserialize, Serialize};

use crate::domain::LedgerError;

/// Details recorded with a processing step.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingMetadata {
    /// Processor identifier.
    pub processor_id: String,
    /// Processor's own lot number.
    pub batch_id: String,
    /// Free-form notes.
    pub notes: String,
    /// Temperature as entered.
    pub temperature: String,
    /// Duration as entered.
    pub duration: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Details recorded with a laboratory test.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabMetadata {
    /// Laboratory name.
    pub laboratory: String,
    /// Certificate number.
    pub certificate_id: String,
    /// Result text as reported.
    pub result: String,
    /// Reported status (`passed`, `failed`, ...).
    pub status: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Metadata that can be stored as a ledger reference.
pub trait EventMetadata: Serialize + for<'de> Deserialize<'de> {
    /// Serialize to the string stored on the ledger.
    fn to_metadata_ref(&self) -> Result<String, LedgerError> {
        serde_json::to_string(self).map_err(|e| LedgerError::InvalidInput(e.to_string()))
    }

    /// Parse a stored reference. Fails for references that are not this JSON shape.
    fn from_metadata_ref(reference: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(reference).map_err(|e| LedgerError::Decode(e.to_string()))
    }
}

impl EventMetadata for ProcessingMetadata {}
impl EventMetadata for LabMetadata {}
