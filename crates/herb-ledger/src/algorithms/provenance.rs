//! # Provenance Trail
//!
//! Reassembles a batch's full history from the ledger and sorts it into
//! collection, processing and quality-test stages for display.

use futures::future::try_join_all;
use serde::Serialize;
use tracing::debug;

use crate::domain::{BatchSummary, Coordinates, EventRecord, LedgerError};
use crate::ports::HerbTraceApi;

/// Event type recorded for harvest events.
pub const COLLECTION_EVENT_TYPE: &str = "Collection";

/// Stage an event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventClass {
    /// Harvest in the field.
    Collection,
    /// Drying, grinding, packaging and similar steps.
    Processing,
    /// Laboratory test.
    QualityTest,
}

/// Classify an event by its position and type.
///
/// The first event is always the collection, whatever its type. Types
/// mentioning `moisture` or `test` (any case) are quality tests; everything
/// else is processing.
///
/// Classes are exclusive. Filtering each list by its own substring test would
/// put a "Pesticide Test" under both processing and quality, and a first event
/// with a custom type would never count as the harvest; neither happens here.
pub fn classify_event(index: u64, event_type: &str) -> EventClass {
    if index == 0 || event_type == COLLECTION_EVENT_TYPE {
        return EventClass::Collection;
    }
    let lowered = event_type.to_lowercase();
    if lowered.contains("moisture") || lowered.contains("test") {
        EventClass::QualityTest
    } else {
        EventClass::Processing
    }
}

/// A batch summary together with every event, in index order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProvenanceTrail {
    /// Batch summary.
    pub summary: BatchSummary,
    /// Events `0..events_count`, in order.
    pub events: Vec<EventRecord>,
}

impl ProvenanceTrail {
    /// Where the batch was harvested: the first event's position.
    pub fn harvest_location(&self) -> Option<Coordinates> {
        self.events.first().map(|e| e.location)
    }

    /// When the batch was harvested: the first event's timestamp.
    pub fn harvest_time(&self) -> Option<u64> {
        self.events.first().map(|e| e.timestamp)
    }

    /// Events of one class, in order.
    pub fn events_of(&self, class: EventClass) -> impl Iterator<Item = &EventRecord> {
        self.events
            .iter()
            .filter(move |e| classify_event(e.index, &e.event_type) == class)
    }

    /// Processing steps, in order.
    pub fn processing_steps(&self) -> Vec<&EventRecord> {
        self.events_of(EventClass::Processing).collect()
    }

    /// Quality tests, in order.
    pub fn quality_tests(&self) -> Vec<&EventRecord> {
        self.events_of(EventClass::QualityTest).collect()
    }

    /// True while the batch has not been recalled.
    pub fn authenticity_verified(&self) -> bool {
        !self.summary.recalled
    }

    /// True if every recorded quality test passed.
    pub fn all_tests_passed(&self) -> bool {
        self.events_of(EventClass::QualityTest).all(|e| e.quality_pass)
    }
}

/// Read a batch summary and all of its events.
///
/// Event reads are issued concurrently; the first failure aborts the fetch.
pub async fn fetch_provenance<A>(api: &A, batch_id: &str) -> Result<ProvenanceTrail, LedgerError>
where
    A: HerbTraceApi + ?Sized,
{
    let summary = api.get_batch_summary(batch_id).await?;
    debug!(batch_id, events = summary.events_count, "Fetching provenance");

    let events = try_join_all((0..summary.events_count).map(|i| api.get_event(batch_id, i))).await?;

    Ok(ProvenanceTrail { summary, events })
}
