//! # Algorithms Module
//!
//! Client-side logic layered on the contract calls: provenance assembly,
//! identifier generation and metadata encoding.

pub mod identifiers;
pub mod metadata;
pub mod provenance;

pub use identifiers::{generate_herb_id, lab_event_id, parse_moisture, processing_event_id};
pub use metadata::{EventMetadata, LabMetadata, ProcessingMetadata};
pub use provenance::{
    classify_event, fetch_provenance, EventClass, ProvenanceTrail, COLLECTION_EVENT_TYPE,
};
