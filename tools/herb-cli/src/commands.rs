//! Subcommands and their execution.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use clap::Subcommand;

use herb_ledger::{
    algorithms::{
        generate_herb_id, lab_event_id, parse_moisture, processing_event_id, EventMetadata,
        LabMetadata, ProcessingMetadata,
    },
    fetch_provenance, Address, Coordinates, GeoBounds, HerbTraceApi, Moisture, NewBatch, NewEvent,
    NewQualityTest,
};

use crate::output::Output;

/// Ledger operations.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a new batch at its harvest site
    CreateBatch {
        /// Herb species
        #[arg(long)]
        species: String,
        /// Batch id (generated from the species and clock if omitted)
        #[arg(long)]
        batch_id: Option<String>,
        /// Identifier of the collection event
        #[arg(long)]
        event_id: String,
        /// Off-ledger metadata reference
        #[arg(long, default_value = "")]
        metadata: String,
        /// Harvest latitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Harvest longitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },

    /// Append a processing step to a batch
    AddEvent {
        /// Target batch
        batch_id: String,
        /// Step name (Drying, Grinding, ...)
        #[arg(long)]
        event_type: String,
        /// Event id (PROC-<ms> if omitted)
        #[arg(long)]
        event_id: Option<String>,
        /// Processor identifier
        #[arg(long, default_value = "")]
        processor_id: String,
        /// Processor's lot number
        #[arg(long, default_value = "")]
        lot: String,
        /// Free-form notes
        #[arg(long, default_value = "")]
        notes: String,
        /// Process temperature
        #[arg(long, default_value = "")]
        temperature: String,
        /// Process duration
        #[arg(long, default_value = "")]
        duration: String,
        /// Latitude in degrees
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        lon: f64,
    },

    /// Record a laboratory test result
    AddQualityTest {
        /// Target batch
        batch_id: String,
        /// Test type (moisture tests carry a numeric value)
        #[arg(long)]
        test_type: String,
        /// Result text, e.g. "8.5%"
        #[arg(long)]
        result: String,
        /// Event id (LAB-<ms> if omitted)
        #[arg(long)]
        event_id: Option<String>,
        /// Laboratory name
        #[arg(long, default_value = "")]
        laboratory: String,
        /// Certificate number
        #[arg(long, default_value = "")]
        certificate_id: String,
        /// Reported status
        #[arg(long, default_value = "pending")]
        status: String,
        /// Latitude in degrees
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        lon: f64,
    },

    /// Allow an account to append events to a batch
    GrantAccess {
        /// Target batch
        batch_id: String,
        /// Account to authorize
        account: Address,
    },

    /// Recall a batch
    Recall {
        /// Target batch
        batch_id: String,
    },

    /// Set the allowed harvest area for a species
    SetGeofence {
        /// Herb species
        species: String,
        /// Southern edge
        #[arg(long, allow_negative_numbers = true)]
        min_lat: f64,
        /// Northern edge
        #[arg(long, allow_negative_numbers = true)]
        max_lat: f64,
        /// Western edge
        #[arg(long, allow_negative_numbers = true)]
        min_lon: f64,
        /// Eastern edge
        #[arg(long, allow_negative_numbers = true)]
        max_lon: f64,
    },

    /// Set the maximum moisture percentage for a species
    SetMoistureThreshold {
        /// Herb species
        species: String,
        /// Threshold in percent
        percent: f64,
    },

    /// Show a batch summary
    Batch {
        /// Batch id
        batch_id: String,
    },

    /// Show one event of a batch
    Event {
        /// Batch id
        batch_id: String,
        /// Zero-based event index
        index: u64,
    },

    /// Show the full provenance trail of a batch
    Trail {
        /// Batch id
        batch_id: String,
    },

    /// Show the number of events recorded for a batch
    EventCount {
        /// Batch id
        batch_id: String,
    },

    /// Check whether an account may append to a batch
    Authorized {
        /// Batch id
        batch_id: String,
        /// Account to check
        account: Address,
    },

    /// Show the geofence of a species
    Geofence {
        /// Herb species
        species: String,
    },

    /// Show the moisture threshold of a species
    Threshold {
        /// Herb species
        species: String,
    },

    /// Show the contract owner
    Owner,
}

impl Command {
    /// True if the command submits a transaction.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::CreateBatch { .. }
                | Self::AddEvent { .. }
                | Self::AddQualityTest { .. }
                | Self::GrantAccess { .. }
                | Self::Recall { .. }
                | Self::SetGeofence { .. }
                | Self::SetMoistureThreshold { .. }
        )
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Execute `command` and print its result.
pub async fn run<A: HerbTraceApi + ?Sized>(api: &A, command: Command, out: &Output) -> Result<()> {
    match command {
        Command::CreateBatch {
            species,
            batch_id,
            event_id,
            metadata,
            lat,
            lon,
        } => {
            let batch_id = batch_id.unwrap_or_else(|| generate_herb_id(&species, now_ms()));
            let receipt = api
                .create_batch(NewBatch {
                    batch_id: batch_id.clone(),
                    species,
                    event_id,
                    metadata_ref: metadata,
                    location: Coordinates::new(lat, lon),
                })
                .await?;
            out.receipt(&format!("Batch {batch_id} created"), &receipt)?;
        }
        Command::AddEvent {
            batch_id,
            event_type,
            event_id,
            processor_id,
            lot,
            notes,
            temperature,
            duration,
            lat,
            lon,
        } => {
            let now = now_ms();
            let metadata = ProcessingMetadata {
                processor_id,
                batch_id: lot,
                notes,
                temperature,
                duration,
                timestamp: now,
            };
            let receipt = api
                .add_event(NewEvent {
                    batch_id: batch_id.clone(),
                    event_id: event_id.unwrap_or_else(|| processing_event_id(now)),
                    event_type: event_type.clone(),
                    metadata_ref: metadata.to_metadata_ref()?,
                    location: Coordinates::new(lat, lon),
                })
                .await?;
            out.receipt(&format!("{event_type} recorded for {batch_id}"), &receipt)?;
        }
        Command::AddQualityTest {
            batch_id,
            test_type,
            result,
            event_id,
            laboratory,
            certificate_id,
            status,
            lat,
            lon,
        } => {
            let now = now_ms();
            let measurement = parse_moisture(&test_type, &result);
            let metadata = LabMetadata {
                laboratory,
                certificate_id,
                result,
                status,
                timestamp: now,
            };
            let receipt = api
                .add_quality_test(NewQualityTest {
                    batch_id: batch_id.clone(),
                    event_id: event_id.unwrap_or_else(|| lab_event_id(now)),
                    test_type: test_type.clone(),
                    measurement,
                    metadata_ref: metadata.to_metadata_ref()?,
                    location: Coordinates::new(lat, lon),
                })
                .await?;
            out.receipt(
                &format!("{test_type} ({measurement}) recorded for {batch_id}"),
                &receipt,
            )?;
        }
        Command::GrantAccess { batch_id, account } => {
            let receipt = api.grant_access(&batch_id, account).await?;
            out.receipt(&format!("{account} may now append to {batch_id}"), &receipt)?;
        }
        Command::Recall { batch_id } => {
            let receipt = api.recall_batch(&batch_id).await?;
            out.receipt(&format!("Batch {batch_id} recalled"), &receipt)?;
        }
        Command::SetGeofence {
            species,
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        } => {
            let bounds = GeoBounds {
                min_lat,
                max_lat,
                min_lon,
                max_lon,
            };
            let receipt = api.set_geo_fence(&species, bounds).await?;
            out.receipt(&format!("Geofence set for {species}"), &receipt)?;
        }
        Command::SetMoistureThreshold { species, percent } => {
            let threshold = Moisture(percent);
            let receipt = api.set_moisture_threshold(&species, threshold).await?;
            out.receipt(&format!("Moisture threshold for {species} set to {threshold}"), &receipt)?;
        }
        Command::Batch { batch_id } => {
            out.summary(&api.get_batch_summary(&batch_id).await?)?;
        }
        Command::Event { batch_id, index } => {
            out.event(&api.get_event(&batch_id, index).await?)?;
        }
        Command::Trail { batch_id } => {
            out.trail(&fetch_provenance(api, &batch_id).await?)?;
        }
        Command::EventCount { batch_id } => {
            out.value("Events", &api.batch_event_count(&batch_id).await?)?;
        }
        Command::Authorized { batch_id, account } => {
            out.value("Authorized", &api.authorized(&batch_id, account).await?)?;
        }
        Command::Geofence { species } => {
            out.geofence(&species, &api.geofence(&species).await?)?;
        }
        Command::Threshold { species } => {
            let threshold = api.moisture_threshold(&species).await?;
            out.value("Moisture threshold", &threshold)?;
        }
        Command::Owner => {
            out.value("Owner", &api.owner().await?)?;
        }
    }
    Ok(())
}
