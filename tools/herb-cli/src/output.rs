//! Human-readable and JSON rendering of ledger results.

use std::fmt::Display;

use anyhow::Result;
use chrono::DateTime;
use serde::Serialize;
use serde_json::json;

use herb_ledger::{
    BatchSummary, EventRecord, GeoFence, LedgerEvent, ProvenanceTrail, TransactionReceipt,
};

/// Output format selected on the command line.
#[derive(Clone, Copy, Debug)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn receipt(&self, message: &str, receipt: &TransactionReceipt) -> Result<()> {
        if self.json {
            return self.print_json(receipt);
        }
        println!("{message}");
        println!("  Transaction: {}", receipt.tx_hash);
        println!("  Block:       {}", receipt.block_number);
        println!("  Gas used:    {}", receipt.gas_used);
        for event in &receipt.events {
            println!("  Event:       {}", describe_event(event));
        }
        Ok(())
    }

    pub fn summary(&self, summary: &BatchSummary) -> Result<()> {
        if self.json {
            return self.print_json(summary);
        }
        print_summary(summary);
        Ok(())
    }

    pub fn event(&self, event: &EventRecord) -> Result<()> {
        if self.json {
            return self.print_json(event);
        }
        println!("Event {} of {}", event.index, event.batch_id);
        println!("  Id:        {}", event.event_id);
        println!("  Type:      {}", event.event_type);
        println!("  Actor:     {}", event.actor);
        println!("  Location:  {}", event.location);
        println!("  Time:      {}", format_time(event.timestamp));
        println!("  Quality:   {}", verdict(event.quality_pass));
        if !event.metadata_ref.is_empty() {
            println!("  Metadata:  {}", event.metadata_ref);
        }
        Ok(())
    }

    pub fn trail(&self, trail: &ProvenanceTrail) -> Result<()> {
        if self.json {
            return self.print_json(&json!({
                "summary": trail.summary,
                "authenticityVerified": trail.authenticity_verified(),
                "harvestLocation": trail.harvest_location(),
                "harvestTime": trail.harvest_time(),
                "processingSteps": trail.processing_steps(),
                "qualityTests": trail.quality_tests(),
            }));
        }

        print_summary(&trail.summary);
        let status = if trail.authenticity_verified() {
            "verified"
        } else {
            "RECALLED"
        };
        println!("  Authenticity: {status}");

        println!("Harvest");
        match (trail.harvest_location(), trail.harvest_time()) {
            (Some(location), Some(time)) => {
                println!("  Location:  {location}");
                println!("  Date:      {}", format_time(time));
            }
            _ => println!("  (no events recorded)"),
        }

        println!("Processing");
        for step in trail.processing_steps() {
            println!(
                "  [{}] {} at {} by {}",
                step.index,
                step.event_type,
                format_time(step.timestamp),
                step.actor.short()
            );
        }

        println!("Quality tests");
        for test in trail.quality_tests() {
            println!(
                "  [{}] {}: {} ({})",
                test.index,
                test.event_type,
                verdict(test.quality_pass),
                format_time(test.timestamp)
            );
        }
        Ok(())
    }

    pub fn geofence(&self, species: &str, fence: &GeoFence) -> Result<()> {
        if self.json {
            return self.print_json(fence);
        }
        if !fence.active {
            println!("No geofence for {species}");
            return Ok(());
        }
        let b = fence.bounds;
        println!(
            "{species}: lat {:.6}..{:.6}, lon {:.6}..{:.6}",
            b.min_lat, b.max_lat, b.min_lon, b.max_lon
        );
        Ok(())
    }

    pub fn value<T: Serialize + Display>(&self, label: &str, value: &T) -> Result<()> {
        if self.json {
            return self.print_json(value);
        }
        println!("{label}: {value}");
        Ok(())
    }
}

fn print_summary(summary: &BatchSummary) {
    println!("Batch {} ({})", summary.batch_id, summary.species);
    println!("  Creator:   {}", summary.creator);
    println!("  Created:   {}", format_time(summary.created_at));
    println!("  Root hash: {}", summary.root_hash);
    println!("  Events:    {}", summary.events_count);
    println!("  Recalled:  {}", summary.recalled);
}

fn describe_event(event: &LedgerEvent) -> String {
    match event {
        LedgerEvent::BatchCreated { creator, .. } => format!("BatchCreated by {}", creator.short()),
        LedgerEvent::EventAdded {
            index,
            event_type,
            actor,
            ..
        } => format!("EventAdded #{index} {event_type} by {}", actor.short()),
        LedgerEvent::AccessGranted { who, .. } => format!("AccessGranted to {who}"),
        LedgerEvent::BatchRecalled { .. } => "BatchRecalled".to_string(),
    }
}

fn verdict(pass: bool) -> &'static str {
    if pass {
        "passed"
    } else {
        "failed"
    }
}

/// Seconds since the epoch as a UTC timestamp.
fn format_time(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}
