//! Sample data for `--demo`.

use herb_ledger::{
    algorithms::{lab_event_id, processing_event_id, EventMetadata, LabMetadata, ProcessingMetadata},
    Address, Coordinates, GeoBounds, HerbTraceApi, InMemoryLedger, LedgerConfig, LedgerError,
    Moisture, NewBatch, NewEvent, NewQualityTest,
};

/// Account that owns the demo contract and signs every demo transaction.
pub const DEMO_ACCOUNT: Address = Address::new([
    0xf3, 0x9f, 0xd6, 0xe5, 0x1a, 0xad, 0x88, 0xf6, 0xf4, 0xce, 0x6a, 0xb8, 0x82, 0x72, 0x79,
    0xcf, 0xff, 0xb9, 0x22, 0x66,
]);

/// Batch recorded by [`seed`].
pub const DEMO_BATCH: &str = "ASH123456";

/// Harvest time of the demo batch (2022-04-01 00:00:00 UTC).
const HARVEST_TIME: u64 = 1_648_771_200;

const JAIPUR: Coordinates = Coordinates::new(26.9124, 75.7873);
const DELHI: Coordinates = Coordinates::new(28.6139, 77.2090);

/// An empty in-memory ledger on the configured network.
pub fn ledger(config: &LedgerConfig) -> InMemoryLedger {
    let ledger =
        InMemoryLedger::new(config.contract, DEMO_ACCOUNT).with_chain_id(config.network.chain_id());
    ledger.set_time(HARVEST_TIME);
    ledger
}

/// Record an Ashwagandha batch from harvest to lab release.
pub async fn seed<A: HerbTraceApi + ?Sized>(api: &A) -> Result<(), LedgerError> {
    api.set_geo_fence(
        "Ashwagandha",
        GeoBounds {
            min_lat: 20.0,
            max_lat: 30.0,
            min_lon: 70.0,
            max_lon: 80.0,
        },
    )
    .await?;
    api.set_moisture_threshold("Ashwagandha", Moisture(10.0))
        .await?;

    api.create_batch(NewBatch {
        batch_id: DEMO_BATCH.to_string(),
        species: "Ashwagandha".to_string(),
        event_id: "EVT-001".to_string(),
        metadata_ref: "QmHarvestRecordAsh123456".to_string(),
        location: JAIPUR,
    })
    .await?;
    api.add_event(NewEvent {
        batch_id: DEMO_BATCH.to_string(),
        event_id: "COL-1648771200000".to_string(),
        event_type: "Collection".to_string(),
        metadata_ref: "QmHarvestRecordAsh123456".to_string(),
        location: JAIPUR,
    })
    .await?;

    let ms = HARVEST_TIME * 1000;
    for (offset, step, temperature, duration) in [
        (86_400_000, "Drying", "40C", "72h"),
        (172_800_000, "Grinding", "", "2h"),
    ] {
        let metadata = ProcessingMetadata {
            processor_id: "PROC-JAIPUR-01".to_string(),
            batch_id: "LOT-2022-04".to_string(),
            notes: format!("{step} completed"),
            temperature: temperature.to_string(),
            duration: duration.to_string(),
            timestamp: ms + offset,
        };
        api.add_event(NewEvent {
            batch_id: DEMO_BATCH.to_string(),
            event_id: processing_event_id(ms + offset),
            event_type: step.to_string(),
            metadata_ref: metadata.to_metadata_ref()?,
            location: DELHI,
        })
        .await?;
    }

    let lab = LabMetadata {
        laboratory: "Delhi Ayurvedic Testing Lab".to_string(),
        certificate_id: "CERT-2022-0415".to_string(),
        result: "8.5% moisture".to_string(),
        status: "passed".to_string(),
        timestamp: ms + 259_200_000,
    };
    api.add_quality_test(NewQualityTest {
        batch_id: DEMO_BATCH.to_string(),
        event_id: lab_event_id(lab.timestamp),
        test_type: "Moisture Content Analysis".to_string(),
        measurement: herb_ledger::parse_moisture("Moisture Content Analysis", &lab.result),
        metadata_ref: lab.to_metadata_ref()?,
        location: DELHI,
    })
    .await?;

    api.add_event(NewEvent {
        batch_id: DEMO_BATCH.to_string(),
        event_id: processing_event_id(ms + 345_600_000),
        event_type: "Packaging".to_string(),
        metadata_ref: String::new(),
        location: DELHI,
    })
    .await?;

    Ok(())
}
