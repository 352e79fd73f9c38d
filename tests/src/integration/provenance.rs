//! # Provenance Trail Assembly
//!
//! Builds the consumer view of a batch from ledger reads: harvest origin,
//! processing steps, laboratory results and the authenticity flag.

#[cfg(test)]
mod tests {
    use herb_ledger::{
        algorithms::{
            generate_herb_id, lab_event_id, parse_moisture, processing_event_id, EventMetadata,
            LabMetadata, ProcessingMetadata,
        },
        fetch_provenance, EventClass, HerbTraceApi, NewEvent, NewQualityTest,
    };

    use crate::fixtures::*;

    #[tokio::test]
    async fn test_dashboard_flow_builds_trail() {
        let ledger = ledger();
        let collector = service_as(&ledger, COLLECTOR).await;
        let processor = service_as(&ledger, PROCESSOR).await;
        let lab = service_as(&ledger, LAB).await;
        let owner = service_as(&ledger, OWNER).await;

        owner
            .set_moisture_threshold("Ashwagandha", herb_ledger::Moisture(10.0))
            .await
            .unwrap();

        let now_ms = 1_648_771_200_123;
        let herb_id = generate_herb_id("Ashwagandha", now_ms);
        assert_eq!(herb_id, "ASH200123");

        collector.create_batch(harvest(&herb_id)).await.unwrap();
        collector
            .add_event(NewEvent {
                location: HARVEST_SITE,
                ..step(&herb_id, "Collection")
            })
            .await
            .unwrap();
        collector.grant_access(&herb_id, PROCESSOR).await.unwrap();
        collector.grant_access(&herb_id, LAB).await.unwrap();

        let drying = ProcessingMetadata {
            processor_id: "PROC-UNIT-7".to_string(),
            notes: "shade dried".to_string(),
            temperature: "40C".to_string(),
            duration: "72h".to_string(),
            timestamp: now_ms + 1,
            ..ProcessingMetadata::default()
        };
        processor
            .add_event(NewEvent {
                batch_id: herb_id.clone(),
                event_id: processing_event_id(now_ms + 1),
                event_type: "Drying".to_string(),
                metadata_ref: drying.to_metadata_ref().unwrap(),
                location: FACILITY,
            })
            .await
            .unwrap();

        let report = LabMetadata {
            laboratory: "AyurLab".to_string(),
            certificate_id: "CERT-9".to_string(),
            result: "Moisture 8.75% w/w".to_string(),
            status: "passed".to_string(),
            timestamp: now_ms + 2,
        };
        lab.add_quality_test(NewQualityTest {
            batch_id: herb_id.clone(),
            event_id: lab_event_id(now_ms + 2),
            test_type: "Moisture Content Analysis".to_string(),
            measurement: parse_moisture("Moisture Content Analysis", &report.result),
            metadata_ref: report.to_metadata_ref().unwrap(),
            location: FACILITY,
        })
        .await
        .unwrap();
        lab.add_quality_test(quality(&herb_id, "Heavy Metals Testing", 0.0))
            .await
            .unwrap();
        processor.add_event(step(&herb_id, "Packaging")).await.unwrap();

        let trail = fetch_provenance(&collector, &herb_id).await.unwrap();
        assert_eq!(trail.events.len(), 5);
        assert!(trail.authenticity_verified());
        assert!(trail.all_tests_passed());

        let origin = trail.harvest_location().unwrap();
        assert!((origin.lat - HARVEST_SITE.lat).abs() <= 1e-6);
        assert!((origin.lon - HARVEST_SITE.lon).abs() <= 1e-6);
        assert_eq!(trail.harvest_time(), Some(1_648_771_200));

        let steps: Vec<&str> = trail
            .processing_steps()
            .iter()
            .map(|e| e.event_type.as_str())
            .collect();
        assert_eq!(steps, vec!["Drying", "Packaging"]);

        let tests: Vec<&str> = trail
            .quality_tests()
            .iter()
            .map(|e| e.event_type.as_str())
            .collect();
        assert_eq!(tests, vec!["Moisture Content Analysis", "Heavy Metals Testing"]);

        let drying_event = trail.processing_steps()[0];
        assert_eq!(drying_event.actor, PROCESSOR);
        assert_eq!(
            ProcessingMetadata::from_metadata_ref(&drying_event.metadata_ref).unwrap(),
            drying
        );
        let moisture_event = trail.quality_tests()[0];
        assert_eq!(
            LabMetadata::from_metadata_ref(&moisture_event.metadata_ref).unwrap(),
            report
        );
    }

    #[tokio::test]
    async fn test_recalled_batch_fails_authenticity() {
        let ledger = ledger();
        let collector = service_as(&ledger, COLLECTOR).await;
        collector.create_batch(harvest("TUR000001")).await.unwrap();
        collector.recall_batch("TUR000001").await.unwrap();

        let trail = fetch_provenance(&collector, "TUR000001").await.unwrap();
        assert!(!trail.authenticity_verified());
        assert!(trail.events.is_empty());
        assert_eq!(trail.harvest_location(), None);
    }

    #[tokio::test]
    async fn test_failed_test_is_visible_in_trail() {
        let ledger = ledger();
        let owner = service_as(&ledger, OWNER).await;
        owner
            .set_moisture_threshold("Ashwagandha", herb_ledger::Moisture(8.0))
            .await
            .unwrap();
        owner.create_batch(harvest("ASH1")).await.unwrap();
        owner.add_event(step("ASH1", "Collection")).await.unwrap();
        owner
            .add_quality_test(quality("ASH1", "moisture", 9.5))
            .await
            .unwrap();

        let trail = fetch_provenance(&owner, "ASH1").await.unwrap();
        assert!(!trail.all_tests_passed());
        let failed: Vec<_> = trail
            .events_of(EventClass::QualityTest)
            .filter(|e| !e.quality_pass)
            .map(|e| e.index)
            .collect();
        assert_eq!(failed, vec![1]);
    }

    #[tokio::test]
    async fn test_trail_of_unknown_batch_is_not_found() {
        let ledger = ledger();
        let collector = service_as(&ledger, COLLECTOR).await;
        let err = fetch_provenance(&collector, "NOPE").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
