//! # Batch Lifecycle Flows
//!
//! Drives the full collector → processor → laboratory → consumer sequence
//! through `HerbTraceService` against the in-memory ledger.
//!
//! ## Flows Tested:
//!
//! 1. **Create and read back**: summary fields, zero events after creation
//! 2. **Append history**: event count and per-event round trip
//! 3. **Access control**: grant, unauthorized writes, owner-only admin calls
//! 4. **Recall**: one-way flag, idempotent, blocks further writes
//! 5. **Geofence and thresholds**: enforcement and quality verdicts

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use herb_ledger::abi::string_topic;
    use herb_ledger::{GeoBounds, HerbTraceApi, LedgerError, LedgerEvent, Moisture};

    use crate::fixtures::*;

    // =============================================================================
    // CREATE AND READ BACK
    // =============================================================================

    #[tokio::test]
    async fn test_created_batch_has_no_events() {
        let ledger = ledger();
        let collector = service_as(&ledger, COLLECTOR).await;

        let receipt = collector.create_batch(harvest("ASH123456")).await.unwrap();
        assert_eq!(receipt.events.len(), 1);
        assert!(receipt.events[0].concerns_batch("ASH123456"));

        let summary = collector.get_batch_summary("ASH123456").await.unwrap();
        assert_eq!(summary.creator, COLLECTOR);
        assert!(!summary.recalled);
        assert_eq!(summary.events_count, 0);
        assert_eq!(collector.batch_event_count("ASH123456").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_batch_is_rejected() {
        let ledger = ledger();
        let collector = service_as(&ledger, COLLECTOR).await;
        collector.create_batch(harvest("ASH1")).await.unwrap();

        let err = collector.create_batch(harvest("ASH1")).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::Submission {
                reason: "Batch exists".to_string()
            }
        );
    }

    // =============================================================================
    // APPEND HISTORY
    // =============================================================================

    #[tokio::test]
    async fn test_events_round_trip_in_order() {
        let ledger = ledger();
        let collector = service_as(&ledger, COLLECTOR).await;
        collector.create_batch(harvest("ASH1")).await.unwrap();

        let types = ["Collection", "Drying", "Grinding", "Sieving", "Packaging"];
        for (i, event_type) in types.iter().enumerate() {
            ledger.advance_time(60);
            let receipt = collector.add_event(step("ASH1", event_type)).await.unwrap();
            assert_eq!(
                receipt.events,
                vec![LedgerEvent::EventAdded {
                    batch_topic: string_topic("ASH1"),
                    index: i as u64,
                    event_id: format!("PROC-{event_type}"),
                    event_type: event_type.to_string(),
                    actor: COLLECTOR,
                }]
            );
        }

        let summary = collector.get_batch_summary("ASH1").await.unwrap();
        assert_eq!(summary.events_count, types.len() as u64);

        for (i, event_type) in types.iter().enumerate() {
            let event = collector.get_event("ASH1", i as u64).await.unwrap();
            assert_eq!(event.index, i as u64);
            assert_eq!(event.event_type, *event_type);
            assert_eq!(event.event_id, format!("PROC-{event_type}"));
            assert_eq!(event.metadata_ref, "{}");
            assert_eq!(event.actor, COLLECTOR);
            assert!((event.location.lat - FACILITY.lat).abs() <= 1e-6);
            assert!((event.location.lon - FACILITY.lon).abs() <= 1e-6);
            assert_eq!(event.timestamp, 1_648_771_200 + 60 * (i as u64 + 1));
        }

        let err = collector.get_event("ASH1", types.len() as u64).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_concurrent_writers_on_separate_batches() {
        let ledger = ledger();
        let collector = service_as(&ledger, COLLECTOR).await;
        let processor = service_as(&ledger, PROCESSOR).await;

        let (a, b) = tokio::join!(
            collector.create_batch(harvest("ASH-A")),
            processor.create_batch(harvest("ASH-B")),
        );
        a.unwrap();
        b.unwrap();

        let (a, b) = tokio::join!(
            collector.add_event(step("ASH-A", "Drying")),
            processor.add_event(step("ASH-B", "Drying")),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(collector.batch_event_count("ASH-A").await.unwrap(), 1);
        assert_eq!(collector.batch_event_count("ASH-B").await.unwrap(), 1);
    }

    // =============================================================================
    // ACCESS CONTROL
    // =============================================================================

    #[tokio::test]
    async fn test_grant_access_opens_batch_to_processor() {
        let ledger = ledger();
        let collector = service_as(&ledger, COLLECTOR).await;
        let processor = service_as(&ledger, PROCESSOR).await;
        collector.create_batch(harvest("ASH1")).await.unwrap();

        assert!(!collector.authorized("ASH1", PROCESSOR).await.unwrap());
        let err = processor.add_event(step("ASH1", "Drying")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized { .. }), "got {err:?}");

        let receipt = collector.grant_access("ASH1", PROCESSOR).await.unwrap();
        assert_eq!(
            receipt.events,
            vec![LedgerEvent::AccessGranted {
                batch_topic: string_topic("ASH1"),
                who: PROCESSOR,
            }]
        );
        assert!(collector.authorized("ASH1", PROCESSOR).await.unwrap());
        processor.add_event(step("ASH1", "Drying")).await.unwrap();
    }

    #[tokio::test]
    async fn test_only_creator_or_owner_may_grant() {
        let ledger = ledger();
        let collector = service_as(&ledger, COLLECTOR).await;
        let processor = service_as(&ledger, PROCESSOR).await;
        let owner = service_as(&ledger, OWNER).await;
        collector.create_batch(harvest("ASH1")).await.unwrap();

        let err = processor.grant_access("ASH1", LAB).await.unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized { .. }));

        owner.grant_access("ASH1", LAB).await.unwrap();
        assert!(owner.authorized("ASH1", LAB).await.unwrap());
    }

    #[tokio::test]
    async fn test_admin_calls_are_owner_only() {
        let ledger = ledger();
        let collector = service_as(&ledger, COLLECTOR).await;
        let owner = service_as(&ledger, OWNER).await;

        let err = collector
            .set_moisture_threshold("Ashwagandha", Moisture(10.0))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized { .. }));
        assert_eq!(collector.owner().await.unwrap(), OWNER);

        owner
            .set_moisture_threshold("Ashwagandha", Moisture(10.0))
            .await
            .unwrap();
        assert_eq!(
            collector.moisture_threshold("Ashwagandha").await.unwrap(),
            Moisture(10.0)
        );
    }

    // =============================================================================
    // RECALL
    // =============================================================================

    #[tokio::test]
    async fn test_recall_is_one_way() {
        let ledger = ledger();
        let collector = service_as(&ledger, COLLECTOR).await;
        collector.create_batch(harvest("ASH1")).await.unwrap();
        collector.add_event(step("ASH1", "Collection")).await.unwrap();

        let receipt = collector.recall_batch("ASH1").await.unwrap();
        assert_eq!(
            receipt.events,
            vec![LedgerEvent::BatchRecalled {
                batch_topic: string_topic("ASH1")
            }]
        );
        assert!(collector.get_batch_summary("ASH1").await.unwrap().recalled);

        collector.recall_batch("ASH1").await.unwrap();
        let summary = collector.get_batch_summary("ASH1").await.unwrap();
        assert!(summary.recalled);
        assert_eq!(summary.events_count, 1);

        let err = collector.add_event(step("ASH1", "Drying")).await.unwrap_err();
        assert!(err.is_submission_failure());
    }

    #[tokio::test]
    async fn test_recall_of_unknown_batch_fails() {
        let ledger = ledger();
        let owner = service_as(&ledger, OWNER).await;
        let err = owner.recall_batch("NOPE").await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::Submission {
                reason: "Batch not found".to_string()
            }
        );
    }

    // =============================================================================
    // GEOFENCE AND THRESHOLDS
    // =============================================================================

    #[tokio::test]
    async fn test_geofence_enforced_at_creation() {
        let ledger = ledger();
        let owner = service_as(&ledger, OWNER).await;
        let collector = service_as(&ledger, COLLECTOR).await;
        owner
            .set_geo_fence(
                "Ashwagandha",
                GeoBounds {
                    min_lat: 20.0,
                    max_lat: 30.0,
                    min_lon: 70.0,
                    max_lon: 80.0,
                },
            )
            .await
            .unwrap();

        collector.create_batch(harvest("ASH-IN")).await.unwrap();

        let mut outside = harvest("ASH-OUT");
        outside.location = herb_ledger::Coordinates::new(-33.8688, 151.2093);
        let err = collector.create_batch(outside).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::Submission {
                reason: "Location outside geofence".to_string()
            }
        );
        assert!(collector.get_batch_summary("ASH-OUT").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_quality_verdicts_follow_threshold() {
        let ledger = ledger();
        let owner = service_as(&ledger, OWNER).await;
        let collector = service_as(&ledger, COLLECTOR).await;
        let lab = service_as(&ledger, LAB).await;

        collector.create_batch(harvest("ASH1")).await.unwrap();
        collector.grant_access("ASH1", LAB).await.unwrap();

        // No threshold configured: everything passes.
        lab.add_quality_test(quality("ASH1", "Moisture Content", 55.0))
            .await
            .unwrap();

        owner
            .set_moisture_threshold("Ashwagandha", Moisture(10.0))
            .await
            .unwrap();
        lab.add_quality_test(quality("ASH1", "Moisture Content", 10.0))
            .await
            .unwrap();
        lab.add_quality_test(quality("ASH1", "Moisture Content", 10.01))
            .await
            .unwrap();

        let verdicts: Vec<bool> = futures::future::try_join_all(
            (0..3).map(|i| lab.get_event("ASH1", i)),
        )
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.quality_pass)
        .collect();
        assert_eq!(verdicts, vec![true, true, false]);
    }

    #[tokio::test]
    async fn test_transport_loss_mid_flow() {
        let ledger = ledger();
        let collector = service_as(&ledger, COLLECTOR).await;
        collector.create_batch(harvest("ASH1")).await.unwrap();

        ledger.set_available(false);
        let err = collector.add_event(step("ASH1", "Drying")).await.unwrap_err();
        assert!(matches!(err, LedgerError::TransportUnavailable(_)));

        ledger.set_available(true);
        assert_eq!(collector.batch_event_count("ASH1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sessions_share_one_provider() {
        let ledger = ledger();
        let collector = service_as(&ledger, COLLECTOR).await;
        let clone = collector.session().clone();
        assert!(Arc::ptr_eq(clone.provider(), &ledger));
        assert_eq!(clone.account(), Some(COLLECTOR));
    }
}
