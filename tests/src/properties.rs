//! # Property-Based Tests
//!
//! Invariants that must hold for arbitrary inputs: scaled values survive a
//! trip through the ledger, histories keep their order and count, and the
//! client-side helpers stay total.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use herb_ledger::abi::codec::{decode, encode, ParamType, Token};
    use herb_ledger::{
        classify_event, generate_herb_id, parse_moisture, Coordinates, EventClass, HerbTraceApi,
        Moisture, NewEvent, NewQualityTest,
    };

    use crate::fixtures::*;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio_test::block_on(future)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_event_location_round_trip(
            lat in -90.0f64..=90.0,
            lon in -180.0f64..=180.0,
        ) {
            let event = block_on(async {
                let ledger = ledger();
                let service = service_as(&ledger, OWNER).await;
                service.create_batch(harvest("ASH1")).await.unwrap();
                service
                    .add_event(NewEvent {
                        location: Coordinates::new(lat, lon),
                        ..step("ASH1", "Drying")
                    })
                    .await
                    .unwrap();
                service.get_event("ASH1", 0).await.unwrap()
            });
            prop_assert!((event.location.lat - lat).abs() <= 1e-6);
            prop_assert!((event.location.lon - lon).abs() <= 1e-6);
        }

        #[test]
        fn prop_threshold_round_trip(percent in 0.0f64..=1_000.0) {
            let stored = block_on(async {
                let ledger = ledger();
                let owner = service_as(&ledger, OWNER).await;
                owner
                    .set_moisture_threshold("Tulsi", Moisture(percent))
                    .await
                    .unwrap();
                owner.moisture_threshold("Tulsi").await.unwrap()
            });
            prop_assert!((stored.percent() - percent).abs() <= 0.01);
        }

        #[test]
        fn prop_event_count_matches_appends(types in prop::collection::vec("[A-Za-z ]{1,16}", 0..12)) {
            let (count, read_back) = block_on(async {
                let ledger = ledger();
                let service = service_as(&ledger, COLLECTOR).await;
                service.create_batch(harvest("ASH1")).await.unwrap();
                for event_type in &types {
                    service.add_event(step("ASH1", event_type)).await.unwrap();
                }
                let count = service.get_batch_summary("ASH1").await.unwrap().events_count;
                let mut read_back = Vec::new();
                for i in 0..count {
                    read_back.push(service.get_event("ASH1", i).await.unwrap().event_type);
                }
                (count, read_back)
            });
            prop_assert_eq!(count, types.len() as u64);
            prop_assert_eq!(read_back, types);
        }

        #[test]
        fn prop_quality_verdict_matches_threshold(
            threshold in 1u64..=10_000,
            value in 0u64..=10_000,
        ) {
            let pass = block_on(async {
                let ledger = ledger();
                let owner = service_as(&ledger, OWNER).await;
                owner
                    .set_moisture_threshold("Ashwagandha", Moisture::from_scaled(threshold))
                    .await
                    .unwrap();
                owner.create_batch(harvest("ASH1")).await.unwrap();
                owner
                    .add_quality_test(NewQualityTest {
                        measurement: Moisture::from_scaled(value),
                        ..quality("ASH1", "Moisture", 0.0)
                    })
                    .await
                    .unwrap();
                owner.get_event("ASH1", 0).await.unwrap().quality_pass
            });
            prop_assert_eq!(pass, value <= threshold);
        }
    }

    proptest! {
        #[test]
        fn prop_int256_round_trip(value in any::<i64>()) {
            let encoded = encode(&[Token::Int(value)]);
            prop_assert_eq!(encoded.len(), 32);
            let fill = if value < 0 { 0xff } else { 0x00 };
            prop_assert!(encoded[..24].iter().all(|b| *b == fill));
            let decoded = decode(&[ParamType::Int256], &encoded).unwrap();
            prop_assert_eq!(decoded, vec![Token::Int(value)]);
        }

        #[test]
        fn prop_string_round_trip(s in ".{0,80}") {
            let encoded = encode(&[Token::String(s.clone()), Token::uint(7)]);
            prop_assert_eq!(encoded.len() % 32, 0);
            let decoded = decode(&[ParamType::String, ParamType::Uint256], &encoded).unwrap();
            prop_assert_eq!(decoded, vec![Token::String(s), Token::uint(7)]);
        }

        #[test]
        fn prop_herb_id_shape(species in "[A-Za-z]{3,20}", now_ms in 1_000_000u64..=u64::MAX / 2) {
            let id = generate_herb_id(&species, now_ms);
            prop_assert_eq!(id.len(), 9);
            prop_assert_eq!(&id[..3], species[..3].to_uppercase());
            prop_assert!(id[3..].chars().all(|c| c.is_ascii_digit()));
            prop_assert!(now_ms.to_string().ends_with(&id[3..]));
        }

        #[test]
        fn prop_parse_moisture_reads_first_number(whole in 0u32..1_000, frac in 0u32..100) {
            let text = format!("Result: {whole}.{frac:02}% after 48h");
            let parsed = parse_moisture("Moisture Content", &text);
            let expected = f64::from(whole) + f64::from(frac) / 100.0;
            prop_assert!((parsed.percent() - expected).abs() < 1e-9);
            prop_assert_eq!(parse_moisture("Pesticide Screen", &text), Moisture(0.0));
        }

        #[test]
        fn prop_classification_is_exclusive(index in 1u64..100, event_type in "[A-Za-z ]{0,24}") {
            let class = classify_event(index, &event_type);
            let lowered = event_type.to_lowercase();
            let is_test = lowered.contains("moisture") || lowered.contains("test");
            match class {
                EventClass::Collection => prop_assert_eq!(event_type.as_str(), "Collection"),
                EventClass::QualityTest => prop_assert!(is_test),
                EventClass::Processing => prop_assert!(!is_test && event_type != "Collection"),
            }
        }
    }
}
