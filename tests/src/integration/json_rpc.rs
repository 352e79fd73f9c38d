//! # JSON-RPC Provider Over HTTP
//!
//! Runs `JsonRpcProvider` against a local HTTP bridge that forwards each
//! Ethereum method to the in-memory ledger, so the wire encoding of calls,
//! receipts, logs and revert data is exercised end to end.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use herb_ledger::abi::string_topic;
    use herb_ledger::{
        fetch_provenance, Address, Hash32, HerbTraceApi, InMemoryLedger, JsonRpcProvider,
        LedgerError, LedgerEvent, LedgerProvider, LedgerSession, ProviderError, RawReceipt,
    };

    use crate::fixtures::*;

    /// Wallet that takes its time to sign or to answer calls.
    struct SlowWallet {
        ledger: Arc<InMemoryLedger>,
        sign_delay: Duration,
        call_delay: Duration,
    }

    #[async_trait]
    impl LedgerProvider for SlowWallet {
        async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
            self.ledger.request_accounts().await
        }

        async fn chain_id(&self) -> Result<u64, ProviderError> {
            self.ledger.chain_id().await
        }

        async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ProviderError> {
            tokio::time::sleep(self.call_delay).await;
            self.ledger.call(to, data).await
        }

        async fn send_transaction(
            &self,
            from: Address,
            to: Address,
            data: Vec<u8>,
        ) -> Result<Hash32, ProviderError> {
            tokio::time::sleep(self.sign_delay).await;
            self.ledger.send_transaction(from, to, data).await
        }

        async fn transaction_receipt(
            &self,
            tx_hash: Hash32,
        ) -> Result<Option<RawReceipt>, ProviderError> {
            self.ledger.transaction_receipt(tx_hash).await
        }
    }

    async fn slow_provider(
        sign_delay: Duration,
        call_delay: Duration,
    ) -> (Arc<InMemoryLedger>, Arc<JsonRpcProvider>) {
        let ledger = ledger();
        let wallet = Arc::new(SlowWallet {
            ledger: Arc::clone(&ledger),
            sign_delay,
            call_delay,
        });
        let (endpoint, _handle) = spawn_rpc_bridge(wallet).await.unwrap();
        let provider = JsonRpcProvider::new(endpoint, Duration::from_millis(300)).unwrap();
        (ledger, Arc::new(provider))
    }

    async fn provider() -> (Arc<InMemoryLedger>, Arc<JsonRpcProvider>) {
        let ledger = ledger();
        let (endpoint, _handle) = spawn_rpc_bridge(Arc::clone(&ledger)).await.unwrap();
        let provider = JsonRpcProvider::new(endpoint, Duration::from_secs(5)).unwrap();
        (ledger, Arc::new(provider))
    }

    #[tokio::test]
    async fn test_chain_and_accounts() {
        let (_ledger, provider) = provider().await;
        assert_eq!(provider.chain_id().await.unwrap(), 11_155_111);
        let accounts = provider.request_accounts().await.unwrap();
        assert_eq!(accounts, vec![OWNER, COLLECTOR, PROCESSOR, LAB]);
    }

    #[tokio::test]
    async fn test_lifecycle_over_http() {
        let (_ledger, provider) = provider().await;
        let collector = service_as(&provider, COLLECTOR).await;

        let receipt = collector.create_batch(harvest("ASH1")).await.unwrap();
        assert_eq!(receipt.block_number, 1);
        assert!(receipt.gas_used > 21_000);
        assert_eq!(
            receipt.events,
            vec![LedgerEvent::BatchCreated {
                batch_topic: string_topic("ASH1"),
                creator: COLLECTOR,
            }]
        );

        collector.add_event(step("ASH1", "Collection")).await.unwrap();
        collector
            .add_quality_test(quality("ASH1", "Moisture Content", 7.25))
            .await
            .unwrap();

        let trail = fetch_provenance(&collector, "ASH1").await.unwrap();
        assert_eq!(trail.events.len(), 2);
        assert_eq!(trail.quality_tests().len(), 1);
        let origin = trail.harvest_location().unwrap();
        assert!((origin.lat - FACILITY.lat).abs() <= 1e-6);
    }

    #[tokio::test]
    async fn test_revert_reason_survives_the_wire() {
        let (_ledger, provider) = provider().await;
        let collector = service_as(&provider, COLLECTOR).await;
        let processor = service_as(&provider, PROCESSOR).await;
        collector.create_batch(harvest("ASH1")).await.unwrap();

        let err = processor.add_event(step("ASH1", "Drying")).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::Unauthorized {
                reason: "Not authorized".to_string()
            }
        );

        let err = collector.get_event("ASH1", 9).await.unwrap_err();
        assert!(err.is_not_found(), "got {err:?}");
    }

    #[tokio::test]
    async fn test_pending_receipts_are_polled() {
        let (ledger, provider) = provider().await;
        ledger.set_pending_polls(2);
        let collector = service_as(&provider, COLLECTOR).await;
        let receipt = collector.create_batch(harvest("ASH1")).await.unwrap();
        assert_eq!(receipt.block_number, 1);
    }

    #[tokio::test]
    async fn test_read_only_session_over_http() {
        let (_ledger, provider) = provider().await;
        let collector = service_as(&provider, COLLECTOR).await;
        collector.create_batch(harvest("ASH1")).await.unwrap();

        let reader = herb_ledger::HerbTraceService::new(LedgerSession::read_only(
            Arc::clone(&provider),
            CONTRACT,
        ));
        assert_eq!(reader.owner().await.unwrap(), OWNER);
        assert_eq!(
            reader.get_batch_summary("ASH1").await.unwrap().creator,
            COLLECTOR
        );
    }

    #[tokio::test]
    async fn test_slow_signature_is_not_reported_as_failure() {
        let (ledger, provider) =
            slow_provider(Duration::from_millis(1_200), Duration::ZERO).await;
        let collector = service_as(&provider, COLLECTOR).await;

        let receipt = collector.create_batch(harvest("ASH1")).await.unwrap();
        assert_eq!(receipt.block_number, 1);
        assert_eq!(ledger.block_number(), 1);
        assert_eq!(collector.batch_event_count("ASH1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_slow_read_times_out() {
        let (_ledger, provider) =
            slow_provider(Duration::ZERO, Duration::from_millis(1_200)).await;
        let reader = herb_ledger::HerbTraceService::new(LedgerSession::read_only(
            Arc::clone(&provider),
            CONTRACT,
        ));

        let err = reader.owner().await.unwrap_err();
        assert!(matches!(err, LedgerError::TransportUnavailable(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_user_rejection_is_rpc_error() {
        let (ledger, provider) = provider().await;
        ledger.set_reject_signatures(true);
        let err = provider
            .send_transaction(OWNER, CONTRACT, vec![0xde, 0xad])
            .await
            .unwrap_err();
        assert!(err.is_user_rejection(), "got {err:?}");
        assert!(matches!(err, ProviderError::Rpc { .. }));
    }
}
