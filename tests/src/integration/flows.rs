//! # Integration Test Flows
//!
//! A transaction's whole path through one node:
//!
//! 1. **Pre-check → Batching cache**: remote batches are filtered by
//!    signature and balance, survivors are sealed into broadcast batches
//! 2. **Submission → Solo engine → Ledger**: a local transfer is admitted,
//!    ordered into a block, applied and reported back
//! 3. **Epoch boundary**: the executor's report at the last height of an
//!    epoch moves the node to the next epoch

#[cfg(test)]
mod tests {
    use super::super::{eventually, signed_transfer};
    use node_runtime::adapters::MemoryLedger;
    use node_runtime::config::RuntimeConfig;
    use node_runtime::NodeRuntime;
    use oc_01_precheck::{PreCheckConfig, TxPreCheckMgr, UncheckedTxEvent};
    use oc_02_tx_cache::{SealReason, TxCache, TxCacheConfig};
    use oc_04_order_node::{LedgerBridge, Ledger, OrderError};
    use shared_bus::{shutdown_channel, OrderEvent};
    use shared_crypto::Secp256k1KeyPair;
    use shared_types::{EpochInfo, U256};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn dev_config() -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.order.solo.batch_timeout_ms = 20;
        config.order.precheck.concurrency = 2;
        config
    }

    async fn started_runtime(
        config: RuntimeConfig,
        funded: &Secp256k1KeyPair,
        balance: u64,
    ) -> (NodeRuntime, Arc<MemoryLedger>) {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.set_balance(funded.address(), U256::from(balance));
        let runtime = NodeRuntime::new(config, ledger.clone()).expect("runtime builds");
        runtime.start().await.expect("runtime starts");
        (runtime, ledger)
    }

    // =============================================================================
    // PRE-CHECK → BATCHING CACHE
    // =============================================================================

    #[tokio::test]
    async fn test_remote_batch_filtered_then_sealed() {
        let rich = Secp256k1KeyPair::generate();
        let poor = Secp256k1KeyPair::generate();
        let ledger = Arc::new(MemoryLedger::new());
        ledger.set_balance(rich.address(), U256::from(1_000_000));
        ledger.set_balance(poor.address(), U256::from(20_999));

        let (trigger, signal) = shutdown_channel();
        let precheck = TxPreCheckMgr::new(
            PreCheckConfig {
                concurrency: 2,
                queue_capacity: 16,
                base_fee: U256::zero(),
            },
            Arc::new(LedgerBridge(ledger.clone())),
        );
        precheck.start(signal.clone()).unwrap();
        let mut valid = precheck.valid_tx_stream().unwrap();

        let (cache, handle, mut batches) = TxCache::new(TxCacheConfig {
            set_size: 2,
            set_timeout: Duration::from_secs(30),
            capacity: 16,
        });
        cache.spawn(signal);

        let mut forged = signed_transfer(&rich, 2, 0);
        forged.value = U256::from(999);
        let first = signed_transfer(&rich, 0, 0);
        let second = signed_transfer(&rich, 1, 0);
        precheck
            .post_unchecked_event(UncheckedTxEvent::Remote(vec![
                first.clone(),
                forged,
                signed_transfer(&poor, 0, 0),
                second.clone(),
            ]))
            .await
            .unwrap();

        let survivors = timeout(Duration::from_secs(2), valid.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(!survivors.local);
        assert_eq!(survivors.transactions, vec![first.clone(), second.clone()]);

        for tx in survivors.transactions {
            handle.submit(tx).await.unwrap();
        }
        let batch = timeout(Duration::from_secs(2), batches.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(batch.sealed_by(), SealReason::Full);
        assert_eq!(batch.transactions(), &[first, second]);

        trigger.trigger();
    }

    // =============================================================================
    // SUBMISSION → SOLO ENGINE → LEDGER
    // =============================================================================

    #[tokio::test]
    async fn test_exact_balance_transfer_executed() {
        let key = Secp256k1KeyPair::generate();
        let (runtime, ledger) = started_runtime(dev_config(), &key, 21_000).await;
        let mut accepted = runtime.node().subscribe_accepted_transactions();

        let tx = signed_transfer(&key, 0, 0);
        runtime.node().prepare(tx.clone()).await.unwrap();

        let event = timeout(Duration::from_secs(2), accepted.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            event,
            OrderEvent::TransactionsAccepted { local: true, ref transactions } if transactions == &vec![tx.clone()]
        ));

        eventually("block 1 applied", || ledger.chain_meta().height == 1).await;
        let block = ledger.block_by_height(1).unwrap();
        assert_eq!(block.transactions, vec![tx]);
        assert_eq!(block.header.proposer_account, format!("0x{:040x}", 1));
        assert_eq!(ledger.account_balance(&key.address()), U256::zero());
        assert_eq!(runtime.node().pending_nonce(&key.address()), 1);

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_one_short_rejected_with_have_want() {
        let key = Secp256k1KeyPair::generate();
        let (runtime, ledger) = started_runtime(dev_config(), &key, 20_999).await;

        let err = runtime
            .node()
            .prepare(signed_transfer(&key, 0, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Rejected(_)));
        assert!(err.to_string().contains("have 20999 want 21000"), "{err}");
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ledger.chain_meta().height, 0);

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_stopped_node_refuses_submissions() {
        let key = Secp256k1KeyPair::generate();
        let (runtime, _ledger) = started_runtime(dev_config(), &key, 1_000_000).await;

        runtime.shutdown().await;
        runtime.shutdown().await;

        assert!(matches!(
            runtime.node().prepare(signed_transfer(&key, 0, 0)).await,
            Err(OrderError::Stopped)
        ));
    }

    // =============================================================================
    // EPOCH BOUNDARY
    // =============================================================================

    #[tokio::test]
    async fn test_epoch_advances_at_last_block() {
        let mut config = dev_config();
        config.epoch_period = 3;
        config.consensus.block_max_tx_num = 1;
        let key = Secp256k1KeyPair::generate();
        let (runtime, ledger) = started_runtime(config, &key, 1_000_000).await;

        let genesis = runtime.node().current_epoch();
        runtime.epochs().advance(EpochInfo {
            epoch: 2,
            start_block: 4,
            ..(*genesis).clone()
        });

        for nonce in 0..3 {
            runtime
                .node()
                .prepare(signed_transfer(&key, nonce, 1))
                .await
                .unwrap();
            eventually("block applied", || ledger.chain_meta().height == nonce + 1).await;
        }

        let node = runtime.node().clone();
        eventually("epoch 2", move || node.current_epoch().epoch == 2).await;
        assert_eq!(runtime.node().quorum(), 1);

        runtime.shutdown().await;
    }
}
