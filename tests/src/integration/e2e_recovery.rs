//! # End-to-End State Recovery
//!
//! A node whose ledger lags behind the network fetches the missing blocks
//! from peer ledgers, replays them through the commit channel and applies
//! them locally. The recovered chain must be byte-identical to the peers'.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use node_runtime::adapters::MemoryLedger;
    use oc_03_state_recovery::{
        BlockFetcher, FetchError, RecoveryConfig, RecoveryError, RecoveryOutcome, RecoveryTarget,
        RecoveryTracker, StateRecovery,
    };
    use oc_04_order_node::{Ledger, LedgerBridge};
    use parking_lot::Mutex;
    use shared_bus::shutdown_channel;
    use shared_types::{Block, CommitEvent, ZERO_HASH};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Serves blocks straight from each peer's ledger.
    #[derive(Default)]
    struct LedgerPeers {
        ledgers: Mutex<HashMap<String, Arc<MemoryLedger>>>,
        /// Peers whose blocks are altered in transit.
        forging: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BlockFetcher for LedgerPeers {
        async fn fetch_block(&self, peer: &str, height: u64) -> Result<Block, FetchError> {
            let ledger = self.ledgers.lock().get(peer).cloned().ok_or_else(|| {
                FetchError::Unreachable {
                    peer: peer.to_string(),
                    reason: "unknown peer".into(),
                }
            })?;
            let mut block = ledger
                .block_by_height(height)
                .map_err(|_| FetchError::NotFound {
                    peer: peer.to_string(),
                    height,
                })?;
            if self.forging.lock().iter().any(|p| p == peer) {
                block.header.timestamp += 1;
            }
            Ok(block)
        }
    }

    /// A ledger holding `len` linked empty blocks.
    fn chain_ledger(len: u64) -> Arc<MemoryLedger> {
        let ledger = Arc::new(MemoryLedger::new());
        for height in 1..=len {
            ledger
                .apply(Block::new(height, ZERO_HASH, height as i64, "0xproposer", vec![]))
                .unwrap();
        }
        ledger
    }

    /// Copy the first `len` blocks of `source` into a fresh ledger.
    fn prefix_of(source: &MemoryLedger, len: u64) -> Arc<MemoryLedger> {
        let ledger = Arc::new(MemoryLedger::new());
        for height in 1..=len {
            ledger.apply(source.block_by_height(height).unwrap()).unwrap();
        }
        ledger
    }

    struct Lagging {
        recovery: StateRecovery,
        commits: mpsc::Receiver<CommitEvent>,
        tracker: Arc<RecoveryTracker>,
    }

    fn lagging(local: Arc<MemoryLedger>, peers: Arc<LedgerPeers>) -> Lagging {
        let (commit_tx, commits) = mpsc::channel(16);
        let tracker = Arc::new(RecoveryTracker::new());
        let recovery = StateRecovery::new(
            RecoveryConfig {
                retry_interval: Duration::from_millis(10),
            },
            peers,
            Arc::new(LedgerBridge(local)),
            commit_tx,
            tracker.clone(),
        );
        Lagging {
            recovery,
            commits,
            tracker,
        }
    }

    fn target_of(ledger: &MemoryLedger) -> RecoveryTarget {
        let head = ledger.chain_meta();
        RecoveryTarget {
            height: head.height,
            digest: head.block_hash,
        }
    }

    // =============================================================================
    // RECOVERY FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_lagging_ledger_catches_up() {
        let network = chain_ledger(6);
        let local = prefix_of(&network, 2);
        let peers = Arc::new(LedgerPeers::default());
        peers.ledgers.lock().insert("node2".into(), network.clone());
        let mut node = lagging(local.clone(), peers);
        let (_trigger, signal) = shutdown_channel();

        let outcome = node
            .recovery
            .recover(target_of(&network), &["node2".to_string()], signal)
            .await
            .unwrap();
        assert_eq!(outcome, RecoveryOutcome::Replayed { from: 3, to: 6 });
        assert!(node.tracker.is_active());

        while local.chain_meta().height < 6 {
            let event = node.commits.recv().await.unwrap();
            assert!(event.local_list.iter().all(|local| !local));
            local.apply(event.block).unwrap();
        }

        assert_eq!(local.chain_meta(), network.chain_meta());
        assert_eq!(node.tracker.complete(6).map(|t| t.height), Some(6));
    }

    #[tokio::test]
    async fn test_forging_peer_skipped() {
        let network = chain_ledger(4);
        let local = prefix_of(&network, 1);
        let peers = Arc::new(LedgerPeers::default());
        peers.ledgers.lock().insert("node2".into(), network.clone());
        peers.ledgers.lock().insert("node3".into(), network.clone());
        peers.forging.lock().push("node2".into());
        let mut node = lagging(local.clone(), peers);
        let (_trigger, signal) = shutdown_channel();

        node.recovery
            .recover(
                target_of(&network),
                &["node2".to_string(), "node3".to_string()],
                signal,
            )
            .await
            .unwrap();

        for height in 2..=4 {
            let event = node.commits.recv().await.unwrap();
            assert_eq!(event.block, network.block_by_height(height).unwrap());
            local.apply(event.block).unwrap();
        }
        assert_eq!(local.chain_meta(), network.chain_meta());
    }

    #[tokio::test]
    async fn test_forked_local_chain_detected() {
        let network = chain_ledger(3);
        let local = Arc::new(MemoryLedger::new());
        for height in 1..=3 {
            local
                .apply(Block::new(height, ZERO_HASH, 100 + height as i64, "0xother", vec![]))
                .unwrap();
        }
        let peers = Arc::new(LedgerPeers::default());
        peers.ledgers.lock().insert("node2".into(), network.clone());
        let node = lagging(local, peers);
        let (_trigger, signal) = shutdown_channel();

        let result = node
            .recovery
            .recover(target_of(&network), &["node2".to_string()], signal)
            .await;

        assert!(matches!(result, Err(RecoveryError::Divergent { height: 3 })));
        assert!(!node.tracker.is_active());
    }
}
