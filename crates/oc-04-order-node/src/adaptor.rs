//! # Order Adaptor
//!
//! The engine's view of the node. Executed batches go to the block
//! listener, state transfer requests start a recovery episode, and
//! consensus messages leave through the pipe matching their kind.
//!
//! The bridges at the bottom expose the node's `Network` and `Ledger` ports
//! through the narrower traits the pre-check and recovery crates consume.

use crate::domain::{ConsensusMessage, ConsensusMessageType, EpochState, ExecutedBatch, NetworkError};
use crate::ports::{EngineStack, Ledger, Network, Pipe};
use async_trait::async_trait;
use oc_01_precheck::BalanceProvider;
use oc_03_state_recovery::{
    BlockFetcher, ChainReader, FetchError, RecoveryOutcome, RecoveryTarget, StateRecovery,
};
use parking_lot::RwLock;
use shared_bus::{EventPublisher, InMemoryEventBus, OrderEvent, ShutdownSignal};
use shared_types::{Address, Block, ChainMeta, NodeInfo, U256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub struct OrderAdaptor {
    node: NodeInfo,
    epoch: Arc<EpochState>,
    pipes: RwLock<HashMap<ConsensusMessageType, Arc<dyn Pipe>>>,
    ready_tx: mpsc::Sender<ExecutedBatch>,
    recovery: Arc<StateRecovery>,
    events: Arc<InMemoryEventBus>,
    shutdown: ShutdownSignal,
}

impl OrderAdaptor {
    pub fn new(
        node: NodeInfo,
        epoch: Arc<EpochState>,
        ready_tx: mpsc::Sender<ExecutedBatch>,
        recovery: Arc<StateRecovery>,
        events: Arc<InMemoryEventBus>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            node,
            epoch,
            pipes: RwLock::new(HashMap::new()),
            ready_tx,
            recovery,
            events,
            shutdown,
        }
    }

    /// Install the consensus pipes opened during start.
    pub fn set_pipes(&self, pipes: HashMap<ConsensusMessageType, Arc<dyn Pipe>>) {
        *self.pipes.write() = pipes;
    }

    /// Close the recovery side of the commit channel.
    pub fn close(&self) {
        self.recovery.close();
    }

    fn pipe(&self, kind: ConsensusMessageType) -> Result<Arc<dyn Pipe>, NetworkError> {
        self.pipes
            .read()
            .get(&kind)
            .cloned()
            .ok_or(NetworkError::Closed)
    }
}

#[async_trait]
impl EngineStack for OrderAdaptor {
    async fn execute(&self, batch: ExecutedBatch) {
        let seq_no = batch.seq_no;
        if self.ready_tx.send(batch).await.is_err() {
            warn!(height = seq_no, "Executed batch dropped, node stopping");
        }
    }

    fn state_update(&self, target: RecoveryTarget) {
        let peers = self.epoch.current().validator_peers(&self.node.p2p_node_id);
        let recovery = self.recovery.clone();
        let events = self.events.clone();
        let shutdown = self.shutdown.clone();

        info!(target = target.height, peers = peers.len(), "Receive state update request");
        recovery.begin(target);
        tokio::spawn(async move {
            events
                .publish(OrderEvent::StateUpdateStarted {
                    target_height: target.height,
                })
                .await;
            match recovery.run(target, &peers, shutdown).await {
                Ok(RecoveryOutcome::Replayed { from, to }) => {
                    debug!(from, to, "Waiting for recovered blocks to be applied");
                }
                Ok(RecoveryOutcome::AlreadyApplied) => {
                    events
                        .publish(OrderEvent::StateUpdateFinished {
                            height: target.height,
                        })
                        .await;
                }
                Err(e) => error!(target = target.height, "State update aborted: {}", e),
            }
        });
    }

    async fn broadcast(&self, msg: ConsensusMessage) -> Result<(), NetworkError> {
        let pipe = self.pipe(msg.kind)?;
        let peers = self.epoch.current().validator_peers(&self.node.p2p_node_id);
        let data = msg
            .encode()
            .map_err(|e| NetworkError::Encode(e.to_string()))?;
        pipe.broadcast(&peers, data).await
    }

    async fn unicast(&self, msg: ConsensusMessage, to: u64) -> Result<(), NetworkError> {
        let epoch = self.epoch.current();
        let peer = epoch
            .validator_set
            .iter()
            .chain(epoch.candidate_set.iter())
            .find(|node| node.id == to)
            .map(|node| node.p2p_node_id.clone())
            .ok_or_else(|| NetworkError::PeerUnreachable(to.to_string()))?;

        let pipe = self.pipe(msg.kind)?;
        let data = msg
            .encode()
            .map_err(|e| NetworkError::Encode(e.to_string()))?;
        pipe.send(&peer, data).await
    }
}

// =============================================================================
// PORT BRIDGES
// =============================================================================

/// Block downloads over the node's network.
pub struct NetworkBlockFetcher(pub Arc<dyn Network>);

#[async_trait]
impl BlockFetcher for NetworkBlockFetcher {
    async fn fetch_block(&self, peer: &str, height: u64) -> Result<Block, FetchError> {
        self.0
            .request_block(peer, height)
            .await
            .map_err(|e| match e {
                NetworkError::BlockNotFound { peer, height } => FetchError::NotFound { peer, height },
                other => FetchError::Unreachable {
                    peer: peer.to_string(),
                    reason: other.to_string(),
                },
            })
    }
}

/// Chain reads and balances from the node's ledger.
pub struct LedgerBridge(pub Arc<dyn Ledger>);

impl ChainReader for LedgerBridge {
    fn chain_meta(&self) -> ChainMeta {
        self.0.chain_meta()
    }

    fn block_by_height(&self, height: u64) -> Option<Block> {
        self.0.block_by_height(height).ok()
    }
}

impl BalanceProvider for LedgerBridge {
    fn balance(&self, address: &Address) -> U256 {
        self.0.account_balance(address)
    }
}
