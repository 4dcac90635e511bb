//! # Order Node
//!
//! Owns the pre-check pipeline, the broadcast cache, the recovery tracker
//! and the consensus engine, and runs the listeners connecting them.
//!
//! ```text
//!  prepare / push_txs ──▶ [PreCheck] ──▶ admission ──▶ engine.propose
//!                                            │
//!                                            └─▶ [TxCache] ──▶ broadcast to peers
//!  consensus pipes ──────────────────────────────────────▶ engine.step
//!  engine.execute ──▶ executed-block listener ──▶ [commit channel]
//!  engine.state_update ──▶ StateRecovery ──────▶ [commit channel]
//! ```

mod listeners;

use crate::adaptor::{LedgerBridge, NetworkBlockFetcher, OrderAdaptor};
use crate::config::OrderConfig;
use crate::domain::{
    ConsensusMessage, ConsensusMessageType, EpochState, ExecutedBatch, Lifecycle, NodeStatus,
    OrderError, ServiceState, StableCheckpoint, PUSH_TXS_PIPE,
};
use crate::engine::{EngineContext, EngineRegistry};
use crate::ports::{ConsensusEngine, EpochProvider, Ledger, Network, Pipe};
use oc_01_precheck::{response_channel, TxPreCheckMgr, TxWithResponse, UncheckedTxEvent};
use oc_02_tx_cache::{Batch, TxCache, TxCacheHandle};
use oc_03_state_recovery::{RecoveryConfig, RecoveryTracker, StateRecovery};
use parking_lot::Mutex;
use shared_bus::{
    shutdown_channel, EventFilter, EventPublisher, EventTopic, InMemoryEventBus, OrderEvent,
    ShutdownTrigger, Subscription,
};
use shared_types::{
    hash_hex, Address, CommitEvent, EpochInfo, Hash, NodeInfo, RateLimiter, Transaction,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// External collaborators of an order node.
pub struct OrderDeps {
    pub node: NodeInfo,
    pub network: Arc<dyn Network>,
    pub ledger: Arc<dyn Ledger>,
    pub epochs: Arc<dyn EpochProvider>,
}

/// Queues created in `new` and consumed by `start`.
struct StartParts {
    cache: TxCache,
    batches: mpsc::Receiver<Batch>,
    ready: mpsc::Receiver<ExecutedBatch>,
    commits: mpsc::Sender<CommitEvent>,
}

pub struct OrderNode {
    config: OrderConfig,
    node: NodeInfo,
    network: Arc<dyn Network>,
    ledger: Arc<dyn Ledger>,
    epochs: Arc<dyn EpochProvider>,
    epoch: Arc<EpochState>,
    engine: Arc<dyn ConsensusEngine>,
    adaptor: Arc<OrderAdaptor>,
    precheck: Arc<TxPreCheckMgr>,
    tracker: Arc<RecoveryTracker>,
    events: Arc<InMemoryEventBus>,
    limiter: Option<Arc<RateLimiter>>,
    replicate: TxCacheHandle,
    start_parts: Mutex<Option<StartParts>>,
    commit_rx: Mutex<Option<mpsc::Receiver<CommitEvent>>>,
    lifecycle: Mutex<Lifecycle>,
    trigger: ShutdownTrigger,
}

impl OrderNode {
    /// Wire a node around the engine registered as `config.order_type`.
    pub fn new(
        config: OrderConfig,
        deps: OrderDeps,
        registry: &EngineRegistry,
    ) -> Result<Self, OrderError> {
        config.validate()?;
        let OrderDeps {
            node,
            network,
            ledger,
            epochs,
        } = deps;

        let epoch = Arc::new(EpochState::new(epochs.current_epoch_info()?));
        let (trigger, _) = shutdown_channel();
        let (commit_tx, commit_rx) = mpsc::channel(config.commit_channel_capacity);
        let (ready_tx, ready_rx) = mpsc::channel(config.ready_channel_capacity);
        let events = Arc::new(InMemoryEventBus::new());

        let tracker = Arc::new(RecoveryTracker::new());
        let recovery = Arc::new(StateRecovery::new(
            RecoveryConfig {
                retry_interval: config.recovery_retry_interval(),
            },
            Arc::new(NetworkBlockFetcher(network.clone())),
            Arc::new(LedgerBridge(ledger.clone())),
            commit_tx.clone(),
            tracker.clone(),
        ));
        let adaptor = Arc::new(OrderAdaptor::new(
            node.clone(),
            epoch.clone(),
            ready_tx,
            recovery,
            events.clone(),
            trigger.signal(),
        ));

        let engine = registry.build(
            &config.order_type,
            EngineContext {
                config: config.clone(),
                node: node.clone(),
                epoch: epoch.current(),
                applied: ledger.chain_meta(),
                stack: adaptor.clone(),
                ledger: ledger.clone(),
            },
        )?;

        let precheck = Arc::new(TxPreCheckMgr::new(
            config.precheck.to_precheck_config(),
            Arc::new(LedgerBridge(ledger.clone())),
        ));
        let (cache, replicate, batches) = TxCache::new(config.tx_cache.to_cache_config());
        let limiter = config
            .limit
            .enable
            .then(|| Arc::new(RateLimiter::new(config.limit.limit, config.limit.burst)));

        info!(
            order_type = %config.order_type,
            node_id = node.id,
            epoch = epoch.current().epoch,
            "Order node created"
        );

        Ok(Self {
            config,
            node,
            network,
            ledger,
            epochs,
            epoch,
            engine,
            adaptor,
            precheck,
            tracker,
            events,
            limiter,
            replicate,
            start_parts: Mutex::new(Some(StartParts {
                cache,
                batches,
                ready: ready_rx,
                commits: commit_tx,
            })),
            commit_rx: Mutex::new(Some(commit_rx)),
            lifecycle: Mutex::new(Lifecycle::Initializing),
            trigger,
        })
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    pub async fn start(&self) -> Result<(), OrderError> {
        let parts = self
            .start_parts
            .lock()
            .take()
            .ok_or(OrderError::AlreadyStarted)?;

        let epoch = self.epoch_refresh()?;
        let applied = self.ledger.chain_meta();
        self.engine
            .report_executed(ServiceState {
                height: applied.height,
                digest: applied.block_hash,
                epoch: epoch.epoch,
                tx_hashes: vec![],
            })
            .await;

        let mut consensus_pipes: HashMap<ConsensusMessageType, Arc<dyn Pipe>> = HashMap::new();
        for kind in ConsensusMessageType::ALL {
            consensus_pipes.insert(kind, self.network.create_pipe(kind.pipe_id())?);
        }
        let tx_pipe = self.network.create_pipe(PUSH_TXS_PIPE)?;
        self.adaptor.set_pipes(consensus_pipes.clone());

        self.wait_for_quorum().await?;

        self.precheck.start(self.trigger.signal())?;
        let valid = self.precheck.valid_tx_stream()?;
        parts.cache.spawn(self.trigger.signal());

        tokio::spawn(listeners::admission(
            valid,
            self.engine.clone(),
            self.replicate.clone(),
            self.events.clone(),
            self.trigger.signal(),
        ));
        for (kind, pipe) in consensus_pipes {
            tokio::spawn(listeners::consensus_messages(
                kind,
                pipe,
                self.engine.clone(),
                self.trigger.signal(),
            ));
        }
        tokio::spawn(listeners::replicated_transactions(
            tx_pipe.clone(),
            self.limiter.clone(),
            self.precheck.clone(),
            self.trigger.signal(),
        ));
        tokio::spawn(listeners::executed_blocks(
            parts.ready,
            parts.commits,
            self.trigger.signal(),
        ));
        tokio::spawn(listeners::batch_broadcast(
            parts.batches,
            tx_pipe,
            self.epoch.clone(),
            self.node.p2p_node_id.clone(),
            self.trigger.signal(),
        ));

        self.engine.start().await?;
        *self.lifecycle.lock() = Lifecycle::Running;
        info!("=====Order started=========");
        Ok(())
    }

    /// Stop every listener, the pipeline and the engine. The commit stream
    /// ends once the executed-block listener exits. Later calls do nothing.
    pub async fn stop(&self) {
        if !self.trigger.trigger() {
            debug!("Order node already stopped");
            return;
        }
        *self.lifecycle.lock() = Lifecycle::Stopped;
        self.start_parts.lock().take();
        self.adaptor.close();
        self.engine.stop().await;
        info!("Order stopped");
    }

    async fn wait_for_quorum(&self) -> Result<(), OrderError> {
        let mut shutdown = self.trigger.signal();
        let interval = self.config.quorum_check_interval();
        loop {
            match self.check_quorum() {
                Ok(()) => return Ok(()),
                Err(e) => warn!("{}, retry in {:?}", e, interval),
            }
            tokio::select! {
                _ = shutdown.recv() => return Err(OrderError::Stopped),
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// Counts this node plus every connected validator.
    fn check_quorum(&self) -> Result<(), OrderError> {
        let epoch = self.epoch.current();
        let connected = self.network.connected_peers();
        let reachable = epoch
            .validator_set
            .iter()
            .filter(|v| v.p2p_node_id == self.node.p2p_node_id || connected.contains(&v.p2p_node_id))
            .count() as u64;
        let quorum = epoch.quorum();
        if reachable >= quorum {
            Ok(())
        } else {
            Err(OrderError::QuorumUnreachable {
                connected: reachable,
                quorum,
            })
        }
    }

    fn epoch_refresh(&self) -> Result<Arc<EpochInfo>, OrderError> {
        let info = self.epochs.current_epoch_info()?;
        self.epoch.replace(info);
        Ok(self.epoch.current())
    }

    // =========================================================================
    // SUBMISSION
    // =========================================================================

    /// Submit a transaction from this node's API and wait for the verdict.
    pub async fn prepare(&self, tx: Transaction) -> Result<(), OrderError> {
        match *self.lifecycle.lock() {
            Lifecycle::Running => {}
            Lifecycle::Stopped => return Err(OrderError::Stopped),
            Lifecycle::Initializing => return Err(OrderError::NotReady(NodeStatus::Pending)),
        }
        self.ready()?;
        if self.precheck.is_full() && self.engine.status() == NodeStatus::PoolFull {
            return Err(OrderError::CacheFull);
        }

        let (responder, response) = response_channel();
        self.precheck
            .post_unchecked_event(UncheckedTxEvent::Local(TxWithResponse { tx, responder }))
            .await?;

        match response.wait().await {
            Some(result) if result.accepted => Ok(()),
            Some(result) => Err(OrderError::Rejected(result.error_message)),
            None => Err(OrderError::Stopped),
        }
    }

    /// Queue transactions replicated by a peer. They are proposed without
    /// any caller waiting on the outcome.
    pub async fn submit_remote_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<(), OrderError> {
        self.precheck
            .post_unchecked_event(UncheckedTxEvent::Remote(transactions))
            .await?;
        Ok(())
    }

    /// Decode a peer's consensus message and hand it to the engine.
    pub async fn step(&self, data: &[u8]) -> Result<(), OrderError> {
        let msg = ConsensusMessage::decode(data)?;
        self.engine.step(msg).await?;
        Ok(())
    }

    // =========================================================================
    // EXECUTION FEEDBACK
    // =========================================================================

    /// Blocks ready for execution, in height order. Can be taken once.
    pub fn commit_stream(&self) -> Result<mpsc::Receiver<CommitEvent>, OrderError> {
        self.commit_rx
            .lock()
            .take()
            .ok_or(OrderError::CommitStreamTaken)
    }

    /// The executor applied `height`.
    pub async fn report_state(
        &self,
        height: u64,
        block_hash: Hash,
        tx_hashes: Vec<Hash>,
    ) -> Result<(), OrderError> {
        if self.tracker.is_stale_report(height) {
            debug!(height, "Ignore report state during state update");
            return Ok(());
        }

        let epoch = self.epoch.current();
        if epoch.is_epoch_end(height) {
            match self.epochs.current_epoch_info() {
                Ok(next) => {
                    info!(height, from = epoch.epoch, to = next.epoch, "Epoch changed");
                    let number = next.epoch;
                    self.epoch.replace(next);
                    self.events.publish(OrderEvent::EpochChanged { epoch: number }).await;
                }
                Err(e) => {
                    error!(height, error = %e, "Refresh epoch info failed, stopping node");
                    self.stop().await;
                    return Err(OrderError::EpochRefresh(e));
                }
            }
        }

        let checkpoint_period = epoch.consensus_params.checkpoint_period;
        let current_epoch = self.epoch.current().epoch;
        let state = ServiceState {
            height,
            digest: block_hash,
            epoch: current_epoch,
            tx_hashes,
        };
        if self.tracker.complete(height).is_some() {
            info!(height, "State update finished");
            self.engine.report_state_updated(state).await;
            self.events
                .publish(OrderEvent::StateUpdateFinished { height })
                .await;
        } else {
            if checkpoint_period > 0 && height % checkpoint_period == 0 {
                info!(height, hash = %hash_hex(&block_hash), "Report checkpoint");
                self.engine
                    .report_stable_checkpoint(StableCheckpoint {
                        height,
                        digest: block_hash,
                        epoch: current_epoch,
                    })
                    .await;
            }
            self.engine.report_executed(state).await;
            self.events
                .publish(OrderEvent::BlockExecuted {
                    height,
                    block_hash,
                })
                .await;
        }
        Ok(())
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Error carrying the engine's human-readable status unless `Normal`.
    pub fn ready(&self) -> Result<(), OrderError> {
        let status = self.engine.status();
        if status.is_normal() {
            Ok(())
        } else {
            Err(OrderError::NotReady(status))
        }
    }

    pub fn status(&self) -> NodeStatus {
        self.engine.status()
    }

    /// Byzantine quorum of the current epoch's validators.
    pub fn quorum(&self) -> u64 {
        self.epoch.quorum()
    }

    pub fn current_epoch(&self) -> Arc<EpochInfo> {
        self.epoch.current()
    }

    pub fn pending_nonce(&self, account: &Address) -> u64 {
        self.engine.pending_nonce(account)
    }

    pub fn pending_transaction(&self, hash: &Hash) -> Option<Transaction> {
        self.engine.pending_transaction(hash)
    }

    /// Feed of transactions admitted to the engine.
    pub fn subscribe_accepted_transactions(&self) -> Subscription {
        self.events
            .subscribe(EventFilter::topics(vec![EventTopic::Transactions]))
    }

    /// Every event the node publishes.
    pub fn events(&self) -> &Arc<InMemoryEventBus> {
        &self.events
    }

    pub fn is_recovering(&self) -> bool {
        self.tracker.is_active()
    }
}
