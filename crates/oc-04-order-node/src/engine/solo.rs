//! # Solo Engine
//!
//! Single-leader ordering for development and single-node deployments.
//! Every proposal is accepted into a bounded pending pool and batched
//! through a [`TxCache`]; each sealed batch is executed as the next
//! sequence number. With timed empty blocks enabled, a `no_tx_batch` timer
//! produces an empty block whenever no batch was sealed for a whole
//! timeout.
//!
//! Pending transactions leave the pool when the executor reports their
//! height. A full pool rejects proposals and reports `PoolFull` until
//! enough of them have been committed.

use super::registry::EngineContext;
use crate::domain::{
    ConsensusMessage, EngineError, ExecutedBatch, NodeStatus, ServiceState, StableCheckpoint,
};
use crate::ports::{ConsensusEngine, EngineStack, Ledger};
use async_trait::async_trait;
use oc_02_tx_cache::{Batch, TimerEvents, TimerSet, TxCache, TxCacheConfig, TxCacheHandle};
use parking_lot::Mutex;
use shared_bus::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
use shared_types::{hash_hex, Address, Hash, NodeInfo, Transaction};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const SOLO: &str = "solo";

const NO_TX_BATCH_TIMER: &str = "no_tx_batch";

// =============================================================================
// PENDING POOL
// =============================================================================

struct PendingTx {
    tx: Transaction,
    local: bool,
}

/// Proposed but not yet committed transactions.
struct PendingPool {
    capacity: usize,
    txs: HashMap<Hash, PendingTx>,
    /// Next nonce per sender, from the highest pending nonce.
    next_nonce: HashMap<Address, u64>,
    per_sender: HashMap<Address, usize>,
}

impl PendingPool {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            txs: HashMap::new(),
            next_nonce: HashMap::new(),
            per_sender: HashMap::new(),
        }
    }

    fn has_room(&self, incoming: usize) -> bool {
        self.txs.len() + incoming <= self.capacity
    }

    fn is_full(&self) -> bool {
        self.txs.len() >= self.capacity
    }

    fn len(&self) -> usize {
        self.txs.len()
    }

    fn insert(&mut self, tx: Transaction, local: bool) {
        let hash = tx.hash();
        if self.txs.contains_key(&hash) {
            return;
        }
        let next = self.next_nonce.entry(tx.from).or_insert(0);
        *next = (*next).max(tx.nonce + 1);
        *self.per_sender.entry(tx.from).or_insert(0) += 1;
        self.txs.insert(hash, PendingTx { tx, local });
    }

    fn remove(&mut self, hashes: &[Hash]) -> usize {
        let mut removed = 0;
        for hash in hashes {
            let Some(entry) = self.txs.remove(hash) else {
                continue;
            };
            removed += 1;
            let sender = entry.tx.from;
            if let Some(count) = self.per_sender.get_mut(&sender) {
                *count -= 1;
                if *count == 0 {
                    self.per_sender.remove(&sender);
                    self.next_nonce.remove(&sender);
                }
            }
        }
        removed
    }

    fn is_local(&self, hash: &Hash) -> bool {
        self.txs.get(hash).is_some_and(|entry| entry.local)
    }

    fn get(&self, hash: &Hash) -> Option<Transaction> {
        self.txs.get(hash).map(|entry| entry.tx.clone())
    }

    fn next_nonce(&self, account: &Address) -> Option<u64> {
        self.next_nonce.get(account).copied()
    }
}

// =============================================================================
// ENGINE
// =============================================================================

struct SoloCore {
    node: NodeInfo,
    stack: Arc<dyn EngineStack>,
    ledger: Arc<dyn Ledger>,
    pool: Mutex<PendingPool>,
    pool_full: AtomicBool,
    status: Mutex<NodeStatus>,
    last_exec: AtomicU64,
}

/// Owned by the batch loop once the engine starts.
struct SoloWorker {
    cache: TxCache,
    batches: mpsc::Receiver<Batch>,
    timers: TimerSet,
    timer_events: TimerEvents,
    timed: bool,
}

pub struct SoloEngine {
    core: Arc<SoloCore>,
    cache: TxCacheHandle,
    worker: Mutex<Option<SoloWorker>>,
    trigger: ShutdownTrigger,
}

impl SoloEngine {
    pub fn new(ctx: EngineContext) -> Result<Self, EngineError> {
        let params = &ctx.epoch.consensus_params;
        let batch_size = usize::try_from(params.block_max_tx_num).unwrap_or(usize::MAX);
        let timed = params.enable_timed_gen_empty_block;
        let no_tx_timeout = Duration::from_millis(params.no_tx_batch_timeout_ms);

        let (cache, handle, batches) = TxCache::new(TxCacheConfig {
            set_size: batch_size,
            set_timeout: ctx.config.solo.batch_timeout(),
            capacity: ctx.config.tx_cache.capacity,
        });
        let (mut timers, timer_events) = TimerSet::new();
        timers.register(NO_TX_BATCH_TIMER, no_tx_timeout);

        info!("SOLO lastExec = {}", ctx.applied.height);
        info!("SOLO batch size = {}", batch_size);
        info!("SOLO batch timeout = {:?}", ctx.config.solo.batch_timeout());
        info!("SOLO pool size = {}", ctx.config.solo.pool_size);
        info!("SOLO enable timed gen empty block = {}", timed);

        let (trigger, _) = shutdown_channel();
        Ok(Self {
            core: Arc::new(SoloCore {
                node: ctx.node,
                stack: ctx.stack,
                ledger: ctx.ledger,
                pool: Mutex::new(PendingPool::new(ctx.config.solo.pool_size)),
                pool_full: AtomicBool::new(false),
                status: Mutex::new(NodeStatus::Pending),
                last_exec: AtomicU64::new(ctx.applied.height),
            }),
            cache: handle,
            worker: Mutex::new(Some(SoloWorker {
                cache,
                batches,
                timers,
                timer_events,
                timed,
            })),
            trigger,
        })
    }

    /// Height of the last batch handed to the executor.
    pub fn last_exec(&self) -> u64 {
        self.core.last_exec.load(Ordering::SeqCst)
    }

    pub fn pending_count(&self) -> usize {
        self.core.pool.lock().len()
    }
}

impl SoloCore {
    async fn execute(&self, transactions: Vec<Transaction>) {
        let seq_no = self.last_exec.fetch_add(1, Ordering::SeqCst) + 1;
        let local_list = {
            let pool = self.pool.lock();
            transactions
                .iter()
                .map(|tx| pool.is_local(&tx.hash()))
                .collect()
        };
        info!(height = seq_no, tx_count = transactions.len(), "======== Call execute");

        self.stack
            .execute(ExecutedBatch {
                transactions,
                local_list,
                seq_no,
                timestamp: unix_nanos(),
                proposer_account: self.node.account_address.clone(),
            })
            .await;
    }

    fn release(&self, state: &ServiceState) {
        self.last_exec.fetch_max(state.height, Ordering::SeqCst);

        let mut pool = self.pool.lock();
        let removed = pool.remove(&state.tx_hashes);
        if !pool.is_full() && self.pool_full.swap(false, Ordering::SeqCst) {
            info!(pending = pool.len(), "Pool no longer full");
        }
        debug!(height = state.height, removed, "Committed transactions released");
    }
}

impl SoloWorker {
    async fn run(self, core: Arc<SoloCore>, mut shutdown: ShutdownSignal) {
        let SoloWorker {
            cache,
            mut batches,
            mut timers,
            mut timer_events,
            timed,
        } = self;
        cache.spawn(shutdown.clone());
        if timed {
            timers.start_timer(NO_TX_BATCH_TIMER);
        }

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                batch = batches.recv() => match batch {
                    Some(batch) => {
                        timers.stop_timer(NO_TX_BATCH_TIMER);
                        debug!(size = batch.len(), reason = ?batch.sealed_by(), "Receive proposal from txcache");
                        core.execute(batch.into_transactions()).await;
                        if timed {
                            timers.start_timer(NO_TX_BATCH_TIMER);
                        }
                    }
                    None => break,
                },
                Some(fired) = timer_events.recv() => {
                    if timers.take_fired(&fired) {
                        debug!("Start create empty block");
                        core.execute(Vec::new()).await;
                        timers.start_timer(NO_TX_BATCH_TIMER);
                    }
                }
            }
        }

        timers.stop_all();
        info!("----- Exit solo batch loop -----");
    }
}

#[async_trait]
impl ConsensusEngine for SoloEngine {
    async fn start(&self) -> Result<(), EngineError> {
        let worker = self.worker.lock().take().ok_or(EngineError::AlreadyStarted)?;
        if self.trigger.is_triggered() {
            return Err(EngineError::Stopped);
        }

        tokio::spawn(worker.run(self.core.clone(), self.trigger.signal()));

        *self.core.status.lock() = NodeStatus::Normal;
        info!("Consensus started");
        Ok(())
    }

    async fn stop(&self) {
        if self.trigger.trigger() {
            *self.core.status.lock() = NodeStatus::Stopped;
            info!("Consensus stopped");
        }
    }

    async fn propose(
        &self,
        transactions: Vec<Transaction>,
        local: bool,
    ) -> Result<(), EngineError> {
        match *self.core.status.lock() {
            NodeStatus::Stopped => return Err(EngineError::Stopped),
            NodeStatus::Pending => return Err(EngineError::NotStarted),
            _ => {}
        }
        if transactions.is_empty() {
            return Ok(());
        }

        {
            let mut pool = self.core.pool.lock();
            if !pool.has_room(transactions.len()) {
                self.core.pool_full.store(true, Ordering::SeqCst);
                warn!(pending = pool.len(), "Mempool is full");
                return Err(EngineError::PoolFull);
            }
            for tx in &transactions {
                pool.insert(tx.clone(), local);
            }
            if pool.is_full() {
                self.core.pool_full.store(true, Ordering::SeqCst);
            }
        }

        for tx in transactions {
            self.cache.submit(tx).await.map_err(|_| EngineError::Stopped)?;
        }
        Ok(())
    }

    async fn step(&self, msg: ConsensusMessage) -> Result<(), EngineError> {
        debug!(kind = ?msg.kind, from = msg.from, "Solo ignores consensus messages");
        Ok(())
    }

    fn status(&self) -> NodeStatus {
        let status = *self.core.status.lock();
        if status == NodeStatus::Normal && self.core.pool_full.load(Ordering::SeqCst) {
            return NodeStatus::PoolFull;
        }
        status
    }

    async fn report_executed(&self, state: ServiceState) {
        self.core.release(&state);
    }

    async fn report_state_updated(&self, state: ServiceState) {
        info!(height = state.height, "State update finished");
        self.core.release(&state);
    }

    async fn report_stable_checkpoint(&self, checkpoint: StableCheckpoint) {
        info!(
            height = checkpoint.height,
            hash = %hash_hex(&checkpoint.digest),
            "Report checkpoint"
        );
    }

    fn pending_nonce(&self, account: &Address) -> u64 {
        let committed = self.core.ledger.account_nonce(account);
        match self.core.pool.lock().next_nonce(account) {
            Some(pending) => pending.max(committed),
            None => committed,
        }
    }

    fn pending_transaction(&self, hash: &Hash) -> Option<Transaction> {
        self.core.pool.lock().get(hash)
    }
}

fn unix_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
