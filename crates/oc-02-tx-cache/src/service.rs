//! # Batching Cache
//!
//! Slices a continuous transaction stream into batches bounded by count
//! and by age. A single task owns the accumulator and the slice timer;
//! submissions, timer expiries and shutdown are all handled in that task.
//!
//! ```text
//! submit ──▶ [input, 10k] ──▶ ┌──────────────┐ ──▶ [batches] ──▶ consumer
//!                            │ accumulator  │
//! slice timer ─────────────▶ │ + TimerSet   │
//!                            └──────────────┘
//! ```

use crate::domain::{Batch, CacheError, SealReason, TimerEvents, TimerSet};
use shared_bus::ShutdownSignal;
use shared_types::Transaction;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub const DEFAULT_SET_SIZE: usize = 10;
pub const DEFAULT_SET_TIMEOUT: Duration = Duration::from_millis(100);
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;
/// Sealed batches buffered for a slow consumer.
const BATCH_QUEUE_CAPACITY: usize = 1_024;

const SLICE_TIMER: &str = "tx_slice";

/// Batching cache configuration. Zero values fall back to the defaults.
#[derive(Debug, Clone)]
pub struct TxCacheConfig {
    pub set_size: usize,
    pub set_timeout: Duration,
    /// Input queue capacity.
    pub capacity: usize,
}

impl Default for TxCacheConfig {
    fn default() -> Self {
        Self {
            set_size: DEFAULT_SET_SIZE,
            set_timeout: DEFAULT_SET_TIMEOUT,
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl TxCacheConfig {
    fn normalized(self) -> Self {
        Self {
            set_size: if self.set_size == 0 {
                DEFAULT_SET_SIZE
            } else {
                self.set_size
            },
            set_timeout: if self.set_timeout.is_zero() {
                DEFAULT_SET_TIMEOUT
            } else {
                self.set_timeout
            },
            capacity: if self.capacity == 0 {
                DEFAULT_CACHE_CAPACITY
            } else {
                self.capacity
            },
        }
    }
}

/// Submission side of the cache.
#[derive(Debug, Clone)]
pub struct TxCacheHandle {
    input: mpsc::Sender<Transaction>,
}

impl TxCacheHandle {
    /// Queue a transaction, waiting while the input queue is full.
    pub async fn submit(&self, tx: Transaction) -> Result<(), CacheError> {
        self.input.send(tx).await.map_err(|_| CacheError::Closed)
    }

    /// Queue a transaction without waiting.
    pub fn try_submit(&self, tx: Transaction) -> Result<(), CacheError> {
        self.input.try_send(tx).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => CacheError::Full,
            mpsc::error::TrySendError::Closed(_) => CacheError::Closed,
        })
    }

    /// True while the input queue is saturated.
    pub fn is_full(&self) -> bool {
        self.input.capacity() == 0
    }
}

/// The cache event loop. Create with [`TxCache::new`], then [`TxCache::spawn`].
pub struct TxCache {
    set_size: usize,
    input: mpsc::Receiver<Transaction>,
    output: mpsc::Sender<Batch>,
    timers: TimerSet,
    timer_events: TimerEvents,
    pending: Vec<Transaction>,
}

impl TxCache {
    pub fn new(config: TxCacheConfig) -> (Self, TxCacheHandle, mpsc::Receiver<Batch>) {
        let config = config.normalized();
        let (input_tx, input) = mpsc::channel(config.capacity);
        let (output, batches) = mpsc::channel(BATCH_QUEUE_CAPACITY);

        let (mut timers, timer_events) = TimerSet::new();
        timers.register(SLICE_TIMER, config.set_timeout);

        let cache = Self {
            set_size: config.set_size,
            input,
            output,
            timers,
            timer_events,
            pending: Vec::with_capacity(config.set_size),
        };
        (cache, TxCacheHandle { input: input_tx }, batches)
    }

    pub fn spawn(self, shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Run until shutdown or until every handle is dropped.
    ///
    /// Transactions still accumulating at exit are discarded.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) {
        info!(set_size = self.set_size, "Transaction cache started");

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                tx = self.input.recv() => match tx {
                    Some(tx) => self.append(tx).await,
                    None => break,
                },
                Some(fired) = self.timer_events.recv() => {
                    if self.timers.take_fired(&fired) {
                        self.seal(SealReason::Timeout).await;
                    }
                }
            }
        }

        self.timers.stop_all();
        debug!(discarded = self.pending.len(), "Transaction cache stopped");
    }

    async fn append(&mut self, tx: Transaction) {
        if self.pending.is_empty() {
            self.timers.start_timer(SLICE_TIMER);
        }
        self.pending.push(tx);

        if self.pending.len() >= self.set_size {
            self.timers.stop_timer(SLICE_TIMER);
            self.seal(SealReason::Full).await;
        }
    }

    async fn seal(&mut self, reason: SealReason) {
        if self.pending.is_empty() {
            return;
        }
        let transactions = std::mem::replace(&mut self.pending, Vec::with_capacity(self.set_size));
        let batch = Batch::seal(transactions, reason);
        debug!(size = batch.len(), ?reason, "Batch sealed");

        if self.output.send(batch).await.is_err() {
            debug!("Batch consumer gone, dropping batch");
        }
    }
}
