//! # Pre-Check Service
//!
//! Two dispatch stages connected by bounded queues:
//!
//! ```text
//! post_unchecked_event ──▶ [unchecked] ──▶ signature stage ──▶ [verified]
//!                                            (worker pool)          │
//!                                                                   ▼
//!            valid_tx_stream ◀── [valid] ◀── economic stage ◀───────┘
//!                                            (worker pool)
//! ```
//!
//! Each stage exits on shutdown or when its input closes, waits for its
//! in-flight workers, and only then closes its output queue. Events still
//! queued at shutdown are dropped; their submitters see no result.

use crate::domain::{
    verify_economics, PreCheckError, TxWithResponse, UncheckedTxEvent, ValidTxs,
};
use crate::pool::WorkerPool;
use crate::ports::BalanceProvider;
use parking_lot::Mutex;
use shared_bus::ShutdownSignal;
use shared_crypto::verify_transaction;
use shared_types::{hash_hex, Transaction, U256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Default capacity of every pipeline queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Pre-check configuration.
#[derive(Debug, Clone)]
pub struct PreCheckConfig {
    /// Workers per stage.
    pub concurrency: usize,
    pub queue_capacity: usize,
    /// Base fee dynamic-fee caps are checked against.
    pub base_fee: U256,
}

impl Default for PreCheckConfig {
    fn default() -> Self {
        Self {
            concurrency: num_cpus::get(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            base_fee: U256::zero(),
        }
    }
}

/// Signature-checked event on its way to the economic stage.
#[derive(Debug)]
enum VerifiedTxEvent {
    Local(TxWithResponse),
    Remote(Vec<Transaction>),
}

/// The two-stage transaction pre-check pipeline.
pub struct TxPreCheckMgr {
    config: PreCheckConfig,
    balances: Arc<dyn BalanceProvider>,
    unchecked_tx: mpsc::Sender<UncheckedTxEvent>,
    unchecked_rx: Mutex<Option<mpsc::Receiver<UncheckedTxEvent>>>,
    valid_tx: Mutex<Option<mpsc::Sender<ValidTxs>>>,
    valid_rx: Mutex<Option<mpsc::Receiver<ValidTxs>>>,
    started: AtomicBool,
}

impl TxPreCheckMgr {
    pub fn new(config: PreCheckConfig, balances: Arc<dyn BalanceProvider>) -> Self {
        let capacity = config.queue_capacity.max(1);
        let (unchecked_tx, unchecked_rx) = mpsc::channel(capacity);
        let (valid_tx, valid_rx) = mpsc::channel(capacity);

        Self {
            config,
            balances,
            unchecked_tx,
            unchecked_rx: Mutex::new(Some(unchecked_rx)),
            valid_tx: Mutex::new(Some(valid_tx)),
            valid_rx: Mutex::new(Some(valid_rx)),
            started: AtomicBool::new(false),
        }
    }

    /// Launch both stages. They run until `shutdown` fires.
    pub fn start(&self, shutdown: ShutdownSignal) -> Result<(), PreCheckError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(PreCheckError::AlreadyStarted);
        }
        let (Some(unchecked_rx), Some(valid_tx)) =
            (self.unchecked_rx.lock().take(), self.valid_tx.lock().take())
        else {
            return Err(PreCheckError::AlreadyStarted);
        };

        let (verified_tx, verified_rx) = mpsc::channel(self.config.queue_capacity.max(1));

        tokio::spawn(run_signature_stage(
            unchecked_rx,
            verified_tx,
            WorkerPool::new("signature", self.config.concurrency),
            shutdown.clone(),
        ));
        tokio::spawn(run_economic_stage(
            verified_rx,
            valid_tx,
            WorkerPool::new("economic", self.config.concurrency),
            self.balances.clone(),
            self.config.base_fee,
            shutdown,
        ));

        info!(
            concurrency = self.config.concurrency,
            queue_capacity = self.config.queue_capacity,
            "Pre-check pipeline started"
        );
        Ok(())
    }

    /// Enqueue an event, waiting while the input queue is full.
    pub async fn post_unchecked_event(&self, event: UncheckedTxEvent) -> Result<(), PreCheckError> {
        self.unchecked_tx
            .send(event)
            .await
            .map_err(|_| PreCheckError::Stopped)
    }

    /// True when the input queue has no free slot.
    pub fn is_full(&self) -> bool {
        self.unchecked_tx.capacity() == 0
    }

    /// Take the output queue. Closes after shutdown once in-flight work drains.
    pub fn valid_tx_stream(&self) -> Result<mpsc::Receiver<ValidTxs>, PreCheckError> {
        self.valid_rx.lock().take().ok_or(PreCheckError::StreamTaken)
    }
}

async fn run_signature_stage(
    mut input: mpsc::Receiver<UncheckedTxEvent>,
    output: mpsc::Sender<VerifiedTxEvent>,
    pool: WorkerPool,
    mut shutdown: ShutdownSignal,
) {
    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            event = input.recv() => {
                let Some(event) = event else { break };
                let output = output.clone();
                let shutdown = shutdown.clone();
                if pool.submit(check_signature(event, output, shutdown)).await.is_err() {
                    break;
                }
            }
        }
    }

    pool.stop_wait().await;
    debug!("Signature stage stopped");
}

async fn check_signature(
    event: UncheckedTxEvent,
    output: mpsc::Sender<VerifiedTxEvent>,
    mut shutdown: ShutdownSignal,
) {
    let verified = match event {
        UncheckedTxEvent::Local(TxWithResponse { tx, responder }) => {
            if let Err(e) = verify_transaction(&tx) {
                debug!(tx = %hash_hex(&tx.hash()), error = %e, "Local transaction signature rejected");
                responder.reject(PreCheckError::SignatureVerifyFailed.to_string());
                return;
            }
            VerifiedTxEvent::Local(TxWithResponse { tx, responder })
        }
        UncheckedTxEvent::Remote(txs) => {
            let received = txs.len();
            let valid: Vec<Transaction> = txs
                .into_iter()
                .filter(|tx| match verify_transaction(tx) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(tx = %hash_hex(&tx.hash()), error = %e, "Remote transaction signature rejected");
                        false
                    }
                })
                .collect();
            if valid.len() < received {
                debug!(received, kept = valid.len(), "Filtered remote transactions by signature");
            }
            VerifiedTxEvent::Remote(valid)
        }
    };

    forward(&output, verified, &mut shutdown).await;
}

async fn run_economic_stage(
    mut input: mpsc::Receiver<VerifiedTxEvent>,
    output: mpsc::Sender<ValidTxs>,
    pool: WorkerPool,
    balances: Arc<dyn BalanceProvider>,
    base_fee: U256,
    mut shutdown: ShutdownSignal,
) {
    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            event = input.recv() => {
                let Some(event) = event else { break };
                let job = check_economics(
                    event,
                    output.clone(),
                    balances.clone(),
                    base_fee,
                    shutdown.clone(),
                );
                if pool.submit(job).await.is_err() {
                    break;
                }
            }
        }
    }

    pool.stop_wait().await;
    debug!("Economic stage stopped");
}

async fn check_economics(
    event: VerifiedTxEvent,
    output: mpsc::Sender<ValidTxs>,
    balances: Arc<dyn BalanceProvider>,
    base_fee: U256,
    mut shutdown: ShutdownSignal,
) {
    let valid = match event {
        VerifiedTxEvent::Local(TxWithResponse { tx, responder }) => {
            let balance = balances.balance(&tx.from);
            if let Err(violation) = verify_economics(&tx, balance, base_fee) {
                debug!(tx = %hash_hex(&tx.hash()), error = %violation, "Local transaction rejected");
                responder.reject(violation.to_string());
                return;
            }
            ValidTxs::local(tx, responder)
        }
        VerifiedTxEvent::Remote(txs) => {
            let valid: Vec<Transaction> = txs
                .into_iter()
                .filter(|tx| {
                    let balance = balances.balance(&tx.from);
                    match verify_economics(tx, balance, base_fee) {
                        Ok(()) => true,
                        Err(violation) => {
                            warn!(tx = %hash_hex(&tx.hash()), error = %violation, "Remote transaction rejected");
                            false
                        }
                    }
                })
                .collect();
            ValidTxs::remote(valid)
        }
    };

    forward(&output, valid, &mut shutdown).await;
}

/// Send downstream unless shutdown wins first.
async fn forward<T>(output: &mpsc::Sender<T>, item: T, shutdown: &mut ShutdownSignal) {
    tokio::select! {
        biased;
        sent = output.send(item) => {
            if sent.is_err() {
                debug!("Downstream queue closed, dropping event");
            }
        }
        _ = shutdown.recv() => debug!("Shutdown while forwarding, dropping event"),
    }
}
