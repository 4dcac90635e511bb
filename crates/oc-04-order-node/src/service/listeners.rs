//! Long-running loops spawned by [`super::OrderNode::start`]. Every loop
//! exits on shutdown or when its input closes.

use crate::domain::{ConsensusMessage, ConsensusMessageType, EpochState, ExecutedBatch};
use crate::ports::{ConsensusEngine, Pipe};
use oc_01_precheck::{TxPreCheckMgr, UncheckedTxEvent, ValidTxs};
use oc_02_tx_cache::{Batch, TxCacheHandle};
use shared_bus::{EventPublisher, InMemoryEventBus, OrderEvent, ShutdownSignal};
use shared_types::{
    decode_transactions, encode_transactions, Block, CommitEvent, RateLimiter, ZERO_HASH,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Pre-checked transactions to the engine, then answer local submitters.
pub(crate) async fn admission(
    mut valid: mpsc::Receiver<ValidTxs>,
    engine: Arc<dyn ConsensusEngine>,
    replicate: TxCacheHandle,
    events: Arc<InMemoryEventBus>,
    mut shutdown: ShutdownSignal,
) {
    loop {
        let batch = tokio::select! {
            _ = shutdown.recv() => break,
            next = valid.recv() => match next {
                Some(batch) => batch,
                None => break,
            },
        };
        let ValidTxs {
            local,
            transactions,
            responder,
        } = batch;
        if transactions.is_empty() {
            continue;
        }

        if let Err(e) = engine.propose(transactions.clone(), local).await {
            warn!(error = %e, local, "Propose tx failed");
            if let Some(responder) = responder {
                responder.reject(e.to_string());
            }
            continue;
        }

        if local {
            for tx in &transactions {
                if let Err(e) = replicate.submit(tx.clone()).await {
                    debug!(error = %e, "Local tx not queued for broadcast");
                }
            }
        }
        events
            .publish(OrderEvent::TransactionsAccepted {
                local,
                transactions,
            })
            .await;
        if let Some(responder) = responder {
            responder.accept();
        }
    }
    info!("----- Exit listen valid txs -----");
}

/// Peer consensus messages on one pipe to the engine.
pub(crate) async fn consensus_messages(
    kind: ConsensusMessageType,
    pipe: Arc<dyn Pipe>,
    engine: Arc<dyn ConsensusEngine>,
    mut shutdown: ShutdownSignal,
) {
    loop {
        let frame = tokio::select! {
            _ = shutdown.recv() => break,
            frame = pipe.receive() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };

        let msg = match ConsensusMessage::decode(&frame.data) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(from = %frame.from, error = %e, "Unmarshal order message failed");
                continue;
            }
        };
        if msg.kind != kind {
            warn!(from = %frame.from, expected = ?kind, got = ?msg.kind, "Consensus message on wrong pipe");
            continue;
        }
        if let Err(e) = engine.step(msg).await {
            warn!(error = %e, "Process order message failed");
        }
    }
    debug!(pipe = kind.pipe_id(), "Consensus listener stopped");
}

/// Replicated transaction batches from peers into pre-check.
pub(crate) async fn replicated_transactions(
    pipe: Arc<dyn Pipe>,
    limiter: Option<Arc<RateLimiter>>,
    precheck: Arc<TxPreCheckMgr>,
    mut shutdown: ShutdownSignal,
) {
    loop {
        let frame = tokio::select! {
            _ = shutdown.recv() => break,
            frame = pipe.receive() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };

        if let Some(limiter) = &limiter {
            if !limiter.allow() {
                warn!("Node received too many PUSH_TXS messages. Rate limiting in effect");
                continue;
            }
        }

        let transactions = match decode_transactions(&frame.data) {
            Ok(txs) => txs,
            Err(e) => {
                warn!(from = %frame.from, error = %e, "Unmarshal txs message failed");
                continue;
            }
        };
        if precheck
            .post_unchecked_event(UncheckedTxEvent::Remote(transactions))
            .await
            .is_err()
        {
            break;
        }
    }
    debug!("Replicated tx listener stopped");
}

/// Engine-ordered batches to blocks on the commit channel.
pub(crate) async fn executed_blocks(
    mut ready: mpsc::Receiver<ExecutedBatch>,
    commits: mpsc::Sender<CommitEvent>,
    mut shutdown: ShutdownSignal,
) {
    loop {
        let executed = tokio::select! {
            _ = shutdown.recv() => break,
            next = ready.recv() => match next {
                Some(executed) => executed,
                None => break,
            },
        };

        let block = Block::new(
            executed.seq_no,
            ZERO_HASH,
            executed.timestamp,
            executed.proposer_account,
            executed.transactions,
        );
        let event = CommitEvent {
            block,
            local_list: executed.local_list,
        };
        if commits.send(event).await.is_err() {
            warn!("Commit channel closed");
            break;
        }
    }
    info!("----- Exit listen executed block -----");
}

/// Sealed batches of local transactions to every other validator and
/// candidate.
pub(crate) async fn batch_broadcast(
    mut batches: mpsc::Receiver<Batch>,
    pipe: Arc<dyn Pipe>,
    epoch: Arc<EpochState>,
    self_p2p_id: String,
    mut shutdown: ShutdownSignal,
) {
    loop {
        let batch = tokio::select! {
            _ = shutdown.recv() => break,
            next = batches.recv() => match next {
                Some(batch) => batch,
                None => break,
            },
        };

        let peers = epoch.current().broadcast_peers(&self_p2p_id);
        if peers.is_empty() {
            continue;
        }
        let data = match encode_transactions(batch.transactions()) {
            Ok(data) => data,
            Err(e) => {
                error!("failed to encode mempool txs: {}", e);
                continue;
            }
        };
        if let Err(e) = pipe.broadcast(&peers, data).await {
            error!("failed to broadcast mempool txs: {}", e);
        }
    }
    debug!("Batch broadcast listener stopped");
}
