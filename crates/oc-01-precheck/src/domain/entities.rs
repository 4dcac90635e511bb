//! Events flowing through the pre-check pipeline.

use shared_types::Transaction;
use tokio::sync::oneshot;
use tracing::debug;

/// Outcome reported to a local submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxResult {
    pub accepted: bool,
    pub error_message: String,
}

impl TxResult {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            error_message: String::new(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            accepted: false,
            error_message: message.into(),
        }
    }
}

/// Write half of a submitter's result cell.
///
/// Responding consumes the responder, so a result is written at most once.
/// Dropping it unanswered wakes the waiter with no result.
#[derive(Debug)]
pub struct TxResponder {
    tx: oneshot::Sender<TxResult>,
}

/// Read half of a submitter's result cell.
#[derive(Debug)]
pub struct TxResponse {
    rx: oneshot::Receiver<TxResult>,
}

/// Create a connected responder/response pair.
pub fn response_channel() -> (TxResponder, TxResponse) {
    let (tx, rx) = oneshot::channel();
    (TxResponder { tx }, TxResponse { rx })
}

impl TxResponder {
    pub fn respond(self, result: TxResult) {
        if self.tx.send(result).is_err() {
            debug!("Submitter stopped waiting for its result");
        }
    }

    pub fn accept(self) {
        self.respond(TxResult::accepted());
    }

    pub fn reject(self, message: impl Into<String>) {
        self.respond(TxResult::rejected(message));
    }
}

impl TxResponse {
    /// Wait for the result. `None` if the responder was dropped unanswered.
    pub async fn wait(self) -> Option<TxResult> {
        self.rx.await.ok()
    }
}

/// A locally submitted transaction and the cell its submitter waits on.
#[derive(Debug)]
pub struct TxWithResponse {
    pub tx: Transaction,
    pub responder: TxResponder,
}

/// Input to the pipeline.
#[derive(Debug)]
pub enum UncheckedTxEvent {
    /// One transaction from this node's API; the submitter awaits a result.
    Local(TxWithResponse),
    /// Transactions replicated by a peer; failures are only logged.
    Remote(Vec<Transaction>),
}

/// Output of the pipeline.
///
/// Local batches hold exactly one transaction and its responder. The
/// responder is left for whoever proposes the transaction to answer.
#[derive(Debug)]
pub struct ValidTxs {
    pub local: bool,
    pub transactions: Vec<Transaction>,
    pub responder: Option<TxResponder>,
}

impl ValidTxs {
    pub fn local(tx: Transaction, responder: TxResponder) -> Self {
        Self {
            local: true,
            transactions: vec![tx],
            responder: Some(responder),
        }
    }

    pub fn remote(transactions: Vec<Transaction>) -> Self {
        Self {
            local: false,
            transactions,
            responder: None,
        }
    }
}
