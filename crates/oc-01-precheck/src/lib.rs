//! # oc-01-precheck
//!
//! Concurrent transaction pre-check for the order core.
//!
//! ## Architecture
//!
//! Every transaction entering the node passes two stages before it may be
//! proposed to consensus:
//!
//! | Stage | Checks | Failure (local) | Failure (remote) |
//! |-------|--------|-----------------|------------------|
//! | Signature | signature recovers to `from` | result written, dropped | logged, filtered |
//! | Economic | fee caps, balance, intrinsic gas, init code | result written, dropped | logged, filtered |
//!
//! Local submissions carry a single-use responder. Failures answer it
//! inside the pipeline; a passing transaction leaves with the responder
//! still unanswered so the proposer can report the final outcome.
//!
//! Remote batches keep the relative order of their surviving
//! transactions and are emitted even when nothing survives.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use oc_01_precheck::{PreCheckConfig, TxPreCheckMgr, UncheckedTxEvent};
//!
//! let mgr = TxPreCheckMgr::new(PreCheckConfig::default(), balances);
//! mgr.start(shutdown_signal)?;
//! let mut valid = mgr.valid_tx_stream()?;
//! mgr.post_unchecked_event(UncheckedTxEvent::Remote(txs)).await?;
//! ```

pub mod domain;
pub mod pool;
pub mod ports;
pub mod service;

// Re-export main types
pub use domain::{
    intrinsic_gas, response_channel, verify_economics, PreCheckError, RuleViolation, TxResponder,
    TxResponse, TxResult, TxWithResponse, UncheckedTxEvent, ValidTxs,
};
pub use pool::{PoolClosed, WorkerPool};
pub use ports::BalanceProvider;
pub use service::{PreCheckConfig, TxPreCheckMgr, DEFAULT_QUEUE_CAPACITY};
