//! # oc-04-order-node
//!
//! The order node: transaction admission and consensus orchestration.
//!
//! ## Architecture
//!
//! ```text
//!                     ┌──────────────────────── OrderNode ────────────────────────┐
//!  API ── prepare ──▶ │ PreCheck ──▶ admission ──▶ ConsensusEngine (solo, ...)    │
//!  peers ─ push_txs ▶ │    ▲                            │ EngineStack              │
//!                     │    └── rate limiter             ▼                          │
//!  peers ─ consensus ▶│ pipe listeners ──▶ step    OrderAdaptor ──▶ StateRecovery │
//!                     │                                 │                 │        │
//!                     │              executed-block listener ──▶ commit ◀─┘        │
//!                     └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! | Step | `start()` |
//! |------|-----------|
//! | 1 | Fetch the current epoch |
//! | 2 | Report the applied chain head to the engine |
//! | 3 | Open one pipe per consensus message type, plus `push_txs` |
//! | 4 | Wait until a quorum of validators is reachable (1s retries) |
//! | 5 | Start pre-check and the broadcast cache, spawn listeners, start the engine |
//!
//! `stop()` is idempotent; every listener observes the same shutdown signal.
//!
//! ## Executed State
//!
//! `report_state(height, ..)` is ignored while a recovery episode targets a
//! different height. At the last block of an epoch the epoch info is
//! refreshed (failure stops the node), every `checkpoint_period` heights a
//! stable checkpoint is reported, and the report then goes to the engine
//! as either executed or state-updated.

pub mod adaptor;
pub mod config;
pub mod domain;
pub mod engine;
pub mod ports;
pub mod service;

// Re-export main types
pub use adaptor::{LedgerBridge, NetworkBlockFetcher, OrderAdaptor};
pub use config::{
    LimitSection, OrderConfig, PreCheckSection, SoloSection, TxCacheSection, DEFAULT_ORDER_TYPE,
};
pub use domain::{
    ConfigError, ConsensusMessage, ConsensusMessageType, EngineError, EpochError, EpochState,
    ExecutedBatch, LedgerError, Lifecycle, NetworkError, NodeStatus, OrderError, PipeMsg,
    ServiceState, StableCheckpoint, PUSH_TXS_PIPE,
};
pub use engine::{EngineContext, EngineFactory, EngineRegistry, SoloEngine, SOLO};
pub use ports::{ConsensusEngine, EngineStack, EpochProvider, Ledger, Network, Pipe};
pub use service::{OrderDeps, OrderNode};
