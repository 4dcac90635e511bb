//! Error types for the order node and its ports.

use super::NodeStatus;
use oc_01_precheck::PreCheckError;
use shared_types::CodecError;
use thiserror::Error;

/// Errors surfaced by [`crate::OrderNode`].
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("unsupported order type: {0}")]
    UnsupportedOrderType(String),

    /// Submissions are refused unless the engine reports `Normal`.
    #[error("{0}")]
    NotReady(NodeStatus),

    #[error("transaction cache are full, we will drop this transaction")]
    CacheFull,

    /// A local submission was answered with a rejection.
    #[error("{0}")]
    Rejected(String),

    #[error("order node already started")]
    AlreadyStarted,

    #[error("order node stopped")]
    Stopped,

    #[error("quorum unreachable: {connected} of {quorum} validators connected")]
    QuorumUnreachable { connected: u64, quorum: u64 },

    #[error("commit stream already taken")]
    CommitStreamTaken,

    #[error("refresh epoch info failed: {0}")]
    EpochRefresh(EpochError),

    #[error(transparent)]
    Epoch(#[from] EpochError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    PreCheck(#[from] PreCheckError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failures reported by a consensus engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("mempool is full")]
    PoolFull,

    #[error("consensus engine not started")]
    NotStarted,

    #[error("consensus engine already started")]
    AlreadyStarted,

    #[error("consensus engine stopped")]
    Stopped,

    #[error("invalid consensus message: {0}")]
    InvalidMessage(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("pipe {0} already exists")]
    PipeExists(String),

    #[error("peer {0} unreachable")]
    PeerUnreachable(String),

    #[error("block {height} not found on {peer}")]
    BlockNotFound { peer: String, height: u64 },

    #[error("network closed")]
    Closed,

    #[error("encode message failed: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("block {0} not found")]
    BlockNotFound(u64),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EpochError {
    #[error("epoch {0} not found")]
    NotFound(u64),

    #[error("epoch service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("order_type must not be empty")]
    EmptyOrderType,

    #[error("{0} must be greater than zero")]
    ZeroCapacity(&'static str),

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("rate limiter enabled with limit {limit} and burst {burst}")]
    InvalidRateLimit { limit: u64, burst: u64 },
}
