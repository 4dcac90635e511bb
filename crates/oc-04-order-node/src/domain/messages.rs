//! Messages exchanged between the node, its engine and its peers.

use serde::{Deserialize, Serialize};
use shared_types::{decode, encode, CodecError, Hash, Transaction};

/// Pipe carrying replicated raw transaction batches.
pub const PUSH_TXS_PIPE: &str = "push_txs";

/// Consensus message kinds. Each kind travels on its own pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsensusMessageType {
    NullRequest,
    PrePrepare,
    Prepare,
    Commit,
    Checkpoint,
    ViewChange,
    NewView,
    FetchMissingRequest,
    SyncState,
    EpochChange,
}

impl ConsensusMessageType {
    pub const ALL: [Self; 10] = [
        Self::NullRequest,
        Self::PrePrepare,
        Self::Prepare,
        Self::Commit,
        Self::Checkpoint,
        Self::ViewChange,
        Self::NewView,
        Self::FetchMissingRequest,
        Self::SyncState,
        Self::EpochChange,
    ];

    pub fn pipe_id(self) -> &'static str {
        match self {
            Self::NullRequest => "order_null_request",
            Self::PrePrepare => "order_pre_prepare",
            Self::Prepare => "order_prepare",
            Self::Commit => "order_commit",
            Self::Checkpoint => "order_checkpoint",
            Self::ViewChange => "order_view_change",
            Self::NewView => "order_new_view",
            Self::FetchMissingRequest => "order_fetch_missing_request",
            Self::SyncState => "order_sync_state",
            Self::EpochChange => "order_epoch_change",
        }
    }
}

/// Engine-level message. The payload is opaque to the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusMessage {
    pub kind: ConsensusMessageType,
    pub epoch: u64,
    /// Sender's node id.
    pub from: u64,
    pub payload: Vec<u8>,
}

impl ConsensusMessage {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        decode(bytes)
    }
}

/// Raw frame received from a pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeMsg {
    /// Sender's p2p id.
    pub from: String,
    pub data: Vec<u8>,
}

/// A batch the engine has ordered and wants executed as `seq_no`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedBatch {
    pub transactions: Vec<Transaction>,
    pub local_list: Vec<bool>,
    pub seq_no: u64,
    /// Nanoseconds since the Unix epoch.
    pub timestamp: i64,
    pub proposer_account: String,
}

/// Applied chain state reported back to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceState {
    pub height: u64,
    pub digest: Hash,
    pub epoch: u64,
    /// Transactions included at `height`.
    pub tx_hashes: Vec<Hash>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StableCheckpoint {
    pub height: u64,
    pub digest: Hash,
    pub epoch: u64,
}
