//! Outbound (Driven) ports for the order node.

use crate::domain::{
    ConsensusMessage, EngineError, EpochError, ExecutedBatch, LedgerError, NetworkError,
    NodeStatus, PipeMsg, ServiceState, StableCheckpoint,
};
use async_trait::async_trait;
use oc_03_state_recovery::RecoveryTarget;
use shared_types::{Address, Block, ChainMeta, EpochInfo, Hash, Transaction, U256};
use std::sync::Arc;

// =============================================================================
// CONSENSUS ENGINE
// =============================================================================

/// A pluggable ordering algorithm. The node drives it; it calls back into
/// the node through [`EngineStack`].
#[async_trait]
pub trait ConsensusEngine: Send + Sync {
    async fn start(&self) -> Result<(), EngineError>;

    async fn stop(&self);

    /// Hand pre-checked transactions to the engine for ordering.
    async fn propose(&self, transactions: Vec<Transaction>, local: bool)
        -> Result<(), EngineError>;

    /// Deliver a message received from a peer.
    async fn step(&self, msg: ConsensusMessage) -> Result<(), EngineError>;

    fn status(&self) -> NodeStatus;

    async fn report_executed(&self, state: ServiceState);

    /// The recovery target height has been applied.
    async fn report_state_updated(&self, state: ServiceState);

    async fn report_stable_checkpoint(&self, checkpoint: StableCheckpoint);

    /// Next nonce for `account`, counting transactions still pending.
    fn pending_nonce(&self, account: &Address) -> u64;

    fn pending_transaction(&self, hash: &Hash) -> Option<Transaction>;
}

/// Callbacks an engine uses to reach the rest of the node.
#[async_trait]
pub trait EngineStack: Send + Sync {
    /// An ordered batch is ready for execution.
    async fn execute(&self, batch: ExecutedBatch);

    /// The local chain is behind; fetch and replay up to `target`.
    fn state_update(&self, target: RecoveryTarget);

    /// Send to every other validator.
    async fn broadcast(&self, msg: ConsensusMessage) -> Result<(), NetworkError>;

    /// Send to the node with id `to`.
    async fn unicast(&self, msg: ConsensusMessage, to: u64) -> Result<(), NetworkError>;
}

// =============================================================================
// NETWORK
// =============================================================================

#[async_trait]
pub trait Network: Send + Sync {
    fn create_pipe(&self, id: &str) -> Result<Arc<dyn Pipe>, NetworkError>;

    /// Point-to-point block download.
    async fn request_block(&self, peer: &str, height: u64) -> Result<Block, NetworkError>;

    /// P2P ids of currently connected peers.
    fn connected_peers(&self) -> Vec<String>;
}

/// A named message channel between peers.
#[async_trait]
pub trait Pipe: Send + Sync {
    async fn send(&self, to: &str, data: Vec<u8>) -> Result<(), NetworkError>;

    async fn broadcast(&self, to: &[String], data: Vec<u8>) -> Result<(), NetworkError>;

    /// Next inbound frame, or `None` once the pipe is closed.
    async fn receive(&self) -> Option<PipeMsg>;
}

// =============================================================================
// LEDGER AND EPOCHS
// =============================================================================

pub trait Ledger: Send + Sync {
    fn account_balance(&self, address: &Address) -> U256;

    fn account_nonce(&self, address: &Address) -> u64;

    fn chain_meta(&self) -> ChainMeta;

    fn block_by_height(&self, height: u64) -> Result<Block, LedgerError>;
}

pub trait EpochProvider: Send + Sync {
    fn current_epoch_info(&self) -> Result<EpochInfo, EpochError>;

    fn epoch_info(&self, epoch: u64) -> Result<EpochInfo, EpochError>;
}
