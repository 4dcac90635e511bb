//! # Epoch Membership
//!
//! An epoch fixes the validator set, the candidate set and the consensus
//! parameters for a contiguous range of block heights. Epoch info is
//! replaced wholesale at epoch boundaries, never mutated in place.

use serde::{Deserialize, Serialize};

/// Identity of a consensus participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: u64,
    /// Account address used as block proposer identity.
    pub account_address: String,
    /// Transport-level peer identifier.
    pub p2p_node_id: String,
}

/// Parameters the consensus engine reads from the current epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParams {
    /// Heights at which a stable checkpoint is reported.
    pub checkpoint_period: u64,
    /// Upper bound on transactions per block.
    pub block_max_tx_num: u64,
    /// Produce empty blocks when no transaction arrives in time.
    pub enable_timed_gen_empty_block: bool,
    pub no_tx_batch_timeout_ms: u64,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            checkpoint_period: 10,
            block_max_tx_num: 500,
            enable_timed_gen_empty_block: false,
            no_tx_batch_timeout_ms: 2_000,
        }
    }
}

/// Validator membership and parameters for one epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochInfo {
    pub epoch: u64,
    /// First block height of this epoch.
    pub start_block: u64,
    /// Number of blocks in this epoch.
    pub epoch_period: u64,
    pub validator_set: Vec<NodeInfo>,
    pub candidate_set: Vec<NodeInfo>,
    pub consensus_params: ConsensusParams,
}

impl EpochInfo {
    /// Height of the last block belonging to this epoch.
    pub fn last_block(&self) -> u64 {
        self.start_block
            .saturating_add(self.epoch_period)
            .saturating_sub(1)
    }

    /// True when `height` closes this epoch.
    pub fn is_epoch_end(&self, height: u64) -> bool {
        self.epoch_period > 0 && height == self.last_block()
    }

    /// Byzantine quorum for the current validator set.
    pub fn quorum(&self) -> u64 {
        quorum(self.validator_set.len() as u64)
    }

    /// Peer IDs of all validators and candidates, excluding `self_p2p_id`.
    pub fn broadcast_peers(&self, self_p2p_id: &str) -> Vec<String> {
        self.validator_set
            .iter()
            .chain(self.candidate_set.iter())
            .filter(|node| node.p2p_node_id != self_p2p_id)
            .map(|node| node.p2p_node_id.clone())
            .collect()
    }

    /// Peer IDs of all validators except `self_p2p_id`, in validator order.
    pub fn validator_peers(&self, self_p2p_id: &str) -> Vec<String> {
        self.validator_set
            .iter()
            .filter(|node| node.p2p_node_id != self_p2p_id)
            .map(|node| node.p2p_node_id.clone())
            .collect()
    }

    /// Look up a validator by its account address.
    pub fn validator_by_account(&self, account: &str) -> Option<&NodeInfo> {
        self.validator_set
            .iter()
            .find(|node| node.account_address == account)
    }
}

/// Quorum for `n` validators: `f = (n - 1) / 3`, `q = (n + f + 2) / 2`.
pub fn quorum(n: u64) -> u64 {
    let f = n.saturating_sub(1) / 3;
    (n + f + 2) / 2
}
