//! # Static Epoch Provider
//!
//! Serves epoch info from memory. The current epoch changes only when
//! [`StaticEpochProvider::advance`] is called.

use oc_04_order_node::{EpochError, EpochProvider};
use parking_lot::RwLock;
use shared_types::{ConsensusParams, EpochInfo, NodeInfo};
use tracing::info;

pub struct StaticEpochProvider {
    epochs: RwLock<Vec<EpochInfo>>,
}

impl StaticEpochProvider {
    pub fn new(genesis: EpochInfo) -> Self {
        Self {
            epochs: RwLock::new(vec![genesis]),
        }
    }

    /// Epoch 1 with `node` as the only validator. An `epoch_period` of zero
    /// never ends the epoch.
    pub fn single_validator(node: NodeInfo, params: ConsensusParams, epoch_period: u64) -> Self {
        Self::new(EpochInfo {
            epoch: 1,
            start_block: 1,
            epoch_period,
            validator_set: vec![node],
            candidate_set: vec![],
            consensus_params: params,
        })
    }

    /// Make `next` the current epoch.
    pub fn advance(&self, next: EpochInfo) {
        info!(epoch = next.epoch, start_block = next.start_block, "Epoch scheduled");
        self.epochs.write().push(next);
    }
}

impl EpochProvider for StaticEpochProvider {
    fn current_epoch_info(&self) -> Result<EpochInfo, EpochError> {
        self.epochs
            .read()
            .last()
            .cloned()
            .ok_or_else(|| EpochError::Unavailable("no epoch configured".into()))
    }

    fn epoch_info(&self, epoch: u64) -> Result<EpochInfo, EpochError> {
        self.epochs
            .read()
            .iter()
            .find(|info| info.epoch == epoch)
            .cloned()
            .ok_or(EpochError::NotFound(epoch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> NodeInfo {
        NodeInfo {
            id: 1,
            account_address: "0xacc1".into(),
            p2p_node_id: "node1".into(),
        }
    }

    #[test]
    fn test_advance_keeps_history() {
        let provider = StaticEpochProvider::single_validator(node(), ConsensusParams::default(), 100);
        let mut next = provider.current_epoch_info().unwrap();
        next.epoch = 2;
        next.start_block = 101;

        provider.advance(next);

        assert_eq!(provider.current_epoch_info().unwrap().epoch, 2);
        assert_eq!(provider.epoch_info(1).unwrap().start_block, 1);
        assert_eq!(provider.epoch_info(3), Err(EpochError::NotFound(3)));
    }
}
