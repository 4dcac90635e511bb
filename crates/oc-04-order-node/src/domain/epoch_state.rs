use parking_lot::RwLock;
use shared_types::EpochInfo;
use std::sync::Arc;

/// Current epoch snapshot. Readers clone the `Arc`; the boundary handler
/// swaps in a whole new value.
#[derive(Debug)]
pub struct EpochState {
    current: RwLock<Arc<EpochInfo>>,
}

impl EpochState {
    pub fn new(info: EpochInfo) -> Self {
        Self {
            current: RwLock::new(Arc::new(info)),
        }
    }

    pub fn current(&self) -> Arc<EpochInfo> {
        self.current.read().clone()
    }

    /// Install `info`, returning the replaced snapshot.
    pub fn replace(&self, info: EpochInfo) -> Arc<EpochInfo> {
        std::mem::replace(&mut *self.current.write(), Arc::new(info))
    }

    pub fn quorum(&self) -> u64 {
        self.current.read().quorum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{ConsensusParams, NodeInfo};

    fn epoch(number: u64, validators: u64) -> EpochInfo {
        EpochInfo {
            epoch: number,
            start_block: 1,
            epoch_period: 100,
            validator_set: (1..=validators)
                .map(|id| NodeInfo {
                    id,
                    account_address: format!("0x{id:040x}"),
                    p2p_node_id: format!("node{id}"),
                })
                .collect(),
            candidate_set: vec![],
            consensus_params: ConsensusParams::default(),
        }
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let state = EpochState::new(epoch(1, 4));
        let before = state.current();

        let old = state.replace(epoch(2, 6));

        assert_eq!(old.epoch, 1);
        assert_eq!(before.epoch, 1);
        assert_eq!(state.current().epoch, 2);
        assert_eq!(state.quorum(), 4);
    }
}
