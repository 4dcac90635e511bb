use serde::{Deserialize, Serialize};
use std::fmt;

/// Consensus engine status. Only `Normal` admits new transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeStatus {
    Normal,
    InConfChange,
    InViewChange,
    InRecovery,
    StateTransferring,
    PoolFull,
    Pending,
    Stopped,
}

impl NodeStatus {
    pub fn is_normal(self) -> bool {
        self == Self::Normal
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Normal => "Normal",
            Self::InConfChange => "system is in conf change",
            Self::InViewChange => "system is in view change",
            Self::InRecovery => "system is in recovery",
            Self::StateTransferring => "system is in state update",
            Self::PoolFull => "system is too busy",
            Self::Pending => "system is in pending state",
            Self::Stopped => "system is stopped",
        };
        f.write_str(text)
    }
}

/// Orchestrator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Initializing,
    Running,
    Stopped,
}
