//! Domain layer: statuses, messages, epoch snapshot and errors.

pub mod epoch_state;
pub mod errors;
pub mod messages;
pub mod status;

pub use epoch_state::EpochState;
pub use errors::{ConfigError, EngineError, EpochError, LedgerError, NetworkError, OrderError};
pub use messages::{
    ConsensusMessage, ConsensusMessageType, ExecutedBatch, PipeMsg, ServiceState,
    StableCheckpoint, PUSH_TXS_PIPE,
};
pub use status::{Lifecycle, NodeStatus};
