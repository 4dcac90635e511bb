//! Ports layer: the traits the node consumes.

pub mod outbound;

#[cfg(test)]
pub mod mocks;

pub use outbound::{ConsensusEngine, EngineStack, EpochProvider, Ledger, Network, Pipe};
