//! Domain layer: timers and batches.

pub mod batch;
pub mod timer;

pub use batch::{Batch, SealReason};
pub use timer::{TimerEvents, TimerFired, TimerSet};

use thiserror::Error;

/// Batching cache errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The cache loop has exited.
    #[error("transaction cache closed")]
    Closed,

    /// The input queue is saturated.
    #[error("transaction cache is full")]
    Full,
}
