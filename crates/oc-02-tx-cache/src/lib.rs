//! # oc-02-tx-cache
//!
//! Time and count bounded transaction batching.
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`TimerSet`] | Named timers with generation-checked expiries |
//! | [`TxCache`] | Accumulates transactions, seals a [`Batch`] on size or timeout |
//!
//! ## Batching Rules
//!
//! - The slice timer starts when the first transaction enters an empty
//!   accumulator, not on a fixed cadence.
//! - Reaching `set_size` seals immediately and stops the timer.
//! - A timer expiry seals whatever has accumulated.
//! - After a seal the accumulator is empty and no timer runs until the
//!   next submission.

pub mod domain;
pub mod service;

// Re-export main types
pub use domain::{Batch, CacheError, SealReason, TimerEvents, TimerFired, TimerSet};
pub use service::{
    TxCache, TxCacheConfig, TxCacheHandle, DEFAULT_CACHE_CAPACITY, DEFAULT_SET_SIZE,
    DEFAULT_SET_TIMEOUT,
};
