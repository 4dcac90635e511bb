//! Recovery targets, episode tracking and errors.

use parking_lot::Mutex;
use shared_types::{Hash, ZERO_HASH};
use thiserror::Error;

/// Height and block hash the engine wants the local chain to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryTarget {
    pub height: u64,
    pub digest: Hash,
}

impl Default for RecoveryTarget {
    fn default() -> Self {
        Self {
            height: 0,
            digest: ZERO_HASH,
        }
    }
}

/// What a recovery episode achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Blocks `from..=to` were delivered to the commit channel.
    Replayed { from: u64, to: u64 },
    /// The local chain already holds the target block.
    AlreadyApplied,
}

/// Tracks the single in-flight recovery episode.
///
/// While an episode is active, executed-state reports for any height but
/// the target are ignored; the report for the target height ends it.
#[derive(Debug, Default)]
pub struct RecoveryTracker {
    target: Mutex<Option<RecoveryTarget>>,
}

impl RecoveryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an episode, replacing any previous target.
    pub fn begin(&self, target: RecoveryTarget) -> Option<RecoveryTarget> {
        self.target.lock().replace(target)
    }

    pub fn is_active(&self) -> bool {
        self.target.lock().is_some()
    }

    pub fn target(&self) -> Option<RecoveryTarget> {
        *self.target.lock()
    }

    /// True when a report for `height` must be ignored.
    pub fn is_stale_report(&self, height: u64) -> bool {
        matches!(*self.target.lock(), Some(target) if target.height != height)
    }

    /// End the episode if `height` is its target.
    pub fn complete(&self, height: u64) -> Option<RecoveryTarget> {
        let mut guard = self.target.lock();
        match *guard {
            Some(target) if target.height == height => guard.take(),
            _ => None,
        }
    }

    /// End the episode for `target` without reaching it. A newer episode
    /// that replaced it is left alone.
    pub fn cancel(&self, target: RecoveryTarget) -> bool {
        let mut guard = self.target.lock();
        if *guard == Some(target) {
            *guard = None;
            true
        } else {
            false
        }
    }
}

/// Failures fetching a single block from a single peer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("peer {peer} unreachable: {reason}")]
    Unreachable { peer: String, reason: String },

    #[error("peer {peer} has no block at height {height}")]
    NotFound { peer: String, height: u64 },

    #[error("malformed block from {peer}: {reason}")]
    Malformed { peer: String, reason: String },
}

/// Failures ending a recovery episode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoveryError {
    #[error("no peers to recover from")]
    NoPeers,

    #[error("recovery cancelled while fetching height {height}")]
    Cancelled { height: u64 },

    #[error("block at height {height} never resolved, replay aborted")]
    UnresolvedHeight { height: u64 },

    #[error("local block {height} diverges from recovery target")]
    Divergent { height: u64 },

    #[error("commit channel closed")]
    CommitChannelClosed,
}
