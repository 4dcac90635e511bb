//! # Order Events
//!
//! Events the order core publishes for in-process observers: admitted
//! transactions, executed heights, recovery episodes and epoch changes.

use serde::{Deserialize, Serialize};
use shared_types::entities::{Hash, Transaction};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEvent {
    /// Transactions passed pre-check and were proposed to the engine.
    TransactionsAccepted {
        /// Submitted through this node rather than replicated by a peer.
        local: bool,
        transactions: Vec<Transaction>,
    },

    /// The executor reported a height as applied.
    BlockExecuted { height: u64, block_hash: Hash },

    /// The engine asked for state transfer to `target_height`.
    StateUpdateStarted { target_height: u64 },

    /// The recovery target height was applied.
    StateUpdateFinished { height: u64 },

    /// Epoch membership was replaced at an epoch boundary.
    EpochChanged { epoch: u64 },
}

impl OrderEvent {
    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::TransactionsAccepted { .. } => EventTopic::Transactions,
            Self::BlockExecuted { .. } => EventTopic::Chain,
            Self::StateUpdateStarted { .. } | Self::StateUpdateFinished { .. } => {
                EventTopic::Recovery
            }
            Self::EpochChanged { .. } => EventTopic::Epoch,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Admitted transactions.
    Transactions,
    /// Executed blocks.
    Chain,
    /// State transfer episodes.
    Recovery,
    /// Epoch changes.
    Epoch,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &OrderEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
