//! # Shared Bus - In-Process Events and Shutdown
//!
//! Two small pieces of plumbing used by every crate of the order core.
//!
//! ## Event Bus
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Order node   │                    │  Observer    │
//! │              │    publish()       │ (API, tests) │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! Publishing never blocks; lagging subscribers lose the oldest events.
//!
//! ## Shutdown
//!
//! [`shutdown_channel`] returns a trigger and a cloneable signal. Loops
//! select on the signal next to their input queue and drain on exit.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod shutdown;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, OrderEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
