//! # oc-03-state-recovery
//!
//! Catch-up for a node whose chain fell behind the consensus cluster.
//!
//! ## Episode Lifecycle
//!
//! ```text
//! engine: state_update(target)
//!        │
//!        ▼
//! ┌─────────────────┐   fetch top-down, verify by hash   ┌──────────────┐
//! │ RecoveryTracker │ ─────────────────────────────────▶ │ StateRecovery│
//! │   active        │                                    └──────┬───────┘
//! └────────┬────────┘                                           │ replay ascending
//!          │                                                    ▼
//!          │ report_state(target.height)             [commit channel, local_list = false]
//!          ▼
//!       cleared
//! ```
//!
//! While the tracker is active the node ignores executed-state reports for
//! every height except the target.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{FetchError, RecoveryError, RecoveryOutcome, RecoveryTarget, RecoveryTracker};
pub use ports::{BlockFetcher, ChainReader};
pub use service::{RecoveryConfig, StateRecovery, DEFAULT_RETRY_INTERVAL};
