//! # Adapter Implementations
//!
//! In-memory implementations of the order node's outbound ports, enough to
//! run a single node without storage or peers.
//!
//! ```text
//! ┌──────────────────────── OrderNode ────────────────────────┐
//! │   Ledger port      Network port       EpochProvider port   │
//! └──────┬──────────────────┬──────────────────────┬───────────┘
//!        ↓ implements       ↓ implements           ↓ implements
//!  MemoryLedger      LoopbackNetwork       StaticEpochProvider
//! ```

pub mod epoch;
pub mod ledger;
pub mod network;

pub use epoch::StaticEpochProvider;
pub use ledger::{ApplyError, MemoryLedger};
pub use network::{LoopbackNetwork, LoopbackPipe};
