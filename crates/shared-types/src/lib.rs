//! # Shared Types Crate
//!
//! Domain entities shared by every crate of the order core.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: transactions, blocks and epoch membership
//!   are defined once, here.
//! - **Hashes are derived**: transaction and block hashes are computed from
//!   content (keccak256), never carried as a separately trusted field.
//! - **Epoch info is immutable**: it is replaced wholesale at an epoch
//!   boundary; holders take a snapshot.

pub mod codec;
pub mod entities;
pub mod epoch;
pub mod errors;
pub mod rate_limiter;

pub use codec::{decode, decode_transactions, encode, encode_transactions};
pub use entities::*;
pub use epoch::{quorum, ConsensusParams, EpochInfo, NodeInfo};
pub use errors::*;
pub use rate_limiter::RateLimiter;
