//! # Shared Crypto - Transaction Signatures
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `ecdsa` | secp256k1 | Recoverable signing, address recovery |
//! | `transaction` | secp256k1 + keccak256 | Sign and verify `Transaction`s |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic, low-S enforced on recovery (EIP-2)
//! - **Sender binding**: a transaction verifies only if its signature
//!   recovers to the address in `from`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod transaction;

// Re-exports
pub use ecdsa::{address_from_pubkey, recover_address, Secp256k1KeyPair};
pub use errors::CryptoError;
pub use transaction::{sign_transaction, verify_transaction};
