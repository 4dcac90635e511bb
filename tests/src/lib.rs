//! # Order-Core Test Suite
//!
//! Cross-crate flows that no single crate can exercise on its own.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs         # submission → pre-check → solo engine → ledger
//!     └── e2e_recovery.rs  # lagging ledger catches up from peers
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p oc-tests
//! cargo test -p oc-tests integration::e2e_recovery
//! ```

#![allow(dead_code)]

pub mod integration;
