//! # Error Types
//!
//! Errors shared by every crate that touches the wire format.

use thiserror::Error;

/// Wire encoding failures.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// Payload could not be serialized.
    #[error("Encode failed: {0}")]
    Encode(String),

    /// Payload is not a valid encoding of the expected type.
    #[error("Decode failed: {0}")]
    Decode(String),
}
