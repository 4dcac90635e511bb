//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Invalid private key
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// `r`/`s` do not form a valid signature
    #[error("Invalid signature format")]
    InvalidSignatureFormat,

    /// Recovery id outside 0, 1, 27, 28
    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// High-S signature (EIP-2)
    #[error("Malleable signature: s is in the upper half of the curve order")]
    MalleableSignature,

    /// Public key recovery failed
    #[error("Public key recovery failed")]
    RecoveryFailed,

    /// Recovered signer differs from the claimed sender
    #[error("Signer mismatch: expected {expected}, recovered {actual}")]
    SignerMismatch {
        /// Claimed sender (hex)
        expected: String,
        /// Recovered signer (hex)
        actual: String,
    },

    /// Signing failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),
}
