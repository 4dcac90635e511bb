//! Pre-check error types.
//!
//! Messages follow the wording clients of Ethereum-compatible nodes
//! already match on.

use shared_types::U256;
use thiserror::Error;

/// A transaction failed an economic or gas rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error(
        "max priority fee per gas higher than max fee per gas: address {address}, \
         maxPriorityFeePerGas: {tip}, maxFeePerGas: {fee_cap}"
    )]
    TipAboveFeeCap {
        address: String,
        tip: U256,
        fee_cap: U256,
    },

    #[error(
        "max fee per gas less than block base fee: address {address}, \
         maxFeePerGas: {fee_cap}, baseFee: {base_fee}"
    )]
    FeeCapTooLow {
        address: String,
        fee_cap: U256,
        base_fee: U256,
    },

    #[error("insufficient funds for gas * price + value: address {address} have {have} want {want}")]
    InsufficientFunds {
        address: String,
        have: U256,
        want: U256,
    },

    #[error("gas uint64 overflow")]
    GasUintOverflow,

    #[error("intrinsic gas too low: have {have}, want {want}")]
    IntrinsicGasTooLow { have: u64, want: u64 },

    #[error("insufficient funds for transfer: address {address}")]
    InsufficientFundsForTransfer { address: String },

    #[error("max initcode size exceeded: code size {size} limit {limit}")]
    MaxInitCodeSizeExceeded { size: usize, limit: usize },
}

/// Pre-check pipeline errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreCheckError {
    #[error("tx signature verify failed")]
    SignatureVerifyFailed,

    #[error(transparent)]
    Rule(#[from] RuleViolation),

    #[error("pre-check pipeline already started")]
    AlreadyStarted,

    #[error("pre-check pipeline stopped")]
    Stopped,

    #[error("valid transaction stream already taken")]
    StreamTaken,
}
