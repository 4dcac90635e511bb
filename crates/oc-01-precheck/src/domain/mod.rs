//! Domain layer: pipeline events, economic rules and intrinsic gas.

pub mod entities;
pub mod errors;
pub mod gas;
pub mod rules;

pub use entities::{
    response_channel, TxResponder, TxResponse, TxResult, TxWithResponse, UncheckedTxEvent,
    ValidTxs,
};
pub use errors::{PreCheckError, RuleViolation};
pub use gas::{intrinsic_gas, MAX_INIT_CODE_SIZE};
pub use rules::verify_economics;
