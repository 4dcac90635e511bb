//! Ports layer (Hexagonal Architecture).

pub mod outbound;

pub use outbound::BalanceProvider;
