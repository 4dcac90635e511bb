//! Outbound (Driven) ports for the pre-check pipeline.

use shared_types::{Address, U256};

/// Account balance lookup, backed by the ledger.
pub trait BalanceProvider: Send + Sync {
    /// Current balance; unknown accounts have zero.
    fn balance(&self, address: &Address) -> U256;
}

/// Mock balance provider for testing.
#[cfg(test)]
pub struct MockBalanceProvider {
    balances: std::collections::HashMap<Address, U256>,
}

#[cfg(test)]
impl MockBalanceProvider {
    pub fn new() -> Self {
        Self {
            balances: std::collections::HashMap::new(),
        }
    }

    pub fn with_balance(mut self, address: Address, balance: u64) -> Self {
        self.balances.insert(address, U256::from(balance));
        self
    }
}

#[cfg(test)]
impl BalanceProvider for MockBalanceProvider {
    fn balance(&self, address: &Address) -> U256 {
        self.balances.get(address).copied().unwrap_or_default()
    }
}
