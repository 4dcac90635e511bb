//! # Memory Ledger
//!
//! Account balances, nonces and the applied chain, all held in memory.
//!
//! Applying a block charges every sender `gas_limit × gas_price + value`,
//! credits the recipient with `value` and moves the sender nonce past the
//! transaction. Blocks assembled by the order node carry a zero parent
//! hash; the ledger links them to its head.

use oc_04_order_node::{Ledger, LedgerError};
use parking_lot::RwLock;
use shared_types::{hash_hex, Address, Block, ChainMeta, Transaction, U256, ZERO_HASH};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// A block that cannot extend the applied chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("expected block {expected}, got {got}")]
    HeightGap { expected: u64, got: u64 },

    #[error("block {height} parent {parent} does not match head {head}")]
    ParentMismatch {
        height: u64,
        parent: String,
        head: String,
    },
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    blocks: Vec<Block>,
}

impl LedgerState {
    fn head(&self) -> ChainMeta {
        self.blocks
            .last()
            .map(|b| ChainMeta {
                height: b.height(),
                block_hash: b.hash(),
            })
            .unwrap_or_default()
    }

    fn charge(&mut self, tx: &Transaction) {
        let cost = U256::from(tx.gas_limit)
            .saturating_mul(tx.gas_price())
            .saturating_add(tx.value);
        let balance = self.balances.entry(tx.from).or_default();
        *balance = balance.saturating_sub(cost);
        if let Some(to) = tx.to {
            let credited = self.balances.entry(to).or_default();
            *credited = credited.saturating_add(tx.value);
        }
        let nonce = self.nonces.entry(tx.from).or_default();
        *nonce = (*nonce).max(tx.nonce + 1);
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Genesis allocation.
    pub fn set_balance(&self, address: Address, balance: U256) {
        self.state.write().balances.insert(address, balance);
    }

    /// Append `block` to the chain and apply its transactions.
    ///
    /// Returns the block as stored, with its parent hash filled in.
    pub fn apply(&self, mut block: Block) -> Result<Block, ApplyError> {
        let mut state = self.state.write();
        let head = state.head();

        let expected = head.height + 1;
        if block.height() != expected {
            return Err(ApplyError::HeightGap {
                expected,
                got: block.height(),
            });
        }
        if block.parent_hash() == ZERO_HASH {
            block.header.parent_hash = head.block_hash;
        } else if block.parent_hash() != head.block_hash {
            return Err(ApplyError::ParentMismatch {
                height: block.height(),
                parent: hash_hex(&block.parent_hash()),
                head: hash_hex(&head.block_hash),
            });
        }

        for tx in &block.transactions {
            state.charge(tx);
        }
        debug!(
            height = block.height(),
            txs = block.transactions.len(),
            "Block applied"
        );
        state.blocks.push(block.clone());
        Ok(block)
    }
}

impl Ledger for MemoryLedger {
    fn account_balance(&self, address: &Address) -> U256 {
        self.state
            .read()
            .balances
            .get(address)
            .copied()
            .unwrap_or_default()
    }

    fn account_nonce(&self, address: &Address) -> u64 {
        self.state
            .read()
            .nonces
            .get(address)
            .copied()
            .unwrap_or_default()
    }

    fn chain_meta(&self) -> ChainMeta {
        self.state.read().head()
    }

    fn block_by_height(&self, height: u64) -> Result<Block, LedgerError> {
        let state = self.state.read();
        height
            .checked_sub(1)
            .and_then(|index| state.blocks.get(index as usize))
            .cloned()
            .ok_or(LedgerError::BlockNotFound(height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{FeeModel, TxSignature};

    fn transfer(from: Address, to: Address, nonce: u64, value: u64) -> Transaction {
        Transaction {
            from,
            to: Some(to),
            nonce,
            gas_limit: 21_000,
            fee: FeeModel::Legacy {
                gas_price: U256::one(),
            },
            value: U256::from(value),
            data: vec![],
            signature: TxSignature::default(),
        }
    }

    #[test]
    fn test_apply_links_parent_and_moves_funds() {
        let ledger = MemoryLedger::new();
        let (alice, bob) = ([1u8; 20], [2u8; 20]);
        ledger.set_balance(alice, U256::from(100_000));

        let first = ledger
            .apply(Block::new(1, ZERO_HASH, 1, "0xp", vec![transfer(alice, bob, 0, 500)]))
            .unwrap();
        let second = ledger.apply(Block::new(2, ZERO_HASH, 2, "0xp", vec![])).unwrap();

        assert_eq!(first.parent_hash(), ZERO_HASH);
        assert_eq!(second.parent_hash(), first.hash());
        assert_eq!(ledger.account_balance(&alice), U256::from(100_000 - 21_000 - 500));
        assert_eq!(ledger.account_balance(&bob), U256::from(500));
        assert_eq!(ledger.account_nonce(&alice), 1);
        assert_eq!(ledger.chain_meta().height, 2);
        assert_eq!(ledger.block_by_height(2).unwrap(), second);
        assert_eq!(ledger.block_by_height(0), Err(LedgerError::BlockNotFound(0)));
    }

    #[test]
    fn test_height_gap_rejected() {
        let ledger = MemoryLedger::new();

        let err = ledger
            .apply(Block::new(3, ZERO_HASH, 1, "0xp", vec![]))
            .unwrap_err();
        assert_eq!(err, ApplyError::HeightGap { expected: 1, got: 3 });
    }

    #[test]
    fn test_foreign_parent_rejected() {
        let ledger = MemoryLedger::new();
        ledger.apply(Block::new(1, ZERO_HASH, 1, "0xp", vec![])).unwrap();

        let err = ledger
            .apply(Block::new(2, [7u8; 32], 2, "0xp", vec![]))
            .unwrap_err();
        assert!(matches!(err, ApplyError::ParentMismatch { height: 2, .. }));
    }
}
