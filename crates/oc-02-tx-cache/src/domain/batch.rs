//! Sealed transaction batches.

use shared_types::Transaction;

/// Why a batch was sealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SealReason {
    /// The accumulator reached the configured set size.
    Full,
    /// The slice timer expired first.
    Timeout,
}

/// An ordered, immutable run of transactions in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    transactions: Vec<Transaction>,
    sealed_by: SealReason,
}

impl Batch {
    pub(crate) fn seal(transactions: Vec<Transaction>, sealed_by: SealReason) -> Self {
        Self {
            transactions,
            sealed_by,
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn into_transactions(self) -> Vec<Transaction> {
        self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn sealed_by(&self) -> SealReason {
        self.sealed_by
    }
}
