//! # Core Domain Entities
//!
//! Defines the chain entities exchanged between the order core, the
//! consensus engine and block execution.
//!
//! ## Clusters
//!
//! - **Transactions**: `Transaction`, `FeeModel`, `TxSignature`
//! - **Chain**: `Block`, `BlockHeader`, `ChainMeta`, `CommitEvent`

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

/// A 32-byte keccak256 hash.
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// The all-zero hash, used as the parent of the genesis block.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Keccak256 over a byte slice.
pub fn keccak256(data: &[u8]) -> Hash {
    Keccak256::digest(data).into()
}

/// Render a hash as `0x`-prefixed hex for logs and error messages.
pub fn hash_hex(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}

/// Render an address as `0x`-prefixed hex.
pub fn address_hex(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

// =============================================================================
// CLUSTER A: TRANSACTIONS
// =============================================================================

/// How a transaction pays for gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeModel {
    /// Fixed gas price.
    Legacy { gas_price: U256 },
    /// Fee cap plus priority tip.
    DynamicFee {
        gas_fee_cap: U256,
        gas_tip_cap: U256,
    },
}

/// Recoverable secp256k1 signature `(r, s, v)`.
///
/// `v` is the recovery id (0 or 1; 27 and 28 are accepted on recovery).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub v: u8,
}

/// A signed transaction as submitted by a client or replicated by a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Claimed sender; must match the address recovered from `signature`.
    pub from: Address,
    /// Recipient, absent for contract creation.
    pub to: Option<Address>,
    pub nonce: u64,
    pub gas_limit: u64,
    pub fee: FeeModel,
    pub value: U256,
    /// Call data, or init code for contract creation.
    pub data: Vec<u8>,
    pub signature: TxSignature,
}

impl Transaction {
    /// Keccak256 over the signing payload (every field except the signature).
    ///
    /// This is both the transaction identifier and the digest that is signed.
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(self.from);
        match &self.to {
            Some(to) => {
                hasher.update([1u8]);
                hasher.update(to);
            }
            None => hasher.update([0u8]),
        }
        hasher.update(self.nonce.to_be_bytes());
        hasher.update(self.gas_limit.to_be_bytes());
        match self.fee {
            FeeModel::Legacy { gas_price } => {
                hasher.update([0u8]);
                hasher.update(u256_bytes(&gas_price));
            }
            FeeModel::DynamicFee {
                gas_fee_cap,
                gas_tip_cap,
            } => {
                hasher.update([2u8]);
                hasher.update(u256_bytes(&gas_fee_cap));
                hasher.update(u256_bytes(&gas_tip_cap));
            }
        }
        hasher.update(u256_bytes(&self.value));
        hasher.update((self.data.len() as u64).to_be_bytes());
        hasher.update(&self.data);
        hasher.finalize().into()
    }

    /// True when the transaction deploys a contract.
    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }

    /// True for the dynamic-fee model.
    pub fn is_dynamic_fee(&self) -> bool {
        matches!(self.fee, FeeModel::DynamicFee { .. })
    }

    /// Price charged per unit of gas up front.
    ///
    /// For dynamic-fee transactions this is the fee cap.
    pub fn gas_price(&self) -> U256 {
        match self.fee {
            FeeModel::Legacy { gas_price } => gas_price,
            FeeModel::DynamicFee { gas_fee_cap, .. } => gas_fee_cap,
        }
    }

    /// Maximum price per unit of gas the sender accepts.
    pub fn gas_fee_cap(&self) -> U256 {
        self.gas_price()
    }

    /// Priority tip; equals the gas price for legacy transactions.
    pub fn gas_tip_cap(&self) -> U256 {
        match self.fee {
            FeeModel::Legacy { gas_price } => gas_price,
            FeeModel::DynamicFee { gas_tip_cap, .. } => gas_tip_cap,
        }
    }
}

fn u256_bytes(value: &U256) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    bytes
}

// =============================================================================
// CLUSTER B: THE CHAIN
// =============================================================================

/// Version string stamped on blocks assembled by the order core.
pub const BLOCK_VERSION: &str = "1.0.0";

/// Block header. The block hash is keccak256 over these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: String,
    pub number: u64,
    /// Hash of the previous block, filled in by the executor for new blocks.
    pub parent_hash: Hash,
    /// Keccak256 over the concatenated transaction hashes.
    pub tx_root: Hash,
    /// Proposal time in nanoseconds since the Unix epoch.
    pub timestamp: i64,
    /// Account address of the proposing node.
    pub proposer_account: String,
}

/// A block: header plus its ordered transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Assemble a block, computing the transaction root.
    pub fn new(
        number: u64,
        parent_hash: Hash,
        timestamp: i64,
        proposer_account: impl Into<String>,
        transactions: Vec<Transaction>,
    ) -> Self {
        let tx_root = tx_root(&transactions);
        Self {
            header: BlockHeader {
                version: BLOCK_VERSION.to_string(),
                number,
                parent_hash,
                tx_root,
                timestamp,
                proposer_account: proposer_account.into(),
            },
            transactions,
        }
    }

    pub fn height(&self) -> u64 {
        self.header.number
    }

    pub fn parent_hash(&self) -> Hash {
        self.header.parent_hash
    }

    /// Keccak256 over the header.
    pub fn hash(&self) -> Hash {
        let header = &self.header;
        let mut hasher = Keccak256::new();
        hasher.update(header.version.as_bytes());
        hasher.update(header.number.to_be_bytes());
        hasher.update(header.parent_hash);
        hasher.update(header.tx_root);
        hasher.update(header.timestamp.to_be_bytes());
        hasher.update(header.proposer_account.as_bytes());
        hasher.finalize().into()
    }

    pub fn tx_hashes(&self) -> Vec<Hash> {
        self.transactions.iter().map(Transaction::hash).collect()
    }
}

fn tx_root(transactions: &[Transaction]) -> Hash {
    let mut hasher = Keccak256::new();
    for tx in transactions {
        hasher.update(tx.hash());
    }
    hasher.finalize().into()
}

/// Height and hash of the latest locally applied block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChainMeta {
    pub height: u64,
    pub block_hash: Hash,
}

/// A block ready for execution, with one flag per transaction marking
/// whether it was submitted through this node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEvent {
    pub block: Block,
    pub local_list: Vec<bool>,
}
