//! # Wire Codec
//!
//! `bincode` encoding for everything that crosses a pipe: transaction
//! lists replicated between nodes, consensus messages and blocks served
//! to recovering peers.

use crate::entities::Transaction;
use crate::errors::CodecError;
use serde::{de::DeserializeOwned, Serialize};

/// Encode any wire type.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(value).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode any wire type.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

/// Encode an ordered transaction list for replication.
pub fn encode_transactions(txs: &[Transaction]) -> Result<Vec<u8>, CodecError> {
    encode(&txs)
}

/// Decode a replicated transaction list.
pub fn decode_transactions(bytes: &[u8]) -> Result<Vec<Transaction>, CodecError> {
    decode(bytes)
}
