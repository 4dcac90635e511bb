//! Integration flows across the order-core crates.

pub mod e2e_recovery;
pub mod flows;

use shared_crypto::{sign_transaction, Secp256k1KeyPair};
use shared_types::{FeeModel, Transaction, TxSignature, U256};
use std::time::Duration;

/// A signed 21000-gas transfer of `value` at gas price 1.
pub fn signed_transfer(key: &Secp256k1KeyPair, nonce: u64, value: u64) -> Transaction {
    let mut tx = Transaction {
        from: [0u8; 20],
        to: Some([0xBB; 20]),
        nonce,
        gas_limit: 21_000,
        fee: FeeModel::Legacy {
            gas_price: U256::one(),
        },
        value: U256::from(value),
        data: vec![],
        signature: TxSignature::default(),
    };
    sign_transaction(&mut tx, key).expect("signing with a fresh key");
    tx
}

/// Poll `check` every 10ms until it holds; panics after 5s.
pub async fn eventually(what: &str, check: impl Fn() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {what}");
}
