//! Transaction signing and sender verification.

use crate::ecdsa::{recover_address, Secp256k1KeyPair};
use crate::CryptoError;
use shared_types::{address_hex, Transaction};

/// Stamp `tx.from` with the key's address and sign the transaction hash.
pub fn sign_transaction(tx: &mut Transaction, keypair: &Secp256k1KeyPair) -> Result<(), CryptoError> {
    tx.from = keypair.address();
    tx.signature = keypair.sign_hash(&tx.hash())?;
    Ok(())
}

/// Check that the signature recovers to the claimed sender.
pub fn verify_transaction(tx: &Transaction) -> Result<(), CryptoError> {
    let recovered = recover_address(&tx.hash(), &tx.signature)?;
    if recovered != tx.from {
        return Err(CryptoError::SignerMismatch {
            expected: address_hex(&tx.from),
            actual: address_hex(&recovered),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{FeeModel, TxSignature, U256};

    fn unsigned() -> Transaction {
        Transaction {
            from: [0u8; 20],
            to: Some([7u8; 20]),
            nonce: 0,
            gas_limit: 21_000,
            fee: FeeModel::Legacy {
                gas_price: U256::one(),
            },
            value: U256::zero(),
            data: vec![],
            signature: TxSignature::default(),
        }
    }

    #[test]
    fn test_signed_transaction_verifies() {
        let keypair = Secp256k1KeyPair::generate();
        let mut tx = unsigned();
        sign_transaction(&mut tx, &keypair).unwrap();

        assert_eq!(tx.from, keypair.address());
        assert!(verify_transaction(&tx).is_ok());
    }

    #[test]
    fn test_tampered_transaction_fails() {
        let keypair = Secp256k1KeyPair::generate();
        let mut tx = unsigned();
        sign_transaction(&mut tx, &keypair).unwrap();
        tx.value = U256::from(1_000);

        assert!(verify_transaction(&tx).is_err());
    }

    #[test]
    fn test_spoofed_sender_fails() {
        let keypair = Secp256k1KeyPair::generate();
        let mut tx = unsigned();
        sign_transaction(&mut tx, &keypair).unwrap();
        tx.from = [9u8; 20];

        assert!(verify_transaction(&tx).is_err());
    }

    #[test]
    fn test_unsigned_transaction_fails() {
        assert!(verify_transaction(&unsigned()).is_err());
    }
}
