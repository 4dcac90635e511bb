//! Economic validity of a signature-checked transaction.
//!
//! Rules run in a fixed order and the first violation wins:
//!
//! 1. dynamic-fee sanity (tip ≤ fee cap, fee cap ≥ base fee)
//! 2. worst-case balance: `gas_limit × fee_cap + value`
//! 3. up-front gas purchase: `gas_limit × gas_price`
//! 4. intrinsic gas
//! 5. value transfer against the balance left after step 3
//! 6. init code size on contract creation
//!
//! Fee caps are 256-bit integers by type, so a cap wider than 256 bits
//! never decodes and needs no rule here.

use super::errors::RuleViolation;
use super::gas::{intrinsic_gas, MAX_INIT_CODE_SIZE};
use shared_types::{address_hex, FeeModel, Transaction, U256};

/// Check `tx` against the sender's current `balance`.
///
/// The balance is a snapshot; nothing is reserved or persisted.
pub fn verify_economics(
    tx: &Transaction,
    balance: U256,
    base_fee: U256,
) -> Result<(), RuleViolation> {
    if let FeeModel::DynamicFee {
        gas_fee_cap,
        gas_tip_cap,
    } = tx.fee
    {
        if gas_fee_cap < gas_tip_cap {
            return Err(RuleViolation::TipAboveFeeCap {
                address: address_hex(&tx.from),
                tip: gas_tip_cap,
                fee_cap: gas_fee_cap,
            });
        }
        if gas_fee_cap < base_fee {
            return Err(RuleViolation::FeeCapTooLow {
                address: address_hex(&tx.from),
                fee_cap: gas_fee_cap,
                base_fee,
            });
        }
    }

    let gas = U256::from(tx.gas_limit);
    let up_front = gas
        .checked_mul(tx.gas_price())
        .ok_or_else(|| insufficient(tx, balance, U256::MAX))?;
    let worst_case = gas
        .checked_mul(tx.gas_fee_cap())
        .and_then(|fee| fee.checked_add(tx.value))
        .ok_or_else(|| insufficient(tx, balance, U256::MAX))?;

    if balance < worst_case {
        return Err(insufficient(tx, balance, worst_case));
    }
    // worst_case >= up_front, so this cannot underflow
    let remaining = balance - up_front;

    let intrinsic = intrinsic_gas(&tx.data, tx.is_contract_creation())?;
    if tx.gas_limit < intrinsic {
        return Err(RuleViolation::IntrinsicGasTooLow {
            have: tx.gas_limit,
            want: intrinsic,
        });
    }

    if !tx.value.is_zero() && remaining < tx.value {
        return Err(RuleViolation::InsufficientFundsForTransfer {
            address: address_hex(&tx.from),
        });
    }

    if tx.is_contract_creation() && tx.data.len() > MAX_INIT_CODE_SIZE {
        return Err(RuleViolation::MaxInitCodeSizeExceeded {
            size: tx.data.len(),
            limit: MAX_INIT_CODE_SIZE,
        });
    }

    Ok(())
}

fn insufficient(tx: &Transaction, have: U256, want: U256) -> RuleViolation {
    RuleViolation::InsufficientFunds {
        address: address_hex(&tx.from),
        have,
        want,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::TxSignature;

    fn legacy(gas_limit: u64, gas_price: u64, value: u64) -> Transaction {
        Transaction {
            from: [1u8; 20],
            to: Some([2u8; 20]),
            nonce: 0,
            gas_limit,
            fee: FeeModel::Legacy {
                gas_price: U256::from(gas_price),
            },
            value: U256::from(value),
            data: vec![],
            signature: TxSignature::default(),
        }
    }

    fn dynamic(fee_cap: u64, tip: u64) -> Transaction {
        Transaction {
            fee: FeeModel::DynamicFee {
                gas_fee_cap: U256::from(fee_cap),
                gas_tip_cap: U256::from(tip),
            },
            ..legacy(21_000, 0, 0)
        }
    }

    #[test]
    fn test_exact_balance_passes_zero_value_transfer() {
        let tx = legacy(21_000, 1, 0);
        assert!(verify_economics(&tx, U256::from(21_000), U256::zero()).is_ok());
    }

    #[test]
    fn test_one_short_fails_with_have_want() {
        let tx = legacy(21_000, 1, 0);
        let err = verify_economics(&tx, U256::from(20_999), U256::zero()).unwrap_err();

        assert_eq!(
            err,
            RuleViolation::InsufficientFunds {
                address: address_hex(&tx.from),
                have: U256::from(20_999),
                want: U256::from(21_000),
            }
        );
        assert!(err.to_string().contains("have 20999 want 21000"));
    }

    #[test]
    fn test_value_counts_toward_worst_case() {
        let tx = legacy(21_000, 1, 500);

        let err = verify_economics(&tx, U256::from(21_000), U256::zero()).unwrap_err();
        assert!(err.to_string().contains("want 21500"));
        assert!(verify_economics(&tx, U256::from(21_500), U256::zero()).is_ok());
    }

    #[test]
    fn test_tip_above_fee_cap_rejected_regardless_of_balance() {
        let tx = dynamic(5, 10);

        let err = verify_economics(&tx, U256::MAX, U256::zero()).unwrap_err();
        assert!(matches!(err, RuleViolation::TipAboveFeeCap { .. }));
    }

    #[test]
    fn test_fee_cap_below_base_fee_rejected() {
        let tx = dynamic(5, 1);

        let err = verify_economics(&tx, U256::MAX, U256::from(7)).unwrap_err();
        assert!(matches!(err, RuleViolation::FeeCapTooLow { .. }));
        assert!(verify_economics(&tx, U256::MAX, U256::zero()).is_ok());
    }

    #[test]
    fn test_dynamic_fee_worst_case_uses_fee_cap() {
        let tx = dynamic(3, 1);

        let err = verify_economics(&tx, U256::from(62_999), U256::zero()).unwrap_err();
        assert!(err.to_string().contains("want 63000"));
    }

    #[test]
    fn test_gas_below_intrinsic_rejected() {
        let mut tx = legacy(21_000, 1, 0);
        tx.data = vec![1, 2, 3];

        let err = verify_economics(&tx, U256::MAX, U256::zero()).unwrap_err();
        assert_eq!(
            err,
            RuleViolation::IntrinsicGasTooLow {
                have: 21_000,
                want: 21_048,
            }
        );
        assert_eq!(err.to_string(), "intrinsic gas too low: have 21000, want 21048");
    }

    #[test]
    fn test_oversized_init_code_rejected() {
        let mut tx = legacy(30_000_000, 0, 0);
        tx.to = None;
        tx.data = vec![1u8; MAX_INIT_CODE_SIZE + 1];

        let err = verify_economics(&tx, U256::MAX, U256::zero()).unwrap_err();
        assert_eq!(
            err,
            RuleViolation::MaxInitCodeSizeExceeded {
                size: MAX_INIT_CODE_SIZE + 1,
                limit: MAX_INIT_CODE_SIZE,
            }
        );
    }

    #[test]
    fn test_overflowing_fee_reported_as_insufficient_funds() {
        let mut tx = legacy(u64::MAX, 0, 0);
        tx.fee = FeeModel::Legacy {
            gas_price: U256::MAX,
        };

        let err = verify_economics(&tx, U256::MAX, U256::zero()).unwrap_err();
        assert!(matches!(err, RuleViolation::InsufficientFunds { .. }));
    }
}
