//! Intrinsic gas: the cost a transaction pays before any execution.

use super::errors::RuleViolation;

/// Base cost of a call or transfer.
pub const TX_GAS: u64 = 21_000;
/// Base cost of a contract creation.
pub const TX_GAS_CONTRACT_CREATION: u64 = 53_000;
/// Per zero byte of payload.
pub const TX_DATA_ZERO_GAS: u64 = 4;
/// Per non-zero byte of payload.
pub const TX_DATA_NON_ZERO_GAS: u64 = 16;
/// Per 32-byte word of init code (EIP-3860).
pub const INIT_CODE_WORD_GAS: u64 = 2;
/// Largest init code a creation may carry (EIP-3860).
pub const MAX_INIT_CODE_SIZE: usize = 2 * 24_576;

/// Gas charged for `data` before execution starts.
pub fn intrinsic_gas(data: &[u8], is_contract_creation: bool) -> Result<u64, RuleViolation> {
    let mut gas = if is_contract_creation {
        TX_GAS_CONTRACT_CREATION
    } else {
        TX_GAS
    };

    if data.is_empty() {
        return Ok(gas);
    }

    let non_zero = data.iter().filter(|b| **b != 0).count() as u64;
    let zero = data.len() as u64 - non_zero;

    gas = non_zero
        .checked_mul(TX_DATA_NON_ZERO_GAS)
        .and_then(|cost| gas.checked_add(cost))
        .ok_or(RuleViolation::GasUintOverflow)?;
    gas = zero
        .checked_mul(TX_DATA_ZERO_GAS)
        .and_then(|cost| gas.checked_add(cost))
        .ok_or(RuleViolation::GasUintOverflow)?;

    if is_contract_creation {
        let words = (data.len() as u64).div_ceil(32);
        gas = words
            .checked_mul(INIT_CODE_WORD_GAS)
            .and_then(|cost| gas.checked_add(cost))
            .ok_or(RuleViolation::GasUintOverflow)?;
    }

    Ok(gas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_transfer() {
        assert_eq!(intrinsic_gas(&[], false).unwrap(), 21_000);
    }

    #[test]
    fn test_empty_creation() {
        assert_eq!(intrinsic_gas(&[], true).unwrap(), 53_000);
    }

    #[test]
    fn test_payload_bytes_priced_by_value() {
        // two zero bytes, three non-zero bytes
        let data = [0, 1, 0, 2, 3];
        assert_eq!(intrinsic_gas(&data, false).unwrap(), 21_000 + 2 * 4 + 3 * 16);
    }

    #[test]
    fn test_creation_charges_init_code_words() {
        // 33 non-zero bytes -> 2 words
        let data = [1u8; 33];
        assert_eq!(
            intrinsic_gas(&data, true).unwrap(),
            53_000 + 33 * 16 + 2 * INIT_CODE_WORD_GAS
        );
    }
}
