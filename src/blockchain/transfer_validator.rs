use alloy::primitives::{Address, U256};

use crate::error::{GatewayError, ValidationError};
use crate::models::{TransferRequest, ValidatedTransfer};

/// Decimal places of the native asset (1 ETH = 10^18 wei)
pub const ETH_DECIMALS: usize = 18;

/// Checks field presence, then the address, then the amount.
///
/// Nothing here touches the chain, so a rejected request never reaches the node.
pub fn validate_transfer(request: &TransferRequest) -> Result<ValidatedTransfer, GatewayError> {
    let (to, amount_eth) = request.required_fields()?;
    let to = validate_address(to)?;
    let value_wei = parse_ether_to_wei(amount_eth)?;

    Ok(ValidatedTransfer { to, value_wei })
}

/// Accepts exactly `0x` followed by 40 hex digits (any case, no checksum test)
pub fn validate_address(address: &str) -> Result<Address, ValidationError> {
    let hex_body = address.strip_prefix("0x").ok_or(ValidationError::InvalidAddress)?;

    if hex_body.len() != 40 || !hex_body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidAddress);
    }

    address.parse().map_err(|_| ValidationError::InvalidAddress)
}

/// Exact fixed-point conversion of a decimal ETH amount to wei.
///
/// Accepts plain decimal notation only (`"1"`, `"0.01"`, `".5"`). Zero,
/// signs, exponents, `NaN`/`Infinity` and more than 18 significant fractional
/// digits are rejected, as is surrounding whitespace. Trailing fractional
/// zeros carry no precision and are ignored.
pub fn parse_ether_to_wei(amount: &str) -> Result<U256, ValidationError> {
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));

    if whole.is_empty() && fraction.is_empty() {
        return Err(ValidationError::InvalidAmount);
    }
    if !is_digits(whole) || !is_digits(fraction) {
        return Err(ValidationError::InvalidAmount);
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > ETH_DECIMALS {
        return Err(ValidationError::InvalidAmount);
    }

    let whole_wei = parse_decimal(whole)?
        .checked_mul(wei_per_eth())
        .ok_or(ValidationError::InvalidAmount)?;

    let scale = U256::from(10u64.pow((ETH_DECIMALS - fraction.len()) as u32));
    let fraction_wei = parse_decimal(fraction)?
        .checked_mul(scale)
        .ok_or(ValidationError::InvalidAmount)?;

    let wei = whole_wei
        .checked_add(fraction_wei)
        .ok_or(ValidationError::InvalidAmount)?;

    if wei.is_zero() {
        return Err(ValidationError::InvalidAmount);
    }

    Ok(wei)
}

fn wei_per_eth() -> U256 {
    U256::from(10u64.pow(ETH_DECIMALS as u32))
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_decimal(digits: &str) -> Result<U256, ValidationError> {
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10).map_err(|_| ValidationError::InvalidAmount)
}
