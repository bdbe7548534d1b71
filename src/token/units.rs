//! Human amount <-> base unit conversion
//!
//! Amounts are `Decimal` so that anything with at most `decimals` fractional
//! digits survives a round trip exactly.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::registry::TokenInfo;
use crate::error::{Error, Result};

/// 10^decimals as a Decimal
fn scale_factor(decimals: u32) -> Result<Decimal> {
    10u64
        .checked_pow(decimals)
        .map(Decimal::from)
        .ok_or_else(|| Error::InvalidAmount(format!("Unsupported precision: {}", decimals)))
}

/// Convert a human amount (e.g. 1.5 USDG) to base units (1_500_000).
///
/// Digits beyond the token's precision are truncated toward zero.
pub fn to_base_units(info: &TokenInfo, amount: Decimal) -> Result<u128> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::InvalidAmount(format!(
            "{} {} is negative",
            amount, info.symbol
        )));
    }

    let scaled = amount
        .checked_mul(scale_factor(info.decimals)?)
        .ok_or_else(|| Error::InvalidAmount(format!("{} {} is too large", amount, info.symbol)))?;

    scaled
        .trunc()
        .to_u128()
        .ok_or_else(|| Error::InvalidAmount(format!("{} {} is not representable", amount, info.symbol)))
}

/// Convert base units back to a human amount. Exact inverse of `to_base_units`.
pub fn from_base_units(info: &TokenInfo, amount: u128) -> Result<Decimal> {
    let raw = i128::try_from(amount)
        .map_err(|_| Error::InvalidAmount(format!("{} base units overflow", amount)))?;

    Decimal::try_from_i128_with_scale(raw, info.decimals)
        .map(|d| d.normalize())
        .map_err(|e| Error::InvalidAmount(format!("{} base units of {}: {}", amount, info.symbol, e)))
}

/// `to_base_units` narrowed to the u64 amounts Solana instructions carry
pub fn to_base_units_u64(info: &TokenInfo, amount: Decimal) -> Result<u64> {
    let units = to_base_units(info, amount)?;
    u64::try_from(units).map_err(|_| {
        Error::InvalidAmount(format!("{} {} exceeds u64 base units", amount, info.symbol))
    })
}
