//! Fixed-point token amounts with 6 decimal places.
//!
//! User input arrives as a decimal string that may carry thousand separators
//! (`"1,234.56"`). It is parsed with [`rust_decimal`] and stored as an integer
//! count of micro-units.

use alloy_primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of decimal places carried by [`Amount`].
pub const AMOUNT_DECIMALS: u32 = 6;

const SCALE: u64 = 10u64.pow(AMOUNT_DECIMALS);

/// Errors produced while parsing or converting amounts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// The input is not a decimal number.
    #[error("invalid amount {0:?}")]
    Invalid(String),
    /// Negative amounts are never valid.
    #[error("amount must not be negative")]
    Negative,
    /// More fractional digits than the fixed-point scale allows.
    #[error("amount has more than {AMOUNT_DECIMALS} decimal places")]
    TooPrecise,
    /// The value does not fit in the fixed-point representation.
    #[error("amount is too large")]
    Overflow,
    /// Converting to fewer local decimals would drop non-zero digits.
    #[error("amount {amount} is not representable with {decimals} decimals")]
    Unrepresentable {
        /// The amount being converted.
        amount: Amount,
        /// Target decimals.
        decimals: u8,
    },
}

/// A token quantity in micro-units (10^-6).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from raw micro-units.
    #[must_use]
    pub const fn from_micro(micro: u64) -> Self {
        Self(micro)
    }

    /// Raw micro-units.
    #[must_use]
    pub const fn micro(&self) -> u64 {
        self.0
    }

    /// Whether this amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Converts to a token's local units.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::Unrepresentable`] when `decimals < 6` and the
    /// dropped digits are non-zero.
    pub fn to_local_units(self, decimals: u8) -> Result<U256, AmountError> {
        let micro = U256::from(self.0);
        let decimals_u32 = u32::from(decimals);
        if decimals_u32 >= AMOUNT_DECIMALS {
            let factor = U256::from(10u64).pow(U256::from(decimals_u32 - AMOUNT_DECIMALS));
            return micro.checked_mul(factor).ok_or(AmountError::Overflow);
        }
        let divisor = U256::from(10u64).pow(U256::from(AMOUNT_DECIMALS - decimals_u32));
        if micro % divisor != U256::ZERO {
            return Err(AmountError::Unrepresentable {
                amount: self,
                decimals,
            });
        }
        Ok(micro / divisor)
    }

    /// Converts from a token's local units, truncating extra precision and
    /// saturating at `u64::MAX` micro-units.
    #[must_use]
    pub fn from_local_units(value: U256, decimals: u8) -> Self {
        let decimals_u32 = u32::from(decimals);
        let micro = if decimals_u32 >= AMOUNT_DECIMALS {
            value / U256::from(10u64).pow(U256::from(decimals_u32 - AMOUNT_DECIMALS))
        } else {
            value.saturating_mul(U256::from(10u64).pow(U256::from(AMOUNT_DECIMALS - decimals_u32)))
        };
        Self(u64::try_from(micro).unwrap_or(u64::MAX))
    }
}

impl From<u64> for Amount {
    fn from(micro: u64) -> Self {
        Self(micro)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE;
        let frac = self.0 % SCALE;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let frac = format!("{frac:06}");
        write!(f, "{whole}.{}", frac.trim_end_matches('0'))
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_amount(s)
    }
}

/// Parses a user-entered amount into micro-units.
///
/// Thousand separators are stripped and an empty input is zero.
///
/// # Errors
///
/// Returns an [`AmountError`] if the input is not a non-negative decimal
/// with at most 6 fractional digits that fits in `u64` micro-units.
pub fn parse_amount(input: &str) -> Result<Amount, AmountError> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Ok(Amount::ZERO);
    }
    let value =
        Decimal::from_str(&cleaned).map_err(|_| AmountError::Invalid(input.to_owned()))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AmountError::Negative);
    }
    let value = value.normalize();
    if value.scale() > AMOUNT_DECIMALS {
        return Err(AmountError::TooPrecise);
    }
    let scaled = value
        .checked_mul(Decimal::from(SCALE))
        .ok_or(AmountError::Overflow)?;
    let micro = u64::try_from(scaled.trunc()).map_err(|_| AmountError::Overflow)?;
    Ok(Amount(micro))
}
