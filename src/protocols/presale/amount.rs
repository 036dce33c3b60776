//! Fixed-scale amounts for the two denominations a presale deals in.
//!
//! Native-currency values (deposits, caps, raised amount) always carry 18
//! decimals. Token values (sold amount, allocations, supply) carry the sale
//! token's own decimal count. They are separate types so a token amount can
//! never be formatted, compared or submitted with the native scale.

use crate::error::Error;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places of every native-currency amount (wei scale)
pub const NATIVE_DECIMALS: u8 = 18;

/// Largest decimal count whose scale factor still fits in a U256
pub const MAX_DECIMALS: u8 = 77;

/// Amount of the chain's native currency, stored in base units (10^-18)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NativeAmount(U256);

impl NativeAmount {
    pub const ZERO: Self = Self(U256::ZERO);

    /// Wrap a raw on-chain value that is already in base units
    pub fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// Parse a human decimal string such as `"2.5"` into base units
    pub fn parse(input: &str) -> Result<Self, Error> {
        parse_units(input, NATIVE_DECIMALS).map(Self)
    }

    /// Raw value in base units, as submitted on-chain
    pub fn raw(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Native cost of one whole token given a rate of `rate` tokens per native unit.
    ///
    /// Returns `None` for a zero rate.
    pub fn per_token_at_rate(rate: U256) -> Option<Self> {
        if rate.is_zero() {
            return None;
        }
        Some(Self(scale_factor(NATIVE_DECIMALS) / rate))
    }
}

impl fmt::Display for NativeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_units(self.0, NATIVE_DECIMALS))
    }
}

/// Amount of the sale token, tagged with the token's decimal count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAmount {
    raw: U256,
    decimals: u8,
}

impl TokenAmount {
    /// Wrap a raw on-chain value scaled by `decimals`
    pub fn new(raw: U256, decimals: u8) -> Result<Self, Error> {
        check_decimals(decimals)?;
        Ok(Self { raw, decimals })
    }

    /// Parse a human decimal string at the token's scale
    pub fn parse(input: &str, decimals: u8) -> Result<Self, Error> {
        check_decimals(decimals)?;
        let raw = parse_units(input, decimals)?;
        Ok(Self { raw, decimals })
    }

    pub fn raw(&self) -> U256 {
        self.raw
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Add two amounts of the same token; differing scales are rejected
    pub fn checked_add(&self, other: &Self) -> Result<Self, Error> {
        if self.decimals != other.decimals {
            return Err(Error::Units(format!(
                "cannot add token amounts with {} and {} decimals",
                self.decimals, other.decimals
            )));
        }
        let raw = self
            .raw
            .checked_add(other.raw)
            .ok_or_else(|| Error::Units("token amount overflow".to_string()))?;
        Ok(Self {
            raw,
            decimals: self.decimals,
        })
    }

    /// `percent`% of this amount, truncated toward zero, same scale
    pub fn percent(&self, percent: u64) -> Self {
        Self {
            raw: self.raw / U256::from(100u64) * U256::from(percent)
                + self.raw % U256::from(100u64) * U256::from(percent) / U256::from(100u64),
            decimals: self.decimals,
        }
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_units(self.raw, self.decimals))
    }
}

fn check_decimals(decimals: u8) -> Result<(), Error> {
    if decimals > MAX_DECIMALS {
        return Err(Error::Units(format!(
            "{} decimals exceeds the maximum of {}",
            decimals, MAX_DECIMALS
        )));
    }
    Ok(())
}

fn scale_factor(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

/// Convert a decimal string into base units at `decimals` precision.
///
/// Rejects signs, exponents, empty input and fractional digits beyond the
/// scale rather than truncating them.
pub fn parse_units(input: &str, decimals: u8) -> Result<U256, Error> {
    check_decimals(decimals)?;
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::InvalidAmount("amount is empty".to_string()));
    }
    if input.starts_with('-') {
        return Err(Error::InvalidAmount(format!("negative amount: {}", input)));
    }

    let (integer_part, fraction_part) = match input.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (input, ""),
    };

    if integer_part.is_empty() && fraction_part.is_empty() {
        return Err(Error::InvalidAmount(format!("not a number: {}", input)));
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(integer_part) || !all_digits(fraction_part) {
        return Err(Error::InvalidAmount(format!("not a number: {}", input)));
    }
    if fraction_part.len() > decimals as usize {
        return Err(Error::InvalidAmount(format!(
            "{} has more than {} decimal places",
            input, decimals
        )));
    }

    let parse_digits = |s: &str| -> Result<U256, Error> {
        if s.is_empty() {
            return Ok(U256::ZERO);
        }
        U256::from_str_radix(s, 10)
            .map_err(|e| Error::InvalidAmount(format!("{}: {}", input, e)))
    };

    let overflow = || Error::InvalidAmount(format!("amount too large: {}", input));
    let whole = parse_digits(integer_part)?
        .checked_mul(scale_factor(decimals))
        .ok_or_else(overflow)?;
    let fraction = parse_digits(fraction_part)?
        .checked_mul(scale_factor(decimals - fraction_part.len() as u8))
        .ok_or_else(overflow)?;

    whole.checked_add(fraction).ok_or_else(overflow)
}

/// Render base units as a decimal string, trimming trailing fractional zeros
/// but always keeping one fractional digit (`"1.0"`, `"2.5"`).
pub fn format_units(raw: U256, decimals: u8) -> String {
    let digits = raw.to_string();
    if decimals == 0 {
        return digits;
    }

    let decimals = decimals as usize;
    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };

    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, fraction)
    }
}
