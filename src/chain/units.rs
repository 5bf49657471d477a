//! Wei amounts and their decimal renderings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chain::error::ChainError;

pub const ETHER_DECIMALS: u32 = 18;
pub const GWEI_DECIMALS: u32 = 9;
pub const ONE_GWEI: Wei = Wei(1_000_000_000);

/// An amount in wei. `u128` covers every realistic balance and fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Wei(pub u128);

impl Wei {
    pub fn checked_mul(self, rhs: u128) -> Option<Wei> {
        self.0.checked_mul(rhs).map(Wei)
    }

    pub fn checked_add(self, rhs: Wei) -> Option<Wei> {
        self.0.checked_add(rhs.0).map(Wei)
    }

    pub fn to_hex(self) -> String {
        format!("{:#x}", self.0)
    }

    pub fn to_ether_string(self) -> String {
        format_units(self.0, ETHER_DECIMALS)
    }

    pub fn to_gwei_string(self) -> String {
        format_units(self.0, GWEI_DECIMALS)
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Render `value / 10^decimals` with trailing zeros trimmed, keeping at
/// least one fractional digit (`1.0`, `0.5`, `0.000000001`).
pub fn format_units(value: u128, decimals: u32) -> String {
    if decimals == 0 {
        return format!("{value}.0");
    }
    let base = 10u128.pow(decimals);
    let whole = value / base;
    let frac = value % base;
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    let frac = frac.trim_end_matches('0');
    let frac = if frac.is_empty() { "0" } else { frac };
    format!("{whole}.{frac}")
}

/// Parse a decimal amount with at most `decimals` fractional digits.
pub fn parse_units(amount: &str, decimals: u32) -> Result<u128, ChainError> {
    let invalid = |reason: &str| ChainError::InvalidAmount {
        amount: amount.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(invalid("amount is empty"));
    }
    if trimmed.starts_with('-') {
        return Err(invalid("amount must not be negative"));
    }

    let (whole, frac) = match trimmed.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (trimmed, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid("amount has no digits"));
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid("amount must be a decimal number"));
    }
    if frac.len() > decimals as usize {
        return Err(invalid(&format!("more than {decimals} decimal places")));
    }

    let base = 10u128.pow(decimals);
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid("amount is too large"))?
    };
    let frac: u128 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = decimals as usize);
        padded.parse().map_err(|_| invalid("amount is too large"))?
    };

    whole
        .checked_mul(base)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(|| invalid("amount is too large"))
}

pub fn parse_ether(amount: &str) -> Result<Wei, ChainError> {
    parse_units(amount, ETHER_DECIMALS).map(Wei)
}

pub fn parse_gwei(amount: &str) -> Result<Wei, ChainError> {
    parse_units(amount, GWEI_DECIMALS).map(Wei)
}

/// Parse a JSON-RPC hex quantity (`0x1a`).
pub fn parse_quantity(hex: &str) -> Result<u128, ChainError> {
    let digits = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .ok_or_else(|| ChainError::InvalidResponse(format!("expected hex quantity, got '{hex}'")))?;
    if digits.is_empty() {
        return Err(ChainError::InvalidResponse(format!("empty hex quantity '{hex}'")));
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| ChainError::InvalidResponse(format!("bad hex quantity '{hex}': {e}")))
}
