//! Fixed-point atomic USD amounts.
//!
//! Monetary fields arrive from the settlement program as integers scaled by
//! 10^6. All accumulation and fee arithmetic stays in this integer form;
//! rust_decimal is used only to render canonical display strings without
//! exponent notation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places of the atomic USD unit.
pub const USD_DECIMALS: u32 = 6;

/// Scale factor of the atomic USD unit (10^6).
pub const USD_SCALE: u64 = 1_000_000;

/// Unsigned atomic USD amount (6 decimals).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Usd(pub u64);

impl Usd {
    /// Create from a raw atomic-unit integer.
    pub fn from_raw(raw: u64) -> Self {
        Usd(raw)
    }

    /// Create from a whole-dollar amount.
    pub fn from_dollars(dollars: u64) -> Self {
        Usd(dollars * USD_SCALE)
    }

    /// The underlying atomic-unit integer.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// The additive identity.
    pub fn zero() -> Self {
        Usd(0)
    }

    /// Returns true if the amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Convert to a rust_decimal value at the correct scale.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(self.0 as i128, USD_DECIMALS)
    }

    /// Canonical display string, trailing zeros trimmed, no exponent.
    pub fn to_display(&self) -> String {
        format!("{}", self.to_decimal().normalize())
    }

    /// Saturating subtraction; amounts never go negative.
    pub fn saturating_sub(&self, rhs: Usd) -> Usd {
        Usd(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display())
    }
}

impl std::ops::Add for Usd {
    type Output = Usd;

    fn add(self, rhs: Usd) -> Usd {
        Usd(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Usd {
    fn add_assign(&mut self, rhs: Usd) {
        self.0 += rhs.0;
    }
}

/// Signed atomic USD amount (6 decimals), used for PnL and funding deltas.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct UsdDelta(pub i64);

impl UsdDelta {
    /// Create from a raw atomic-unit integer.
    pub fn from_raw(raw: i64) -> Self {
        UsdDelta(raw)
    }

    /// Build from the wire form: unsigned magnitude plus a profit flag.
    pub fn from_parts(magnitude: u64, is_profit: bool) -> Self {
        let raw = magnitude as i64;
        UsdDelta(if is_profit { raw } else { -raw })
    }

    /// The underlying atomic-unit integer.
    pub fn raw(&self) -> i64 {
        self.0
    }

    /// The additive identity.
    pub fn zero() -> Self {
        UsdDelta(0)
    }

    /// Returns true if the amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is > 0.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Convert to a rust_decimal value at the correct scale.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(self.0 as i128, USD_DECIMALS)
    }

    /// Canonical display string, trailing zeros trimmed, no exponent.
    pub fn to_display(&self) -> String {
        format!("{}", self.to_decimal().normalize())
    }
}

impl fmt::Display for UsdDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display())
    }
}

impl std::ops::Add for UsdDelta {
    type Output = UsdDelta;

    fn add(self, rhs: UsdDelta) -> UsdDelta {
        UsdDelta(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for UsdDelta {
    fn add_assign(&mut self, rhs: UsdDelta) {
        self.0 += rhs.0;
    }
}

impl std::ops::Neg for UsdDelta {
    type Output = UsdDelta;

    fn neg(self) -> UsdDelta {
        UsdDelta(-self.0)
    }
}
