//! Amount type for monetary values expressed in milliunits.
//!
//! The Budgeting API reports every amount as an integer number of thousandths of the budget's
//! currency unit, so `-12340` is an outflow of 12.34. Negative amounts are expenses.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// The number of milliunits in one currency unit.
const MILLIUNITS_PER_UNIT: i64 = 1000;

/// Represents an amount of money in milliunits.
///
/// # Examples
///
/// ```
/// # use ynab_trends::Milliunits;
/// let coffee = Milliunits::new(-4500);
/// assert!(coffee.is_expense());
/// assert_eq!(coffee.abs(), Milliunits::new(4500));
/// assert_eq!(coffee.to_string(), "-4.50");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Milliunits(i64);

impl Milliunits {
    pub const ZERO: Milliunits = Milliunits(0);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw milliunit value.
    pub const fn value(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is strictly negative, i.e. money leaving the budget.
    pub const fn is_expense(&self) -> bool {
        self.0 < 0
    }

    pub const fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Returns the amount as a `Decimal` in milliunits.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }

    /// Returns the amount converted to currency units, e.g. `-12340` becomes `-12.34`.
    pub fn to_units(&self) -> Decimal {
        Decimal::new(self.0, 3)
    }
}

impl From<i64> for Milliunits {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Add for Milliunits {
    type Output = Milliunits;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Milliunits {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Milliunits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Milliunits::ZERO, Add::add)
    }
}

impl fmt::Display for Milliunits {
    /// Formats the amount in currency units with thousands separators, e.g. `-1,234.50`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_milliunits(self.to_decimal()))
    }
}

/// Formats a (possibly fractional) milliunit value in currency units, e.g. `200500` -> `200.50`.
pub fn format_milliunits(value: Decimal) -> String {
    let units = value / Decimal::from(MILLIUNITS_PER_UNIT);
    let sign = if units.is_sign_negative() && !units.is_zero() {
        "-"
    } else {
        ""
    };
    let num = units.abs().round_dp(2).to_f64().unwrap_or_default();
    format!("{sign}{}", format_num::format_num!(",.2", num))
}
