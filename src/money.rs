//! Monetary amounts in integer pence.
//!
//! All arithmetic happens on whole minor units. `rust_decimal` is only used at
//! the text boundary, to render two-decimal pound amounts.

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// An amount of money in pence.
///
/// # Examples
///
/// ```
/// use transit_billing::Pence;
///
/// let fare = Pence::new(200) + Pence::new(80) + Pence::new(80);
/// assert_eq!(fare.to_string(), "3.60");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pence(i64);

impl Pence {
    /// Number of decimal places used when rendering.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Pence(0);

    /// Creates an amount from a count of pence.
    pub const fn new(pence: i64) -> Self {
        Pence(pence)
    }

    /// Returns the raw number of pence.
    pub const fn as_pence(self) -> i64 {
        self.0
    }

    /// Returns how much of `self` remains after `spent`, never below zero.
    pub fn saturating_headroom(self, spent: Pence) -> Pence {
        Pence((self.0 - spent.0).max(0))
    }

    fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, Self::SCALE)
    }
}

impl fmt::Display for Pence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.to_decimal())
    }
}

impl Add for Pence {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Pence(self.0 + rhs.0)
    }
}

impl AddAssign for Pence {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Pence {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Pence::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Pence> for Pence {
    fn sum<I: Iterator<Item = &'a Pence>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Pence {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
