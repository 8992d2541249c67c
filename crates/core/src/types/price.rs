//! Money amounts in minor currency units and derived discount values.
//!
//! The product API reports prices as integer cents. Display and percentage
//! math go through `rust_decimal` so that rounding is exact and predictable.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An amount of money in the smallest currency unit (cents).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MinorUnits(u64);

impl MinorUnits {
    /// Zero cents.
    pub const ZERO: Self = Self(0);

    /// Create an amount from cents.
    #[must_use]
    pub const fn new(cents: u64) -> Self {
        Self(cents)
    }

    /// Get the amount in cents.
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Returns `self - other`, or `None` if that would go below zero.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Amount in major units (dollars) as an exact decimal.
    #[must_use]
    pub fn to_major(self) -> Decimal {
        Decimal::from(self.0) / Decimal::ONE_HUNDRED
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.to_major())
    }
}

impl Add for MinorUnits {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Mul<u32> for MinorUnits {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0.saturating_mul(u64::from(rhs)))
    }
}

impl Sum for MinorUnits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Savings of an offer price over the maximum retail price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discount {
    /// `mrp - offer_price`.
    pub amount: MinorUnits,
    /// Percentage of `mrp`, rounded to one decimal place.
    pub percentage: Decimal,
}

impl Discount {
    /// Compute the discount of `offer_price` relative to `mrp`.
    ///
    /// Returns `None` when `mrp` is zero or the offer price exceeds it.
    #[must_use]
    pub fn between(mrp: MinorUnits, offer_price: MinorUnits) -> Option<Self> {
        if mrp == MinorUnits::ZERO {
            return None;
        }
        let amount = mrp.checked_sub(offer_price)?;
        let ratio = Decimal::from(amount.cents()) / Decimal::from(mrp.cents());
        let percentage = (ratio * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);

        Some(Self { amount, percentage })
    }

    /// Percentage formatted with exactly one decimal place, e.g. `"66.7"`.
    #[must_use]
    pub fn percentage_label(&self) -> String {
        format!("{:.1}", self.percentage)
    }
}
