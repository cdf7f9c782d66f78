use std::{
    fmt::Display,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const SHOP_CURRENCY_CODE: &str = "VND";

/// The number of minor units in one đồng. The payment gateway expects amounts in these units.
const MINOR_UNITS_PER_VND: i64 = 100;

//--------------------------------------        Money         ---------------------------------------------------------
/// A fixed-point monetary value, stored as an integer number of minor units (1/100 VND).
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a monetary amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {value} is too large to convert to Money")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        let whole = abs / MINOR_UNITS_PER_VND;
        let fraction = abs % MINOR_UNITS_PER_VND;
        if fraction == 0 {
            write!(f, "{sign}{whole}₫")
        } else {
            write!(f, "{sign}{whole}.{fraction:02}₫")
        }
    }
}

impl Money {
    /// The amount in minor units.
    pub fn value(&self) -> i64 {
        self.0
    }

    pub const fn from_minor_units(value: i64) -> Self {
        Self(value)
    }

    pub fn from_vnd(vnd: i64) -> Self {
        Self(vnd * MINOR_UNITS_PER_VND)
    }

    /// The amount in whole đồng, truncating any fractional part.
    pub fn whole_vnd(&self) -> i64 {
        self.0 / MINOR_UNITS_PER_VND
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// The absolute difference between two amounts.
    pub fn abs_diff(&self, other: Money) -> Money {
        Self((self.0 - other.0).abs())
    }

    /// `None` if the sum does not fit.
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Self)
    }

    /// `None` if the product does not fit.
    pub fn checked_mul(self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Self)
    }
}
