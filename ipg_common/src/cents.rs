use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const KES_CURRENCY_CODE: &str = "KES";
pub const KES_CURRENCY_CODE_LOWER: &str = "kes";

//--------------------------------------       Cents         ---------------------------------------------------------
/// A monetary amount in minor units (cents). All amount arithmetic and comparisons in the gateway
/// happen in minor units so that decimal gateway strings never reach floating point.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);
op!(inplace Cents, SubAssign, sub_assign);
op!(unary Cents, Neg, neg);

impl Mul<i64> for Cents {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Cents {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Cents {}

impl TryFrom<u64> for Cents {
    type Error = CentsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(CentsConversionError(format!("Value {value} is too large to convert to Cents")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl FromStr for Cents {
    type Err = CentsConversionError;

    /// Parses a decimal amount string as supplied by the gateway ("100.00", "99.5", "250") into
    /// minor units. At most two fractional digits are allowed and negative amounts are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CentsConversionError("Empty amount string".to_string()));
        }
        if s.starts_with('-') {
            return Err(CentsConversionError(format!("Negative amount: {s}")));
        }
        let (units, frac) = match s.split_once('.') {
            Some((u, f)) => (u, f),
            None => (s, ""),
        };
        if frac.len() > 2 {
            return Err(CentsConversionError(format!("Too many fractional digits in amount: {s}")));
        }
        // i64::parse would accept a sign here, turning "1.-5" into 0.95
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CentsConversionError(format!("Fractional part must be digits in amount: {s}")));
        }
        let units =
            units.parse::<i64>().map_err(|e| CentsConversionError(format!("Invalid amount {s}: {e}")))?;
        let frac = match frac {
            "" => 0,
            f => {
                let f = f.parse::<i64>().map_err(|e| CentsConversionError(format!("Invalid amount {s}: {e}")))?;
                if frac.len() == 1 {
                    f * 10
                } else {
                    f
                }
            },
        };
        units
            .checked_mul(100)
            .and_then(|u| u.checked_add(frac))
            .map(Self)
            .ok_or_else(|| CentsConversionError(format!("Amount overflows minor units: {s}")))
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, (self.0 % 100).abs())
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_whole(units: i64) -> Self {
        Self(units * 100)
    }

    /// The amount formatted the way the gateway expects it in signed fields: integer minor units.
    pub fn to_minor_string(&self) -> String {
        self.0.to_string()
    }
}
