//! Monetary amounts as exact minor units.
//!
//! Balances and transaction amounts are stored as an `i64` count of minor
//! units (cents, scale 2). Arithmetic is always checked; the wire shape is a
//! plain two-decimal number for compatibility with existing clients.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DomainError, DomainResult};

/// Exact currency amount, scale 2.
///
/// `Money` is a value: compared, copied and ordered by its cent count.
/// Negative values are representable (differences, deltas) but balances and
/// transaction amounts are validated non-negative/positive at their
/// construction boundaries.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Parse a major-unit decimal amount (e.g. `50.0`, `19.99`) into cents.
    ///
    /// Rejects non-finite values and values outside the representable range.
    /// Sub-cent precision is rounded to the nearest cent.
    pub fn from_major(amount: f64) -> DomainResult<Self> {
        if !amount.is_finite() {
            return Err(DomainError::validation("amount must be a finite number"));
        }
        let cents = (amount * 100.0).round();
        if cents.abs() > i64::MAX as f64 / 2.0 {
            return Err(DomainError::overflow(format!("{amount} is not representable")));
        }
        Ok(Self(cents as i64))
    }

    /// Major-unit view of the amount (two-decimal precision).
    pub fn as_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::overflow(format!("{self} + {other}")))
    }

    pub fn checked_sub(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_sub(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::overflow(format!("{self} - {other}")))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

// Serialize as a decimal number so the external JSON contract stays a plain
// `amount: 50.0` field; deserialization round-trips through `from_major`.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_major())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Money::from_major(raw).map_err(serde::de::Error::custom)
    }
}
