//! # Money
//!
//! Monetary amounts as integer cents. Financial values are never
//! represented as floating-point numbers anywhere in the stack: JSON
//! carries decimal strings (`"1500.00"`), the database carries integer
//! cents, and arithmetic is checked so overflow surfaces as an error
//! instead of wrapping.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// A monetary amount in integer cents (USD).
///
/// Construct via [`Money::from_cents`] or [`Money::parse`]. Arithmetic is
/// checked: [`Money::checked_add`] and [`Money::checked_sub`] return
/// [`ValidationError::AmountOverflow`] on overflow.
///
/// Serializes to a canonical decimal string (`"1500.00"`, `"-25.50"`) and
/// accepts both `"1500"` and `"1500.5"` forms on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// The zero amount.
    pub const ZERO: Money = Money(0);

    /// Create an amount from integer cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount in integer cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Parse a decimal string (`"1500"`, `"1500.5"`, `"-25.00"`) into an
    /// amount.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAmount`] if the string is empty,
    /// contains non-numeric characters, or carries more than two decimal
    /// places.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        let invalid = || ValidationError::InvalidAmount(s.to_string());

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if digits.is_empty() {
            return Err(invalid());
        }

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || frac.len() > 2 {
            return Err(invalid());
        }
        if !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        // All characters are digits at this point, so a parse failure on a
        // non-empty whole part can only mean the value exceeds i64.
        let whole_cents = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<i64>()
                .map_err(|_| ValidationError::AmountOverflow)?
                .checked_mul(100)
                .ok_or(ValidationError::AmountOverflow)?
        };
        // "1500.5" means 50 cents, not 5.
        let frac_cents = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac.parse::<i64>().map_err(|_| invalid())?,
        };

        let cents = whole_cents
            .checked_add(frac_cents)
            .ok_or(ValidationError::AmountOverflow)?;
        Ok(Self(if negative { -cents } else { cents }))
    }

    /// Canonical decimal-string form with exactly two decimal places.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }

    /// Checked addition.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::AmountOverflow`] on overflow.
    pub fn checked_add(self, other: Money) -> Result<Money, ValidationError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or(ValidationError::AmountOverflow)
    }

    /// Checked subtraction.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::AmountOverflow`] on overflow.
    pub fn checked_sub(self, other: Money) -> Result<Money, ValidationError> {
        self.0
            .checked_sub(other.0)
            .map(Money)
            .ok_or(ValidationError::AmountOverflow)
    }

    /// Whether the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Whether the amount is strictly less than zero.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Whether the amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Money::parse(&s).map_err(D::Error::custom)
    }
}
