// Fixed-point recipe price: at most 5 digits, 2 of them after the decimal point

use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

const MAX_INTEGER_DIGITS: usize = 3;
const DECIMAL_PLACES: usize = 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("A valid number is required.")]
    Invalid,

    #[error("Ensure this value is greater than or equal to 0.")]
    Negative,

    #[error("Ensure that there are no more than 3 digits before the decimal point.")]
    TooManyDigits,

    #[error("Ensure that there are no more than 2 decimal places.")]
    TooManyDecimalPlaces,
}

/// Stored as whole cents; rendered as `"5.25"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price {
    cents: i64,
}

impl Price {
    pub const MAX_CENTS: i64 = 99_999;

    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        if cents < 0 {
            return Err(PriceError::Negative);
        }
        if cents > Self::MAX_CENTS {
            return Err(PriceError::TooManyDigits);
        }
        Ok(Self { cents })
    }

    pub fn cents(self) -> i64 {
        self.cents
    }

    /// Reads a price from a JSON number or decimal string
    pub fn from_json(value: &Value) -> Result<Self, PriceError> {
        match value {
            Value::String(raw) => raw.parse(),
            // Display yields the shortest round-trip form, e.g. 7.29 -> "7.29"
            Value::Number(number) if number.as_f64().is_some_and(f64::is_finite) => {
                number.to_string().parse()
            }
            _ => Err(PriceError::Invalid),
        }
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw: &str = raw.trim();
        let (negative, unsigned) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };

        let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if integer.is_empty() && fraction.is_empty() {
            return Err(PriceError::Invalid);
        }
        if !integer.chars().chain(fraction.chars()).all(|c: char| c.is_ascii_digit()) {
            return Err(PriceError::Invalid);
        }

        // Trailing zeros in the fraction do not count as decimal places
        let fraction: &str = fraction.trim_end_matches('0');
        if fraction.len() > DECIMAL_PLACES {
            return Err(PriceError::TooManyDecimalPlaces);
        }

        let integer: &str = integer.trim_start_matches('0');
        if integer.len() > MAX_INTEGER_DIGITS {
            return Err(PriceError::TooManyDigits);
        }

        let whole: i64 = if integer.is_empty() { 0 } else { integer.parse().map_err(|_| PriceError::Invalid)? };
        let mut cents: i64 = 0;
        for (position, digit) in fraction.chars().enumerate() {
            let value: i64 = i64::from(digit.to_digit(10).ok_or(PriceError::Invalid)?);
            cents += value * if position == 0 { 10 } else { 1 };
        }

        let total: i64 = whole * 100 + cents;
        if negative && total != 0 {
            return Err(PriceError::Negative);
        }

        Self::from_cents(total)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
