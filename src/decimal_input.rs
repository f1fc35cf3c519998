//! Parse-once boundary type for numeric user input.
//!
//! The UI hands over strings (or floats) that may be empty, partial or
//! garbage. They are parsed exactly once into a [`DecimalInput`] and the
//! engine only ever works with the parsed value afterwards.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A decimal value, or the marker that the input could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecimalInput(Option<Decimal>);

impl DecimalInput {
    pub const INVALID: DecimalInput = DecimalInput(None);

    pub fn new(value: Decimal) -> Self {
        Self(Some(value))
    }

    /// Parse user text. Surrounding whitespace is ignored; scientific
    /// notation (`1e-7`) is accepted.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::INVALID;
        }
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(|d| Self(Some(d)))
            .unwrap_or(Self::INVALID)
    }

    /// NaN and infinities are invalid.
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() {
            return Self::INVALID;
        }
        Self(Decimal::from_f64_retain(value).map(|d| d.normalize()))
    }

    pub fn value(&self) -> Option<Decimal> {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    /// Some(value) only when the input parsed and is strictly positive.
    pub fn positive(&self) -> Option<Decimal> {
        self.0.filter(|d| d.is_sign_positive() && !d.is_zero())
    }

    /// The value, with invalid input collapsing to zero.
    pub fn or_zero(&self) -> Decimal {
        self.0.unwrap_or(Decimal::ZERO)
    }

    /// The value clamped below at zero; invalid input is zero.
    pub fn non_negative(&self) -> Decimal {
        self.or_zero().max(Decimal::ZERO)
    }
}

impl From<Decimal> for DecimalInput {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

impl From<&str> for DecimalInput {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<Option<Decimal>> for DecimalInput {
    fn from(value: Option<Decimal>) -> Self {
        Self(value)
    }
}

impl fmt::Display for DecimalInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(d) => write!(f, "{}", d),
            None => write!(f, "<invalid>"),
        }
    }
}

impl Serialize for DecimalInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(d) => serializer.serialize_str(&d.to_string()),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for DecimalInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Anything unparseable becomes INVALID
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match raw {
            Some(serde_json::Value::String(s)) => Self::parse(&s),
            Some(serde_json::Value::Number(n)) => Self::parse(&n.to_string()),
            _ => Self::INVALID,
        })
    }
}
