//! Cell values and out-of-band detection
//!
//! Every cell of a column is an `Option<Value>`; `None` is the only in-memory
//! representation of "no data". Numbers are decimals so that the precision a
//! value was reported with survives reading, conversion and writing.

use crate::constants::{OUT_OF_BAND_SENTINEL, OUT_OF_BAND_TOLERANCE};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Numeric value with the scale it was reported with
    Number(Decimal),
    /// Free text (expocodes, alphanumeric station numbers, ...)
    Text(String),
    /// Fused DATE/TIME
    DateTime(NaiveDateTime),
}

impl Value {
    /// Parse a raw field: decimal if possible, otherwise trimmed text.
    ///
    /// Returns `None` for an empty field.
    pub fn parse_field(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(
            parse_decimal(trimmed)
                .map(Value::Number)
                .unwrap_or_else(|| Value::Text(trimmed.to_string())),
        )
    }

    /// Numeric value, if this is a number
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Number(d) => Some(*d),
            _ => None,
        }
    }

    /// Numeric value as f64, if this is a number
    pub fn as_f64(&self) -> Option<f64> {
        self.as_decimal().and_then(|d| d.to_f64())
    }

    /// Text value, if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value is text consisting only of whitespace
    pub fn is_blank(&self) -> bool {
        matches!(self, Value::Text(s) if s.trim().is_empty())
    }

    /// Coerce text that looks numeric into a number, leaving other values as-is
    pub fn into_numeric(self) -> Option<Self> {
        match self {
            Value::Text(s) => parse_decimal(s.trim()).map(Value::Number),
            other => Some(other),
        }
    }

    /// Truncate a number toward zero; other values are returned unchanged
    pub fn truncated(&self) -> Self {
        match self {
            Value::Number(d) => Value::Number(d.trunc()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "{}", s),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M")),
        }
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Decimal::from(value))
    }
}

/// Parse a decimal in plain or scientific notation
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
        .or_else(|| {
            // Values such as "1e400" or "nan" have no decimal representation
            text.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .and_then(Decimal::from_f64)
        })
}

/// Out-of-band ("no data") detection
///
/// A number is out of band when it lies strictly within `tolerance` of the
/// sentinel. Missing values are out of band, text never is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutOfBand {
    /// Sentinel value, -999 by default
    pub sentinel: Decimal,
    /// Equality tolerance, 0.1 by default
    pub tolerance: Decimal,
}

impl Default for OutOfBand {
    fn default() -> Self {
        Self {
            sentinel: Decimal::from(OUT_OF_BAND_SENTINEL),
            tolerance: Decimal::new(OUT_OF_BAND_TOLERANCE.0, OUT_OF_BAND_TOLERANCE.1),
        }
    }
}

impl OutOfBand {
    /// Check a decimal against the sentinel
    pub fn is_out_of_band_decimal(&self, value: Decimal) -> bool {
        (self.sentinel - value).abs() < self.tolerance
    }

    /// Check a cell
    pub fn is_out_of_band(&self, value: Option<&Value>) -> bool {
        match value {
            None => true,
            Some(Value::Number(d)) => self.is_out_of_band_decimal(*d),
            Some(_) => false,
        }
    }

    /// Check a raw field as found in a file
    pub fn is_out_of_band_str(&self, raw: &str) -> bool {
        match parse_decimal(raw.trim()) {
            Some(d) => self.is_out_of_band_decimal(d),
            None => false,
        }
    }

    /// Return the value unless it is out of band
    pub fn in_band_or_none(&self, value: Option<Value>) -> Option<Value> {
        if self.is_out_of_band(value.as_ref()) {
            None
        } else {
            value
        }
    }
}

/// Check a float against the default sentinel (-999, tolerance 0.1)
pub fn is_out_of_band(value: f64) -> bool {
    Decimal::from_f64(value)
        .map(|d| OutOfBand::default().is_out_of_band_decimal(d))
        .unwrap_or(false)
}
