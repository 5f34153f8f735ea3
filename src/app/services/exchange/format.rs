//! printf-style print templates
//!
//! Supports `%[-+ 0][width][.precision](d|i|f|e|g|s)` with optional literal
//! text around the conversion. Numbers are formatted from their decimal
//! representation with half-even rounding, never through binary floats.

use crate::app::models::Value;
use crate::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Integer,
    Fixed,
    Exponent,
    General,
    Text,
}

/// A parsed print template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintFormat {
    template: String,
    prefix: String,
    suffix: String,
    left_align: bool,
    plus_sign: bool,
    space_sign: bool,
    zero_pad: bool,
    width: usize,
    precision: Option<usize>,
    conversion: Conversion,
}

impl FromStr for PrintFormat {
    type Err = Error;

    fn from_str(template: &str) -> Result<Self> {
        let invalid = |message: &str| Error::format(template, message);

        let start = template.find('%').ok_or_else(|| invalid("no conversion"))?;
        let prefix = template[..start].to_string();
        let mut chars = template[start + 1..].char_indices().peekable();

        let mut format = PrintFormat {
            template: template.to_string(),
            prefix,
            suffix: String::new(),
            left_align: false,
            plus_sign: false,
            space_sign: false,
            zero_pad: false,
            width: 0,
            precision: None,
            conversion: Conversion::Text,
        };

        while let Some(&(_, c)) = chars.peek() {
            match c {
                '-' => format.left_align = true,
                '+' => format.plus_sign = true,
                ' ' => format.space_sign = true,
                '0' => format.zero_pad = true,
                _ => break,
            }
            chars.next();
        }

        let mut width = String::new();
        while let Some(&(_, c)) = chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            width.push(c);
            chars.next();
        }
        if !width.is_empty() {
            format.width = width.parse().map_err(|_| invalid("bad width"))?;
        }

        if let Some(&(_, '.')) = chars.peek() {
            chars.next();
            let mut precision = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                precision.push(c);
                chars.next();
            }
            format.precision = Some(if precision.is_empty() {
                0
            } else {
                precision.parse().map_err(|_| invalid("bad precision"))?
            });
        }

        let (offset, conversion) = chars.next().ok_or_else(|| invalid("missing conversion"))?;
        format.conversion = match conversion {
            'd' | 'i' => Conversion::Integer,
            'f' | 'F' => Conversion::Fixed,
            'e' | 'E' => Conversion::Exponent,
            'g' | 'G' => Conversion::General,
            's' => Conversion::Text,
            other => return Err(invalid(&format!("unsupported conversion '{}'", other))),
        };

        let suffix = &template[start + 1 + offset + conversion.len_utf8()..];
        if suffix.contains('%') {
            return Err(invalid("more than one conversion"));
        }
        format.suffix = suffix.to_string();
        Ok(format)
    }
}

impl PrintFormat {
    /// Template this format was parsed from
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Format a cell value
    pub fn format(&self, value: &Value) -> Result<String> {
        let body = match (self.conversion, value) {
            (Conversion::Text, value) => {
                let text = value.to_string();
                let text = match self.precision {
                    Some(p) => text.chars().take(p).collect(),
                    None => text,
                };
                self.pad(text)
            }
            (_, Value::Number(number)) => self.format_number(*number)?,
            (_, other) => {
                return Err(Error::format(
                    &self.template,
                    format!("'{}' is not a number", other),
                ));
            }
        };
        Ok(format!("{}{}{}", self.prefix, body, self.suffix))
    }

    /// Format an integer (flags, fill values)
    pub fn format_integer(&self, value: i64) -> Result<String> {
        self.format(&Value::from(value))
    }

    fn format_number(&self, number: Decimal) -> Result<String> {
        let negative = number.is_sign_negative() && !number.is_zero();
        let magnitude = number.abs();
        let digits = match self.conversion {
            Conversion::Integer => magnitude.trunc().to_string(),
            Conversion::Fixed => fixed(magnitude, self.precision.unwrap_or(6)),
            Conversion::Exponent => exponent(magnitude, self.precision.unwrap_or(6))
                .ok_or_else(|| self.out_of_range(number))?,
            Conversion::General => general(magnitude, self.precision.unwrap_or(6))
                .ok_or_else(|| self.out_of_range(number))?,
            Conversion::Text => magnitude.to_string(),
        };
        let negative = negative && digits.chars().any(|c| c.is_ascii_digit() && c != '0');

        let sign = if negative {
            "-"
        } else if self.plus_sign {
            "+"
        } else if self.space_sign {
            " "
        } else {
            ""
        };

        Ok(if self.zero_pad && !self.left_align {
            let fill = self.width.saturating_sub(sign.len() + digits.len());
            format!("{}{}{}", sign, "0".repeat(fill), digits)
        } else {
            self.pad(format!("{}{}", sign, digits))
        })
    }

    fn out_of_range(&self, number: Decimal) -> Error {
        Error::format(&self.template, format!("cannot scale {} to an exponent", number))
    }

    fn pad(&self, text: String) -> String {
        let len = text.chars().count();
        if len >= self.width {
            text
        } else if self.left_align {
            format!("{}{}", text, " ".repeat(self.width - len))
        } else {
            format!("{}{}", " ".repeat(self.width - len), text)
        }
    }
}

fn round(value: Decimal, places: usize) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(places as u32, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(places as u32);
    rounded
}

fn fixed(value: Decimal, precision: usize) -> String {
    round(value, precision).to_string()
}

/// Power of ten of the leading digit of a non-zero magnitude
fn leading_exponent(value: Decimal) -> i32 {
    let normalized = value.normalize();
    let digits = normalized.mantissa().unsigned_abs().to_string().len() as i32;
    digits - normalized.scale() as i32 - 1
}

/// `value / 10^power`, one decimal digit at a time
fn scale_by_power(value: Decimal, power: i32) -> Option<Decimal> {
    (0..power.unsigned_abs()).try_fold(value, |scaled, _| {
        if power >= 0 {
            scaled.checked_div(Decimal::TEN)
        } else {
            scaled.checked_mul(Decimal::TEN)
        }
    })
}

/// Mantissa and exponent with the mantissa rounded to `precision` places
fn split_exponent(value: Decimal, precision: usize) -> Option<(Decimal, i32)> {
    if value.is_zero() {
        return Some((round(Decimal::ZERO, precision), 0));
    }
    let mut exp = leading_exponent(value);
    let mut mantissa = round(scale_by_power(value, exp)?, precision);
    if mantissa >= Decimal::TEN {
        exp += 1;
        mantissa = round(scale_by_power(value, exp)?, precision);
    }
    Some((mantissa, exp))
}

fn exponent(value: Decimal, precision: usize) -> Option<String> {
    let (mantissa, exp) = split_exponent(value, precision)?;
    Some(format!(
        "{}e{}{:02}",
        mantissa,
        if exp < 0 { '-' } else { '+' },
        exp.abs()
    ))
}

fn strip_zeros(text: String) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

fn general(value: Decimal, precision: usize) -> Option<String> {
    let precision = precision.max(1);
    let (mantissa, exp) = split_exponent(value, precision - 1)?;
    if exp >= -4 && exp < precision as i32 {
        Some(strip_zeros(fixed(value, (precision as i32 - 1 - exp) as usize)))
    } else {
        Some(format!(
            "{}e{}{:02}",
            strip_zeros(mantissa.to_string()),
            if exp < 0 { '-' } else { '+' },
            exp.abs()
        ))
    }
}
