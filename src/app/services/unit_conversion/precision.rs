//! Significant-digit arithmetic on decimals
//!
//! Converted values are rounded half-even so that they never report more
//! significant digits than their operands.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of significant digits a decimal was written with (`0.0050` has 2)
pub fn significant_digits(value: Decimal) -> u32 {
    let digits = value.mantissa().unsigned_abs().to_string().len() as u32;
    if value.is_zero() {
        1.max(value.scale())
    } else {
        digits
    }
}

/// Number of digits left of the decimal point (at least 1)
pub fn integral_digits(value: Decimal) -> u32 {
    value.trunc().abs().mantissa().unsigned_abs().to_string().len() as u32
}

/// Power of ten of the leading digit (`200.5` -> 2, `0.005` -> -3)
fn leading_exponent(value: Decimal) -> i64 {
    let normalized = value.abs().normalize();
    let digits = normalized.mantissa().unsigned_abs().to_string().len() as i64;
    digits - normalized.scale() as i64 - 1
}

/// Round to `digits` significant digits, half-even
pub fn round_significant(value: Decimal, digits: u32) -> Decimal {
    if value.is_zero() || digits == 0 {
        return value;
    }
    let places = digits as i64 - 1 - leading_exponent(value);
    if places >= 0 {
        value.round_dp_with_strategy(places as u32, RoundingStrategy::MidpointNearestEven)
    } else {
        // Beyond the decimal range the value already has fewer digits than asked for
        let Some(factor) = power_of_ten(places.unsigned_abs()) else {
            return value;
        };
        value
            .checked_div(factor)
            .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven))
            .and_then(|rounded| rounded.checked_mul(factor))
            .unwrap_or(value)
    }
}

fn power_of_ten(exponent: u64) -> Option<Decimal> {
    (0..exponent).try_fold(Decimal::ONE, |power, _| power.checked_mul(Decimal::TEN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(text: &str) -> Decimal {
        Decimal::from_str(text).unwrap()
    }

    #[test]
    fn test_significant_digits() {
        assert_eq!(significant_digits(d("200.5")), 4);
        assert_eq!(significant_digits(d("0.0050")), 2);
        assert_eq!(significant_digits(d("-12.30")), 4);
        assert_eq!(significant_digits(d("7")), 1);
    }

    #[test]
    fn test_integral_digits() {
        assert_eq!(integral_digits(d("200.5")), 3);
        assert_eq!(integral_digits(d("0.25")), 1);
        assert_eq!(integral_digits(d("-45.1")), 2);
    }

    #[test]
    fn test_round_significant() {
        assert_eq!(round_significant(d("217.4412"), 4), d("217.4"));
        assert_eq!(round_significant(d("0.0012345"), 3), d("0.00123"));
        assert_eq!(round_significant(d("1234.5"), 2), d("1200"));
        assert_eq!(round_significant(d("2.25"), 2), d("2.2"));
        assert_eq!(round_significant(d("2.35"), 2), d("2.4"));
        assert_eq!(round_significant(d("9.96"), 2), d("10"));
    }

    #[test]
    fn test_round_significant_large_magnitudes() {
        assert_eq!(
            round_significant(d("123456789012345678901234"), 3),
            d("123000000000000000000000")
        );
        assert_eq!(round_significant(Decimal::MAX, 2), d("79000000000000000000000000000"));
        assert_eq!(
            round_significant(d("0.00000000000000000001234"), 2),
            d("0.000000000000000000012")
        );
    }

    #[test]
    fn test_round_significant_keeps_scale() {
        let rounded = round_significant(d("217.4012"), 4);
        assert_eq!(rounded.to_string(), "217.4");
        let rounded = round_significant(d("5.000001"), 4);
        assert_eq!(rounded.to_string(), "5.000");
    }
}
