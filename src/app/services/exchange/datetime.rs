//! Fusing DATE/TIME fields into a single timestamp and splitting them back

use crate::app::models::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Digits of a DATE or TIME cell, if it holds a non-negative integer
fn digits(value: &Value) -> Option<String> {
    let text = match value {
        Value::Number(d) if d.is_sign_negative() || !d.fract().is_zero() => return None,
        Value::Number(d) => d.trunc().to_string(),
        Value::Text(s) => s.trim().to_string(),
        Value::DateTime(_) => return None,
    };
    if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
        Some(text)
    } else {
        None
    }
}

/// Parse a DATE cell: up to 6 digits is YYMMDD, 7 or 8 digits YYYYMMDD
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let digits = digits(value)?;
    match digits.len() {
        0..=6 => NaiveDate::parse_from_str(&format!("{:0>6}", digits), "%y%m%d").ok(),
        7 | 8 => NaiveDate::parse_from_str(&format!("{:0>8}", digits), "%Y%m%d").ok(),
        _ => None,
    }
}

/// Parse a TIME cell of up to 4 digits (HHMM)
pub fn parse_time(value: &Value) -> Option<NaiveTime> {
    let digits = digits(value)?;
    if digits.len() > 4 {
        return None;
    }
    NaiveTime::parse_from_str(&format!("{:0>4}", digits), "%H%M").ok()
}

/// Fuse a row's DATE and TIME; a missing time means midnight
pub fn fuse_datetime(date: Option<&Value>, time: Option<&Value>) -> Option<NaiveDateTime> {
    let date = parse_date(date?)?;
    let time = match time {
        Some(time) => parse_time(time)?,
        None => NaiveTime::MIN,
    };
    Some(date.and_time(time))
}

/// Split a timestamp into text DATE (`YYYYMMDD`) and TIME (`HHMM`) values
pub fn split_datetime(datetime: &NaiveDateTime) -> (Value, Value) {
    (
        Value::Text(datetime.format("%Y%m%d").to_string()),
        Value::Text(datetime.format("%H%M").to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(text: &str) -> Value {
        Value::parse_field(text).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, 0)
            .unwrap()
    }

    #[test]
    fn test_eight_digit_date() {
        assert_eq!(
            fuse_datetime(Some(&num("20100315")), Some(&num("1230"))),
            Some(at(2010, 3, 15, 12, 30))
        );
        assert_eq!(
            fuse_datetime(Some(&Value::from("20100315")), Some(&num("5"))),
            Some(at(2010, 3, 15, 0, 5))
        );
    }

    #[test]
    fn test_six_digit_date() {
        assert_eq!(
            fuse_datetime(Some(&num("970214")), Some(&num("45"))),
            Some(at(1997, 2, 14, 0, 45))
        );
        // Leading zeros lost by numeric parsing are restored
        assert_eq!(
            fuse_datetime(Some(&num("50607")), None),
            Some(at(2005, 6, 7, 0, 0))
        );
    }

    #[test]
    fn test_missing_time_is_midnight() {
        assert_eq!(
            fuse_datetime(Some(&num("20100315")), None),
            Some(at(2010, 3, 15, 0, 0))
        );
    }

    #[test]
    fn test_unparsable_combinations() {
        assert_eq!(fuse_datetime(None, Some(&num("1200"))), None);
        assert_eq!(fuse_datetime(Some(&num("20101350")), None), None);
        assert_eq!(fuse_datetime(Some(&num("20100315")), Some(&num("2560"))), None);
        assert_eq!(fuse_datetime(Some(&num("20100315")), Some(&num("12345"))), None);
        assert_eq!(fuse_datetime(Some(&Value::from("2010-03-15")), None), None);
        assert_eq!(fuse_datetime(Some(&num("201003151")), None), None);
    }

    #[test]
    fn test_split_datetime() {
        let (date, time) = split_datetime(&at(2010, 3, 15, 7, 5));
        assert_eq!(date, Value::from("20100315"));
        assert_eq!(time, Value::from("0705"));
    }
}
