//! String to typed value coercion for filter values.
//!
//! Every function returns `None` when the value cannot be coerced; the caller
//! drops the criterion instead of failing the query.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

// Basic safety limits
pub const MAX_FIELD_VALUE_LENGTH: usize = 10_000;
pub const MAX_FIELD_NAME_LENGTH: usize = 100;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Basic field name validation
#[must_use]
pub fn is_valid_field_name(field_name: &str) -> bool {
    !field_name.is_empty()
        && field_name.len() <= MAX_FIELD_NAME_LENGTH
        && !field_name.starts_with('_')
}

/// Basic value length check
#[must_use]
pub const fn is_acceptable_value(value: &str) -> bool {
    value.len() <= MAX_FIELD_VALUE_LENGTH
}

#[must_use]
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[must_use]
pub fn parse_identifier(value: &str) -> Option<Uuid> {
    Uuid::parse_str(value.trim()).ok()
}

/// `true` / `false`, ASCII case-insensitive.
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[must_use]
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    let value = value.trim();
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

/// Parse a calendar date, discarding any time of day.
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
    {
        return Some(date);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|timestamp| timestamp.date())
}

/// Half-open `[start, end)` UTC interval covering `date`.
#[must_use]
pub fn day_bounds(date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let end = date.succ_opt()?.and_time(NaiveTime::MIN).and_utc();
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_name_validation() {
        assert!(is_valid_field_name("nome"));
        assert!(!is_valid_field_name(""));
        assert!(!is_valid_field_name("_internal"));
        assert!(!is_valid_field_name(&"a".repeat(MAX_FIELD_NAME_LENGTH + 1)));
    }

    #[test]
    fn test_value_length_guard() {
        assert!(is_acceptable_value("Ana"));
        assert!(!is_acceptable_value(&"x".repeat(MAX_FIELD_VALUE_LENGTH + 1)));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool(" FALSE "), Some(false));
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(parse_bool("1"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_parse_identifier() {
        let id = Uuid::new_v4();
        assert_eq!(parse_identifier(&id.to_string()), Some(id));
        assert_eq!(parse_identifier(&format!(" {id} ")), Some(id));
        assert_eq!(parse_identifier("not-a-uuid"), None);
        assert_eq!(parse_identifier("42"), None);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("4.5"), Decimal::from_str("4.5").ok());
        assert_eq!(parse_decimal("-12"), Some(Decimal::from(-12)));
        assert_eq!(parse_decimal("1e3"), Some(Decimal::from(1000)));
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal(""), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(parse_date("2024-03-15"), expected);
        assert_eq!(parse_date("15/03/2024"), expected);
        assert_eq!(parse_date("2024-03-15T18:45:00Z"), expected);
        assert_eq!(parse_date("2024-03-15T18:45:00.123"), expected);
        assert_eq!(parse_date("2024-03-15 08:00:00"), expected);
        assert_eq!(parse_date("15 March"), None);
        assert_eq!(parse_date("2024-02-30"), None);
    }

    #[test]
    fn test_day_bounds_cover_one_day() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let (start, end) = day_bounds(date).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-12-31T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-01-01T00:00:00+00:00");

        assert!(day_bounds(NaiveDate::MAX).is_none());
    }
}
