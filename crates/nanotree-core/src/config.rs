#![forbid(unsafe_code)]

//! Shared pieces for env-overridable configuration.
//!
//! Each configurable component owns its config struct and a
//! `from_env_with(get)` parser that takes a lookup closure, so tests can feed
//! a map instead of touching the process environment. This module provides the
//! error type and the value parsers those parsers share.

use std::fmt;
use std::str::FromStr;

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    pub fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// A parsed config together with every problem found along the way.
///
/// Fields that failed to parse keep their defaults.
#[derive(Debug, Clone)]
pub struct ConfigParse<T> {
    pub config: T,
    pub errors: Vec<ConfigError>,
}

impl<T> ConfigParse<T> {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a decimal integer, or a hexadecimal one with a `0x` prefix.
#[must_use]
pub fn parse_integer<T>(value: &str) -> Option<T>
where
    T: FromStr + TryFrom<i128>,
{
    let trimmed = value.trim().replace('_', "");
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.as_str()),
    };
    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        let magnitude = i128::from_str_radix(hex, 16).ok()?;
        let signed = if negative { -magnitude } else { magnitude };
        return T::try_from(signed).ok();
    }
    trimmed.parse::<T>().ok()
}

/// Look up `key`, parse it, and either store the result or record an error.
pub fn apply_env<F, T>(
    get: &mut F,
    key: &str,
    field: &'static str,
    expected: &str,
    parse: impl Fn(&str) -> Option<T>,
    slot: &mut T,
    errors: &mut Vec<ConfigError>,
) where
    F: FnMut(&str) -> Option<String>,
{
    if let Some(value) = get(key) {
        match parse(&value) {
            Some(parsed) => *slot = parsed,
            None => errors.push(ConfigError::new(field, value, expected)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parse_integer_decimal_and_hex() {
        assert_eq!(parse_integer::<u64>("42"), Some(42));
        assert_eq!(parse_integer::<u64>(" 1_000 "), Some(1000));
        assert_eq!(parse_integer::<u64>("0xff"), Some(255));
        assert_eq!(parse_integer::<i64>("-0x10"), Some(-16));
        assert_eq!(parse_integer::<i32>("-7"), Some(-7));
    }

    #[test]
    fn parse_integer_rejects_garbage_and_overflow() {
        assert_eq!(parse_integer::<u64>("nope"), None);
        assert_eq!(parse_integer::<u8>("0x1ff"), None);
        assert_eq!(parse_integer::<u64>("-1"), None);
    }

    #[test]
    fn apply_env_records_errors() {
        let env: HashMap<&str, &str> = [("A", "5"), ("B", "x")].into_iter().collect();
        let mut get = |key: &str| env.get(key).map(|v| v.to_string());
        let mut errors = Vec::new();
        let mut a = 0u32;
        let mut b = 9u32;
        let mut c = 3u32;
        apply_env(&mut get, "A", "a", "integer", parse_integer, &mut a, &mut errors);
        apply_env(&mut get, "B", "b", "integer", parse_integer, &mut b, &mut errors);
        apply_env(&mut get, "C", "c", "integer", parse_integer, &mut c, &mut errors);
        assert_eq!((a, b, c), (5, 9, 3));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "b");
        assert_eq!(errors[0].to_string(), "b=x (integer)");
    }
}
