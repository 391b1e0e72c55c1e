//! Input validation primitives.
//!
//! Provides ergonomic helpers for common validation patterns:
//! - Unwrapping Option values with descriptive errors
//! - Validating non-empty strings
//! - Checking values against an allow-list pattern

use regex::Regex;

use crate::error::{Error, Result};

/// Require an Option to contain a value.
///
/// Replaces the common pattern:
/// ```ignore
/// value.ok_or_else(|| Error::validation_missing_argument(vec!["field".into()]))?
/// ```
pub fn require<T>(opt: Option<T>, field: &str) -> Result<T> {
    opt.ok_or_else(|| Error::validation_missing_argument(vec![field.to_string()]))
}

/// Require a string to be non-empty after trimming.
///
/// Returns a reference to the trimmed string on success.
pub fn require_non_empty<'a>(value: &'a str, field: &str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::validation_invalid_argument(field, message, None, None))
    } else {
        Ok(trimmed)
    }
}

/// Require `value` to match the anchored allow-list `pattern` in full.
pub fn require_match<'a>(value: &'a str, field: &str, pattern: &str) -> Result<&'a str> {
    let re = Regex::new(pattern).map_err(|e| {
        Error::internal_unexpected(format!("Invalid validation pattern {}: {}", pattern, e))
    })?;

    if re.is_match(value) {
        Ok(value)
    } else {
        Err(Error::validation_invalid_argument(
            field,
            format!("'{}' does not match {}", value, pattern),
            Some(value.to_string()),
            None,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_returns_value_when_some() {
        assert_eq!(require(Some("value"), "field").unwrap(), "value");
    }

    #[test]
    fn require_returns_missing_argument_when_none() {
        let err = require::<&str>(None, "name").unwrap_err();
        assert_eq!(err.code.as_str(), "validation.missing_argument");
        assert_eq!(err.details["args"][0], "name");
    }

    #[test]
    fn require_non_empty_trims_whitespace() {
        assert_eq!(require_non_empty("  hello  ", "field", "msg").unwrap(), "hello");
    }

    #[test]
    fn require_non_empty_fails_for_whitespace_only() {
        assert!(require_non_empty("   ", "field", "Cannot be empty").is_err());
    }

    #[test]
    fn require_match_accepts_full_match() {
        assert_eq!(require_match("abc", "f", "^[a-z]+$").unwrap(), "abc");
    }

    #[test]
    fn require_match_rejects_partial_match() {
        let err = require_match("abc/def", "f", "^[a-z]+$").unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
        assert_eq!(err.details["id"], "abc/def");
    }
}
