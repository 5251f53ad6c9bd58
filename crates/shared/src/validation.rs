//! Common validation utilities.
//!
//! Validators here only set an error code. Request layers render errors
//! without a message as `Invalid value`, so a message is attached only when
//! the caller needs to say something more specific.

use uuid::Uuid;
use validator::{ValidateEmail, ValidateUrl, ValidationError};

fn invalid(code: &'static str) -> ValidationError {
    ValidationError::new(code)
}

/// Parses a query-string value as an integer ≥ 1.
pub fn parse_positive_int(raw: &str) -> Result<u32, ValidationError> {
    match raw.trim().parse::<u32>() {
        Ok(value) if value >= 1 => Ok(value),
        _ => Err(invalid("positive_int")),
    }
}

/// Parses a query-string or form value as a boolean (`true`/`false`).
pub fn parse_bool(raw: &str) -> Result<bool, ValidationError> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid("boolean")),
    }
}

pub fn validate_positive_int(raw: &str) -> Result<(), ValidationError> {
    parse_positive_int(raw).map(|_| ())
}

/// Rejects empty or whitespace-only strings.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(invalid("not_blank"))
    } else {
        Ok(())
    }
}

/// Validates that `value` is one of `allowed`.
pub fn validate_one_of(value: &str, allowed: &[&str]) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(invalid("one_of"))
    }
}

/// Validates an e-mail address.
pub fn validate_email_address(value: &str) -> Result<(), ValidationError> {
    if value.validate_email() {
        Ok(())
    } else {
        Err(invalid("email"))
    }
}

pub fn validate_uuid(value: &str) -> Result<(), ValidationError> {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| invalid("uuid"))
}

/// Validates an absolute http(s) site URL, ignoring surrounding whitespace.
/// Empty means "not configured" and is accepted.
pub fn validate_site_url(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }

    let http = value.starts_with("http://") || value.starts_with("https://");
    if http && value.validate_url() {
        Ok(())
    } else {
        Err(invalid("site_url"))
    }
}
