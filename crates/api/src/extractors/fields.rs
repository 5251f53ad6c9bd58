//! Validators for loosely typed JSON fields.
//!
//! Form posts send flags and numbers as strings, so these fields stay
//! `serde_json::Value` and are checked by `#[validate(custom(...))]`. The
//! `*_value` readers are used after validation has passed.

use domain::models::PAGE_LIST_LIMIT_CHOICES;
use serde_json::Value;
use shared::validation::{parse_bool, parse_positive_int, validate_site_url};
use validator::ValidationError;

/// A JSON boolean, or `"true"`/`"false"`.
pub fn flag_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(raw) => parse_bool(raw).ok(),
        _ => None,
    }
}

/// A JSON integer ≥ 1, or a string holding one.
pub fn positive_int_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n >= 1),
        Value::String(raw) => parse_positive_int(raw).ok(),
        _ => None,
    }
}

pub fn validate_flag(value: &Value) -> Result<(), ValidationError> {
    flag_value(value)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("boolean"))
}

/// One of the page-list sizes offered on the customize screen.
pub fn validate_page_list_limit(value: &Value) -> Result<(), ValidationError> {
    match positive_int_value(value) {
        Some(limit) if PAGE_LIST_LIMIT_CHOICES.contains(&limit) => Ok(()),
        _ => Err(ValidationError::new("one_of")),
    }
}

pub fn validate_site_url_value(value: &Value) -> Result<(), ValidationError> {
    match value {
        Value::String(url) => validate_site_url(url),
        _ => Err(ValidationError::new("string")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flag_value() {
        assert_eq!(flag_value(&json!(true)), Some(true));
        assert_eq!(flag_value(&json!("false")), Some(false));
        assert_eq!(flag_value(&json!(1)), None);
        assert!(validate_flag(&json!("yes")).is_err());
    }

    #[test]
    fn test_positive_int_value() {
        assert_eq!(positive_int_value(&json!(30)), Some(30));
        assert_eq!(positive_int_value(&json!("50")), Some(50));
        assert_eq!(positive_int_value(&json!(-1)), None);
        assert_eq!(positive_int_value(&json!(1.5)), None);
    }

    #[test]
    fn test_validate_page_list_limit() {
        assert!(validate_page_list_limit(&json!(10)).is_ok());
        assert!(validate_page_list_limit(&json!("50")).is_ok());
        assert!(validate_page_list_limit(&json!(20)).is_err());
        assert!(validate_page_list_limit(&json!(true)).is_err());
    }

    #[test]
    fn test_validate_site_url_value() {
        assert!(validate_site_url_value(&json!("https://wiki.example.com")).is_ok());
        assert!(validate_site_url_value(&json!("")).is_ok());
        assert!(validate_site_url_value(&json!(42)).is_err());
        assert!(validate_site_url_value(&json!("ftp://wiki.example.com")).is_err());
    }
}
