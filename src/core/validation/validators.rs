//! Reusable field validators
//!
//! These validators are attached to form fields through
//! [`FieldRules`](super::FieldRules). Each one only judges the kind of value it
//! understands and lets anything else through for another validator to handle.

use crate::core::field::{FieldFormat, FieldValue};

/// Validator: field is required (not null, not blank)
pub fn required() -> impl Fn(&str, &FieldValue) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &FieldValue| {
        if value.is_blank() {
            Err(format!("Field '{}' is required", field))
        } else {
            Ok(())
        }
    }
}

/// Validator: number must be positive
pub fn positive() -> impl Fn(&str, &FieldValue) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &FieldValue| match value.as_float() {
        Some(num) if num <= 0.0 => Err(format!(
            "Field '{}' must be positive (value: {})",
            field, num
        )),
        _ => Ok(()),
    }
}

/// Validator: string length must be within range
pub fn string_length(
    min: usize,
    max: usize,
) -> impl Fn(&str, &FieldValue) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &FieldValue| {
        let Some(s) = value.as_string() else {
            return Ok(());
        };
        let len = s.chars().count();
        if len < min {
            Err(format!(
                "'{}' must have at least {} characters (currently: {})",
                field, min, len
            ))
        } else if len > max {
            Err(format!(
                "'{}' must not exceed {} characters (currently: {})",
                field, max, len
            ))
        } else {
            Ok(())
        }
    }
}

/// Validator: number must not exceed maximum
pub fn max_value(max: f64) -> impl Fn(&str, &FieldValue) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &FieldValue| match value.as_float() {
        Some(num) if num > max => Err(format!(
            "'{}' must not exceed {} (value: {})",
            field, max, num
        )),
        _ => Ok(()),
    }
}

/// Validator: value must be in allowed list
pub fn in_list(
    allowed: Vec<String>,
) -> impl Fn(&str, &FieldValue) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &FieldValue| match value.as_string() {
        Some(s) if !allowed.iter().any(|a| a == s) => Err(format!(
            "'{}' must be one of {:?} (current value: {})",
            field, allowed, s
        )),
        _ => Ok(()),
    }
}

/// Validator: non-blank strings must match a format
pub fn format(
    format: FieldFormat,
) -> impl Fn(&str, &FieldValue) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &FieldValue| {
        if value.is_blank() || value.as_string().is_none() || format.validate(value) {
            Ok(())
        } else {
            Err(format!("'{}' must be {}", field, format.describe()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn text(s: &str) -> FieldValue {
        FieldValue::String(s.to_string())
    }

    // === required() ===

    #[test]
    fn test_required_null_value_returns_error() {
        let v = required();
        let result = v("name", &FieldValue::Null);
        assert!(result.unwrap_err().contains("required"));
    }

    #[test]
    fn test_required_blank_string_returns_error() {
        let v = required();
        assert!(v("name", &text("   ")).is_err());
    }

    #[test]
    fn test_required_values_return_ok() {
        let v = required();
        assert!(v("name", &text("hello")).is_ok());
        assert!(v("age", &FieldValue::Integer(0)).is_ok());
        assert!(v("active", &FieldValue::Boolean(false)).is_ok());
    }

    // === positive() ===

    #[test]
    fn test_positive_rejects_zero_and_negative() {
        let v = positive();
        assert!(v("price", &FieldValue::Float(-5.0)).unwrap_err().contains("positive"));
        assert!(v("price", &FieldValue::Integer(0)).is_err());
    }

    #[test]
    fn test_positive_accepts_positive_and_passthrough() {
        let v = positive();
        assert!(v("price", &FieldValue::Float(42.5)).is_ok());
        assert!(v("count", &FieldValue::Integer(1)).is_ok());
        assert!(v("name", &text("hello")).is_ok());
    }

    // === string_length() ===

    #[test]
    fn test_string_length_bounds() {
        let v = string_length(3, 5);
        assert!(v("name", &text("ab")).unwrap_err().contains("at least 3"));
        assert!(v("name", &text("abcdef")).unwrap_err().contains("exceed 5"));
        assert!(v("name", &text("abc")).is_ok());
        assert!(v("name", &text("abcde")).is_ok());
    }

    #[test]
    fn test_string_length_counts_characters() {
        let v = string_length(1, 4);
        assert!(v("name", &text("été!")).is_ok());
    }

    #[test]
    fn test_string_length_non_string_passthrough() {
        let v = string_length(5, 10);
        assert!(v("age", &FieldValue::Integer(42)).is_ok());
    }

    // === max_value() ===

    #[test]
    fn test_max_value() {
        let v = max_value(100.0);
        assert!(v("score", &FieldValue::Float(101.0)).unwrap_err().contains("exceed 100"));
        assert!(v("score", &FieldValue::Integer(100)).is_ok());
        assert!(v("name", &text("hello")).is_ok());
    }

    // === in_list() ===

    #[test]
    fn test_in_list() {
        let v = in_list(vec!["draft".into(), "published".into()]);
        assert!(v("status", &text("draft")).is_ok());
        assert!(v("status", &text("deleted")).unwrap_err().contains("one of"));
        assert!(v("flag", &FieldValue::Integer(42)).is_ok());
    }

    // === format() ===

    #[test]
    fn test_format_email() {
        let v = format(FieldFormat::Email);
        assert!(v("email", &text("reader@example.com")).is_ok());
        assert!(v("email", &text("nope")).unwrap_err().contains("an email address"));
    }

    #[test]
    fn test_format_skips_blank_values() {
        let v = format(FieldFormat::Custom(Regex::new(r"^\d{3}-\d$").unwrap()));
        assert!(v("isbn", &text("")).is_ok());
        assert!(v("isbn", &text("978-1")).is_ok());
        assert!(v("isbn", &text("x")).is_err());
    }
}
