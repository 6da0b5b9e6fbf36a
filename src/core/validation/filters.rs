//! Reusable field filters
//!
//! These filters transform submitted form values before they are written to the
//! object being edited.

use crate::core::field::FieldValue;
use anyhow::Result;

/// Filter: trim whitespace from string
pub fn trim() -> impl Fn(&str, FieldValue) -> Result<FieldValue> + Send + Sync + Clone {
    |_: &str, value: FieldValue| match value {
        FieldValue::String(s) => Ok(FieldValue::String(s.trim().to_string())),
        other => Ok(other),
    }
}

/// Filter: convert string to uppercase
pub fn uppercase() -> impl Fn(&str, FieldValue) -> Result<FieldValue> + Send + Sync + Clone {
    |_: &str, value: FieldValue| match value {
        FieldValue::String(s) => Ok(FieldValue::String(s.to_uppercase())),
        other => Ok(other),
    }
}

/// Filter: convert string to lowercase
pub fn lowercase() -> impl Fn(&str, FieldValue) -> Result<FieldValue> + Send + Sync + Clone {
    |_: &str, value: FieldValue| match value {
        FieldValue::String(s) => Ok(FieldValue::String(s.to_lowercase())),
        other => Ok(other),
    }
}

/// Filter: blank strings become null, so optional fields are cleared
pub fn empty_to_null() -> impl Fn(&str, FieldValue) -> Result<FieldValue> + Send + Sync + Clone {
    |_: &str, value: FieldValue| {
        if value.is_blank() {
            Ok(FieldValue::Null)
        } else {
            Ok(value)
        }
    }
}
