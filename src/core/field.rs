//! Field value types, conversions and formats

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;
use validator::{ValidateEmail, ValidateUrl};

/// Format used for date/time values in list and show views
pub const LIST_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A polymorphic field value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float, widening integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get the value as a UUID if possible
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            FieldValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    /// Get the value as a timestamp if possible
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Check if the value is null or an empty/blank string
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Value as it appears in list views: timestamps become `YYYY-MM-DD HH:MM:SS`,
    /// everything else is left untouched.
    pub fn for_listing(self) -> FieldValue {
        match self {
            FieldValue::DateTime(dt) => {
                FieldValue::String(dt.format(LIST_DATETIME_FORMAT).to_string())
            }
            other => other,
        }
    }

    /// Convert into a plain JSON value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Integer(i) => serde_json::Value::from(*i),
            FieldValue::Float(f) => serde_json::Value::from(*f),
            FieldValue::Boolean(b) => serde_json::Value::Bool(*b),
            FieldValue::Uuid(u) => serde_json::Value::String(u.to_string()),
            FieldValue::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
            FieldValue::Null => serde_json::Value::Null,
        }
    }

    /// Build a value from JSON; arrays and objects are kept as their JSON text
    pub fn from_json(value: &serde_json::Value) -> FieldValue {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => FieldValue::String(s.clone()),
            other => FieldValue::String(other.to_string()),
        }
    }

    /// Total ordering used when sorting lists: nulls first, same-typed values by
    /// their natural order, mixed types by their display text.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
            (FieldValue::Null, _) => Ordering::Less,
            (_, FieldValue::Null) => Ordering::Greater,
            (FieldValue::String(a), FieldValue::String(b)) => a.cmp(b),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a.cmp(b),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a.cmp(b),
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => a.cmp(b),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => a.cmp(b),
            (a, b) => match (a.as_float(), b.as_float()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => a.to_string().cmp(&b.to_string()),
            },
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Uuid(u) => write!(f, "{}", u),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.format(LIST_DATETIME_FORMAT)),
            FieldValue::Null => Ok(()),
        }
    }
}

/// Errors raised when reading or writing a named field
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("Field \"{field}\" does not exist on \"{object_type}\"")]
    UnknownField { object_type: String, field: String },

    #[error("Field \"{field}\" expects {expected}, got \"{value}\"")]
    InvalidValue {
        field: String,
        expected: &'static str,
        value: String,
    },
}

/// Conversion from a Rust field type into a [`FieldValue`]
pub trait ToFieldValue {
    fn to_field_value(&self) -> FieldValue;
}

/// Conversion from a [`FieldValue`] into a Rust field type
///
/// Strings are coerced where it makes sense, which is what lets CSV cells and
/// form inputs land in typed fields.
pub trait FromFieldValue: Sized {
    /// Human readable name of the expected kind, used in error messages
    const EXPECTED: &'static str;

    fn from_field_value(value: FieldValue) -> Option<Self>;
}

/// Convert a value for the named field, reporting what was expected on failure
pub fn convert_field<T: FromFieldValue>(field: &str, value: FieldValue) -> Result<T, FieldError> {
    let shown = value.to_string();
    T::from_field_value(value).ok_or_else(|| FieldError::InvalidValue {
        field: field.to_string(),
        expected: T::EXPECTED,
        value: shown,
    })
}

impl ToFieldValue for String {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::String(self.clone())
    }
}

impl FromFieldValue for String {
    const EXPECTED: &'static str = "a string";

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::String(s) => Some(s),
            FieldValue::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl ToFieldValue for i64 {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Integer(*self)
    }
}

impl FromFieldValue for i64 {
    const EXPECTED: &'static str = "an integer";

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Integer(i) => Some(i),
            FieldValue::Float(f) if f.fract() == 0.0 => Some(f as i64),
            FieldValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl ToFieldValue for i32 {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Integer(i64::from(*self))
    }
}

impl FromFieldValue for i32 {
    const EXPECTED: &'static str = "an integer";

    fn from_field_value(value: FieldValue) -> Option<Self> {
        i64::from_field_value(value).and_then(|i| i32::try_from(i).ok())
    }
}

impl ToFieldValue for u32 {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Integer(i64::from(*self))
    }
}

impl FromFieldValue for u32 {
    const EXPECTED: &'static str = "a positive integer";

    fn from_field_value(value: FieldValue) -> Option<Self> {
        i64::from_field_value(value).and_then(|i| u32::try_from(i).ok())
    }
}

impl ToFieldValue for f64 {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Float(*self)
    }
}

impl FromFieldValue for f64 {
    const EXPECTED: &'static str = "a number";

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::String(s) => s.trim().parse().ok(),
            other => other.as_float(),
        }
    }
}

impl ToFieldValue for bool {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Boolean(*self)
    }
}

impl FromFieldValue for bool {
    const EXPECTED: &'static str = "a boolean";

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Boolean(b) => Some(b),
            FieldValue::Integer(i) => Some(i != 0),
            FieldValue::String(s) => match s.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "0" | "false" | "no" | "off" | "" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl ToFieldValue for Uuid {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Uuid(*self)
    }
}

impl FromFieldValue for Uuid {
    const EXPECTED: &'static str = "a UUID";

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Uuid(u) => Some(u),
            FieldValue::String(s) => Uuid::parse_str(s.trim()).ok(),
            _ => None,
        }
    }
}

impl ToFieldValue for DateTime<Utc> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::DateTime(*self)
    }
}

impl FromFieldValue for DateTime<Utc> {
    const EXPECTED: &'static str = "a date/time";

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::DateTime(dt) => Some(dt),
            FieldValue::String(s) => parse_datetime(s.trim()),
            _ => None,
        }
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM` (HTML inputs) and
/// bare dates, the latter read as midnight UTC.
fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [LIST_DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl<T: ToFieldValue> ToFieldValue for Option<T> {
    fn to_field_value(&self) -> FieldValue {
        match self {
            Some(value) => value.to_field_value(),
            None => FieldValue::Null,
        }
    }
}

impl<T: FromFieldValue> FromFieldValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_field_value(value: FieldValue) -> Option<Self> {
        if value.is_blank() {
            return Some(None);
        }
        T::from_field_value(value).map(Some)
    }
}

/// Field format validators used by forms
#[derive(Debug, Clone)]
pub enum FieldFormat {
    Email,
    Uuid,
    Url,
    Custom(Regex),
}

impl FieldFormat {
    /// Validate a field value against this format
    pub fn validate(&self, value: &FieldValue) -> bool {
        let string_value = match value.as_string() {
            Some(s) => s,
            None => return false,
        };

        match self {
            FieldFormat::Email => string_value.validate_email(),
            FieldFormat::Uuid => Uuid::parse_str(string_value).is_ok(),
            FieldFormat::Url => string_value.validate_url(),
            FieldFormat::Custom(regex) => regex.is_match(string_value),
        }
    }

    /// Short description used in validation messages
    pub fn describe(&self) -> String {
        match self {
            FieldFormat::Email => "an email address".to_string(),
            FieldFormat::Uuid => "a UUID".to_string(),
            FieldFormat::Url => "a URL".to_string(),
            FieldFormat::Custom(regex) => format!("a value matching {}", regex.as_str()),
        }
    }
}
