//! Validation and filtering of form input
//!
//! Filters normalize a submitted value before it is written to the object,
//! validators check the value once it has been written. Both are plain
//! closures so forms can mix the stock ones below with their own.

pub mod filters;
pub mod validators;

use crate::core::field::FieldValue;
use indexmap::IndexMap;
use std::sync::Arc;

/// Checks a field value, returning a user-facing message on failure
pub type Validator = Arc<dyn Fn(&str, &FieldValue) -> Result<(), String> + Send + Sync>;

/// Rewrites a submitted field value
pub type Filter = Arc<dyn Fn(&str, FieldValue) -> anyhow::Result<FieldValue> + Send + Sync>;

/// Filters and validators attached to the fields of a form
#[derive(Clone, Default)]
pub struct FieldRules {
    filters: IndexMap<String, Vec<Filter>>,
    validators: IndexMap<String, Vec<Validator>>,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter<F>(&mut self, field: impl Into<String>, filter: F)
    where
        F: Fn(&str, FieldValue) -> anyhow::Result<FieldValue> + Send + Sync + 'static,
    {
        self.filters
            .entry(field.into())
            .or_default()
            .push(Arc::new(filter));
    }

    pub fn add_validator<F>(&mut self, field: impl Into<String>, validator: F)
    where
        F: Fn(&str, &FieldValue) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators
            .entry(field.into())
            .or_default()
            .push(Arc::new(validator));
    }

    /// Run every filter of a field, in registration order
    pub fn filter(&self, field: &str, value: FieldValue) -> Result<FieldValue, String> {
        let mut value = value;
        for filter in self.filters.get(field).into_iter().flatten() {
            value = filter(field, value).map_err(|e| e.to_string())?;
        }
        Ok(value)
    }

    /// Every validation message for a field
    pub fn validate(&self, field: &str, value: &FieldValue) -> Vec<String> {
        self.validators
            .get(field)
            .into_iter()
            .flatten()
            .filter_map(|validator| validator(field, value).err())
            .collect()
    }

    /// Fields with at least one validator, in registration order
    pub fn validated_fields(&self) -> impl Iterator<Item = &str> {
        self.validators.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for FieldRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRules")
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .finish()
    }
}
