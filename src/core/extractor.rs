//! Extraction of named fields into rendering-ready values

use crate::core::entity::ManagedObject;
use crate::core::error::ConfigurationError;
use crate::core::field::FieldValue;
use indexmap::IndexMap;

/// Extracted field name → value, in the requested order
pub type FieldMap = IndexMap<String, FieldValue>;

/// Read the given fields of an object
pub fn extract<S: AsRef<str>>(
    object: &dyn ManagedObject,
    fields: &[S],
) -> Result<FieldMap, ConfigurationError> {
    fields
        .iter()
        .map(|field| {
            let field = field.as_ref();
            object
                .get_field(field)
                .map(|value| (field.to_string(), value))
                .ok_or_else(|| ConfigurationError::UnknownField {
                    object_type: object.object_type().to_string(),
                    field: field.to_string(),
                })
        })
        .collect()
}

/// Like [`extract`], with timestamps formatted for list views
pub fn extract_for_list<S: AsRef<str>>(
    object: &dyn ManagedObject,
    fields: &[S],
) -> Result<FieldMap, ConfigurationError> {
    Ok(extract(object, fields)?
        .into_iter()
        .map(|(name, value)| (name, value.for_listing()))
        .collect())
}

/// Read the given keys of a JSON row returned by a repository method
///
/// Anything other than a JSON object has no fields, so every requested field is
/// reported as unknown.
pub fn extract_json<S: AsRef<str>>(
    object_type: &str,
    row: &serde_json::Value,
    fields: &[S],
) -> Result<FieldMap, ConfigurationError> {
    fields
        .iter()
        .map(|field| {
            let field = field.as_ref();
            row.get(field)
                .map(|value| (field.to_string(), FieldValue::from_json(value)))
                .ok_or_else(|| ConfigurationError::UnknownField {
                    object_type: object_type.to_string(),
                    field: field.to_string(),
                })
        })
        .collect()
}

/// Field map as a JSON object, for templates
pub fn to_json(fields: &FieldMap) -> serde_json::Value {
    serde_json::Value::Object(
        fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect(),
    )
}
