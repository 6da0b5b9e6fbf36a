//! Managed object traits: the capability interface the dashboard uses to read and
//! write fields of arbitrary entity types by name.

use crate::core::field::{FieldError, FieldValue};
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// An object the dashboard can list, show, edit, import and operate on.
///
/// Fields are reached through an explicit registration map (usually generated
/// by [`impl_managed_object!`](crate::impl_managed_object)) instead of poking at
/// private state.
pub trait ManagedObject: fmt::Debug + Send + Sync + 'static {
    /// Entity type identifier (e.g. "book")
    fn object_type(&self) -> &str;

    /// Identifier of this instance, as it appears in URLs
    fn id(&self) -> String;

    /// Every field that can be read or written, in declaration order
    fn field_names(&self) -> &'static [&'static str];

    /// Read a field by name; `None` when the field does not exist
    fn get_field(&self, field: &str) -> Option<FieldValue>;

    /// Write a field by name, coercing the value to the field's type
    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), FieldError>;

    /// Clone behind a fresh box
    fn clone_object(&self) -> Box<dyn ManagedObject>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// All fields as a JSON object
    fn to_json(&self) -> serde_json::Value {
        let map = self
            .field_names()
            .iter()
            .map(|name| {
                let value = self
                    .get_field(name)
                    .map(|v| v.to_json())
                    .unwrap_or(serde_json::Value::Null);
                (name.to_string(), value)
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

impl Clone for Box<dyn ManagedObject> {
    fn clone(&self) -> Self {
        self.clone_object()
    }
}

/// Downcast a managed object to its concrete type
pub fn downcast_ref<T: ManagedObject>(object: &dyn ManagedObject) -> Option<&T> {
    object.as_any().downcast_ref::<T>()
}

/// Mutable counterpart of [`downcast_ref`]
pub fn downcast_mut<T: ManagedObject>(object: &mut dyn ManagedObject) -> Option<&mut T> {
    object.as_any_mut().downcast_mut::<T>()
}

/// Static side of a managed object type
pub trait ManagedEntity: ManagedObject + Sized {
    /// Entity type identifier
    const OBJECT_TYPE: &'static str;

    /// Every field, `id` first
    const FIELDS: &'static [&'static str];

    /// A fresh instance with a new identifier and default field values
    fn blank() -> Self;
}

/// Target field → value, collected before the real object exists.
///
/// CSV rows and similar inputs are gathered into a record first, then turned
/// into an instance by an [`ObjectFactory`].
pub type ImportRecord = IndexMap<String, FieldValue>;

/// Builds instances of one entity type
pub trait ObjectFactory: Send + Sync {
    /// Entity type identifier this factory produces
    fn object_type(&self) -> &str;

    /// Fields instances of this type expose
    fn field_names(&self) -> &'static [&'static str];

    /// A fresh instance with default values
    fn blank(&self) -> Box<dyn ManagedObject>;

    /// Build an instance from a record, field by field
    fn from_record(&self, record: &ImportRecord) -> Result<Box<dyn ManagedObject>, FieldError> {
        let mut object = self.blank();
        for (field, value) in record {
            object.set_field(field, value.clone())?;
        }
        Ok(object)
    }

    /// Check that a field exists on this type
    fn has_field(&self, field: &str) -> bool {
        self.field_names().contains(&field)
    }
}

/// [`ObjectFactory`] for any [`ManagedEntity`]
pub struct EntityFactory<T>(PhantomData<fn() -> T>);

impl<T: ManagedEntity> EntityFactory<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }

    /// Shared factory, as stored in the object registry
    pub fn shared() -> Arc<dyn ObjectFactory> {
        Arc::new(Self::new())
    }
}

impl<T: ManagedEntity> Default for EntityFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ManagedEntity> ObjectFactory for EntityFactory<T> {
    fn object_type(&self) -> &str {
        T::OBJECT_TYPE
    }

    fn field_names(&self) -> &'static [&'static str] {
        T::FIELDS
    }

    fn blank(&self) -> Box<dyn ManagedObject> {
        Box::new(T::blank())
    }
}
