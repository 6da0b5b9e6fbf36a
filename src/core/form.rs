//! Form contract used by the new/edit flow, and the default entity-backed form

use crate::core::entity::{ManagedObject, ObjectFactory};
use crate::core::field::FieldValue;
use crate::core::request::DashboardRequest;
use crate::core::validation::FieldRules;
use indexmap::IndexMap;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// A form bound to one managed object
pub trait Form: Send + Sync {
    /// Name used as the prefix of every input (`{name}[{field}]`)
    fn name(&self) -> &str;

    /// Object the form edits
    fn set_data(&mut self, object: Box<dyn ManagedObject>);

    /// Read submitted values from the request
    fn bind(&mut self, request: &DashboardRequest);

    fn is_submitted(&self) -> bool;

    fn is_valid(&self) -> bool;

    /// The object holding the submitted values
    fn data(&self) -> Option<Box<dyn ManagedObject>>;

    /// Everything a template needs to render the form
    fn view(&self) -> serde_json::Value;
}

/// A reusable form definition; `create` builds a form around optional data
pub trait FormType: Send + Sync {
    fn create(&self, data: Option<Box<dyn ManagedObject>>) -> Option<Box<dyn Form>>;
}

/// Builds an empty form on demand
pub type FormFactoryFn = Arc<dyn Fn() -> Option<Box<dyn Form>> + Send + Sync>;

/// Form factories and form types, each keyed by name
#[derive(Clone, Default)]
pub struct FormRegistry {
    factories: HashMap<String, FormFactoryFn>,
    types: HashMap<String, Arc<dyn FormType>>,
}

impl FormRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_factory<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Option<Box<dyn Form>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn register_type(&mut self, name: impl Into<String>, form_type: Arc<dyn FormType>) {
        self.types.insert(name.into(), form_type);
    }

    pub fn factory(&self, name: &str) -> Option<&FormFactoryFn> {
        self.factories.get(name)
    }

    pub fn form_type(&self, name: &str) -> Option<&Arc<dyn FormType>> {
        self.types.get(name)
    }
}

impl std::fmt::Debug for FormRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormRegistry")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Form editing the fields of a managed object by name
pub struct EntityForm {
    name: String,
    factory: Arc<dyn ObjectFactory>,
    fields: Vec<String>,
    rules: FieldRules,
    object: Option<Box<dyn ManagedObject>>,
    submitted: bool,
    raw_values: IndexMap<String, String>,
    errors: IndexMap<String, Vec<String>>,
}

impl EntityForm {
    fn input_name(&self, field: &str) -> String {
        format!("{}[{}]", self.name, field)
    }

    fn add_error(&mut self, field: &str, message: String) {
        self.errors.entry(field.to_string()).or_default().push(message);
    }

    pub fn errors(&self) -> &IndexMap<String, Vec<String>> {
        &self.errors
    }
}

impl Form for EntityForm {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_data(&mut self, object: Box<dyn ManagedObject>) {
        self.object = Some(object);
    }

    fn bind(&mut self, request: &DashboardRequest) {
        if !request.is_post() || !request.has_form_data(&self.name) {
            return;
        }
        self.submitted = true;
        self.errors.clear();

        let mut object = self
            .object
            .take()
            .unwrap_or_else(|| self.factory.blank());

        for field in self.fields.clone() {
            let Some(raw) = request.body_value(&self.input_name(&field)) else {
                continue;
            };
            self.raw_values.insert(field.clone(), raw.to_string());

            let written = self
                .rules
                .filter(&field, FieldValue::String(raw.to_string()))
                .and_then(|value| object.set_field(&field, value).map_err(|e| e.to_string()));
            if let Err(message) = written {
                self.add_error(&field, message);
            }
        }

        for field in self.fields.clone() {
            if self.errors.contains_key(&field) {
                continue;
            }
            let value = object.get_field(&field).unwrap_or(FieldValue::Null);
            for message in self.rules.validate(&field, &value) {
                self.add_error(&field, message);
            }
        }

        self.object = Some(object);
    }

    fn is_submitted(&self) -> bool {
        self.submitted
    }

    fn is_valid(&self) -> bool {
        self.submitted && self.errors.is_empty()
    }

    fn data(&self) -> Option<Box<dyn ManagedObject>> {
        self.object.as_ref().map(|object| object.clone_object())
    }

    fn view(&self) -> serde_json::Value {
        let fields: Vec<_> = self
            .fields
            .iter()
            .map(|field| {
                let value = match self.raw_values.get(field) {
                    Some(raw) => raw.clone(),
                    None => self
                        .object
                        .as_ref()
                        .and_then(|object| object.get_field(field))
                        .map(|value| value.to_string())
                        .unwrap_or_default(),
                };
                json!({
                    "name": field,
                    "full_name": self.input_name(field),
                    "value": value,
                    "errors": self.errors.get(field).cloned().unwrap_or_default(),
                })
            })
            .collect();

        json!({
            "name": self.name,
            "object_type": self.factory.object_type(),
            "submitted": self.submitted,
            "valid": self.is_valid(),
            "fields": fields,
        })
    }
}

/// [`FormType`] producing [`EntityForm`]s for one object type
#[derive(Clone)]
pub struct EntityFormType {
    name: String,
    factory: Arc<dyn ObjectFactory>,
    fields: Vec<String>,
    rules: FieldRules,
}

impl EntityFormType {
    /// Form over every field of the type except `id`
    pub fn new(factory: Arc<dyn ObjectFactory>) -> Self {
        let fields = factory
            .field_names()
            .iter()
            .filter(|name| **name != "id")
            .map(|name| name.to_string())
            .collect();
        Self {
            name: factory.object_type().to_string(),
            factory,
            fields,
            rules: FieldRules::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Restrict the form to these fields, in this order
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn filter<F>(mut self, field: &str, filter: F) -> Self
    where
        F: Fn(&str, FieldValue) -> anyhow::Result<FieldValue> + Send + Sync + 'static,
    {
        self.rules.add_filter(field, filter);
        self
    }

    pub fn validator<F>(mut self, field: &str, validator: F) -> Self
    where
        F: Fn(&str, &FieldValue) -> Result<(), String> + Send + Sync + 'static,
    {
        self.rules.add_validator(field, validator);
        self
    }

    /// A fresh, unbound form
    pub fn build(&self) -> EntityForm {
        EntityForm {
            name: self.name.clone(),
            factory: self.factory.clone(),
            fields: self.fields.clone(),
            rules: self.rules.clone(),
            object: None,
            submitted: false,
            raw_values: IndexMap::new(),
            errors: IndexMap::new(),
        }
    }

    /// Shortcut producing a [`FormFactoryFn`]-compatible closure
    pub fn into_factory(self) -> impl Fn() -> Option<Box<dyn Form>> + Send + Sync + 'static {
        move || Some(Box::new(self.build()) as Box<dyn Form>)
    }
}

impl FormType for EntityFormType {
    fn create(&self, data: Option<Box<dyn ManagedObject>>) -> Option<Box<dyn Form>> {
        let mut form = self.build();
        if let Some(object) = data {
            form.set_data(object);
        }
        Some(Box::new(form))
    }
}
