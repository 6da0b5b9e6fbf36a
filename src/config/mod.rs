//! Configuration loading and management
//!
//! A dashboard is described declaratively: which object types it manages, how
//! each one is listed, created, imported and operated on. The description is
//! loaded from YAML or assembled in code with the fluent builders below, then
//! validated once by [`DashboardRegistry::build`].

pub mod registry;

pub use registry::{DashboardRegistry, ObjectDefinition};

use crate::core::error::ConfigurationError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default number of rows shown on one list page
pub const DEFAULT_RESULTS_PER_PAGE: usize = 20;

fn default_results_per_page() -> usize {
    DEFAULT_RESULTS_PER_PAGE
}

/// A named group of managed objects shown as a menu
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dashboard {
    pub name: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Object types shown as menu entries, in menu order
    #[serde(default)]
    pub objects: Vec<String>,
}

impl Dashboard {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            description: None,
            objects: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn object(mut self, object_type: impl Into<String>) -> Self {
        self.objects.push(object_type.into());
        self
    }
}

/// A method of the object manager listing a subset of objects
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredefinedCriteria {
    /// Repository method called without arguments
    pub method: String,

    /// Rows are arbitrary data shown as-is instead of managed objects
    #[serde(default)]
    pub custom_result_set: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl PredefinedCriteria {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            custom_result_set: false,
            label: None,
        }
    }

    pub fn custom_result_set(mut self) -> Self {
        self.custom_result_set = true;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Operation entry of a list configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationConfig {
    pub label: String,

    /// Name of the registered operation handler
    pub handler: String,
}

/// Link from a listed object to a page outside the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RedirectConfig {
    pub label: String,

    /// Target path; `{id}` is replaced by the object identifier
    pub path: String,
}

/// How objects of a type are listed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListConfiguration {
    /// Fields shown as columns, in column order
    #[serde(default)]
    pub fields: Vec<String>,

    #[serde(default = "default_results_per_page")]
    pub results_per_page: usize,

    #[serde(default)]
    pub criteria: IndexMap<String, PredefinedCriteria>,

    #[serde(default)]
    pub operations: IndexMap<String, OperationConfig>,

    #[serde(default)]
    pub redirects: IndexMap<String, RedirectConfig>,
}

impl Default for ListConfiguration {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            results_per_page: DEFAULT_RESULTS_PER_PAGE,
            criteria: IndexMap::new(),
            operations: IndexMap::new(),
            redirects: IndexMap::new(),
        }
    }
}

/// Where the form of the new/edit view comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormSource<'a> {
    /// A registered form factory, called then given the object
    Factory(&'a str),
    /// A registered form type, created around the object
    Class(&'a str),
}

/// How objects of a type are created and edited
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NewObjectConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_factory: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_class: Option<String>,

    /// Transform hook applied to the submitted object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,

    /// Hook run with the object and the form before persisting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_insert: Option<String>,
}

impl NewObjectConfiguration {
    pub fn with_form_factory(name: impl Into<String>) -> Self {
        Self {
            form_factory: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_form_class(name: impl Into<String>) -> Self {
        Self {
            form_class: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn transform(mut self, hook: impl Into<String>) -> Self {
        self.transform = Some(hook.into());
        self
    }

    pub fn before_insert(mut self, hook: impl Into<String>) -> Self {
        self.before_insert = Some(hook.into());
        self
    }

    /// The single configured form source
    pub fn form_source(&self, object_type: &str) -> Result<FormSource<'_>, ConfigurationError> {
        match (&self.form_factory, &self.form_class) {
            (Some(factory), None) => Ok(FormSource::Factory(factory)),
            (None, Some(class)) => Ok(FormSource::Class(class)),
            (Some(_), Some(_)) => Err(ConfigurationError::AmbiguousFormSource {
                object_type: object_type.to_string(),
            }),
            (None, None) => Err(ConfigurationError::NoFormSource {
                object_type: object_type.to_string(),
            }),
        }
    }
}

/// Import variants
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// A CSV file with a header row
    CsvUpload,
    /// CSV text pasted in a text area, without header
    PasteCsv,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::CsvUpload => "csv_upload",
            ImportKind::PasteCsv => "paste_csv",
        }
    }
}

/// One way of importing objects of a type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportRule {
    #[serde(rename = "type")]
    pub kind: ImportKind,

    /// Title shown above the import form
    pub name: String,

    /// Accepted MIME types for uploads; empty accepts anything
    #[serde(default)]
    pub mime_types: Vec<String>,

    /// Source column → target field
    #[serde(default)]
    pub mapping: IndexMap<String, String>,

    /// Field separator of pasted text (`,` when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<char>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_insert: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_insert: Option<String>,
}

impl ImportRule {
    fn new(kind: ImportKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            mime_types: Vec::new(),
            mapping: IndexMap::new(),
            separator: None,
            before_insert: None,
            post_insert: None,
        }
    }

    pub fn csv_upload(name: impl Into<String>) -> Self {
        Self::new(ImportKind::CsvUpload, name)
    }

    pub fn paste_csv(name: impl Into<String>) -> Self {
        Self::new(ImportKind::PasteCsv, name)
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_types.push(mime_type.into());
        self
    }

    /// Map a source column to a target field
    pub fn map(mut self, column: impl Into<String>, field: impl Into<String>) -> Self {
        self.mapping.insert(column.into(), field.into());
        self
    }

    pub fn separator(mut self, separator: char) -> Self {
        self.separator = Some(separator);
        self
    }

    pub fn before_insert(mut self, hook: impl Into<String>) -> Self {
        self.before_insert = Some(hook.into());
        self
    }

    pub fn post_insert(mut self, hook: impl Into<String>) -> Self {
        self.post_insert = Some(hook.into());
        self
    }

    /// Separator as the single byte the CSV reader expects
    pub fn separator_byte(&self) -> Result<u8, ConfigurationError> {
        let separator = self.separator.unwrap_or(',');
        u8::try_from(separator)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| ConfigurationError::InvalidValue {
                field: "separator".to_string(),
                value: separator.to_string(),
                message: "separator must be a single ASCII character".to_string(),
            })
    }

    /// Positions of the mapped fields in a pasted line
    ///
    /// A mapping column that parses as an integer is that 0-based position in
    /// the line; any other column name stands for its position in the mapping.
    /// Every position must fall inside a line of `mapping.len()` fields and
    /// appear only once.
    pub fn paste_positions(&self) -> Result<Vec<(usize, &str)>, ConfigurationError> {
        let width = self.mapping.len();
        let mut positions: Vec<(usize, &str)> = Vec::with_capacity(width);
        for (ordinal, (column, field)) in self.mapping.iter().enumerate() {
            let index = column.trim().parse::<usize>().unwrap_or(ordinal);
            let invalid = |message: String| ConfigurationError::InvalidValue {
                field: "mapping".to_string(),
                value: column.clone(),
                message,
            };
            if index >= width {
                return Err(invalid(format!(
                    "column {} is outside a line of {} fields",
                    index, width
                )));
            }
            if positions.iter().any(|(taken, _)| *taken == index) {
                return Err(invalid(format!("column {} is mapped more than once", index)));
            }
            positions.push((index, field.as_str()));
        }
        Ok(positions)
    }

    /// Whether an uploaded file of this MIME type is accepted
    pub fn accepts_mime_type(&self, mime_type: Option<&str>) -> bool {
        if self.mime_types.is_empty() {
            return true;
        }
        mime_type.is_some_and(|mime| {
            self.mime_types
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(mime))
        })
    }
}

/// Everything the dashboard knows about one object type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManagedObjectConfiguration {
    /// Entity type identifier
    #[serde(rename = "type")]
    pub object_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default)]
    pub list: ListConfiguration,

    #[serde(default, rename = "new", skip_serializing_if = "Option::is_none")]
    pub new_object: Option<NewObjectConfiguration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imports: Option<IndexMap<String, ImportRule>>,

    /// Name of a registered object manager used to persist new/edited objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_manager: Option<String>,
}

impl ManagedObjectConfiguration {
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            label: None,
            list: ListConfiguration::default(),
            new_object: None,
            imports: None,
            object_manager: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label shown in menus and titles, the type identifier when unset
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.object_type)
    }

    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.list.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn results_per_page(mut self, results_per_page: usize) -> Self {
        self.list.results_per_page = results_per_page;
        self
    }

    pub fn criteria(mut self, name: impl Into<String>, criteria: PredefinedCriteria) -> Self {
        self.list.criteria.insert(name.into(), criteria);
        self
    }

    pub fn operation(
        mut self,
        name: impl Into<String>,
        label: impl Into<String>,
        handler: impl Into<String>,
    ) -> Self {
        self.list.operations.insert(
            name.into(),
            OperationConfig {
                label: label.into(),
                handler: handler.into(),
            },
        );
        self
    }

    pub fn redirect(
        mut self,
        name: impl Into<String>,
        label: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        self.list.redirects.insert(
            name.into(),
            RedirectConfig {
                label: label.into(),
                path: path.into(),
            },
        );
        self
    }

    pub fn new_object(mut self, config: NewObjectConfiguration) -> Self {
        self.new_object = Some(config);
        self
    }

    pub fn import(mut self, key: impl Into<String>, rule: ImportRule) -> Self {
        self.imports
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), rule);
        self
    }

    pub fn object_manager(mut self, name: impl Into<String>) -> Self {
        self.object_manager = Some(name.into());
        self
    }
}

/// Complete configuration of the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DashboardConfig {
    /// Name of the dashboard shown when no action is requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_dashboard: Option<String>,

    #[serde(default)]
    pub dashboards: Vec<Dashboard>,

    #[serde(default)]
    pub objects: Vec<ManagedObjectConfiguration>,
}

impl DashboardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigurationError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigurationError::Io {
            message: format!("{}: {}", path, e),
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigurationError::Parse {
            file: Some(path.to_string()),
            message: e.to_string(),
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigurationError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigurationError::Parse {
            file: None,
            message: e.to_string(),
        })
    }

    pub fn dashboard(mut self, dashboard: Dashboard) -> Self {
        self.dashboards.push(dashboard);
        self
    }

    pub fn default_dashboard(mut self, name: impl Into<String>) -> Self {
        self.default_dashboard = Some(name.into());
        self
    }

    pub fn object(mut self, object: ManagedObjectConfiguration) -> Self {
        self.objects.push(object);
        self
    }

    /// Find the configuration of an object type
    pub fn find_object(&self, object_type: &str) -> Option<&ManagedObjectConfiguration> {
        self.objects.iter().find(|o| o.object_type == object_type)
    }
}
