//! Validated, read-only view of the dashboard configuration
//!
//! [`DashboardRegistry::build`] checks the whole configuration against the
//! registered factories, handlers, hooks, forms and object managers once, at
//! startup. Flows then look settings up by entity type without re-checking.

use super::{
    Dashboard, DashboardConfig, ImportKind, ImportRule, ManagedObjectConfiguration,
    NewObjectConfiguration, PredefinedCriteria, RedirectConfig,
};
use crate::config::FormSource;
use crate::core::entity::ObjectFactory;
use crate::core::error::ConfigurationError;
use crate::core::form::FormRegistry;
use crate::core::hooks::{HookRegistry, HookStage};
use crate::core::operation::{Operation, OperationRegistry};
use crate::server::entity_registry::ObjectRegistry;
use indexmap::IndexMap;
use std::sync::Arc;

/// Name of the dashboard synthesized when none is declared
pub const DEFAULT_DASHBOARD_NAME: &str = "default";

/// Registered collaborators the configuration is checked against
pub struct RegistryContext<'a> {
    pub objects: &'a ObjectRegistry,
    pub operations: &'a OperationRegistry,
    pub hooks: &'a HookRegistry,
    pub forms: &'a FormRegistry,
    /// Names of the custom object managers
    pub object_managers: Vec<&'a str>,
}

/// A managed object type with its configuration and factory
#[derive(Clone)]
pub struct ObjectDefinition {
    pub config: ManagedObjectConfiguration,
    pub factory: Arc<dyn ObjectFactory>,
    operations: IndexMap<String, Operation>,
}

impl ObjectDefinition {
    pub fn object_type(&self) -> &str {
        &self.config.object_type
    }

    pub fn label(&self) -> &str {
        self.config.display_label()
    }

    /// Fields shown in list views; at least one is required to list
    pub fn fields_to_show(&self) -> Result<&[String], ConfigurationError> {
        if self.config.list.fields.is_empty() {
            return Err(ConfigurationError::NoFieldsToShow {
                object_type: self.object_type().to_string(),
            });
        }
        Ok(&self.config.list.fields)
    }

    pub fn results_per_page(&self) -> usize {
        self.config.list.results_per_page
    }

    pub fn criteria(&self, name: &str) -> Result<&PredefinedCriteria, ConfigurationError> {
        self.config
            .list
            .criteria
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownCriteria {
                object_type: self.object_type().to_string(),
                criteria: name.to_string(),
            })
    }

    pub fn operation(&self, name: &str) -> Result<&Operation, ConfigurationError> {
        self.operations
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownOperation {
                object_type: self.object_type().to_string(),
                operation: name.to_string(),
            })
    }

    /// Every operation, in declaration order
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.values()
    }

    pub fn redirect(&self, name: &str) -> Result<&RedirectConfig, ConfigurationError> {
        self.config
            .list
            .redirects
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownRedirect {
                object_type: self.object_type().to_string(),
                redirect: name.to_string(),
            })
    }

    pub fn new_object(&self) -> Result<&NewObjectConfiguration, ConfigurationError> {
        self.config
            .new_object
            .as_ref()
            .ok_or_else(|| ConfigurationError::NoNewObjectConfiguration {
                object_type: self.object_type().to_string(),
            })
    }

    /// Import rules in declaration order; an object without any cannot import
    pub fn imports(&self) -> Result<&IndexMap<String, ImportRule>, ConfigurationError> {
        self.config
            .imports
            .as_ref()
            .filter(|imports| !imports.is_empty())
            .ok_or_else(|| ConfigurationError::NoImports {
                object_type: self.object_type().to_string(),
            })
    }
}

impl std::fmt::Debug for ObjectDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectDefinition")
            .field("config", &self.config)
            .field("operations", &self.operations)
            .finish()
    }
}

/// Typed registry of dashboards and managed objects
#[derive(Debug, Clone)]
pub struct DashboardRegistry {
    default_dashboard: String,
    dashboards: IndexMap<String, Dashboard>,
    objects: IndexMap<String, ObjectDefinition>,
}

impl DashboardRegistry {
    /// Validate a configuration and index it by name
    pub fn build(
        config: DashboardConfig,
        context: &RegistryContext<'_>,
    ) -> Result<Self, ConfigurationError> {
        let mut objects = IndexMap::new();
        for object in config.objects {
            if objects.contains_key(&object.object_type) {
                return Err(ConfigurationError::DuplicateObject {
                    object_type: object.object_type,
                });
            }
            let definition = Self::check_object(object, context)?;
            objects.insert(definition.object_type().to_string(), definition);
        }

        let mut dashboards: IndexMap<String, Dashboard> = IndexMap::new();
        if config.dashboards.is_empty() {
            let mut dashboard = Dashboard::new(DEFAULT_DASHBOARD_NAME, "Dashboard");
            dashboard.objects = objects.keys().cloned().collect();
            dashboards.insert(dashboard.name.clone(), dashboard);
        }
        for dashboard in config.dashboards {
            if dashboards.contains_key(&dashboard.name) {
                return Err(ConfigurationError::DuplicateDashboard {
                    name: dashboard.name,
                });
            }
            if let Some(unknown) = dashboard.objects.iter().find(|o| !objects.contains_key(*o)) {
                return Err(ConfigurationError::UnknownObject {
                    object_type: unknown.clone(),
                });
            }
            dashboards.insert(dashboard.name.clone(), dashboard);
        }

        let default_dashboard = match config.default_dashboard {
            Some(name) if dashboards.contains_key(&name) => name,
            Some(name) => return Err(ConfigurationError::UnknownDashboard { name }),
            None => dashboards
                .keys()
                .next()
                .cloned()
                .unwrap_or_else(|| DEFAULT_DASHBOARD_NAME.to_string()),
        };

        tracing::debug!(
            dashboards = dashboards.len(),
            objects = objects.len(),
            "dashboard configuration validated"
        );

        Ok(Self {
            default_dashboard,
            dashboards,
            objects,
        })
    }

    fn check_object(
        config: ManagedObjectConfiguration,
        context: &RegistryContext<'_>,
    ) -> Result<ObjectDefinition, ConfigurationError> {
        let object_type = config.object_type.clone();
        let factory =
            context
                .objects
                .get(&object_type)
                .ok_or_else(|| ConfigurationError::NoObjectFactory {
                    object_type: object_type.clone(),
                })?;

        if config.list.results_per_page == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: format!("{}.list.results_per_page", object_type),
                value: "0".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        let mut operations = IndexMap::new();
        for (name, operation) in &config.list.operations {
            if !context.operations.contains(&operation.handler) {
                return Err(ConfigurationError::UnknownOperationHandler {
                    handler: operation.handler.clone(),
                });
            }
            operations.insert(
                name.clone(),
                Operation {
                    name: name.clone(),
                    label: operation.label.clone(),
                    object_type: object_type.clone(),
                    handler: operation.handler.clone(),
                },
            );
        }

        if let Some(new_object) = &config.new_object {
            match new_object.form_source(&object_type)? {
                FormSource::Factory(name) if context.forms.factory(name).is_none() => {
                    return Err(ConfigurationError::UnknownFormSource {
                        kind: "factory",
                        name: name.to_string(),
                    });
                }
                FormSource::Class(name) if context.forms.form_type(name).is_none() => {
                    return Err(ConfigurationError::UnknownFormSource {
                        kind: "type",
                        name: name.to_string(),
                    });
                }
                _ => {}
            }
            check_hook(context.hooks, HookStage::Transform, &new_object.transform)?;
            check_hook(context.hooks, HookStage::BeforeInsert, &new_object.before_insert)?;
        }

        for (key, rule) in config.imports.iter().flatten() {
            rule.separator_byte()?;
            if rule.kind == ImportKind::PasteCsv {
                rule.paste_positions().map_err(|err| match err {
                    ConfigurationError::InvalidValue { field, value, message } => {
                        ConfigurationError::InvalidValue {
                            field: format!("{}.imports.{}.{}", object_type, key, field),
                            value,
                            message,
                        }
                    }
                    other => other,
                })?;
            }
            if let Some(field) = rule.mapping.values().find(|f| !factory.has_field(f)) {
                return Err(ConfigurationError::UnknownField {
                    object_type: object_type.clone(),
                    field: field.clone(),
                });
            }
            check_hook(context.hooks, HookStage::ImportBeforeInsert, &rule.before_insert)?;
            check_hook(context.hooks, HookStage::ImportPostInsert, &rule.post_insert)?;
        }

        if let Some(name) = &config.object_manager {
            if !context.object_managers.contains(&name.as_str()) {
                return Err(ConfigurationError::UnknownObjectManager { name: name.clone() });
            }
        }

        Ok(ObjectDefinition {
            config,
            factory,
            operations,
        })
    }

    pub fn default_dashboard(&self) -> Result<&Dashboard, ConfigurationError> {
        self.dashboard(&self.default_dashboard)
    }

    pub fn dashboard(&self, name: &str) -> Result<&Dashboard, ConfigurationError> {
        self.dashboards
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownDashboard {
                name: name.to_string(),
            })
    }

    pub fn object(&self, object_type: &str) -> Result<&ObjectDefinition, ConfigurationError> {
        self.objects
            .get(object_type)
            .ok_or_else(|| ConfigurationError::UnknownObject {
                object_type: object_type.to_string(),
            })
    }

    /// Every managed object, in declaration order
    pub fn objects(&self) -> impl Iterator<Item = &ObjectDefinition> {
        self.objects.values()
    }
}

fn check_hook(
    hooks: &HookRegistry,
    stage: HookStage,
    name: &Option<String>,
) -> Result<(), ConfigurationError> {
    match name {
        Some(name) if !hooks.contains(stage, name) => Err(ConfigurationError::HookNotCallable {
            stage: stage.to_string(),
            hook: name.clone(),
        }),
        _ => Ok(()),
    }
}
