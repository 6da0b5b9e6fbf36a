//! Dashboard host
//!
//! This module provides a `DashboardHost` structure holding all state the
//! dispatcher needs: the validated registry, the object managers, and the
//! registries of operations, hooks and forms, plus the renderer and the path
//! generator.
//!
//! The host is immutable once built and is shared through an `Arc` by every
//! request.

use crate::config::DashboardRegistry;
use crate::core::error::{ConfigurationError, DashboardResult};
use crate::core::form::FormRegistry;
use crate::core::hooks::HookRegistry;
use crate::core::operation::OperationRegistry;
use crate::core::service::ObjectManager;
use crate::server::path::PathGenerator;
use crate::server::render::TemplateRenderer;
use std::collections::HashMap;
use std::sync::Arc;

/// Host context containing all dashboard state
///
/// # Example
///
/// ```rust,ignore
/// let host = DashboardHost::from_builder_components(
///     registry,
///     object_manager,
///     object_managers,
///     operations,
///     hooks,
///     forms,
///     renderer,
///     paths,
/// );
///
/// let action = DashboardAction::new(Arc::new(host));
/// let response = action.dispatch(&request, &context).await?;
/// ```
pub struct DashboardHost {
    /// Validated configuration
    pub registry: Arc<DashboardRegistry>,

    /// Object manager used for reads, imports and default persistence
    pub object_manager: Arc<dyn ObjectManager>,

    /// Custom object managers, by name
    pub object_managers: HashMap<String, Arc<dyn ObjectManager>>,

    pub operations: OperationRegistry,

    pub hooks: HookRegistry,

    pub forms: FormRegistry,

    /// Renderer of every view
    pub renderer: Arc<dyn TemplateRenderer>,

    pub paths: PathGenerator,
}

impl DashboardHost {
    /// Build the host from builder components
    #[allow(clippy::too_many_arguments)]
    pub fn from_builder_components(
        registry: DashboardRegistry,
        object_manager: Arc<dyn ObjectManager>,
        object_managers: HashMap<String, Arc<dyn ObjectManager>>,
        operations: OperationRegistry,
        hooks: HookRegistry,
        forms: FormRegistry,
        renderer: Arc<dyn TemplateRenderer>,
        paths: PathGenerator,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            object_manager,
            object_managers,
            operations,
            hooks,
            forms,
            renderer,
            paths,
        }
    }

    /// Object manager persisting objects of a type
    ///
    /// This is the custom manager named in the object configuration when
    /// there is one, the default manager otherwise.
    pub fn persisting_manager(&self, object_type: &str) -> DashboardResult<&dyn ObjectManager> {
        let definition = self.registry.object(object_type)?;
        match definition.config.object_manager.as_deref() {
            None => Ok(self.object_manager.as_ref()),
            Some(name) => self
                .object_managers
                .get(name)
                .map(|manager| manager.as_ref())
                .ok_or_else(|| {
                    ConfigurationError::UnknownObjectManager {
                        name: name.to_string(),
                    }
                    .into()
                }),
        }
    }

    /// Managed object types, in declaration order
    pub fn object_types(&self) -> Vec<&str> {
        self.registry
            .objects()
            .map(|definition| definition.object_type())
            .collect()
    }
}

impl std::fmt::Debug for DashboardHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardHost")
            .field("registry", &self.registry)
            .field(
                "object_managers",
                &self.object_managers.keys().collect::<Vec<_>>(),
            )
            .field("operations", &self.operations.handler_names())
            .field("hooks", &self.hooks)
            .field("forms", &self.forms)
            .field("paths", &self.paths)
            .finish()
    }
}
