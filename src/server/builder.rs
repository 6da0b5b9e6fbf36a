//! DashboardBuilder for fluent API to build the dashboard server

use super::dispatcher::DashboardAction;
use super::entity_registry::ObjectRegistry;
use super::host::DashboardHost;
use super::path::{DEFAULT_MOUNT_PATH, PathGenerator};
use super::render::{TemplateRenderer, TeraRenderer};
use super::router::build_dashboard_routes;
use crate::config::DashboardConfig;
use crate::config::registry::{DashboardRegistry, RegistryContext};
use crate::core::context::DashboardContext;
use crate::core::entity::{ManagedEntity, ManagedObject, ObjectFactory};
use crate::core::error::ConfigurationError;
use crate::core::form::{Form, FormRegistry, FormType};
use crate::core::hooks::{HookRegistry, HookStage};
use crate::core::operation::{Operation, OperationHandler, OperationRegistry};
use crate::core::service::ObjectManager;
use anyhow::Result;
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder wiring configuration, collaborators and routes together
///
/// # Example
///
/// ```ignore
/// let app = DashboardBuilder::new()
///     .with_config_file("dashboard.yaml")?
///     .register_entity::<Book>()
///     .with_object_manager(InMemoryObjectManager::new())
///     .register_operation_fn("publish", |_, book, _| publish(book))
///     .build()?;
/// ```
pub struct DashboardBuilder {
    config: Option<DashboardConfig>,
    objects: ObjectRegistry,
    object_manager: Option<Arc<dyn ObjectManager>>,
    object_managers: HashMap<String, Arc<dyn ObjectManager>>,
    operations: OperationRegistry,
    hooks: HookRegistry,
    forms: FormRegistry,
    renderer: Option<Arc<dyn TemplateRenderer>>,
    template_glob: Option<String>,
    mount_path: String,
    custom_routes: Vec<Router>,
    /// First name registered twice, reported by `build_host`
    duplicate: Option<ConfigurationError>,
}

impl DashboardBuilder {
    /// Create a new DashboardBuilder
    pub fn new() -> Self {
        Self {
            config: None,
            objects: ObjectRegistry::new(),
            object_manager: None,
            object_managers: HashMap::new(),
            operations: OperationRegistry::new(),
            hooks: HookRegistry::new(),
            forms: FormRegistry::new(),
            renderer: None,
            template_glob: None,
            mount_path: DEFAULT_MOUNT_PATH.to_string(),
            custom_routes: Vec::new(),
            duplicate: None,
        }
    }

    fn check_unique(&mut self, kind: &'static str, name: &str, taken: bool) {
        if taken && self.duplicate.is_none() {
            self.duplicate = Some(ConfigurationError::DuplicateRegistration {
                kind,
                name: name.to_string(),
            });
        }
    }

    /// Set the dashboard configuration (required)
    pub fn with_config(mut self, config: DashboardConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load the dashboard configuration from a YAML file
    pub fn with_config_file(self, path: &str) -> Result<Self> {
        let config = DashboardConfig::from_yaml_file(path)?;
        Ok(self.with_config(config))
    }

    /// Register a managed entity type
    pub fn register_entity<T: ManagedEntity>(mut self) -> Self {
        let taken = self.objects.get(T::OBJECT_TYPE).is_some();
        self.check_unique("object factory", T::OBJECT_TYPE, taken);
        self.objects.register_entity::<T>();
        self
    }

    /// Register a hand-written object factory
    pub fn register_factory(mut self, factory: Arc<dyn ObjectFactory>) -> Self {
        let taken = self.objects.get(factory.object_type()).is_some();
        self.check_unique("object factory", factory.object_type(), taken);
        self.objects.register(factory);
        self
    }

    /// Set the object manager used for reads, imports and default persistence (required)
    pub fn with_object_manager(mut self, manager: impl ObjectManager + 'static) -> Self {
        self.object_manager = Some(Arc::new(manager));
        self
    }

    /// Same as [`with_object_manager`](Self::with_object_manager), for a manager
    /// that is already shared
    pub fn with_shared_object_manager(mut self, manager: Arc<dyn ObjectManager>) -> Self {
        self.object_manager = Some(manager);
        self
    }

    /// Register a custom object manager that object configurations can name
    pub fn with_named_object_manager(
        mut self,
        name: impl Into<String>,
        manager: Arc<dyn ObjectManager>,
    ) -> Self {
        let name = name.into();
        let taken = self.object_managers.contains_key(&name);
        self.check_unique("object manager", &name, taken);
        self.object_managers.insert(name, manager);
        self
    }

    pub fn register_operation(
        mut self,
        name: impl Into<String>,
        handler: Arc<dyn OperationHandler>,
    ) -> Self {
        let name = name.into();
        let taken = self.operations.contains(&name);
        self.check_unique("operation handler", &name, taken);
        self.operations.register(name, handler);
        self
    }

    pub fn register_operation_fn<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Operation, Box<dyn ManagedObject>, &DashboardContext) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        let taken = self.operations.contains(&name);
        self.check_unique("operation handler", &name, taken);
        self.operations.register_fn(name, f);
        self
    }

    pub fn register_transform_hook<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(Box<dyn ManagedObject>) -> anyhow::Result<Option<Box<dyn ManagedObject>>>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        let taken = self.hooks.contains(HookStage::Transform, &name);
        self.check_unique("transform hook", &name, taken);
        self.hooks.register_transform(name, hook);
        self
    }

    pub fn register_before_insert_hook<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut dyn ManagedObject, &dyn Form) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let name = name.into();
        let taken = self.hooks.contains(HookStage::BeforeInsert, &name);
        self.check_unique("before insert hook", &name, taken);
        self.hooks.register_before_insert(name, hook);
        self
    }

    pub fn register_import_before_insert_hook<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut dyn ManagedObject) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let name = name.into();
        let taken = self.hooks.contains(HookStage::ImportBeforeInsert, &name);
        self.check_unique("import before insert hook", &name, taken);
        self.hooks.register_import_before_insert(name, hook);
        self
    }

    pub fn register_import_post_insert_hook<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&dyn ManagedObject) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let name = name.into();
        let taken = self.hooks.contains(HookStage::ImportPostInsert, &name);
        self.check_unique("import post insert hook", &name, taken);
        self.hooks.register_import_post_insert(name, hook);
        self
    }

    pub fn register_form_factory<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Option<Box<dyn Form>> + Send + Sync + 'static,
    {
        let name = name.into();
        let taken = self.forms.factory(&name).is_some();
        self.check_unique("form factory", &name, taken);
        self.forms.register_factory(name, factory);
        self
    }

    pub fn register_form_type(mut self, name: impl Into<String>, form_type: Arc<dyn FormType>) -> Self {
        let name = name.into();
        let taken = self.forms.form_type(&name).is_some();
        self.check_unique("form type", &name, taken);
        self.forms.register_type(name, form_type);
        self
    }

    /// Replace the built-in tera renderer
    pub fn with_renderer(mut self, renderer: impl TemplateRenderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Load templates overriding the built-in ones (e.g. `"templates/**/*.html"`)
    pub fn with_templates(mut self, glob: impl Into<String>) -> Self {
        self.template_glob = Some(glob.into());
        self
    }

    /// Serve the dashboard at another path than `/dashboard`
    pub fn mount_at(mut self, path: impl Into<String>) -> Self {
        self.mount_path = path.into();
        self
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Validate the configuration and build the host
    pub fn build_host(mut self) -> Result<DashboardHost> {
        if let Some(duplicate) = self.duplicate.take() {
            return Err(duplicate.into());
        }

        let config = self
            .config
            .take()
            .ok_or_else(|| anyhow::anyhow!("DashboardConfig is required. Call .with_config()"))?;

        let object_manager = self.object_manager.take().ok_or_else(|| {
            anyhow::anyhow!("ObjectManager is required. Call .with_object_manager()")
        })?;

        let registry = DashboardRegistry::build(
            config,
            &RegistryContext {
                objects: &self.objects,
                operations: &self.operations,
                hooks: &self.hooks,
                forms: &self.forms,
                object_managers: self.object_managers.keys().map(String::as_str).collect(),
            },
        )?;

        let paths = PathGenerator::new(self.mount_path.clone());
        let renderer: Arc<dyn TemplateRenderer> = match (self.renderer.take(), &self.template_glob) {
            (Some(renderer), _) => renderer,
            (None, Some(glob)) => Arc::new(TeraRenderer::with_overrides(paths.clone(), glob)?),
            (None, None) => Arc::new(TeraRenderer::new(paths.clone())?),
        };

        Ok(DashboardHost::from_builder_components(
            registry,
            object_manager,
            self.object_managers,
            self.operations,
            self.hooks,
            self.forms,
            renderer,
            paths,
        ))
    }

    /// Build the dispatcher without any HTTP layer
    pub fn build_action(self) -> Result<DashboardAction> {
        Ok(DashboardAction::new(Arc::new(self.build_host()?)))
    }

    /// Build the final router
    ///
    /// This generates:
    /// - the dashboard route (GET and POST) at the mount path
    /// - health check routes
    /// - custom routes
    pub fn build(mut self) -> Result<Router> {
        let custom_routes = std::mem::take(&mut self.custom_routes);
        let mount_path = self.mount_path.clone();
        let action = self.build_action()?;

        let mut app = build_dashboard_routes(action, &mount_path);
        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }
        Ok(app)
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let mount_path = self.mount_path.clone();
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Dashboard listening on http://{}{}", addr, mount_path);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for DashboardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
