//! Named callbacks invoked around object creation and import

use crate::core::entity::ManagedObject;
use crate::core::error::{ConfigurationError, DashboardError, DashboardResult};
use crate::core::form::Form;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Replaces the object submitted through a form; `None` is a broken contract
pub type TransformHook =
    Arc<dyn Fn(Box<dyn ManagedObject>) -> anyhow::Result<Option<Box<dyn ManagedObject>>> + Send + Sync>;

/// Runs after a form is validated, before the object is persisted
pub type BeforeInsertHook =
    Arc<dyn Fn(&mut dyn ManagedObject, &dyn Form) -> anyhow::Result<()> + Send + Sync>;

/// Runs on every imported object before it is persisted
pub type ImportBeforeInsertHook =
    Arc<dyn Fn(&mut dyn ManagedObject) -> anyhow::Result<()> + Send + Sync>;

/// Runs on every imported object after it is persisted
pub type ImportPostInsertHook = Arc<dyn Fn(&dyn ManagedObject) -> anyhow::Result<()> + Send + Sync>;

/// Where a hook runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStage {
    Transform,
    BeforeInsert,
    ImportBeforeInsert,
    ImportPostInsert,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookStage::Transform => "transform",
            HookStage::BeforeInsert => "before insert",
            HookStage::ImportBeforeInsert => "import before insert",
            HookStage::ImportPostInsert => "import post insert",
        };
        f.write_str(name)
    }
}

/// Hooks registered by name, one namespace per stage
#[derive(Clone, Default)]
pub struct HookRegistry {
    transform: HashMap<String, TransformHook>,
    before_insert: HashMap<String, BeforeInsertHook>,
    import_before_insert: HashMap<String, ImportBeforeInsertHook>,
    import_post_insert: HashMap<String, ImportPostInsertHook>,
}

fn not_callable(stage: HookStage, name: &str) -> DashboardError {
    ConfigurationError::HookNotCallable {
        stage: stage.to_string(),
        hook: name.to_string(),
    }
    .into()
}

fn hook_failed(name: &str, err: anyhow::Error) -> DashboardError {
    DashboardError::Hook {
        hook: name.to_string(),
        message: format!("{:#}", err),
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_transform<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn(Box<dyn ManagedObject>) -> anyhow::Result<Option<Box<dyn ManagedObject>>>
            + Send
            + Sync
            + 'static,
    {
        self.transform.insert(name.into(), Arc::new(hook));
    }

    pub fn register_before_insert<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn(&mut dyn ManagedObject, &dyn Form) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.before_insert.insert(name.into(), Arc::new(hook));
    }

    pub fn register_import_before_insert<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn(&mut dyn ManagedObject) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.import_before_insert.insert(name.into(), Arc::new(hook));
    }

    pub fn register_import_post_insert<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn(&dyn ManagedObject) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.import_post_insert.insert(name.into(), Arc::new(hook));
    }

    pub fn contains(&self, stage: HookStage, name: &str) -> bool {
        match stage {
            HookStage::Transform => self.transform.contains_key(name),
            HookStage::BeforeInsert => self.before_insert.contains_key(name),
            HookStage::ImportBeforeInsert => self.import_before_insert.contains_key(name),
            HookStage::ImportPostInsert => self.import_post_insert.contains_key(name),
        }
    }

    /// Fail with `HookNotCallable` unless the hook is registered for the stage
    pub fn ensure(&self, stage: HookStage, name: &str) -> DashboardResult<()> {
        if self.contains(stage, name) {
            Ok(())
        } else {
            Err(not_callable(stage, name))
        }
    }

    pub fn import_before_insert(&self, name: &str) -> DashboardResult<ImportBeforeInsertHook> {
        self.import_before_insert
            .get(name)
            .cloned()
            .ok_or_else(|| not_callable(HookStage::ImportBeforeInsert, name))
    }

    pub fn import_post_insert(&self, name: &str) -> DashboardResult<ImportPostInsertHook> {
        self.import_post_insert
            .get(name)
            .cloned()
            .ok_or_else(|| not_callable(HookStage::ImportPostInsert, name))
    }

    /// Run a transform hook; a hook returning nothing is a logic error
    pub fn apply_transform(
        &self,
        name: &str,
        object: Box<dyn ManagedObject>,
    ) -> DashboardResult<Box<dyn ManagedObject>> {
        let hook = self
            .transform
            .get(name)
            .ok_or_else(|| not_callable(HookStage::Transform, name))?;

        hook(object).map_err(|e| hook_failed(name, e))?.ok_or_else(|| {
            DashboardError::Logic(format!(
                "Transform hook \"{}\" did not return an object to persist",
                name
            ))
        })
    }

    pub fn apply_before_insert(
        &self,
        name: &str,
        object: &mut dyn ManagedObject,
        form: &dyn Form,
    ) -> DashboardResult<()> {
        let hook = self
            .before_insert
            .get(name)
            .ok_or_else(|| not_callable(HookStage::BeforeInsert, name))?;
        hook(object, form).map_err(|e| hook_failed(name, e))
    }

    /// Run a resolved import hook, attributing failures to `name`
    pub fn run_import_before_insert(
        hook: &ImportBeforeInsertHook,
        name: &str,
        object: &mut dyn ManagedObject,
    ) -> DashboardResult<()> {
        hook(object).map_err(|e| hook_failed(name, e))
    }

    pub fn run_import_post_insert(
        hook: &ImportPostInsertHook,
        name: &str,
        object: &dyn ManagedObject,
    ) -> DashboardResult<()> {
        hook(object).map_err(|e| hook_failed(name, e))
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("transform", &self.transform.keys().collect::<Vec<_>>())
            .field("before_insert", &self.before_insert.keys().collect::<Vec<_>>())
            .field(
                "import_before_insert",
                &self.import_before_insert.keys().collect::<Vec<_>>(),
            )
            .field(
                "import_post_insert",
                &self.import_post_insert.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::FieldValue;

    crate::impl_managed_object!(Note, "note", {
        body: String,
    });

    #[test]
    fn test_transform_replaces_object() {
        let mut hooks = HookRegistry::new();
        hooks.register_transform("shout", |mut object| {
            let body = object.get_field("body").unwrap_or(FieldValue::Null);
            object.set_field("body", FieldValue::String(body.to_string().to_uppercase()))?;
            Ok(Some(object))
        });

        let note = Box::new(Note::new("hello".to_string()));
        let result = hooks.apply_transform("shout", note).unwrap();
        assert_eq!(
            result.get_field("body"),
            Some(FieldValue::String("HELLO".to_string()))
        );
    }

    #[test]
    fn test_transform_returning_none_is_logic_error() {
        let mut hooks = HookRegistry::new();
        hooks.register_transform("drop", |_| Ok(None));

        let err = hooks
            .apply_transform("drop", Box::new(Note::new("x".to_string())))
            .unwrap_err();
        assert_eq!(err.error_code(), "LOGIC_ERROR");
    }

    #[test]
    fn test_unknown_hook_is_not_callable() {
        let hooks = HookRegistry::new();
        let err = hooks.import_post_insert("audit").err().unwrap();
        match err {
            DashboardError::Configuration(ConfigurationError::HookNotCallable { stage, hook }) => {
                assert_eq!(stage, "import post insert");
                assert_eq!(hook, "audit");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_stages_are_separate_namespaces() {
        let mut hooks = HookRegistry::new();
        hooks.register_import_before_insert("normalize", |_| Ok(()));
        assert!(hooks.contains(HookStage::ImportBeforeInsert, "normalize"));
        assert!(!hooks.contains(HookStage::ImportPostInsert, "normalize"));
        assert!(hooks.ensure(HookStage::Transform, "normalize").is_err());
    }

    #[test]
    fn test_hook_failure_is_reported_with_name() {
        let mut hooks = HookRegistry::new();
        hooks.register_import_before_insert("reject", |_| anyhow::bail!("bad row"));
        let hook = hooks.import_before_insert("reject").unwrap();

        let mut note = Note::new("x".to_string());
        let err = HookRegistry::run_import_before_insert(&hook, "reject", &mut note).unwrap_err();
        assert_eq!(err.error_code(), "HOOK_FAILED");
        assert!(err.to_string().contains("bad row"));
    }
}
