//! Named operations run against a single managed object
//!
//! An operation is declared in the list configuration of an object type
//! (`publish`, `archive`...) and points at a handler registered by name. The
//! same handler serves single and batch invocations: a batch is just the
//! handler called once per selected object.

use crate::core::context::DashboardContext;
use crate::core::entity::ManagedObject;
use crate::core::error::{ConfigurationError, DashboardError, DashboardResult};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// A resolved operation of an object type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub name: String,
    pub label: String,
    pub object_type: String,
    pub handler: String,
}

/// Code behind an operation
#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn handle(
        &self,
        operation: &Operation,
        object: Box<dyn ManagedObject>,
        context: &DashboardContext,
    ) -> anyhow::Result<()>;
}

/// Adapter turning a plain closure into an [`OperationHandler`]
pub struct FnOperationHandler<F>(F);

impl<F> FnOperationHandler<F>
where
    F: Fn(&Operation, Box<dyn ManagedObject>, &DashboardContext) -> anyhow::Result<()>
        + Send
        + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> OperationHandler for FnOperationHandler<F>
where
    F: Fn(&Operation, Box<dyn ManagedObject>, &DashboardContext) -> anyhow::Result<()>
        + Send
        + Sync,
{
    async fn handle(
        &self,
        operation: &Operation,
        object: Box<dyn ManagedObject>,
        context: &DashboardContext,
    ) -> anyhow::Result<()> {
        (self.0)(operation, object, context)
    }
}

/// Operation handlers keyed by handler name
#[derive(Clone, Default)]
pub struct OperationRegistry {
    handlers: HashMap<String, Arc<dyn OperationHandler>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn OperationHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    /// Register a synchronous closure as a handler
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Operation, Box<dyn ManagedObject>, &DashboardContext) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.register(name, Arc::new(FnOperationHandler::new(f)));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Run an operation on one object
    ///
    /// Handler failures are reported as [`DashboardError::Operation`].
    pub async fn process_operation(
        &self,
        operation: &Operation,
        object: Box<dyn ManagedObject>,
        context: &DashboardContext,
    ) -> DashboardResult<()> {
        let handler = self.handlers.get(&operation.handler).ok_or_else(|| {
            ConfigurationError::UnknownOperationHandler {
                handler: operation.handler.clone(),
            }
        })?;

        let id = object.id();
        tracing::debug!(
            operation = %operation.name,
            object_type = %operation.object_type,
            id = %id,
            "processing operation"
        );

        handler
            .handle(operation, object, context)
            .await
            .map_err(|e| DashboardError::Operation {
                operation: operation.name.clone(),
                message: format!("{:#}", e),
            })
    }
}

impl std::fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("handlers", &self.handler_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    crate::impl_managed_object!(Ticket, "ticket", {
        subject: String,
    });

    fn operation(handler: &str) -> Operation {
        Operation {
            name: "close".to_string(),
            label: "Close".to_string(),
            object_type: "ticket".to_string(),
            handler: handler.to_string(),
        }
    }

    #[tokio::test]
    async fn test_process_operation_calls_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut registry = OperationRegistry::new();
        registry.register_fn("close_ticket", move |op, object, _ctx| {
            sink.lock().unwrap().push(format!("{}:{}", op.name, object.id()));
            Ok(())
        });

        let ticket = Ticket::new("printer".to_string()).with_id("7");
        registry
            .process_operation(&operation("close_ticket"), Box::new(ticket), &DashboardContext::now())
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["close:7".to_string()]);
    }

    #[tokio::test]
    async fn test_handler_failure_is_operation_error() {
        let mut registry = OperationRegistry::new();
        registry.register_fn("close_ticket", |_, _, _| anyhow::bail!("ticket is locked"));

        let err = registry
            .process_operation(
                &operation("close_ticket"),
                Box::new(Ticket::blank_ticket()),
                &DashboardContext::now(),
            )
            .await
            .unwrap_err();

        match err {
            DashboardError::Operation { operation, message } => {
                assert_eq!(operation, "close");
                assert!(message.contains("locked"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_handler_is_configuration_error() {
        let registry = OperationRegistry::new();
        let err = registry
            .process_operation(
                &operation("missing"),
                Box::new(Ticket::blank_ticket()),
                &DashboardContext::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DashboardError::Configuration(ConfigurationError::UnknownOperationHandler { .. })
        ));
    }

    impl Ticket {
        fn blank_ticket() -> Self {
            Ticket::new(String::new())
        }
    }
}
