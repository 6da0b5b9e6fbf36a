//! # This-Dashboard
//!
//! A configuration-driven administration dashboard for managed objects, served
//! by axum.
//!
//! ## Features
//!
//! - **Declarative Configuration**: dashboards, listed fields, criteria, operations,
//!   forms and imports described in YAML or built in code
//! - **Eager Validation**: every handler, hook, form and field named by the
//!   configuration is checked once, at startup
//! - **Field Access by Name**: entities expose an explicit field map generated by
//!   `impl_managed_object!`
//! - **CRUD Views**: paginated, ordered lists with predefined criteria, show, new and
//!   edit forms
//! - **Operations**: named actions on one object or on a batch of objects
//! - **CSV Import**: uploaded files with a header, or pasted lines mapped by position
//! - **Swappable Collaborators**: object managers, forms and template renderer
//!   are traits
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dashboard::prelude::*;
//!
//! impl_managed_object!(Book, "book", {
//!     title: String,
//!     pages: i64,
//! });
//!
//! let config = DashboardConfig::new().object(
//!     ManagedObjectConfiguration::new("book")
//!         .label("Books")
//!         .fields(&["title", "pages"])
//!         .operation("archive", "Archive", "archive_book"),
//! );
//!
//! DashboardBuilder::new()
//!     .with_config(config)
//!     .register_entity::<Book>()
//!     .with_object_manager(InMemoryObjectManager::new())
//!     .register_operation_fn("archive_book", |_, book, _| {
//!         tracing::info!("archiving {}", book.id());
//!         Ok(())
//!     })
//!     .serve("127.0.0.1:3000")
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Traits ===
    pub use crate::core::{
        context::DashboardContext,
        entity::{
            EntityFactory, ImportRecord, ManagedEntity, ManagedObject, ObjectFactory, downcast_mut,
            downcast_ref,
        },
        error::{ConfigurationError, DashboardError, DashboardResult, RequestError},
        field::{FieldFormat, FieldValue},
        form::{EntityForm, EntityFormType, Form, FormType},
        hooks::HookRegistry,
        import::ImportReport,
        operation::{Operation, OperationHandler},
        request::{DashboardRequest, DashboardResponse, UploadedFile},
        service::ObjectManager,
        store::{CriteriaResult, OrderBy, SortDirection},
        validation::{filters, validators},
    };

    // === Macros ===
    pub use crate::impl_managed_object;

    // === Storage ===
    #[cfg(feature = "in-memory")]
    pub use crate::storage::InMemoryObjectManager;

    // === Config ===
    pub use crate::config::{
        Dashboard, DashboardConfig, ImportKind, ImportRule, ManagedObjectConfiguration,
        NewObjectConfiguration, PredefinedCriteria,
    };

    // === Server ===
    pub use crate::server::{DashboardAction, DashboardBuilder, PathGenerator, TemplateRenderer};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;

    // === Axum ===
    pub use axum::Router;
}
