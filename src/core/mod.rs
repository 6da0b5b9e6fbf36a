//! Core module containing the traits and types the dashboard is built from

pub mod context;
pub mod entity;
pub mod error;
pub mod extractor;
pub mod field;
pub mod form;
pub mod hooks;
pub mod import;
pub mod operation;
pub mod query;
pub mod request;
pub mod service;
pub mod store;
pub mod validation;

pub use context::DashboardContext;
pub use entity::{EntityFactory, ImportRecord, ManagedEntity, ManagedObject, ObjectFactory};
pub use error::{ConfigurationError, DashboardError, DashboardResult, RequestError};
pub use field::{FieldFormat, FieldValue};
pub use form::{EntityForm, EntityFormType, Form, FormFactoryFn, FormRegistry, FormType};
pub use hooks::{HookRegistry, HookStage};
pub use import::{ImportEngine, ImportReport};
pub use operation::{Operation, OperationHandler, OperationRegistry};
pub use request::{DashboardRequest, DashboardResponse, UploadedFile};
pub use service::ObjectManager;
pub use store::{CriteriaResult, OrderBy, SortDirection};
