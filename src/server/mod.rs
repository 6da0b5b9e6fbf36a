//! Server module exposing the dashboard over HTTP
//!
//! This module provides a `DashboardBuilder` that wires:
//! - the validated configuration and the registries it was checked against
//! - the object managers, renderer and path generator
//! - the single dashboard route, health checks and custom routes

pub mod builder;
pub mod dispatcher;
pub mod entity_registry;
pub mod handler;
pub mod host;
pub mod path;
pub mod render;
pub mod router;

pub use builder::DashboardBuilder;
pub use dispatcher::DashboardAction;
pub use entity_registry::ObjectRegistry;
pub use handler::{dashboard_handler, read_request};
pub use host::DashboardHost;
pub use path::PathGenerator;
pub use render::{TemplateRenderer, TeraRenderer};
pub use router::build_dashboard_routes;
