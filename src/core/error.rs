//! Typed error handling for the dashboard
//!
//! Every flow of the dispatcher returns a [`DashboardError`]. The dispatcher never
//! recovers from these locally: they travel up to the HTTP layer, which turns them
//! into a status code and a small JSON body.
//!
//! # Error Categories
//!
//! - [`ConfigurationError`]: missing or invalid declarative setup
//! - [`RequestError`]: malformed or missing request parameters
//! - `NotFound`: an identifier with no persisted object behind it
//! - `Data`, `Logic`, `Runtime`: contract violations at runtime
//! - `Operation`, `Hook`: failures raised by user-supplied callbacks
//!
//! # Example
//!
//! ```rust,ignore
//! match action.dispatch(&request, &context).await {
//!     Ok(response) => response.into_response(),
//!     Err(DashboardError::NotFound { object_type, id }) => {
//!         tracing::warn!("{} {} is gone", object_type, id);
//!         StatusCode::NOT_FOUND.into_response()
//!     }
//!     Err(e) => e.into_response(),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::core::field::FieldError;

/// The main error type of the dashboard
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Declarative setup is missing or inconsistent
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// No persisted object matches the identifier
    #[error("Could not find object \"{object_type}\" with ID \"{id}\"")]
    NotFound { object_type: String, id: String },

    /// Data returned by a collaborator does not have the expected shape
    #[error("Data error: {0}")]
    Data(String),

    /// A hook broke its return contract
    #[error("Logic error: {0}")]
    Logic(String),

    /// A collaborator failed to produce what was asked of it
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// The request itself is malformed
    #[error(transparent)]
    Request(#[from] RequestError),

    /// An operation handler failed
    #[error("Operation \"{operation}\" failed: {message}")]
    Operation { operation: String, message: String },

    /// A configured hook failed
    #[error("Hook \"{hook}\" failed: {message}")]
    Hook { hook: String, message: String },

    /// The persistence layer failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// A view could not be rendered
    #[error("Template error: {0}")]
    Template(String),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl DashboardError {
    /// Shortcut for a missing object
    pub fn not_found(object_type: impl Into<String>, id: impl Into<String>) -> Self {
        DashboardError::NotFound {
            object_type: object_type.into(),
            id: id.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            DashboardError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DashboardError::NotFound { .. } => StatusCode::NOT_FOUND,
            DashboardError::Data(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DashboardError::Logic(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DashboardError::Runtime(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DashboardError::Request(e) => e.status_code(),
            DashboardError::Operation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            DashboardError::Hook { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            DashboardError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DashboardError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            DashboardError::Configuration(_) => "CONFIGURATION_ERROR",
            DashboardError::NotFound { .. } => "OBJECT_NOT_FOUND",
            DashboardError::Data(_) => "DATA_ERROR",
            DashboardError::Logic(_) => "LOGIC_ERROR",
            DashboardError::Runtime(_) => "RUNTIME_ERROR",
            DashboardError::Request(e) => e.error_code(),
            DashboardError::Operation { .. } => "OPERATION_FAILED",
            DashboardError::Hook { .. } => "HOOK_FAILED",
            DashboardError::Storage(_) => "STORAGE_ERROR",
            DashboardError::Template(_) => "TEMPLATE_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            DashboardError::NotFound { object_type, id } => Some(serde_json::json!({
                "object_type": object_type,
                "id": id,
            })),
            DashboardError::Operation { operation, .. } => {
                Some(serde_json::json!({ "operation": operation }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "{}", self);
        } else {
            tracing::debug!(code = self.error_code(), "{}", self);
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors raised by missing or invalid dashboard configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("There is no fields to show in \"{object_type}\" object configuration.")]
    NoFieldsToShow { object_type: String },

    #[error("Object \"{object_type}\" is not managed by the dashboard.")]
    UnknownObject { object_type: String },

    #[error("No object factory is registered for \"{object_type}\".")]
    NoObjectFactory { object_type: String },

    #[error("Object \"{object_type}\" is configured more than once.")]
    DuplicateObject { object_type: String },

    #[error("Dashboard \"{name}\" is configured more than once.")]
    DuplicateDashboard { name: String },

    #[error("There is no dashboard named \"{name}\".")]
    UnknownDashboard { name: String },

    #[error("A {kind} is already registered under \"{name}\".")]
    DuplicateRegistration { kind: &'static str, name: String },

    #[error("Object \"{object_type}\" has no predefined criteria named \"{criteria}\".")]
    UnknownCriteria { object_type: String, criteria: String },

    #[error("Object \"{object_type}\" has no operation named \"{operation}\".")]
    UnknownOperation { object_type: String, operation: String },

    #[error("Object \"{object_type}\" has no redirect named \"{redirect}\".")]
    UnknownRedirect { object_type: String, redirect: String },

    #[error("No operation handler is registered under \"{handler}\".")]
    UnknownOperationHandler { handler: String },

    #[error("Object \"{object_type}\" does not have configuration for new objects.")]
    NoNewObjectConfiguration { object_type: String },

    #[error("There is no way to create a form for \"{object_type}\".")]
    NoFormSource { object_type: String },

    #[error("Object \"{object_type}\" declares both a form factory and a form class.")]
    AmbiguousFormSource { object_type: String },

    #[error("No form {kind} is registered under \"{name}\".")]
    UnknownFormSource { kind: &'static str, name: String },

    #[error("There is no import configured for \"{object_type}\".")]
    NoImports { object_type: String },

    #[error("Could not use {stage} hook \"{hook}\" as it is not a registered callable.")]
    HookNotCallable { stage: String, hook: String },

    #[error("No object manager is registered under \"{name}\".")]
    UnknownObjectManager { name: String },

    #[error("Field \"{field}\" does not exist on \"{object_type}\".")]
    UnknownField { object_type: String, field: String },

    #[error("Repository of \"{object_type}\" has no method \"{method}\".")]
    UnknownRepositoryMethod { object_type: String, method: String },

    #[error("Missing required component: {component}")]
    MissingComponent { component: String },

    #[error("Invalid value '{value}' for '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    #[error("Failed to parse configuration{}: {message}", .file.as_ref().map(|f| format!(" file '{}'", f)).unwrap_or_default())]
    Parse {
        file: Option<String>,
        message: String,
    },

    #[error("IO error: {message}")]
    Io { message: String },
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to the shape of the incoming request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("Missing required parameter: {name}")]
    MissingParameter { name: String },

    #[error("Invalid value '{value}' for parameter '{name}'")]
    InvalidParameter { name: String, value: String },

    #[error("Unknown dashboard action: {action}")]
    UnknownAction { action: String },

    #[error("CRUD operation \"{operation}\" is not implemented")]
    UnknownCrudOperation { operation: String },

    #[error("Invalid request body: {message}")]
    InvalidBody { message: String },
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::MissingParameter { .. } => StatusCode::BAD_REQUEST,
            RequestError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            RequestError::UnknownAction { .. } => StatusCode::NOT_FOUND,
            RequestError::UnknownCrudOperation { .. } => StatusCode::NOT_FOUND,
            RequestError::InvalidBody { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::MissingParameter { .. } => "MISSING_PARAMETER",
            RequestError::InvalidParameter { .. } => "INVALID_PARAMETER",
            RequestError::UnknownAction { .. } => "UNKNOWN_ACTION",
            RequestError::UnknownCrudOperation { .. } => "UNKNOWN_CRUD_OPERATION",
            RequestError::InvalidBody { .. } => "INVALID_BODY",
        }
    }

    pub fn missing(name: impl Into<String>) -> Self {
        RequestError::MissingParameter { name: name.into() }
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<FieldError> for DashboardError {
    fn from(err: FieldError) -> Self {
        match err {
            FieldError::UnknownField { object_type, field } => {
                DashboardError::Configuration(ConfigurationError::UnknownField {
                    object_type,
                    field,
                })
            }
            invalid @ FieldError::InvalidValue { .. } => DashboardError::Data(invalid.to_string()),
        }
    }
}

impl From<serde_yaml::Error> for DashboardError {
    fn from(err: serde_yaml::Error) -> Self {
        DashboardError::Configuration(ConfigurationError::Parse {
            file: None,
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(err: std::io::Error) -> Self {
        DashboardError::Configuration(ConfigurationError::Io {
            message: err.to_string(),
        })
    }
}

impl From<csv::Error> for DashboardError {
    fn from(err: csv::Error) -> Self {
        DashboardError::Data(format!("CSV processing error: {}", err))
    }
}

impl From<tera::Error> for DashboardError {
    fn from(err: tera::Error) -> Self {
        // tera keeps the useful part of the message in the source chain
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        DashboardError::Template(message)
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for dashboard operations
pub type DashboardResult<T> = Result<T, DashboardError>;
