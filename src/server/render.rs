//! Template rendering
//!
//! Views are rendered through the [`TemplateRenderer`] trait. [`TeraRenderer`]
//! ships the built-in templates and exposes the path generator to them as
//! `dashboard_path_*` functions.

use super::path::PathGenerator;
use crate::core::error::DashboardResult;
use serde_json::Value;
use std::collections::HashMap;
use tera::{Context, Tera};

/// Renders a named template with a JSON context
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, context: &Value) -> DashboardResult<String>;
}

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("dashboard.html", include_str!("../../templates/dashboard.html")),
    ("crud/list.html", include_str!("../../templates/crud/list.html")),
    ("crud/new.html", include_str!("../../templates/crud/new.html")),
    ("crud/show.html", include_str!("../../templates/crud/show.html")),
    ("import.html", include_str!("../../templates/import.html")),
];

/// Tera-backed renderer
pub struct TeraRenderer {
    tera: Tera,
}

impl TeraRenderer {
    /// Renderer using the built-in templates only
    pub fn new(paths: PathGenerator) -> DashboardResult<Self> {
        let mut tera = Self::builtin()?;
        register_path_functions(&mut tera, paths);
        Ok(Self { tera })
    }

    /// Renderer loading templates from a glob (e.g. `"templates/**/*.html"`)
    ///
    /// Templates found there take precedence over the built-in ones of the same
    /// name; missing ones fall back to the built-ins.
    pub fn with_overrides(paths: PathGenerator, glob: &str) -> DashboardResult<Self> {
        let mut tera = Tera::new(glob)?;
        tera.extend(&Self::builtin()?)?;
        register_path_functions(&mut tera, paths);
        Ok(Self { tera })
    }

    fn builtin() -> DashboardResult<Tera> {
        let mut tera = Tera::default();
        tera.add_raw_templates(BUILTIN_TEMPLATES.to_vec())?;
        Ok(tera)
    }

    /// Names of every loaded template
    pub fn template_names(&self) -> Vec<&str> {
        self.tera.get_template_names().collect()
    }
}

impl TemplateRenderer for TeraRenderer {
    fn render(&self, template: &str, context: &Value) -> DashboardResult<String> {
        let context = Context::from_serialize(context)?;
        Ok(self.tera.render(template, &context)?)
    }
}

impl std::fmt::Debug for TeraRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeraRenderer")
            .field("templates", &self.template_names())
            .finish()
    }
}

fn string_arg(args: &HashMap<String, Value>, function: &str, name: &str) -> tera::Result<String> {
    match args.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(tera::Error::msg(format!(
            "Function `{}` received an invalid `{}`: {}",
            function, name, other
        ))),
        None => Err(tera::Error::msg(format!(
            "Function `{}` requires the `{}` argument",
            function, name
        ))),
    }
}

fn register_path_functions(tera: &mut Tera, paths: PathGenerator) {
    let p = paths.clone();
    tera.register_function(
        "dashboard_path_object_list",
        move |args: &HashMap<String, Value>| {
            let object = string_arg(args, "dashboard_path_object_list", "object")?;
            let path = match args.get("page").and_then(Value::as_u64) {
                Some(page) => {
                    let criteria = args.get("criteria").and_then(Value::as_str);
                    p.object_list_page(&object, page as usize, criteria, &[])
                }
                None => p.object_list(&object),
            };
            Ok(Value::String(path))
        },
    );

    let p = paths.clone();
    tera.register_function(
        "dashboard_path_object_show",
        move |args: &HashMap<String, Value>| {
            let object = string_arg(args, "dashboard_path_object_show", "object")?;
            let id = string_arg(args, "dashboard_path_object_show", "id")?;
            Ok(Value::String(p.object_show(&object, &id)))
        },
    );

    let p = paths.clone();
    tera.register_function(
        "dashboard_path_object_new",
        move |args: &HashMap<String, Value>| {
            let object = string_arg(args, "dashboard_path_object_new", "object")?;
            Ok(Value::String(p.object_new(&object)))
        },
    );

    let p = paths.clone();
    tera.register_function(
        "dashboard_path_object_edit",
        move |args: &HashMap<String, Value>| {
            let object = string_arg(args, "dashboard_path_object_edit", "object")?;
            let id = string_arg(args, "dashboard_path_object_edit", "id")?;
            Ok(Value::String(p.object_edit(&object, &id)))
        },
    );

    let p = paths.clone();
    tera.register_function(
        "dashboard_path_object_import",
        move |args: &HashMap<String, Value>| {
            let object = string_arg(args, "dashboard_path_object_import", "object")?;
            Ok(Value::String(p.import(&object)))
        },
    );

    let p = paths.clone();
    tera.register_function(
        "dashboard_path_object_operation",
        move |args: &HashMap<String, Value>| {
            let object = string_arg(args, "dashboard_path_object_operation", "object")?;
            let id = string_arg(args, "dashboard_path_object_operation", "id")?;
            let operation = string_arg(args, "dashboard_path_object_operation", "operation")?;
            Ok(Value::String(p.object_operation(&object, &id, &operation)))
        },
    );

    let p = paths.clone();
    tera.register_function(
        "dashboard_path_object_redirect",
        move |args: &HashMap<String, Value>| {
            let path = string_arg(args, "dashboard_path_object_redirect", "path")?;
            let id = string_arg(args, "dashboard_path_object_redirect", "id")?;
            Ok(Value::String(p.object_redirect(&path, &id)))
        },
    );

    tera.register_function(
        "dashboard_path_batch_object_operation",
        move |args: &HashMap<String, Value>| {
            let object = string_arg(args, "dashboard_path_batch_object_operation", "object")?;
            Ok(Value::String(paths.batch_operation(&object)))
        },
    );
}
