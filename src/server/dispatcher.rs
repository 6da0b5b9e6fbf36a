//! Action dispatcher
//!
//! Every dashboard view goes through [`DashboardAction::dispatch`]. The
//! `action` query parameter picks the flow:
//!
//! | `action` | flow |
//! |---|---|
//! | absent | home of the default dashboard |
//! | `crud` | list, new, edit or show, picked by `crud_operation` |
//! | `import` | CSV upload and paste forms |
//! | `operation` | one operation on one object |
//! | `batch_operation` | one operation on several objects |
//!
//! Flows never recover from errors; they travel up to the HTTP layer.

use crate::config::{FormSource, ImportKind, NewObjectConfiguration, ObjectDefinition};
use crate::core::context::DashboardContext;
use crate::core::entity::ManagedObject;
use crate::core::error::{ConfigurationError, DashboardError, DashboardResult, RequestError};
use crate::core::extractor::{self, FieldMap};
use crate::core::field::{FieldValue, LIST_DATETIME_FORMAT};
use crate::core::form::Form;
use crate::core::import::ImportEngine;
use crate::core::operation::Operation;
use crate::core::query::{ListQuery, PAGE_LINK_RADIUS, PaginationMeta};
use crate::core::request::{DashboardRequest, DashboardResponse};
use crate::core::store::{CriteriaResult, OrderBy};
use crate::server::host::DashboardHost;
use crate::server::path::{action, crud, param};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Entry point routing a request to the flow it asks for
#[derive(Clone)]
pub struct DashboardAction {
    host: Arc<DashboardHost>,
}

// =============================================================================
// View models
// =============================================================================

#[derive(Debug, Serialize)]
struct MenuEntry<'a> {
    object_type: &'a str,
    label: &'a str,
    path: String,
}

#[derive(Debug, Serialize)]
struct RowView {
    /// Identifier used by row links; rows of custom result sets may have none
    id: Option<String>,
    values: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RedirectView<'a> {
    name: &'a str,
    label: &'a str,
    path: &'a str,
}

#[derive(Debug, Serialize)]
struct CriteriaView<'a> {
    name: &'a str,
    label: &'a str,
    method: &'a str,
    custom_result_set: bool,
}

#[derive(Debug, Serialize)]
struct PageLink {
    number: usize,
    path: String,
    current: bool,
}

#[derive(Debug, Serialize)]
struct FieldView {
    name: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct ImportFormView<'a> {
    name: &'a str,
    title: &'a str,
    kind: &'static str,
    mime_types: &'a [String],
    columns: Vec<&'a str>,
    content: String,
    errors: Vec<String>,
}

/// Rows of a list view, ready to render
#[derive(Debug, Default)]
struct Table {
    fields: Vec<String>,
    rows: Vec<RowView>,
    /// Field name → value per row
    list: Vec<Value>,
    /// Unmodified objects or rows
    objects: Vec<Value>,
}

enum Listing {
    Objects(Vec<Box<dyn ManagedObject>>),
    Rows(Vec<Value>),
}

fn required<'r>(request: &'r DashboardRequest, name: &str) -> Result<&'r str, RequestError> {
    request
        .query_param(name)
        .ok_or_else(|| RequestError::missing(name))
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => FieldValue::from_json(other).to_string(),
    }
}

fn json_id(row: &Value) -> Option<String> {
    row.get("id").filter(|id| !id.is_null()).map(display)
}

impl Table {
    /// Rows read through the field extractor, timestamps formatted for lists
    fn extracted(object_type: &str, fields: &[String], listing: Listing) -> DashboardResult<Self> {
        let mut table = Table {
            fields: fields.to_vec(),
            ..Table::default()
        };
        match listing {
            Listing::Objects(objects) => {
                for object in objects {
                    let values = extractor::extract_for_list(object.as_ref(), fields)?;
                    table.push(Some(object.id()), &values, object.to_json());
                }
            }
            Listing::Rows(rows) => {
                for row in rows {
                    let values: FieldMap = extractor::extract_json(object_type, &row, fields)?
                        .into_iter()
                        .map(|(name, value)| (name, value.for_listing()))
                        .collect();
                    table.push(json_id(&row), &values, row);
                }
            }
        }
        Ok(table)
    }

    fn push(&mut self, id: Option<String>, values: &FieldMap, raw: Value) {
        self.rows.push(RowView {
            id,
            values: values.values().map(ToString::to_string).collect(),
        });
        self.list.push(extractor::to_json(values));
        self.objects.push(raw);
    }

    /// Rows shown as they come; the first row decides the columns
    fn custom(listing: Listing) -> Self {
        let rows: Vec<Value> = match listing {
            Listing::Objects(objects) => objects.iter().map(|object| object.to_json()).collect(),
            Listing::Rows(rows) => rows,
        };
        let fields: Vec<String> = rows
            .first()
            .and_then(Value::as_object)
            .map(|first| first.keys().cloned().collect())
            .unwrap_or_default();

        let mut table = Table {
            fields,
            ..Table::default()
        };
        for row in rows {
            let values = table
                .fields
                .iter()
                .map(|field| row.get(field).map(display).unwrap_or_default())
                .collect();
            table.rows.push(RowView {
                id: json_id(&row),
                values,
            });
            table.list.push(row.clone());
            table.objects.push(row);
        }
        table
    }
}

impl DashboardAction {
    pub fn new(host: Arc<DashboardHost>) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &DashboardHost {
        &self.host
    }

    /// Route a request to its flow
    pub async fn dispatch(
        &self,
        request: &DashboardRequest,
        context: &DashboardContext,
    ) -> DashboardResult<DashboardResponse> {
        let requested = request.query_param(param::ACTION).map(str::to_lowercase);
        tracing::debug!(
            action = requested.as_deref().unwrap_or("dashboard"),
            method = %request.method,
            "dispatching dashboard request"
        );

        match requested.as_deref() {
            None => self.dashboard(context),
            Some(action::CRUD) => self.crud(request).await,
            Some(action::IMPORT) => self.import(request).await,
            Some(action::OPERATION) => self.operation(request, context).await,
            Some(action::BATCH_OPERATION) => self.batch_operation(request, context).await,
            Some(other) => Err(RequestError::UnknownAction {
                action: other.to_string(),
            }
            .into()),
        }
    }

    fn render<T: Serialize>(&self, template: &str, view: &T) -> DashboardResult<DashboardResponse> {
        let context = serde_json::to_value(view)
            .map_err(|e| DashboardError::Template(format!("Could not serialize view: {}", e)))?;
        let html = self.host.renderer.render(template, &context)?;
        Ok(DashboardResponse::Html(html))
    }

    fn redirect_to_list(&self, object_type: &str) -> DashboardResponse {
        DashboardResponse::Redirect(self.host.paths.object_list(object_type))
    }

    fn object(&self, request: &DashboardRequest) -> DashboardResult<&ObjectDefinition> {
        let object_type = required(request, param::OBJECT)?;
        Ok(self.host.registry.object(object_type)?)
    }

    // =========================================================================
    // Dashboard home
    // =========================================================================

    fn dashboard(&self, context: &DashboardContext) -> DashboardResult<DashboardResponse> {
        let registry = &self.host.registry;
        let dashboard = registry.default_dashboard()?;

        let menu = dashboard
            .objects
            .iter()
            .map(|object_type| {
                let definition = registry.object(object_type)?;
                Ok(MenuEntry {
                    object_type: definition.object_type(),
                    label: definition.label(),
                    path: self.host.paths.object_list(object_type),
                })
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;

        #[derive(Serialize)]
        struct DashboardView<'a> {
            dashboard_name: String,
            dashboard: &'a crate::config::Dashboard,
            menu: Vec<MenuEntry<'a>>,
            request_date: String,
            user: Option<&'a str>,
        }

        self.render(
            "dashboard.html",
            &DashboardView {
                dashboard_name: format!("dashboard-{}", dashboard.name),
                dashboard,
                menu,
                request_date: context.request_date.format(LIST_DATETIME_FORMAT).to_string(),
                user: context.user.as_deref(),
            },
        )
    }

    // =========================================================================
    // CRUD
    // =========================================================================

    async fn crud(&self, request: &DashboardRequest) -> DashboardResult<DashboardResponse> {
        let operation = required(request, param::CRUD_OPERATION)?.to_lowercase();
        if ![crud::LIST, crud::NEW, crud::EDIT, crud::SHOW].contains(&operation.as_str()) {
            return Err(RequestError::UnknownCrudOperation { operation }.into());
        }
        let definition = self.object(request)?;

        match operation.as_str() {
            crud::LIST => self.list(definition, request).await,
            crud::NEW => self.new_object(definition, request, false).await,
            crud::EDIT => self.new_object(definition, request, true).await,
            _ => self.show(definition, request).await,
        }
    }

    async fn list(
        &self,
        definition: &ObjectDefinition,
        request: &DashboardRequest,
    ) -> DashboardResult<DashboardResponse> {
        let fields = definition.fields_to_show()?;
        let query = ListQuery::from_request(request)?;
        let object_type = definition.object_type();
        let results_per_page = definition.results_per_page();
        let manager = self.host.object_manager.as_ref();

        let (table, pages_count) = match query.criteria.as_deref() {
            None => {
                let pages_count = manager.pages_count(object_type, results_per_page).await?;
                let objects = manager
                    .find_page(
                        object_type,
                        query.offset(results_per_page),
                        results_per_page,
                        &query.order_by,
                    )
                    .await?;
                tracing::debug!(object_type, page = query.page, pages_count, "listing objects");
                let table = Table::extracted(object_type, fields, Listing::Objects(objects))?;
                (table, pages_count)
            }
            Some(name) => {
                let criteria = definition.criteria(name)?;
                let listing = match manager
                    .call_repository_method(object_type, &criteria.method)
                    .await?
                {
                    CriteriaResult::Objects(objects) => Listing::Objects(objects),
                    CriteriaResult::Json(Value::Array(rows)) => Listing::Rows(rows),
                    CriteriaResult::Json(_) => {
                        return Err(DashboardError::Data(format!(
                            "The result of criteria \"{}\" must be a sequence",
                            name
                        )));
                    }
                };
                tracing::debug!(object_type, criteria = name, "listing objects with criteria");
                let table = if criteria.custom_result_set {
                    Table::custom(listing)
                } else {
                    Table::extracted(object_type, fields, listing)?
                };
                (table, 1)
            }
        };

        let pagination = PaginationMeta::new(query.page, results_per_page, pages_count);
        let pages = pagination
            .window(PAGE_LINK_RADIUS)
            .map(|number| PageLink {
                number,
                path: self.host.paths.object_list_page(
                    object_type,
                    number,
                    query.criteria.as_deref(),
                    &query.order_by,
                ),
                current: number == query.page,
            })
            .collect();

        #[derive(Serialize)]
        struct ListView<'a> {
            object_type: &'a str,
            label: &'a str,
            fields: Vec<String>,
            rows: Vec<RowView>,
            list: Vec<Value>,
            objects: Vec<Value>,
            criteria: Option<&'a str>,
            order_by: &'a [OrderBy],
            results_per_page: usize,
            page: usize,
            pages_count: usize,
            pagination: PaginationMeta,
            pages: Vec<PageLink>,
            operations: Vec<&'a Operation>,
            redirects: Vec<RedirectView<'a>>,
            predefined_criteria: Vec<CriteriaView<'a>>,
            has_imports: bool,
        }

        let list = &definition.config.list;
        self.render(
            "crud/list.html",
            &ListView {
                object_type,
                label: definition.label(),
                fields: table.fields,
                rows: table.rows,
                list: table.list,
                objects: table.objects,
                criteria: query.criteria.as_deref(),
                order_by: &query.order_by,
                results_per_page,
                page: query.page,
                pages_count,
                pagination,
                pages,
                operations: definition.operations().collect(),
                redirects: list
                    .redirects
                    .iter()
                    .map(|(name, redirect)| RedirectView {
                        name,
                        label: &redirect.label,
                        path: &redirect.path,
                    })
                    .collect(),
                predefined_criteria: list
                    .criteria
                    .iter()
                    .map(|(name, criteria)| CriteriaView {
                        name,
                        label: criteria.label.as_deref().unwrap_or(name.as_str()),
                        method: &criteria.method,
                        custom_result_set: criteria.custom_result_set,
                    })
                    .collect(),
                has_imports: definition.imports().is_ok(),
            },
        )
    }

    /// New and edit views; editing loads the object named by `id`
    async fn new_object(
        &self,
        definition: &ObjectDefinition,
        request: &DashboardRequest,
        edit: bool,
    ) -> DashboardResult<DashboardResponse> {
        let config = definition.new_object()?;
        let object_type = definition.object_type();
        let id = if edit {
            Some(required(request, param::ID)?)
        } else {
            None
        };

        let data = match id {
            Some(id) => {
                self.host
                    .object_manager
                    .get_one_by_id(object_type, id)
                    .await?
            }
            None => definition.factory.blank(),
        };

        let mut form = self.build_form(object_type, config, data)?;
        form.bind(request);

        if form.is_submitted() && form.is_valid() {
            let object = form.data().ok_or_else(|| {
                DashboardError::Runtime(format!(
                    "The form of \"{}\" holds no object after submission",
                    object_type
                ))
            })?;

            let mut object = match &config.transform {
                Some(hook) => self.host.hooks.apply_transform(hook, object)?,
                None => object,
            };
            if let Some(hook) = &config.before_insert {
                self.host
                    .hooks
                    .apply_before_insert(hook, object.as_mut(), form.as_ref())?;
            }

            let object_id = object.id();
            self.host
                .persisting_manager(object_type)?
                .persist(object)
                .await?;
            tracing::info!(object_type, id = %object_id, edit = id.is_some(), "object saved");

            return Ok(self.redirect_to_list(object_type));
        }

        #[derive(Serialize)]
        struct FormView<'a> {
            object_type: &'a str,
            label: &'a str,
            form: Value,
            edit: bool,
            id: Option<&'a str>,
            action_path: String,
        }

        let action_path = match id {
            Some(id) => self.host.paths.object_edit(object_type, id),
            None => self.host.paths.object_new(object_type),
        };
        self.render(
            "crud/new.html",
            &FormView {
                object_type,
                label: definition.label(),
                form: form.view(),
                edit: id.is_some(),
                id,
                action_path,
            },
        )
    }

    fn build_form(
        &self,
        object_type: &str,
        config: &NewObjectConfiguration,
        data: Box<dyn ManagedObject>,
    ) -> DashboardResult<Box<dyn Form>> {
        let form = match config.form_source(object_type)? {
            FormSource::Factory(name) => {
                let factory = self.host.forms.factory(name).ok_or_else(|| {
                    ConfigurationError::UnknownFormSource {
                        kind: "factory",
                        name: name.to_string(),
                    }
                })?;
                factory().map(|mut form| {
                    form.set_data(data);
                    form
                })
            }
            FormSource::Class(name) => {
                let form_type = self.host.forms.form_type(name).ok_or_else(|| {
                    ConfigurationError::UnknownFormSource {
                        kind: "type",
                        name: name.to_string(),
                    }
                })?;
                form_type.create(Some(data))
            }
        };

        form.ok_or_else(|| {
            DashboardError::Runtime(format!("Could not create the form of \"{}\"", object_type))
        })
    }

    async fn show(
        &self,
        definition: &ObjectDefinition,
        request: &DashboardRequest,
    ) -> DashboardResult<DashboardResponse> {
        let object_type = definition.object_type();
        let id = required(request, param::ID)?;
        let object = self
            .host
            .object_manager
            .get_one_by_id(object_type, id)
            .await?;

        let fields = extractor::extract_for_list(object.as_ref(), object.field_names())?
            .into_iter()
            .map(|(name, value)| FieldView {
                name,
                value: value.to_string(),
            })
            .collect();

        #[derive(Serialize)]
        struct ShowView<'a> {
            object_type: &'a str,
            label: &'a str,
            id: &'a str,
            fields: Vec<FieldView>,
            object: Value,
            operations: Vec<&'a Operation>,
            redirects: Vec<RedirectView<'a>>,
        }

        self.render(
            "crud/show.html",
            &ShowView {
                object_type,
                label: definition.label(),
                id,
                fields,
                object: object.to_json(),
                operations: definition.operations().collect(),
                redirects: definition
                    .config
                    .list
                    .redirects
                    .iter()
                    .map(|(name, redirect)| RedirectView {
                        name,
                        label: &redirect.label,
                        path: &redirect.path,
                    })
                    .collect(),
            },
        )
    }

    // =========================================================================
    // Import
    // =========================================================================

    async fn import(&self, request: &DashboardRequest) -> DashboardResult<DashboardResponse> {
        let definition = self.object(request)?;
        let object_type = definition.object_type();
        let rules = definition.imports()?;
        let engine = ImportEngine::new(
            definition.factory.as_ref(),
            self.host.object_manager.as_ref(),
            &self.host.hooks,
        );

        let mut forms = Vec::with_capacity(rules.len());
        for (key, rule) in rules {
            let mut errors = Vec::new();
            let mut content = String::new();

            match rule.kind {
                ImportKind::CsvUpload => {
                    if let Some(file) = request.file(&format!("{}[file]", key)) {
                        if rule.accepts_mime_type(file.mime_type()) {
                            let report = engine.import_upload(rule, &file.data).await?;
                            tracing::info!(
                                object_type,
                                import = %key,
                                imported = report.imported,
                                skipped = report.skipped,
                                "CSV file imported"
                            );
                            return Ok(self.redirect_to_list(object_type));
                        }
                        errors.push(format!(
                            "The mime type of the file is invalid ({}). Allowed mime types are {}.",
                            file.mime_type().unwrap_or("unknown"),
                            rule.mime_types.join(", ")
                        ));
                    }
                }
                ImportKind::PasteCsv => {
                    if let Some(pasted) = request.body_value(&format!("{}[content]", key)) {
                        if !pasted.trim().is_empty() {
                            let report = engine.import_paste(rule, pasted).await?;
                            tracing::info!(
                                object_type,
                                import = %key,
                                imported = report.imported,
                                skipped = report.skipped,
                                "pasted CSV imported"
                            );
                            return Ok(self.redirect_to_list(object_type));
                        }
                        content = pasted.to_string();
                        errors.push("This value should not be blank.".to_string());
                    }
                }
            }

            forms.push(ImportFormView {
                name: key,
                title: &rule.name,
                kind: rule.kind.as_str(),
                mime_types: &rule.mime_types,
                columns: rule.mapping.keys().map(String::as_str).collect(),
                content,
                errors,
            });
        }

        #[derive(Serialize)]
        struct ImportView<'a> {
            object_type: &'a str,
            label: &'a str,
            imports: Vec<ImportFormView<'a>>,
        }

        self.render(
            "import.html",
            &ImportView {
                object_type,
                label: definition.label(),
                imports: forms,
            },
        )
    }

    // =========================================================================
    // Operations
    // =========================================================================

    async fn operation(
        &self,
        request: &DashboardRequest,
        context: &DashboardContext,
    ) -> DashboardResult<DashboardResponse> {
        let definition = self.object(request)?;
        let object_type = definition.object_type();
        let id = required(request, param::ID)?;
        let operation = definition.operation(required(request, param::OPERATION)?)?;

        let object = self
            .host
            .object_manager
            .get_one_by_id(object_type, id)
            .await?;
        self.host
            .operations
            .process_operation(operation, object, context)
            .await?;
        tracing::info!(object_type, id, operation = %operation.name, "operation processed");

        Ok(self.redirect_to_list(object_type))
    }

    async fn batch_operation(
        &self,
        request: &DashboardRequest,
        context: &DashboardContext,
    ) -> DashboardResult<DashboardResponse> {
        let definition = self.object(request)?;
        let object_type = definition.object_type();
        let name = request
            .body_value(param::OPERATION)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| RequestError::missing(param::OPERATION))?;
        let operation = definition.operation(name)?;

        let ids = request.body_values(param::ID);
        for id in &ids {
            let object = self
                .host
                .object_manager
                .get_one_by_id(object_type, id)
                .await?;
            self.host
                .operations
                .process_operation(operation, object, context)
                .await?;
        }
        tracing::info!(
            object_type,
            operation = %operation.name,
            count = ids.len(),
            "batch operation processed"
        );

        Ok(match &request.referer {
            Some(referer) => DashboardResponse::Redirect(referer.clone()),
            None => self.redirect_to_list(object_type),
        })
    }
}

impl std::fmt::Debug for DashboardAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardAction")
            .field("host", &self.host)
            .finish()
    }
}
