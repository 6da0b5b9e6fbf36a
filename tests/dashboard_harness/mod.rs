//! Shared test harness for dashboard flows
//!
//! Provides a `Person` entity, an object manager recording every call it
//! receives, a renderer recording every view it is asked for, and helpers to
//! build a dispatcher around them.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! mod dashboard_harness;
//! use dashboard_harness::*;
//! ```

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use dashboard::prelude::*;

// ---------------------------------------------------------------------------
// Person: the managed object used across tests
// ---------------------------------------------------------------------------

dashboard::impl_managed_object!(Person, "person", {
    full_name: String,
    years: i64,
    born_at: Option<DateTime<Utc>>,
});

pub fn person(id: &str, full_name: &str, years: i64) -> Box<dyn ManagedObject> {
    Box::new(Person::new(full_name.to_string(), years, None).with_id(id))
}

pub fn people(count: usize) -> Vec<Box<dyn ManagedObject>> {
    (1..=count)
        .map(|i| person(&i.to_string(), &format!("Person {}", i), i as i64))
        .collect()
}

// ---------------------------------------------------------------------------
// RecordingManager: in-memory storage plus a log of every call
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CountAll(String),
    FindPage {
        object_type: String,
        offset: usize,
        limit: usize,
        order_by: Vec<OrderBy>,
    },
    FindById(String),
    Persist(String),
    Repository(String),
}

#[derive(Clone, Default)]
pub struct RecordingManager {
    pub inner: InMemoryObjectManager,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl RecordingManager {
    pub fn new(inner: InMemoryObjectManager) -> Self {
        Self {
            inner,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ObjectManager for RecordingManager {
    async fn count_all(&self, object_type: &str) -> DashboardResult<usize> {
        self.record(Call::CountAll(object_type.to_string()));
        self.inner.count_all(object_type).await
    }

    async fn find_page(
        &self,
        object_type: &str,
        offset: usize,
        limit: usize,
        order_by: &[OrderBy],
    ) -> DashboardResult<Vec<Box<dyn ManagedObject>>> {
        self.record(Call::FindPage {
            object_type: object_type.to_string(),
            offset,
            limit,
            order_by: order_by.to_vec(),
        });
        self.inner.find_page(object_type, offset, limit, order_by).await
    }

    async fn find_by_id(
        &self,
        object_type: &str,
        id: &str,
    ) -> DashboardResult<Option<Box<dyn ManagedObject>>> {
        self.record(Call::FindById(id.to_string()));
        self.inner.find_by_id(object_type, id).await
    }

    async fn persist(&self, object: Box<dyn ManagedObject>) -> DashboardResult<()> {
        self.record(Call::Persist(object.id()));
        self.inner.persist(object).await
    }

    async fn call_repository_method(
        &self,
        object_type: &str,
        method: &str,
    ) -> DashboardResult<CriteriaResult> {
        self.record(Call::Repository(method.to_string()));
        self.inner.call_repository_method(object_type, method).await
    }
}

// ---------------------------------------------------------------------------
// RecordingRenderer: keeps the context of every rendered view
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct RecordingRenderer {
    views: Arc<Mutex<Vec<(String, Value)>>>,
}

impl RecordingRenderer {
    /// Template name and context of the last rendered view
    pub fn last(&self) -> (String, Value) {
        self.views
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("nothing was rendered")
    }

    pub fn count(&self) -> usize {
        self.views.lock().unwrap().len()
    }
}

impl TemplateRenderer for RecordingRenderer {
    fn render(&self, template: &str, context: &Value) -> DashboardResult<String> {
        self.views
            .lock()
            .unwrap()
            .push((template.to_string(), context.clone()));
        Ok(format!("rendered {}", template))
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Person configuration listing name and age, 10 per page
pub fn person_config() -> ManagedObjectConfiguration {
    ManagedObjectConfiguration::new("person")
        .label("People")
        .fields(&["full_name", "years"])
        .results_per_page(10)
}

/// Everything a test needs to drive and observe the dispatcher
pub struct Fixture {
    pub action: DashboardAction,
    pub manager: RecordingManager,
    pub renderer: RecordingRenderer,
}

impl Fixture {
    pub async fn dispatch(&self, request: DashboardRequest) -> DashboardResult<DashboardResponse> {
        self.action
            .dispatch(&request, &DashboardContext::now())
            .await
    }

    pub async fn get(&self, query: &str) -> DashboardResult<DashboardResponse> {
        self.dispatch(DashboardRequest::get(query)).await
    }

    /// Context of the last rendered view, checking its template
    pub fn view(&self, template: &str) -> Value {
        let (rendered, context) = self.renderer.last();
        assert_eq!(rendered, template);
        context
    }

    pub fn stored(&self) -> Vec<Box<dyn ManagedObject>> {
        self.manager.inner.all("person").unwrap()
    }
}

/// Builder preloaded with the person entity and a recording manager
pub fn builder(
    config: DashboardConfig,
    seed: Vec<Box<dyn ManagedObject>>,
) -> (DashboardBuilder, RecordingManager, RecordingRenderer) {
    builder_with(config, InMemoryObjectManager::new(), seed)
}

pub fn builder_with(
    config: DashboardConfig,
    inner: InMemoryObjectManager,
    seed: Vec<Box<dyn ManagedObject>>,
) -> (DashboardBuilder, RecordingManager, RecordingRenderer) {
    inner.seed(seed).unwrap();
    let manager = RecordingManager::new(inner);
    let renderer = RecordingRenderer::default();
    let builder = DashboardBuilder::new()
        .with_config(config)
        .register_entity::<Person>()
        .with_shared_object_manager(Arc::new(manager.clone()))
        .with_renderer(renderer.clone());
    (builder, manager, renderer)
}

pub fn fixture(builder: (DashboardBuilder, RecordingManager, RecordingRenderer)) -> Fixture {
    let (builder, manager, renderer) = builder;
    Fixture {
        action: builder.build_action().expect("configuration should be valid"),
        manager,
        renderer,
    }
}
