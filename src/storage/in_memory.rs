//! In-memory implementation of ObjectManager for testing and development

use crate::core::entity::ManagedObject;
use crate::core::error::{ConfigurationError, DashboardError, DashboardResult};
use crate::core::service::ObjectManager;
use crate::core::store::{CriteriaResult, OrderBy, apply_order};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A named query over every stored object of one type
pub type RepositoryMethod =
    Arc<dyn Fn(Vec<Box<dyn ManagedObject>>) -> anyhow::Result<CriteriaResult> + Send + Sync>;

type Store = HashMap<String, IndexMap<String, Box<dyn ManagedObject>>>;

/// In-memory object manager implementation
///
/// Useful for testing and development. Objects are kept per type in insertion
/// order; persisting an existing identifier replaces the object in place.
/// Uses RwLock for thread-safe access.
#[derive(Clone)]
pub struct InMemoryObjectManager {
    objects: Arc<RwLock<Store>>,
    repository_methods: HashMap<String, HashMap<String, RepositoryMethod>>,
}

fn lock_error(e: impl std::fmt::Display) -> DashboardError {
    DashboardError::Storage(format!("Failed to acquire lock: {}", e))
}

impl InMemoryObjectManager {
    /// Create a new in-memory object manager
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(HashMap::new())),
            repository_methods: HashMap::new(),
        }
    }

    /// Add a repository method callable through predefined criteria
    pub fn with_repository_method<F>(
        mut self,
        object_type: impl Into<String>,
        method: impl Into<String>,
        f: F,
    ) -> Self
    where
        F: Fn(Vec<Box<dyn ManagedObject>>) -> anyhow::Result<CriteriaResult> + Send + Sync + 'static,
    {
        self.repository_methods
            .entry(object_type.into())
            .or_default()
            .insert(method.into(), Arc::new(f));
        self
    }

    /// Store objects directly, bypassing the async API
    pub fn seed<I>(&self, objects: I) -> DashboardResult<()>
    where
        I: IntoIterator<Item = Box<dyn ManagedObject>>,
    {
        let mut store = self.objects.write().map_err(lock_error)?;
        for object in objects {
            store
                .entry(object.object_type().to_string())
                .or_default()
                .insert(object.id(), object);
        }
        Ok(())
    }

    /// Every stored object of a type, in insertion order
    pub fn all(&self, object_type: &str) -> DashboardResult<Vec<Box<dyn ManagedObject>>> {
        let store = self.objects.read().map_err(lock_error)?;
        Ok(store
            .get(object_type)
            .map(|objects| objects.values().cloned().collect())
            .unwrap_or_default())
    }
}

impl Default for InMemoryObjectManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectManager for InMemoryObjectManager {
    async fn count_all(&self, object_type: &str) -> DashboardResult<usize> {
        let store = self.objects.read().map_err(lock_error)?;
        Ok(store.get(object_type).map_or(0, IndexMap::len))
    }

    async fn find_page(
        &self,
        object_type: &str,
        offset: usize,
        limit: usize,
        order_by: &[OrderBy],
    ) -> DashboardResult<Vec<Box<dyn ManagedObject>>> {
        let mut objects = self.all(object_type)?;
        apply_order(&mut objects, order_by);
        Ok(objects.into_iter().skip(offset).take(limit).collect())
    }

    async fn find_by_id(
        &self,
        object_type: &str,
        id: &str,
    ) -> DashboardResult<Option<Box<dyn ManagedObject>>> {
        let store = self.objects.read().map_err(lock_error)?;
        Ok(store
            .get(object_type)
            .and_then(|objects| objects.get(id))
            .cloned())
    }

    async fn persist(&self, object: Box<dyn ManagedObject>) -> DashboardResult<()> {
        let mut store = self.objects.write().map_err(lock_error)?;
        store
            .entry(object.object_type().to_string())
            .or_default()
            .insert(object.id(), object);
        Ok(())
    }

    async fn call_repository_method(
        &self,
        object_type: &str,
        method: &str,
    ) -> DashboardResult<CriteriaResult> {
        let repository_method = self
            .repository_methods
            .get(object_type)
            .and_then(|methods| methods.get(method))
            .ok_or_else(|| ConfigurationError::UnknownRepositoryMethod {
                object_type: object_type.to_string(),
                method: method.to_string(),
            })?;

        let objects = self.all(object_type)?;
        repository_method(objects).map_err(|e| {
            DashboardError::Storage(format!("Repository method \"{}\" failed: {:#}", method, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::FieldValue;

    crate::impl_managed_object!(Book, "book", {
        title: String,
        pages: i64,
    });

    fn book(id: &str, title: &str, pages: i64) -> Box<dyn ManagedObject> {
        Box::new(Book::new(title.to_string(), pages).with_id(id))
    }

    fn titles(objects: &[Box<dyn ManagedObject>]) -> Vec<String> {
        objects
            .iter()
            .map(|o| o.get_field("title").unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_persist_and_find() {
        let manager = InMemoryObjectManager::new();
        manager.persist(book("1", "Dune", 412)).await.unwrap();

        assert_eq!(manager.count_all("book").await.unwrap(), 1);
        let found = manager.find_by_id("book", "1").await.unwrap().unwrap();
        assert_eq!(found.get_field("pages"), Some(FieldValue::Integer(412)));
        assert!(manager.find_by_id("book", "2").await.unwrap().is_none());
        assert_eq!(manager.count_all("author").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_persist_existing_id_replaces_in_place() {
        let manager = InMemoryObjectManager::new();
        manager
            .seed(vec![book("1", "Dune", 412), book("2", "Emma", 300)])
            .unwrap();
        manager.persist(book("1", "Dune Messiah", 256)).await.unwrap();

        let all = manager.all("book").unwrap();
        assert_eq!(titles(&all), vec!["Dune Messiah", "Emma"]);
    }

    #[tokio::test]
    async fn test_find_page_orders_then_slices() {
        let manager = InMemoryObjectManager::new();
        manager
            .seed(vec![
                book("1", "C", 1),
                book("2", "A", 2),
                book("3", "D", 3),
                book("4", "B", 4),
            ])
            .unwrap();

        let page = manager
            .find_page("book", 1, 2, &[OrderBy::asc("title")])
            .await
            .unwrap();
        assert_eq!(titles(&page), vec!["B", "C"]);

        let unordered = manager.find_page("book", 2, 20, &[]).await.unwrap();
        assert_eq!(titles(&unordered), vec!["D", "B"]);
    }

    #[tokio::test]
    async fn test_repository_method() {
        let manager = InMemoryObjectManager::new().with_repository_method(
            "book",
            "find_long",
            |objects| {
                Ok(CriteriaResult::Objects(
                    objects
                        .into_iter()
                        .filter(|o| o.get_field("pages").and_then(|p| p.as_integer()) > Some(300))
                        .collect(),
                ))
            },
        );
        manager
            .seed(vec![book("1", "Dune", 412), book("2", "Emma", 300)])
            .unwrap();

        match manager.call_repository_method("book", "find_long").await.unwrap() {
            CriteriaResult::Objects(objects) => assert_eq!(titles(&objects), vec!["Dune"]),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_repository_method() {
        let manager = InMemoryObjectManager::new();
        let err = manager
            .call_repository_method("book", "find_nothing")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DashboardError::Configuration(ConfigurationError::UnknownRepositoryMethod { .. })
        ));
    }
}
