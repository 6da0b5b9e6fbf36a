//! Object persistence gateway

use crate::core::entity::ManagedObject;
use crate::core::error::{DashboardError, DashboardResult};
use crate::core::store::{CriteriaResult, OrderBy};
use async_trait::async_trait;

/// Service trait for reading and persisting managed objects
///
/// One object manager serves every entity type; calls are keyed by the entity
/// type identifier. The dashboard awaits each call before issuing the next one.
#[async_trait]
pub trait ObjectManager: Send + Sync {
    /// Number of stored objects of a type
    async fn count_all(&self, object_type: &str) -> DashboardResult<usize>;

    /// One page of objects, `limit` items starting at `offset`
    async fn find_page(
        &self,
        object_type: &str,
        offset: usize,
        limit: usize,
        order_by: &[OrderBy],
    ) -> DashboardResult<Vec<Box<dyn ManagedObject>>>;

    /// Get an object by identifier
    async fn find_by_id(
        &self,
        object_type: &str,
        id: &str,
    ) -> DashboardResult<Option<Box<dyn ManagedObject>>>;

    /// Insert or replace an object
    async fn persist(&self, object: Box<dyn ManagedObject>) -> DashboardResult<()>;

    /// Invoke a named repository method without arguments
    async fn call_repository_method(
        &self,
        object_type: &str,
        method: &str,
    ) -> DashboardResult<CriteriaResult>;

    /// Get an object by identifier, failing with `NotFound` when absent
    async fn get_one_by_id(
        &self,
        object_type: &str,
        id: &str,
    ) -> DashboardResult<Box<dyn ManagedObject>> {
        self.find_by_id(object_type, id)
            .await?
            .ok_or_else(|| DashboardError::not_found(object_type, id))
    }

    /// Number of pages needed to show every object of a type
    async fn pages_count(&self, object_type: &str, results_per_page: usize) -> DashboardResult<usize> {
        let count = self.count_all(object_type).await?;
        Ok(crate::core::query::pages_count(count, results_per_page))
    }
}
