//! Object registry: the factories of every managed object type

use crate::core::entity::{EntityFactory, ManagedEntity, ObjectFactory};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of object factories keyed by entity type identifier
///
/// The dashboard never names concrete types: every blank instance (new form,
/// imported row) comes from the factory registered here.
#[derive(Clone, Default)]
pub struct ObjectRegistry {
    factories: HashMap<String, Arc<dyn ObjectFactory>>,
}

impl ObjectRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory under the type it produces
    pub fn register(&mut self, factory: Arc<dyn ObjectFactory>) {
        let object_type = factory.object_type().to_string();
        self.factories.insert(object_type, factory);
    }

    /// Register a type defined with `impl_managed_object!`
    pub fn register_entity<T: ManagedEntity>(&mut self) {
        self.register(EntityFactory::<T>::shared());
    }

    pub fn get(&self, object_type: &str) -> Option<Arc<dyn ObjectFactory>> {
        self.factories.get(object_type).cloned()
    }

    /// Get all registered entity types
    pub fn object_types(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }
}

impl std::fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("object_types", &self.object_types())
            .finish()
    }
}
