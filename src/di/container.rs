use crate::error::{GantryError, Result};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Thread-safe dependency injection container.
///
/// Two keyspaces coexist:
/// - typed bindings, keyed by [`TypeId`], one instance per type
///   ([`register`](Container::register) / [`resolve`](Container::resolve));
/// - named bindings, keyed by string id, used for controller singletons and
///   filters that routes reference by name
///   ([`bind_named`](Container::bind_named) / [`get_named`](Container::get_named)).
///
/// All bindings are populated during the single-threaded setup phase and
/// read-only while serving.
pub struct Container {
    services: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    named: DashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Clone for Container {
    fn clone(&self) -> Self {
        Self {
            services: self.services.clone(),
            named: self.named.clone(),
        }
    }
}

impl Container {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
            named: DashMap::new(),
        }
    }

    pub fn register<T: 'static + Send + Sync>(&mut self, instance: T) -> &mut Self {
        self.services.insert(TypeId::of::<T>(), Arc::new(instance));
        self
    }

    pub fn resolve<T: 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        let entry = self.services.get(&TypeId::of::<T>()).ok_or_else(|| {
            GantryError::DependencyNotFound {
                type_name: std::any::type_name::<T>().to_string(),
            }
        })?;
        entry
            .value()
            .clone()
            .downcast::<T>()
            .map_err(|_| GantryError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    /// Bind a value under a string id. Rebinding an id replaces the previous
    /// value; duplicate ids across registrations are unsupported.
    pub fn bind_named<T: Clone + 'static + Send + Sync>(&self, id: impl Into<String>, value: T) {
        self.named.insert(id.into(), Arc::new(value));
    }

    pub fn get_named<T: Clone + 'static + Send + Sync>(&self, id: &str) -> Result<T> {
        let entry = self
            .named
            .get(id)
            .ok_or_else(|| GantryError::DependencyNotFound {
                type_name: format!("'{}' ({})", id, std::any::type_name::<T>()),
            })?;
        entry
            .value()
            .clone()
            .downcast::<T>()
            .map(|value| value.as_ref().clone())
            .map_err(|_| GantryError::DowncastFailed {
                type_name: format!("'{}' ({})", id, std::any::type_name::<T>()),
            })
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    pub fn contains_named(&self, id: &str) -> bool {
        self.named.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.services.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.named.is_empty()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}
