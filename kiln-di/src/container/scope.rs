//! Named unit-of-work caches for scoped services

use super::{Instance, key::ServiceKey};
use parking_lot::RwLock;
use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::Arc
};

/// A named cache of [`Lifetime::Scoped`](super::Lifetime::Scoped) instances,
/// typically one per request or operation.
///
/// Scopes are created with [`Container::create_scope`](super::Container::create_scope)
/// and passed to [`Container::resolve_in_scope`](super::Container::resolve_in_scope).
/// Cloning a `Scope` yields another handle to the same cache.
///
/// A scope keeps working after it was replaced in the container by a scope
/// with the same name, or after [`Container::clear`](super::Container::clear);
/// it only becomes unreachable by name.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>
}

struct ScopeInner {
    name: String,
    instances: RwLock<HashMap<ServiceKey, Instance>>,
}

impl Debug for Scope {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.inner.name)
            .field("instances", &self.len())
            .finish()
    }
}

impl Scope {
    #[inline]
    pub(crate) fn new(name: String) -> Self {
        let inner = ScopeInner {
            name,
            instances: RwLock::new(HashMap::new())
        };
        Self { inner: Arc::new(inner) }
    }

    /// Returns the scope name
    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the number of instances cached in this scope
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.instances.read().len()
    }

    /// Returns `true` if nothing has been cached in this scope yet
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.instances.read().is_empty()
    }

    /// Returns `true` if both handles point to the same scope
    #[inline]
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    #[inline]
    pub(crate) fn get(&self, key: &ServiceKey) -> Option<Instance> {
        self.inner.instances
            .read()
            .get(key)
            .cloned()
    }

    #[inline]
    pub(crate) fn set(&self, key: ServiceKey, instance: Instance) {
        self.inner.instances
            .write()
            .insert(key, instance);
    }
}
