//! Dependency registry: string-keyed, type-erased values consumed by the resolver.
//!
//! Type-based entries use [`type_key`] (the fully-qualified type name) as their key, so one map
//! serves both name and type lookups.

use std::any::{self, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, RouteError};

/// Registry key for values looked up by type.
pub fn type_key<T: Any + ?Sized>() -> &'static str {
    any::type_name::<T>()
}

/// A resolved value, or an explicit null. Cloning shares the value.
#[derive(Clone, Default)]
pub struct Dependency(Option<Arc<dyn Any + Send + Sync>>);

impl Dependency {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an existing `Arc` without boxing it again.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        let value: Arc<dyn Any + Send + Sync> = value;
        Self(Some(value))
    }

    pub fn null() -> Self {
        Self(None)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref()?.downcast_ref::<T>()
    }

    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.0.clone()?.downcast::<T>().ok()
    }

    /// True when both are null or both share the same allocation.
    pub fn ptr_eq(&self, other: &Dependency) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None => f.write_str("Dependency(null)"),
            Some(_) => f.write_str("Dependency(..)"),
        }
    }
}

/// has/get/set contract the resolver reads from.
pub trait Registry {
    fn has(&self, key: &str) -> bool;

    /// Fails with [`RouteError::NotFound`] when the key is absent. A null entry is present.
    fn get(&self, key: &str) -> Result<Dependency>;

    fn set(&mut self, key: &str, value: Dependency);
}

/// In-process [`Registry`]. Clones are independent maps sharing the stored values, so a base
/// container can be cloned per request and filled with request-scoped entries.
#[derive(Clone, Default, Debug)]
pub struct Container {
    entries: HashMap<String, Dependency>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Container::insert`].
    pub fn with<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder form of [`Container::insert_typed`].
    pub fn with_typed<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.insert_typed(value);
        self
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Dependency::new(value));
    }

    /// Stores `value` under its own type key.
    pub fn insert_typed<T: Any + Send + Sync>(&mut self, value: T) {
        self.entries.insert(type_key::<T>().to_string(), Dependency::new(value));
    }

    pub fn insert_dependency(&mut self, key: impl Into<String>, value: Dependency) {
        self.entries.insert(key.into(), value);
    }

    /// Copy of `self` with every entry of `other` laid over it; `other` wins on shared keys.
    pub fn merged(&self, other: &Container) -> Container {
        let mut merged = self.clone();
        merged
            .entries
            .extend(other.entries.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    pub fn lookup(&self, key: &str) -> Option<&Dependency> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Registry for Container {
    fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn get(&self, key: &str) -> Result<Dependency> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| RouteError::NotFound(key.to_string()))
    }

    fn set(&mut self, key: &str, value: Dependency) {
        self.entries.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Wrapper(u32);

    #[test]
    fn test_get_missing_key_is_not_found() {
        let container = Container::new();
        assert!(!container.has("foo"));
        assert!(matches!(container.get("foo"), Err(RouteError::NotFound(k)) if k == "foo"));
    }

    #[test]
    fn test_null_entry_is_present() {
        let mut container = Container::new();
        container.set("session", Dependency::null());
        assert!(container.has("session"));
        assert!(container.get("session").unwrap().is_null());
    }

    #[test]
    fn test_typed_entries_use_type_name() {
        let container = Container::new().with_typed(Wrapper(3));
        let dep = container.get(type_key::<Wrapper>()).unwrap();
        assert_eq!(dep.downcast_ref::<Wrapper>(), Some(&Wrapper(3)));
        assert!(dep.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_clone_is_independent_but_shares_values() {
        let base = Container::new().with("foo", "Foo".to_string());
        let mut request = base.clone();
        request.insert("bar", "Bar".to_string());

        assert!(!base.has("bar"));
        assert!(base
            .get("foo")
            .unwrap()
            .ptr_eq(&request.get("foo").unwrap()));
    }

    #[test]
    fn test_merged_prefers_other() {
        let own = Container::new()
            .with("foo", "own".to_string())
            .with("bar", "Bar".to_string());
        let request = Container::new().with("foo", "request".to_string());
        let merged = own.merged(&request);

        assert_eq!(merged.len(), 2);
        let foo = merged.get("foo").unwrap();
        assert_eq!(foo.downcast_ref::<String>().unwrap(), "request");
        assert!(merged.has("bar"));
        assert_eq!(own.get("foo").unwrap().downcast_ref::<String>().unwrap(), "own");
    }

    #[test]
    fn test_from_arc_does_not_double_wrap() {
        let shared = Arc::new(Wrapper(9));
        let dep = Dependency::from_arc(shared.clone());
        assert!(Arc::ptr_eq(&dep.downcast_arc::<Wrapper>().unwrap(), &shared));
    }
}
