//! The named registry.

use crate::entry::{EntryState, FactoryEntry, Instance};
use crate::error::{BoxError, RegistryError, Result};
use crate::kind::{CapabilityKind, Component, RegistryKey};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Registry of named, lazily constructed components.
///
/// Factories are registered under a `(kind, name)` key and run at most once,
/// on first resolution. Resolved instances are shared as `Arc<T>` for the
/// lifetime of the registry.
///
/// The registry is a cheap handle: clones share the same entries. Build
/// functions receive the registry so they can resolve their own
/// dependencies.
///
/// ```
/// use armature_registry::{CapabilityKind, Component, NamedRegistry};
///
/// struct Pool {
///     url: String,
/// }
///
/// impl Component for Pool {
///     const KIND: CapabilityKind = CapabilityKind::ConnectionPool;
/// }
///
/// let registry = NamedRegistry::new();
/// registry
///     .register("local", |_| Ok(Pool { url: "http://localhost:9200".into() }))
///     .unwrap();
///
/// let pool = registry.resolve::<Pool>("local").unwrap();
/// assert_eq!(pool.url, "http://localhost:9200");
/// ```
#[derive(Clone, Default)]
pub struct NamedRegistry {
    entries: Arc<DashMap<RegistryKey, Arc<FactoryEntry>>>,
}

impl NamedRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        debug!("Creating new named registry");
        Self::default()
    }

    /// Register a build function for `T` under `name`.
    ///
    /// Nothing is constructed here. Registering an existing key replaces the
    /// previous factory and discards any instance it had built.
    pub fn register<T, F>(&self, name: impl Into<String>, build: F) -> Result<()>
    where
        T: Component,
        F: Fn(&NamedRegistry) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        let key = RegistryKey::new(T::KIND, name)?;
        let entry = FactoryEntry::new(
            key.clone(),
            Box::new(move |registry: &NamedRegistry| build(registry).map(|instance| Arc::new(instance) as Instance)),
        );
        self.insert(key, entry);
        Ok(())
    }

    /// Register an already constructed instance under `name`.
    pub fn register_instance<T: Component>(&self, name: impl Into<String>, instance: T) -> Result<()> {
        let key = RegistryKey::new(T::KIND, name)?;
        let entry = FactoryEntry::prebuilt(key.clone(), Arc::new(instance));
        self.insert(key, entry);
        Ok(())
    }

    fn insert(&self, key: RegistryKey, entry: FactoryEntry) {
        let kind = key.kind();
        let replaced = self.entries.insert(key, Arc::new(entry));

        match replaced {
            Some(previous) => debug!(
                kind = %kind,
                name = previous.key().name(),
                "Replaced existing factory"
            ),
            None => trace!(kind = %kind, "Factory registered"),
        }
    }

    /// Resolve the component registered as `T` under `name`.
    ///
    /// Builds the instance on first use (transitively building whatever the
    /// build function resolves) and returns the cached instance afterwards.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotRegistered`] if no factory exists for the key, or
    /// if a dependency resolved by the build function is missing.
    /// [`RegistryError::ConstructionFailed`] if the build function failed;
    /// the failure is not cached.
    pub fn resolve<T: Component>(&self, name: &str) -> Result<Arc<T>> {
        self.try_resolve::<T>(name)?
            .ok_or_else(|| RegistryError::NotRegistered {
                kind: T::KIND,
                name: name.to_string(),
            })
    }

    /// Like [`resolve`](Self::resolve), but reports a missing key as `Ok(None)`.
    pub fn try_resolve<T: Component>(&self, name: &str) -> Result<Option<Arc<T>>> {
        let kind = T::KIND;
        let Some(entry) = self.entry(kind, name) else {
            trace!(kind = %kind, name, "No factory registered");
            return Ok(None);
        };

        entry
            .get_or_build(self)?
            .downcast::<T>()
            .map(Some)
            .map_err(|_| RegistryError::TypeMismatch {
                kind,
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Look up an entry without holding the map guard past the call.
    fn entry(&self, kind: CapabilityKind, name: &str) -> Option<Arc<FactoryEntry>> {
        self.entries
            .get(&RegistryKey::lookup(kind, name))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Check whether a factory is registered for `(kind, name)`.
    pub fn contains(&self, kind: CapabilityKind, name: &str) -> bool {
        self.entries.contains_key(&RegistryKey::lookup(kind, name))
    }

    /// Current lifecycle state of `(kind, name)`, if registered.
    pub fn state(&self, kind: CapabilityKind, name: &str) -> Option<EntryState> {
        self.entry(kind, name).map(|entry| entry.state())
    }

    /// Registered names for `kind`, sorted.
    pub fn names(&self, kind: CapabilityKind) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().kind() == kind)
            .map(|entry| entry.key().name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Number of registered entries across all kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for NamedRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}
