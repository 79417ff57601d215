//! Factory entries: a build function plus its memoized instance.

use crate::error::{BoxError, RegistryError, Result};
use crate::kind::RegistryKey;
use crate::registry::NamedRegistry;
use once_cell::sync::OnceCell;
use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// Type-erased constructed instance.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

/// Type-erased build function.
pub(crate) type BuildFn = dyn Fn(&NamedRegistry) -> std::result::Result<Instance, BoxError> + Send + Sync;

/// Lifecycle state of a registered entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Build function present, nothing constructed yet (or the last build failed).
    Registered,
    /// A build is in progress; concurrent resolvers wait on it.
    Building,
    /// The instance is constructed and cached.
    Built,
}

pub(crate) struct FactoryEntry {
    key: RegistryKey,
    build: Box<BuildFn>,
    instance: OnceCell<Instance>,
    building: AtomicBool,
}

impl FactoryEntry {
    pub(crate) fn new(key: RegistryKey, build: Box<BuildFn>) -> Self {
        Self {
            key,
            build,
            instance: OnceCell::new(),
            building: AtomicBool::new(false),
        }
    }

    /// Entry whose instance already exists.
    pub(crate) fn prebuilt(key: RegistryKey, instance: Instance) -> Self {
        let cached = Arc::clone(&instance);
        Self {
            key,
            build: Box::new(move |_: &NamedRegistry| Ok(Arc::clone(&cached))),
            instance: OnceCell::with_value(instance),
            building: AtomicBool::new(false),
        }
    }

    pub(crate) fn key(&self) -> &RegistryKey {
        &self.key
    }

    pub(crate) fn state(&self) -> EntryState {
        if self.instance.get().is_some() {
            EntryState::Built
        } else if self.building.load(Ordering::Acquire) {
            EntryState::Building
        } else {
            EntryState::Registered
        }
    }

    /// Return the cached instance, building it first if needed.
    ///
    /// Concurrent callers block until the single in-flight build finishes.
    /// A failed build leaves the cell empty so the next call retries.
    pub(crate) fn get_or_build(&self, registry: &NamedRegistry) -> Result<Instance> {
        if let Some(instance) = self.instance.get() {
            trace!(kind = %self.key.kind(), name = self.key.name(), "Component cache hit");
            return Ok(Arc::clone(instance));
        }

        // Lowered only after the cell is filled.
        let mut building = None;
        let result = self.instance.get_or_try_init(|| {
            building = Some(BuildingFlag::raise(&self.building));
            debug!(kind = %self.key.kind(), name = self.key.name(), "Building component");

            let instance = (self.build)(registry)
                .map_err(|source| RegistryError::from_build(&self.key, source))?;

            debug!(kind = %self.key.kind(), name = self.key.name(), "Component built");
            Ok(instance)
        });
        drop(building);

        result.cloned()
    }
}

/// Holds the `building` flag up for the duration of a build, including unwinds.
struct BuildingFlag<'a>(&'a AtomicBool);

impl<'a> BuildingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for BuildingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
