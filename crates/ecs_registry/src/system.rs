//! Systems and the per-tick update dispatch.
//!
//! A [`System`] is registered once per concrete type and invoked on every
//! [`Registry::update`]. It receives the registry on each call so it can pull
//! the components it cares about with
//! [`Registry::get_components_of`](crate::Registry::get_components_of).

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::entity::RegistryId;
use crate::error::RegistryError;
use crate::registry::{Registry, accepted};

/// A per-tick behavior unit.
pub trait System: Send + 'static {
    /// Called once when the system is registered, with the identity of the
    /// registry that accepted it.
    fn on_register(&mut self, registry: RegistryId) {
        let _ = registry;
    }

    /// Advance the system by one tick. `delta` is whatever the host loop
    /// passed to [`Registry::update`].
    fn update(&mut self, registry: &Registry, delta: f32);
}

/// A shared handle to a system instance.
///
/// The caller keeps its own clone; the registry only holds a reference and
/// forgets it on removal.
pub struct SystemHandle<S: ?Sized> {
    inner: Arc<Mutex<S>>,
}

impl<S: System> SystemHandle<S> {
    /// Wrap a system so it can be registered and still inspected afterwards.
    #[must_use]
    pub fn new(system: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(system)),
        }
    }
}

impl<S: ?Sized> SystemHandle<S> {
    /// Locks the system. Do not hold the guard across [`Registry::update`].
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.inner.lock()
    }

    /// Returns `true` if both handles refer to the same system instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<S: ?Sized> Clone for SystemHandle<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ?Sized> std::fmt::Debug for SystemHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemHandle")
            .field("system", &std::any::type_name::<S>())
            .finish()
    }
}

/// A registry entry: the runnable system plus a typed view for lookups.
pub(crate) struct RegisteredSystem {
    name: &'static str,
    run: Arc<Mutex<dyn System>>,
    typed: Arc<dyn Any + Send + Sync>,
}

impl RegisteredSystem {
    fn new<S: System>(system: &SystemHandle<S>) -> Self {
        let run: Arc<Mutex<dyn System>> = system.inner.clone();
        let typed: Arc<dyn Any + Send + Sync> = system.inner.clone();
        Self {
            name: std::any::type_name::<S>(),
            run,
            typed,
        }
    }
}

impl Registry {
    /// Register a system keyed by its concrete type.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateSystem`] if a system of the same type
    /// is already registered. The existing registration is kept.
    pub fn try_add_system<S: System>(&self, system: &SystemHandle<S>) -> Result<(), RegistryError> {
        let name = std::any::type_name::<S>();
        // Held until `on_register` returns so no tick can run the system first.
        let mut guard = system.lock();
        match self.systems.entry(TypeId::of::<S>()) {
            Entry::Occupied(_) => return Err(RegistryError::DuplicateSystem(name)),
            Entry::Vacant(slot) => {
                slot.insert(RegisteredSystem::new(system));
            }
        }
        guard.on_register(self.id);
        debug!(system = name, "system registered");
        Ok(())
    }

    /// Register a system. Returns `false` if its type is already registered.
    pub fn add_system<S: System>(&self, system: &SystemHandle<S>) -> bool {
        accepted("add_system", self.try_add_system(system))
    }

    /// Unregister the system of type `S`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SystemNotFound`] if none is registered.
    pub fn try_remove_system<S: System>(&self) -> Result<(), RegistryError> {
        let name = std::any::type_name::<S>();
        self.systems
            .remove(&TypeId::of::<S>())
            .ok_or(RegistryError::SystemNotFound(name))?;
        debug!(system = name, "system unregistered");
        Ok(())
    }

    /// Unregister a system by its concrete type. Returns `false` if absent.
    pub fn remove_system<S: System>(&self, _system: &SystemHandle<S>) -> bool {
        accepted("remove_system", self.try_remove_system::<S>())
    }

    /// Returns `true` if a system of the same concrete type is registered.
    #[must_use]
    pub fn contains_system<S: System>(&self, _system: &SystemHandle<S>) -> bool {
        self.systems.contains_key(&TypeId::of::<S>())
    }

    /// The registered system of exactly type `S`.
    #[must_use]
    pub fn get_system<S: System>(&self) -> Option<SystemHandle<S>> {
        let entry = self.systems.get(&TypeId::of::<S>())?;
        let inner = Arc::clone(&entry.typed).downcast::<Mutex<S>>().ok()?;
        Some(SystemHandle { inner })
    }

    /// Number of registered systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Run every registered system once with `delta`.
    ///
    /// The system set is snapshotted first, so systems may query the registry
    /// and add or remove systems while the tick runs; such changes take effect
    /// on the next call. Iteration order over systems is unspecified.
    pub fn update(&self, delta: f32) {
        let systems: Vec<(&'static str, Arc<Mutex<dyn System>>)> = self
            .systems
            .iter()
            .map(|entry| (entry.name, Arc::clone(&entry.run)))
            .collect();

        trace!(delta, systems = systems.len(), "update");
        for (name, system) in systems {
            trace!(system = name, "running system");
            system.lock().update(self, delta);
        }
    }
}
