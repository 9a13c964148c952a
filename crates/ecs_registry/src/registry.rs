//! Entity and component storage.
//!
//! The [`Registry`] is the single source of truth for which entities exist and
//! which components they hold. Each entity maps to an ordered list of
//! components keyed by concrete type; a component's owner slot always agrees
//! with that list.
//!
//! ## Locking
//!
//! Entity storage sits behind one `RwLock` owned by the registry instance.
//! Mutations take the write lock, so moving a component between entities is
//! atomic. Reads take the read lock and never observe a half-applied move.
//! Component values have their own locks and are not covered by it.

use std::any::TypeId;
use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::component::{AnyComponent, Component, ComponentKind, ErasedSlot, Handle, Owner};
use crate::entity::{Entity, RegistryId};
use crate::entity_ref::EntityRef;
use crate::error::RegistryError;
use crate::system::RegisteredSystem;

/// A component stored under an entity.
struct Attached {
    kind: ComponentKind,
    slot: Arc<dyn ErasedSlot>,
}

/// A live entity: its name and its components in attachment order.
struct Record {
    name: String,
    components: Vec<Attached>,
}

impl Record {
    fn position_of(&self, type_id: TypeId) -> Option<usize> {
        self.components
            .iter()
            .position(|attached| attached.kind.type_id == type_id)
    }

    /// Drops the component stored at `addr`. Returns whether it was present.
    fn detach(&mut self, addr: *const ()) -> bool {
        let before = self.components.len();
        self.components
            .retain(|attached| !std::ptr::addr_eq(Arc::as_ptr(&attached.slot), addr));
        self.components.len() != before
    }
}

#[derive(Default)]
struct Storage {
    /// Last id handed out. Ids are never reused.
    last_id: u64,
    /// Keyed by entity; entity IDs grow monotonically so this is creation order.
    records: BTreeMap<Entity, Record>,
}

impl Storage {
    fn allocate(&mut self) -> Entity {
        self.last_id += 1;
        Entity::new(self.last_id)
    }
}

/// Central store for entities, their components, and registered systems.
pub struct Registry {
    pub(crate) id: RegistryId,
    storage: RwLock<Storage>,
    pub(crate) systems: DashMap<TypeId, RegisteredSystem>,
}

impl Registry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: RegistryId::new(),
            storage: RwLock::new(Storage::default()),
            systems: DashMap::new(),
        }
    }

    /// Identity of this registry instance.
    #[must_use]
    pub fn id(&self) -> RegistryId {
        self.id
    }

    fn owner(&self, entity: Entity) -> Owner {
        Owner {
            registry: self.id,
            entity,
        }
    }

    // -- Entity lifecycle --

    /// Create an entity named with a fresh UUID.
    pub fn create(&self) -> Entity {
        self.create_named(Uuid::new_v4().to_string())
    }

    /// Create an entity with the given name. Names need not be unique.
    pub fn create_named(&self, name: impl Into<String>) -> Entity {
        let name = name.into();
        let mut storage = self.storage.write();
        let entity = storage.allocate();
        debug!(%entity, name = %name, "entity created");
        storage.records.insert(
            entity,
            Record {
                name,
                components: Vec::new(),
            },
        );
        entity
    }

    /// Remove an entity, detaching every component it holds first.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EntityNotFound`] if the entity is not live.
    pub fn try_remove_entity(&self, entity: Entity) -> Result<(), RegistryError> {
        let mut storage = self.storage.write();
        let record = storage
            .records
            .remove(&entity)
            .ok_or(RegistryError::EntityNotFound(entity))?;

        for attached in &record.components {
            *attached.slot.owner_cell().lock() = None;
        }
        debug!(
            %entity,
            components = record.components.len(),
            "entity removed"
        );
        Ok(())
    }

    /// Remove an entity and all its components.
    ///
    /// Returns `false` if the entity is not live.
    pub fn remove_entity(&self, entity: Entity) -> bool {
        accepted("remove_entity", self.try_remove_entity(entity))
    }

    /// Returns `true` if the entity is live in this registry.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.storage.read().records.contains_key(&entity)
    }

    /// Returns `true` if any live entity has this name.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.find_by_name(name).is_some()
    }

    /// The earliest created live entity with this name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<Entity> {
        self.storage
            .read()
            .records
            .iter()
            .find(|(_, record)| record.name == name)
            .map(|(entity, _)| *entity)
    }

    /// The name an entity was created with.
    #[must_use]
    pub fn name_of(&self, entity: Entity) -> Option<String> {
        self.storage
            .read()
            .records
            .get(&entity)
            .map(|record| record.name.clone())
    }

    /// Snapshot of all live entities, oldest first.
    #[must_use]
    pub fn all(&self) -> Vec<Entity> {
        self.storage.read().records.keys().copied().collect()
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.read().records.len()
    }

    /// Returns `true` if there are no live entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entity-scoped view for the convenience calls.
    #[must_use]
    pub fn entity(&self, entity: Entity) -> EntityRef<'_> {
        EntityRef::new(self, entity)
    }

    // -- Component operations --

    /// Attach a component to an entity.
    ///
    /// A component owned by another entity of this registry is moved. If the
    /// entity already holds a component of the same concrete type the call
    /// changes nothing: the existing instance is kept and `component` stays
    /// where it was.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::EntityNotFound`] if the entity is not live.
    /// - [`RegistryError::ForeignComponent`] if the component is attached in
    ///   another registry.
    pub fn try_add_component<C: Component>(
        &self,
        entity: Entity,
        component: &Handle<C>,
    ) -> Result<(), RegistryError> {
        let kind = component.kind();
        let mut storage = self.storage.write();
        let record = storage
            .records
            .get(&entity)
            .ok_or(RegistryError::EntityNotFound(entity))?;

        // Lock order: storage, then owner cell.
        let mut owner = component.owner_cell().lock();
        let previous = match *owner {
            Some(current) if current.registry != self.id => {
                return Err(RegistryError::ForeignComponent(kind.name));
            }
            Some(current) if current.entity == entity => return Ok(()),
            current => current.map(|current| current.entity),
        };

        if record.position_of(kind.type_id).is_some() {
            trace!(%entity, component = kind.name, "entity already holds this type");
            return Ok(());
        }

        if let Some(previous) = previous
            && let Some(old) = storage.records.get_mut(&previous)
        {
            old.detach(component.addr());
            debug!(from = %previous, to = %entity, component = kind.name, "component moved");
        }

        if let Some(record) = storage.records.get_mut(&entity) {
            record.components.push(Attached {
                kind,
                slot: component.erase(),
            });
        }
        *owner = Some(self.owner(entity));
        debug!(%entity, component = kind.name, "component attached");
        Ok(())
    }

    /// Attach a component to an entity.
    ///
    /// Returns `false` only if the entity is not live or the component belongs
    /// to another registry. Attaching a duplicate type is accepted and ignored.
    pub fn add_component<C: Component>(&self, entity: Entity, component: &Handle<C>) -> bool {
        accepted("add_component", self.try_add_component(entity, component))
    }

    /// Detach a component from an entity.
    ///
    /// Returns `Ok(true)` if the component was detached, `Ok(false)` if it was
    /// not attached anywhere.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::EntityNotFound`] if the entity is not live.
    /// - [`RegistryError::NotOwner`] if another entity holds the component.
    /// - [`RegistryError::ForeignComponent`] if another registry holds it.
    pub fn try_remove_component<C: ?Sized>(
        &self,
        entity: Entity,
        component: &Handle<C>,
    ) -> Result<bool, RegistryError> {
        let kind = component.kind();
        let mut storage = self.storage.write();
        let record = storage
            .records
            .get_mut(&entity)
            .ok_or(RegistryError::EntityNotFound(entity))?;

        let mut owner = component.owner_cell().lock();
        match *owner {
            None => Ok(false),
            Some(current) if current.registry != self.id => {
                Err(RegistryError::ForeignComponent(kind.name))
            }
            Some(current) if current.entity != entity => Err(RegistryError::NotOwner {
                component: kind.name,
                entity,
                owner: current.entity,
            }),
            Some(_) => {
                let detached = record.detach(component.addr());
                *owner = None;
                debug!(%entity, component = kind.name, "component detached");
                Ok(detached)
            }
        }
    }

    /// Detach a component from an entity.
    ///
    /// Returns `true` only if storage changed. Removing a component the entity
    /// does not own, or one already detached, returns `false`.
    pub fn remove_component<C: ?Sized>(&self, entity: Entity, component: &Handle<C>) -> bool {
        matches!(
            self.try_remove_component(entity, component)
                .inspect_err(|error| debug!(%error, "remove_component rejected")),
            Ok(true)
        )
    }

    /// Look up a component of an entity as type `T`.
    ///
    /// A component stored exactly under `T` wins. Otherwise components are
    /// scanned in attachment order, oldest first, and the first one exposing a
    /// `T` view is returned. `T` is usually a concrete component type or a
    /// trait object declared through [`component!`](crate::component!).
    #[must_use]
    pub fn get_component<T: ?Sized + 'static>(&self, entity: Entity) -> Option<Handle<T>> {
        let target = TypeId::of::<T>();
        let storage = self.storage.read();
        let record = storage.records.get(&entity)?;

        let exact = record
            .position_of(target)
            .map(|index| &record.components[index]);
        let found = exact
            .into_iter()
            .chain(
                record
                    .components
                    .iter()
                    .filter(|attached| attached.kind.type_id != target),
            )
            .find_map(|attached| {
                Arc::clone(&attached.slot)
                    .view(target)
                    .and_then(|erased| erased.downcast::<T>())
            });
        trace!(%entity, target = std::any::type_name::<T>(), found = found.is_some(), "component lookup");
        found
    }

    /// All components stored exactly under type `T`, one per holding entity,
    /// oldest entity first. Not polymorphic.
    pub fn get_components_of<T: Component>(&self) -> std::vec::IntoIter<Handle<T>> {
        let target = TypeId::of::<T>();
        let storage = self.storage.read();
        let found: Vec<Handle<T>> = storage
            .records
            .values()
            .filter_map(|record| record.position_of(target).map(|index| &record.components[index]))
            .filter_map(|attached| {
                Arc::clone(&attached.slot)
                    .view(target)
                    .and_then(|erased| erased.downcast::<T>())
            })
            .collect();
        found.into_iter()
    }

    /// Every component attached to an entity, in attachment order.
    /// Empty if the entity is not live.
    #[must_use]
    pub fn get_components(&self, entity: Entity) -> Vec<AnyComponent> {
        self.storage
            .read()
            .records
            .get(&entity)
            .map(|record| {
                record
                    .components
                    .iter()
                    .map(|attached| AnyComponent::new(Arc::clone(&attached.slot)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        let id = self.id;
        let storage = self.storage.get_mut();
        for attached in storage.records.values().flat_map(|record| &record.components) {
            let mut owner = attached.slot.owner_cell().lock();
            if owner.is_some_and(|current| current.registry == id) {
                *owner = None;
            }
        }
        debug!(registry = %id, entities = storage.records.len(), "registry dropped");
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("id", &self.id)
            .field("entities", &self.len())
            .field("systems", &self.systems.len())
            .finish()
    }
}

/// Folds a `try_*` result into the boolean API, logging the rejection.
pub(crate) fn accepted(operation: &'static str, result: Result<(), RegistryError>) -> bool {
    match result {
        Ok(()) => true,
        Err(error) => {
            debug!(%error, operation, "registry call rejected");
            false
        }
    }
}
