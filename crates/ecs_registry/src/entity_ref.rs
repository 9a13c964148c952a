//! Entity-scoped convenience wrapper.

use crate::component::{AnyComponent, Component, Handle};
use crate::entity::Entity;
use crate::registry::Registry;

/// An [`Entity`] paired with the registry it lives in.
///
/// Every method forwards to the registry call of the same name with this
/// entity filled in.
#[derive(Debug, Clone, Copy)]
pub struct EntityRef<'r> {
    registry: &'r Registry,
    entity: Entity,
}

impl<'r> EntityRef<'r> {
    pub(crate) fn new(registry: &'r Registry, entity: Entity) -> Self {
        Self { registry, entity }
    }

    /// The wrapped entity.
    #[must_use]
    pub fn id(&self) -> Entity {
        self.entity
    }

    /// The registry the entity lives in.
    #[must_use]
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Returns `true` while the entity is live.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.registry.contains(self.entity)
    }

    /// See [`Registry::name_of`].
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.registry.name_of(self.entity)
    }

    /// See [`Registry::get_component`].
    #[must_use]
    pub fn get_component<T: ?Sized + 'static>(&self) -> Option<Handle<T>> {
        self.registry.get_component::<T>(self.entity)
    }

    /// See [`Registry::add_component`].
    pub fn add_component<C: Component>(&self, component: &Handle<C>) -> bool {
        self.registry.add_component(self.entity, component)
    }

    /// See [`Registry::remove_component`].
    pub fn remove_component<C: ?Sized>(&self, component: &Handle<C>) -> bool {
        self.registry.remove_component(self.entity, component)
    }

    /// Every component of the entity, in attachment order. See
    /// [`Registry::get_components`].
    #[must_use]
    pub fn components(&self) -> Vec<AnyComponent> {
        self.registry.get_components(self.entity)
    }
}

impl PartialEq for EntityRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.registry, other.registry) && self.entity == other.entity
    }
}

impl Eq for EntityRef<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Name(&'static str);

    crate::component!(Name);

    #[test]
    fn test_entity_ref_forwards_to_registry() {
        let registry = Registry::new();
        let player = registry.entity(registry.create_named("player"));
        let name = Handle::new(Name("hero"));

        assert!(player.exists());
        assert_eq!(player.name().as_deref(), Some("player"));
        assert!(player.add_component(&name));
        assert_eq!(player.get_component::<Name>().unwrap().read().0, "hero");
        assert_eq!(player.components().len(), 1);

        assert!(player.remove_component(&name));
        assert!(!player.remove_component(&name));
        assert!(player.get_component::<Name>().is_none());
    }

    #[test]
    fn test_entity_ref_equality_is_by_identity() {
        let registry = Registry::new();
        let a = registry.create_named("twin");
        let b = registry.create_named("twin");
        assert_eq!(registry.entity(a), registry.entity(a));
        assert_ne!(registry.entity(a), registry.entity(b));
    }

    #[test]
    fn test_entity_ref_after_removal() {
        let registry = Registry::new();
        let e = registry.entity(registry.create());
        registry.remove_entity(e.id());
        assert!(!e.exists());
        assert!(e.name().is_none());
        assert!(!e.add_component(&Handle::new(Name("late"))));
    }
}
