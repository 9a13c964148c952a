//! Entity and registry identifiers.
//!
//! An [`Entity`] carries no data. Its name and component set live in the
//! [`Registry`](crate::Registry) that created it, and only that registry can
//! mint one. Two entities created with the same name are still distinct.

use uuid::Uuid;

/// Identity of an entity within the registry that created it.
///
/// Equality is by identity, never by name. A registry hands out ids in
/// creation order and never reuses one, so ordering entities orders them by
/// age and a removed entity stays dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(u64);

impl Entity {
    pub(crate) const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Identity of a [`Registry`](crate::Registry) instance.
///
/// Entity ids restart in every registry, so component owner records carry
/// this as well. A component attached in one registry is never mistaken for
/// one attached in another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistryId(Uuid);

impl RegistryId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RegistryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_display() {
        assert_eq!(Entity::new(42).to_string(), "Entity(42)");
    }

    #[test]
    fn test_registry_ids_differ() {
        assert_ne!(RegistryId::new(), RegistryId::new());
    }
}
