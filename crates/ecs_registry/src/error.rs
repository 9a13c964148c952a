//! Registry error types.

use crate::entity::Entity;

/// Reasons a registry mutation was rejected.
///
/// The boolean registry API folds these into `false`; the `try_*` variants
/// return them as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The entity was never created here, or has been removed.
    #[error("{0} is not a live entity")]
    EntityNotFound(Entity),

    /// The component is attached to a different entity than the one named.
    #[error("component `{component}` is owned by {owner}, not {entity}")]
    NotOwner {
        component: &'static str,
        entity: Entity,
        owner: Entity,
    },

    /// The component is attached to an entity of another registry.
    #[error("component `{0}` is attached in another registry")]
    ForeignComponent(&'static str),

    /// A system of the same concrete type is already registered.
    #[error("a system of type `{0}` is already registered")]
    DuplicateSystem(&'static str),

    /// No system of the given type is registered.
    #[error("no system of type `{0}` is registered")]
    SystemNotFound(&'static str),
}
