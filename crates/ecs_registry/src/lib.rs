//! # ecs_registry
//!
//! A flat, type-keyed entity-component-system registry.
//!
//! This crate provides:
//!
//! - [`Entity`] — opaque `u64` identities allocated by a registry.
//! - [`Component`] and [`Handle`] — shared component values with a
//!   registry-maintained owner back-reference.
//! - [`Registry`] — entity/component storage, exact and polymorphic lookup,
//!   attach/detach/move, and the system table.
//! - [`System`] — per-tick behavior units driven by [`Registry::update`].
//! - [`EntityRef`] — entity-scoped convenience calls.
//!
//! ## Usage
//!
//! ```rust
//! use ecs_registry::{component, Handle, Registry, System, SystemHandle};
//!
//! struct Velocity(f32);
//! component!(Velocity);
//!
//! struct Drag;
//!
//! impl System for Drag {
//!     fn update(&mut self, registry: &Registry, delta: f32) {
//!         for velocity in registry.get_components_of::<Velocity>() {
//!             velocity.write().0 *= 1.0 - delta;
//!         }
//!     }
//! }
//!
//! let registry = Registry::new();
//! let ship = registry.entity(registry.create_named("ship"));
//! let velocity = Handle::new(Velocity(10.0));
//! ship.add_component(&velocity);
//!
//! registry.add_system(&SystemHandle::new(Drag));
//! registry.update(0.5);
//! assert_eq!(velocity.read().0, 5.0);
//! ```

pub mod component;
pub mod entity;
pub mod entity_ref;
pub mod error;
pub mod registry;
pub mod system;

pub use component::{AnyComponent, Component, ComponentKind, ErasedHandle, Handle, Slot};
pub use entity::{Entity, RegistryId};
pub use entity_ref::EntityRef;
pub use error::RegistryError;
pub use registry::Registry;
pub use system::{System, SystemHandle};
