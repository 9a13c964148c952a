//! Core [`Component`] trait, shared component handles, and type-erased views.
//!
//! A component is constructed by the caller and wrapped in a [`Handle`]. The
//! handle is a shared reference: cloning it does not clone the component, and
//! two handles are the same component iff [`Handle::ptr_eq`] holds.
//!
//! Every handle carries an owner slot recording which entity currently holds
//! it. Only the [`Registry`](crate::Registry) writes that slot, and only while
//! it holds its storage lock; callers can read it through [`Handle::owner`].
//!
//! ## Polymorphic views
//!
//! Rust has no subtyping, so "a component that is also a `T`" is expressed as
//! a component that exposes itself as a trait object. The [`component!`]
//! macro declares those views:
//!
//! ```rust
//! use ecs_registry::{component, Handle, Registry};
//!
//! trait Shape: Send + Sync {
//!     fn area(&self) -> f32;
//! }
//!
//! struct Square(f32);
//!
//! impl Shape for Square {
//!     fn area(&self) -> f32 {
//!         self.0 * self.0
//!     }
//! }
//!
//! component!(Square => dyn Shape);
//!
//! let registry = Registry::new();
//! let e = registry.create();
//! registry.add_component(e, &Handle::new(Square(2.0)));
//!
//! let shape = registry.get_component::<dyn Shape>(e).unwrap();
//! assert_eq!(shape.read().area(), 4.0);
//! ```

use std::any::{Any, TypeId};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::entity::{Entity, RegistryId};
use crate::registry::Registry;

/// The concrete runtime type of a component: the storage key inside an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentKind {
    /// Rust type identity of the concrete component type.
    pub type_id: TypeId,
    /// Human-readable type name, for logs and errors.
    pub name: &'static str,
}

impl ComponentKind {
    /// The kind of component type `C`.
    #[must_use]
    pub fn of<C: Component>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
        }
    }
}

/// The core component trait.
///
/// Any `Send + Sync + 'static` type can be a component. Implement it with an
/// empty `impl` block, or with [`component!`] when the type should also be
/// found by polymorphic lookups.
pub trait Component: Sized + Send + Sync + 'static {
    /// Returns a handle to this component viewed as the type identified by
    /// `target`, if this component exposes such a view.
    ///
    /// The registry calls this during the fallback scan of
    /// [`Registry::get_component`](crate::Registry::get_component). The exact
    /// type is handled by the registry and never reaches this method.
    fn view(handle: &Handle<Self>, target: TypeId) -> Option<ErasedHandle> {
        let _ = (handle, target);
        None
    }
}

/// Declares a [`Component`] impl, optionally with trait-object views for
/// polymorphic lookup.
///
/// `component!(Health);` is a plain component. `component!(Sprite => dyn
/// Drawable, dyn Named);` additionally lets `get_component::<dyn Drawable>()`
/// find a `Sprite`. Every listed trait must be implemented by the type.
#[macro_export]
macro_rules! component {
    ($ty:ty => $($view:ty),+ $(,)?) => {
        impl $crate::Component for $ty {
            fn view(
                handle: &$crate::Handle<Self>,
                target: ::std::any::TypeId,
            ) -> ::core::option::Option<$crate::ErasedHandle> {
                $(
                    if target == ::std::any::TypeId::of::<$view>() {
                        let view: $crate::Handle<$view> = handle.clone().coerce(|slot| {
                            let slot: ::std::sync::Arc<$crate::Slot<$view>> = slot;
                            slot
                        });
                        return ::core::option::Option::Some($crate::ErasedHandle::new(view));
                    }
                )+
                ::core::option::Option::None
            }
        }
    };
    ($ty:ty) => {
        impl $crate::Component for $ty {}
    };
}

/// Which registry and entity currently hold a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Owner {
    pub registry: RegistryId,
    pub entity: Entity,
}

/// Shared storage cell behind a [`Handle`].
///
/// The value is the last field so a `Slot<C>` unsizes to `Slot<dyn Trait>`.
pub struct Slot<C: ?Sized> {
    kind: ComponentKind,
    owner: Mutex<Option<Owner>>,
    value: RwLock<C>,
}

/// A shared handle to a component value.
///
/// `C` is either a concrete [`Component`] or a trait object the component
/// exposes through [`component!`].
pub struct Handle<C: ?Sized> {
    slot: Arc<Slot<C>>,
}

impl<C: Component> Handle<C> {
    /// Wraps a freshly constructed component. It has no owner until attached.
    #[must_use]
    pub fn new(value: C) -> Self {
        Self {
            slot: Arc::new(Slot {
                kind: ComponentKind::of::<C>(),
                owner: Mutex::new(None),
                value: RwLock::new(value),
            }),
        }
    }

    pub(crate) fn erase(&self) -> Arc<dyn ErasedSlot> {
        let slot: Arc<dyn ErasedSlot> = self.slot.clone();
        slot
    }
}

impl<C: ?Sized> Handle<C> {
    /// Locks the component for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, C> {
        self.slot.value.read()
    }

    /// Locks the component for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, C> {
        self.slot.value.write()
    }

    /// The entity currently holding this component, if any.
    ///
    /// Entity ids restart in every registry; use [`Handle::owner_in`] when
    /// more than one registry is alive.
    #[must_use]
    pub fn owner(&self) -> Option<Entity> {
        self.slot.owner.lock().map(|owner| owner.entity)
    }

    /// The registry this component is attached in, if any.
    #[must_use]
    pub fn owner_registry(&self) -> Option<RegistryId> {
        self.slot.owner.lock().map(|owner| owner.registry)
    }

    /// The entity holding this component, if it is attached in `registry`.
    #[must_use]
    pub fn owner_in(&self, registry: &Registry) -> Option<Entity> {
        self.slot
            .owner
            .lock()
            .filter(|owner| owner.registry == registry.id())
            .map(|owner| owner.entity)
    }

    /// The concrete type this component is stored under.
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        self.slot.kind
    }

    /// Returns `true` if both handles refer to the same component instance,
    /// regardless of the type they view it as.
    #[must_use]
    pub fn ptr_eq<U: ?Sized>(&self, other: &Handle<U>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.slot), Arc::as_ptr(&other.slot))
    }

    /// Re-types the handle through an unsizing coercion of its slot.
    ///
    /// Used by [`component!`] to build trait-object views.
    pub fn coerce<U: ?Sized>(self, f: impl FnOnce(Arc<Slot<C>>) -> Arc<Slot<U>>) -> Handle<U> {
        Handle { slot: f(self.slot) }
    }

    pub(crate) fn owner_cell(&self) -> &Mutex<Option<Owner>> {
        &self.slot.owner
    }

    pub(crate) fn addr(&self) -> *const () {
        Arc::as_ptr(&self.slot) as *const ()
    }
}

impl<C: ?Sized> Clone for Handle<C> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<C: ?Sized> std::fmt::Debug for Handle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &self.slot.kind.name)
            .field("owner", &self.owner())
            .finish()
    }
}

/// A type-erased [`Handle`], produced by views and unpacked by the registry.
pub struct ErasedHandle(Box<dyn Any>);

impl ErasedHandle {
    /// Erases a handle of any view type.
    #[must_use]
    pub fn new<T: ?Sized + 'static>(handle: Handle<T>) -> Self {
        Self(Box::new(handle))
    }

    /// Recovers the handle if it was erased from a `Handle<T>`.
    #[must_use]
    pub fn downcast<T: ?Sized + 'static>(self) -> Option<Handle<T>> {
        self.0.downcast::<Handle<T>>().ok().map(|handle| *handle)
    }
}

/// Object-safe face of a `Slot<C>` used by entity storage.
pub(crate) trait ErasedSlot: Send + Sync {
    fn kind(&self) -> ComponentKind;

    fn owner_cell(&self) -> &Mutex<Option<Owner>>;

    /// Handle to the component as the `target` type: the concrete type
    /// itself, or any view its [`Component::view`] exposes.
    fn view(self: Arc<Self>, target: TypeId) -> Option<ErasedHandle>;
}

impl<C: Component> ErasedSlot for Slot<C> {
    fn kind(&self) -> ComponentKind {
        self.kind
    }

    fn owner_cell(&self) -> &Mutex<Option<Owner>> {
        &self.owner
    }

    fn view(self: Arc<Self>, target: TypeId) -> Option<ErasedHandle> {
        let handle = Handle { slot: self };
        if target == TypeId::of::<C>() {
            return Some(ErasedHandle::new(handle));
        }
        C::view(&handle, target)
    }
}

/// A component of unknown type, as returned by
/// [`Registry::get_components`](crate::Registry::get_components).
#[derive(Clone)]
pub struct AnyComponent {
    slot: Arc<dyn ErasedSlot>,
}

impl AnyComponent {
    pub(crate) fn new(slot: Arc<dyn ErasedSlot>) -> Self {
        Self { slot }
    }

    /// The concrete type of the component.
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        self.slot.kind()
    }

    /// The entity currently holding this component, if any.
    #[must_use]
    pub fn owner(&self) -> Option<Entity> {
        self.slot.owner_cell().lock().map(|owner| owner.entity)
    }

    /// Typed handle to the component, as its concrete type or one of its views.
    #[must_use]
    pub fn downcast<T: ?Sized + 'static>(&self) -> Option<Handle<T>> {
        Arc::clone(&self.slot)
            .view(TypeId::of::<T>())
            .and_then(ErasedHandle::downcast::<T>)
    }

    /// Returns `true` if this is the component behind `handle`.
    #[must_use]
    pub fn is<U: ?Sized>(&self, handle: &Handle<U>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.slot), handle.addr())
    }
}

impl std::fmt::Debug for AnyComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyComponent")
            .field("kind", &self.kind().name)
            .field("owner", &self.owner())
            .finish()
    }
}
