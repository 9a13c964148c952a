//! # ecs_runtime
//!
//! Host loop for the entity registry. The registry itself has no notion of
//! time; [`TickLoop`] owns a [`Registry`](ecs_registry::Registry) and calls
//! its `update` once per fixed step.

pub mod tick;

pub use tick::{TickConfig, TickLoop};
