//! End-to-end behaviour of the registry through its public API.

use std::sync::Arc;
use std::thread;

use ecs_registry::{Handle, Registry, System, SystemHandle, component};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

trait Describe: Send + Sync {
    fn describe(&self) -> String;
}

#[derive(Debug, Default)]
struct TestComponent {
    hits: u32,
}

#[derive(Debug, Default)]
struct TestComponent2;

/// Stands in for a subclass of `TestComponent`: found through the shared view.
#[derive(Debug, Default)]
struct InheritedComponent;

impl Describe for TestComponent {
    fn describe(&self) -> String {
        format!("base with {} hits", self.hits)
    }
}

impl Describe for InheritedComponent {
    fn describe(&self) -> String {
        "inherited".to_string()
    }
}

component!(TestComponent => dyn Describe);
component!(TestComponent2);
component!(InheritedComponent => dyn Describe);

#[derive(Default)]
struct DeltaSystem {
    delta: f32,
}

impl System for DeltaSystem {
    fn update(&mut self, _registry: &Registry, delta: f32) {
        self.delta = delta;
    }
}

#[derive(Default)]
struct OtherDeltaSystem {
    delta: f32,
}

impl System for OtherDeltaSystem {
    fn update(&mut self, _registry: &Registry, delta: f32) {
        self.delta = delta;
    }
}

#[derive(Default)]
struct HitSystem;

impl System for HitSystem {
    fn update(&mut self, registry: &Registry, _delta: f32) {
        for component in registry.get_components_of::<TestComponent>() {
            component.write().hits += 1;
        }
    }
}

#[test]
fn test_identity_survives_until_removal() {
    init_tracing();
    let registry = Registry::new();
    let records: Vec<_> = (0..10).map(|_| registry.create_named("same")).collect();
    assert!(records.iter().all(|&e| registry.contains(e)));
    assert_eq!(registry.all(), records);

    assert!(registry.remove_entity(records[3]));
    assert!(!registry.contains(records[3]));
    assert_eq!(registry.len(), 9);
}

#[test]
fn test_owner_matches_storage_through_moves() {
    init_tracing();
    let registry = Registry::new();
    let a = registry.create();
    let b = registry.create();
    let c = Handle::new(TestComponent::default());

    registry.add_component(a, &c);
    registry.add_component(b, &c);

    assert_eq!(c.owner(), Some(b));
    for entity in registry.all() {
        let holds = registry
            .get_components(entity)
            .iter()
            .any(|component| component.is(&c));
        assert_eq!(holds, c.owner() == Some(entity));
    }
}

#[test]
fn test_polymorphic_lookup_through_view() {
    init_tracing();
    let registry = Registry::new();
    let e = registry.entity(registry.create());
    let inherited = Handle::new(InheritedComponent);
    e.add_component(&Handle::new(TestComponent2));
    e.add_component(&inherited);

    let found = e.get_component::<dyn Describe>().unwrap();
    assert!(found.ptr_eq(&inherited));
    assert_eq!(found.read().describe(), "inherited");
    assert!(e.get_component::<TestComponent>().is_none());
}

#[test]
fn test_system_exclusivity_and_fan_out() {
    init_tracing();
    let registry = Registry::new();
    let first = SystemHandle::new(DeltaSystem::default());
    let other = SystemHandle::new(OtherDeltaSystem::default());
    assert!(registry.add_system(&first));
    assert!(registry.add_system(&other));
    assert!(!registry.add_system(&SystemHandle::new(DeltaSystem::default())));
    assert!(registry.get_system::<DeltaSystem>().unwrap().ptr_eq(&first));

    registry.update(5.0);
    assert_eq!(first.lock().delta, 5.0);
    assert_eq!(other.lock().delta, 5.0);
}

#[test]
fn test_cardinality_over_many_entities() {
    init_tracing();
    let registry = Registry::new();
    let mut expected = 0;
    for i in 0..1000 {
        let e = registry.create();
        if i % 3 == 0 {
            registry.add_component(e, &Handle::new(TestComponent::default()));
            expected += 1;
        }
        if i % 5 == 0 {
            registry.add_component(e, &Handle::new(InheritedComponent));
        }
    }
    assert_eq!(registry.len(), 1000);
    assert_eq!(registry.get_components_of::<TestComponent>().count(), expected);

    registry.add_system(&SystemHandle::new(HitSystem));
    registry.update(1.0);
    assert!(
        registry
            .get_components_of::<TestComponent>()
            .all(|c| c.read().hits == 1)
    );
}

#[test]
fn test_removal_cascades() {
    init_tracing();
    let registry = Registry::new();
    let e = registry.create();
    let first = Handle::new(TestComponent::default());
    let second = Handle::new(TestComponent2);
    registry.add_component(e, &first);
    registry.add_component(e, &second);

    assert!(registry.remove_entity(e));
    assert_eq!(first.owner(), None);
    assert_eq!(second.owner(), None);
    assert!(
        registry
            .all()
            .iter()
            .all(|&other| registry.get_components(other).is_empty())
    );
}

#[test]
fn test_independent_registries() {
    init_tracing();
    let left = Registry::new();
    let right = Registry::new();
    let l = left.create();
    let r = right.create();
    assert_eq!(l, r);

    let component = Handle::new(TestComponent::default());
    assert!(left.add_component(l, &component));
    assert!(!right.add_component(r, &component));
    assert!(!right.remove_component(r, &component));
    assert_eq!(component.owner(), Some(l));
    assert_eq!(component.owner_in(&left), Some(l));
    assert_eq!(component.owner_in(&right), None);
    assert!(left.get_component::<TestComponent>(l).is_some());

    drop(left);
    assert_eq!(component.owner(), None);
    assert!(right.add_component(r, &component));
    assert_eq!(component.owner_registry(), Some(right.id()));
}

#[test]
fn test_concurrent_moves_keep_single_owner() {
    init_tracing();
    let registry = Arc::new(Registry::new());
    let entities: Vec<_> = (0..8).map(|_| registry.create()).collect();
    let component = Handle::new(TestComponent::default());

    let workers: Vec<_> = entities
        .iter()
        .map(|&entity| {
            let registry = Arc::clone(&registry);
            let component = component.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    registry.add_component(entity, &component);
                    let _ = registry.get_component::<TestComponent>(entity);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let holders: Vec<_> = entities
        .iter()
        .copied()
        .filter(|&e| registry.get_component::<TestComponent>(e).is_some())
        .collect();
    assert_eq!(holders.len(), 1);
    assert_eq!(component.owner(), Some(holders[0]));
}
