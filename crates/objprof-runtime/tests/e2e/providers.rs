//! Size estimation through registered providers

use std::sync::Arc;

use objprof_engine::{ObjectProfilerProvider, ProviderRegistry, SizeOfProvider};

use super::harness::*;

/// Estimates strings from their length alone
struct StringProvider;

impl SizeOfProvider<Heap> for StringProvider {
    fn name(&self) -> &str {
        "string-estimate"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn sizeof(&self, heap: &Heap, obj: Option<&ObjRef>) -> i64 {
        let Some(obj) = obj else {
            return -1;
        };
        match heap.class_of(*obj) {
            Ok(class) if class.name() == "String" => match heap.get_field(*obj, "count") {
                Ok(Value::Int(count)) => 24 + 16 + 2 * i64::from(count),
                _ => -1,
            },
            _ => -1,
        }
    }
}

fn registry(world: &World) -> ProviderRegistry<Heap> {
    let mut registry = ProviderRegistry::<Heap>::new();
    registry.register(Arc::new(ObjectProfilerProvider::with_profiler(Arc::new(
        world.profiler.clone(),
    ))));
    registry.register(Arc::new(StringProvider));
    registry
}

#[test]
fn test_query_order() {
    let world = World::new();
    assert_eq!(registry(&world).names(), vec!["string-estimate", "object-profiler"]);
}

#[test]
fn test_specialised_provider_answers_first() {
    let mut world = World::new();
    let s = world.heap.new_string("four").unwrap();
    assert_eq!(registry(&world).sizeof(&world.heap, Some(&s)), 48);
}

#[test]
fn test_engine_answers_the_rest() {
    let mut world = World::new();
    let date = world.lib.new_date(&mut world.heap, 0).unwrap();
    assert_eq!(registry(&world).sizeof(&world.heap, Some(&date)), 20);
}

#[test]
fn test_all_providers_failing_is_sentinel() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let sealed = world.define(
        ClassBuilder::new("Sealed")
            .extends(&object)
            .policy(ReflectPolicy::Opaque),
    );
    let s = world.alloc(&sealed);
    assert_eq!(registry(&world).sizeof(&world.heap, Some(&s)), SIZEOF_FAILED);
}

#[test]
fn test_default_registry() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let o = world.alloc(&object);
    let registry = ProviderRegistry::<Heap>::with_default_provider();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.sizeof(&world.heap, Some(&o)), 8);
}
