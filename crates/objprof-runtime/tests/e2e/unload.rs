//! Metadata cache behaviour across class unloading

use std::sync::Arc;

use super::harness::*;

#[test]
fn test_metadata_is_described_once() {
    let mut world = World::new();
    let date = world.lib.new_date(&mut world.heap, 0).unwrap();
    expect_size(&world, date, 20);
    let misses = world.profiler.cache().stats().misses;
    expect_size(&world, date, 20);
    let stats = world.profiler.cache().stats();
    assert_eq!(stats.misses, misses);
    assert!(stats.hits >= 1);
}

#[test]
fn test_instances_of_unloaded_class_fail() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let plugin = world.define(ClassBuilder::new("Plugin").extends(&object).reference("state"));
    let p = world.alloc(&plugin);
    expect_size(&world, p, 12);

    world.heap.unload_class("Plugin").unwrap();
    assert!(matches!(
        world.try_sizeof(p).unwrap_err(),
        SizeofError::TypeResolution(_)
    ));

    let holder = world.define(ClassBuilder::new("Holder").extends(&object).reference("plugin"));
    let h = world.alloc(&holder);
    world
        .heap
        .set_field(h, "plugin", Value::Ref(p))
        .unwrap();
    assert_eq!(world.sizeof(h), SIZEOF_FAILED);
}

#[test]
fn test_unloaded_class_metadata_is_pruned() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let plugin = world.define(ClassBuilder::new("Plugin").extends(&object).reference("state"));
    let p = world.alloc(&plugin);
    expect_size(&world, p, 12);

    let cache = Arc::clone(world.profiler.cache());
    let described = cache.len();
    let unloaded = world.heap.unload_class("Plugin").unwrap();
    drop(unloaded);
    drop(plugin);

    assert_eq!(cache.prune(), 1);
    assert_eq!(cache.len(), described - 1);
}

#[test]
fn test_reloaded_class_is_described_again() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let v1 = world.define(ClassBuilder::new("Plugin").extends(&object).reference("state"));
    let p1 = world.alloc(&v1);
    expect_size(&world, p1, 12);

    world.heap.unload_class("Plugin").unwrap();
    let v2 = world.define(
        ClassBuilder::new("Plugin")
            .extends(&object)
            .reference("state")
            .primitive("version", PrimitiveKind::Long),
    );
    let p2 = world.alloc(&v2);
    expect_size(&world, p2, 20);
}

fn cold_sizeof(world: &World, obj: ObjRef) -> i64 {
    world
        .profiler
        .clone()
        .with_cache(Arc::new(MetadataCache::new()))
        .sizeof(&world.heap, Some(&obj))
}

#[test]
fn test_subclass_of_unloaded_parent_sizes_the_same_cold_or_warm() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let base = world.define(ClassBuilder::new("Base").extends(&object).private_reference("owner"));
    let derived = world.define(
        ClassBuilder::new("Derived")
            .extends(&base)
            .primitive("id", PrimitiveKind::Int),
    );
    let d = world.alloc(&derived);
    expect_size(&world, d, 16);

    world.heap.unload_class("Base").unwrap();
    expect_size(&world, d, 16);
    assert_eq!(cold_sizeof(&world, d), 16);

    world.define(
        ClassBuilder::new("Base")
            .extends(&object)
            .policy(ReflectPolicy::PublicOnly)
            .private_reference("owner"),
    );
    expect_size(&world, d, 16);
    assert_eq!(cold_sizeof(&world, d), 16);
}
