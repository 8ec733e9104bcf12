//! Fixed sizes for types that must not be introspected

use super::harness::*;

#[test]
fn test_throwable_has_fixed_size() {
    let mut world = World::new();
    let error = world.lib.new_throwable(&mut world.heap, "boom").unwrap();
    // the class is opaque; the fixed size is used instead
    assert_eq!(world.try_sizeof(error).unwrap(), 24);
}

#[test]
fn test_throwable_fixed_size_follows_profile() {
    let mut world = World::with_profile(SizeProfile::wide());
    let error = world.lib.new_throwable(&mut world.heap, "boom").unwrap();
    expect_size(&world, error, 16 + 4 * 8);
}

#[test]
fn test_fields_of_fixed_size_types_are_not_traversed() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let holder = world.define(ClassBuilder::new("Failure").extends(&object).reference("error"));
    let h = world.alloc(&holder);
    let error = world
        .lib
        .new_throwable(&mut world.heap, "a long message that is not counted")
        .unwrap();
    world.link(h, "error", error);
    expect_size(&world, h, 12 + 24);
}

#[test]
fn test_runtime_internal_types() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let pool = world.define(
        ClassBuilder::new("ConstantPool")
            .extends(&object)
            .policy(ReflectPolicy::Opaque),
    );
    let accessor = world.define(
        ClassBuilder::new("UnsafeStaticObjectFieldAccessorImpl")
            .extends(&object)
            .policy(ReflectPolicy::Opaque)
            .reference("field"),
    );
    let p = world.alloc(&pool);
    let a = world.alloc(&accessor);
    expect_size(&world, p, 16);
    expect_size(&world, a, 8);
}

#[test]
fn test_custom_entry() {
    let socket_table = WorkaroundTable::standard(&SizeProfile::narrow()).with("Socket", 40);
    let mut world = World::with_profiler(ObjectProfiler::new().with_workarounds(socket_table));
    let object = world.lib.object.clone();
    let socket = world.define(
        ClassBuilder::new("Socket")
            .extends(&object)
            .policy(ReflectPolicy::Opaque),
    );
    let s = world.alloc(&socket);
    expect_size(&world, s, 40);
}

#[test]
fn test_without_table_opaque_types_fail() {
    let mut world = World::with_profiler(ObjectProfiler::new().with_workarounds(WorkaroundTable::new()));
    let error = world.lib.new_throwable(&mut world.heap, "boom").unwrap();
    assert_eq!(world.sizeof(error), SIZEOF_FAILED);
}
