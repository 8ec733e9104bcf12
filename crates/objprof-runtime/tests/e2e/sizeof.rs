//! Reference sizes of built-in and user-defined classes

use super::harness::*;
use objprof_engine::FieldKind;

// ============================================================================
// 1. Built-in layouts (narrow profile)
// ============================================================================

#[test]
fn test_plain_object() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let obj = world.alloc(&object);
    expect_size(&world, obj, 8);
}

#[test]
fn test_date() {
    let mut world = World::new();
    let date = world.lib.new_date(&mut world.heap, 1_234_567_890).unwrap();
    expect_size(&world, date, 20);
}

#[test]
fn test_empty_string() {
    let mut world = World::new();
    let s = world.heap.new_string("").unwrap();
    // 24 shell + 16 char[0]
    expect_size(&world, s, 40);
}

#[test]
fn test_string_counts_its_chars() {
    let mut world = World::new();
    let s = world.heap.new_string("hello").unwrap();
    expect_size(&world, s, 24 + 16 + 10);
}

#[test]
fn test_reference_arrays() {
    let mut world = World::new();
    let array_class = world.lib.object_array.clone();
    let empty = world.heap.new_array(&array_class, 0).unwrap();
    let ten = world.heap.new_array(&array_class, 10).unwrap();
    expect_size(&world, empty, 16);
    expect_size(&world, ten, 56);
}

#[test]
fn test_primitive_arrays() {
    let mut world = World::new();
    let longs = world.heap.new_primitive_array(PrimitiveKind::Long, 4).unwrap();
    let bytes = world.heap.new_primitive_array(PrimitiveKind::Byte, 3).unwrap();
    expect_size(&world, longs, 16 + 32);
    expect_size(&world, bytes, 16 + 3);
}

#[test]
fn test_boxed_values() {
    let mut world = World::new();
    let i = world.lib.new_integer(&mut world.heap, 42).unwrap();
    let l = world.lib.new_long(&mut world.heap, 42).unwrap();
    let b = world.lib.new_boolean(&mut world.heap, true).unwrap();
    expect_size(&world, i, 12);
    expect_size(&world, l, 16);
    expect_size(&world, b, 9);
}

#[test]
fn test_array_list_with_elements() {
    let mut world = World::new();
    let items: Vec<ObjRef> = (0..3)
        .map(|i| world.lib.new_integer(&mut world.heap, i).unwrap())
        .collect();
    let list = world.list_of(&items);
    // 20 list + 56 Object[10] + 3 * 12
    expect_size(&world, list, 20 + 56 + 36);
}

// ============================================================================
// 2. Shared instances
// ============================================================================

#[test]
fn test_absent_is_zero() {
    let world = World::new();
    assert_eq!(world.profiler.sizeof(&world.heap, None), 0);
}

#[test]
fn test_shared_constants_are_zero() {
    let world = World::new();
    for name in ["TRUE", "FALSE", "EMPTY_LIST", "EMPTY_STRING", "STDIN", "STDOUT", "STDERR"] {
        expect_size(&world, world.constant(name), 0);
    }
}

#[test]
fn test_shared_constants_are_not_charged_to_holders() {
    let mut world = World::new();
    let yes = world.constant("TRUE");
    let list = world.list_of(&[yes]);
    expect_size(&world, list, 20 + 56);
}

#[test]
fn test_class_mirror_is_zero() {
    let mut world = World::new();
    let date = world.lib.date.clone();
    let mirror = world.heap.class_object(&date).unwrap();
    expect_size(&world, mirror, 0);
}

#[test]
fn test_enum_constants_are_zero() {
    let mut world = World::new();
    let colors = world
        .lib
        .define_enum(&mut world.heap, "Color", &["RED", "GREEN", "BLUE"])
        .unwrap();
    for color in &colors {
        expect_size(&world, *color, 0);
    }

    let pixel = world.define(ClassBuilder::new("Pixel").reference("color"));
    let p = world.alloc(&pixel);
    world.link(p, "color", colors[1]);
    expect_size(&world, p, 12);
}

// ============================================================================
// 3. User-defined classes
// ============================================================================

#[test]
fn test_int_and_null_reference() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let holder = world.define(
        ClassBuilder::new("Holder")
            .extends(&object)
            .primitive("count", PrimitiveKind::Int)
            .reference("next"),
    );
    let h = world.alloc(&holder);
    expect_size(&world, h, 16);
}

#[test]
fn test_inherited_fields() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let base = world.define(
        ClassBuilder::new("Base")
            .extends(&object)
            .primitive("id", PrimitiveKind::Long)
            .private_reference("owner"),
    );
    let derived = world.define(
        ClassBuilder::new("Derived")
            .extends(&base)
            .primitive("flag", PrimitiveKind::Boolean)
            .reference("payload"),
    );
    let d = world.alloc(&derived);
    let owner = world.lib.new_date(&mut world.heap, 0).unwrap();
    world.link(d, "owner", owner);
    expect_size(&world, d, 8 + 8 + 4 + 1 + 4 + 20);
}

#[test]
fn test_static_fields_are_ignored() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let registry = world.define(
        ClassBuilder::new("Registry")
            .extends(&object)
            .static_field("INSTANCES", FieldKind::Reference)
            .static_field("COUNT", FieldKind::Primitive(PrimitiveKind::Long)),
    );
    let big = world.heap.new_primitive_array(PrimitiveKind::Byte, 4096).unwrap();
    world
        .heap
        .set_static(&registry, "INSTANCES", Value::Ref(big))
        .unwrap();
    let r = world.alloc(&registry);
    expect_size(&world, r, 8);
}

#[test]
fn test_wide_profile() {
    let mut world = World::with_profile(SizeProfile::wide());
    let object = world.lib.object.clone();
    let obj = world.alloc(&object);
    let date = world.lib.new_date(&mut world.heap, 0).unwrap();
    let array_class = world.lib.object_array.clone();
    let empty = world.heap.new_array(&array_class, 0).unwrap();
    expect_size(&world, obj, 16);
    expect_size(&world, date, 16 + 8 + 8);
    expect_size(&world, empty, 16 + 4 + 8);
}

#[test]
fn test_report_counts_objects() {
    let mut world = World::new();
    let items: Vec<ObjRef> = (0..3)
        .map(|i| world.lib.new_integer(&mut world.heap, i).unwrap())
        .collect();
    let list = world.list_of(&items);
    let report = world.profiler.report(&world.heap, Some(&list)).unwrap();
    assert_eq!(report.bytes, 112);
    assert_eq!(report.objects, 5);
}
