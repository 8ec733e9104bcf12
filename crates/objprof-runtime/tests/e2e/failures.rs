//! Introspection failures abort the whole traversal

use super::harness::*;

#[test]
fn test_private_field_of_public_only_class() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let vault = world.define(
        ClassBuilder::new("Vault")
            .extends(&object)
            .policy(ReflectPolicy::PublicOnly)
            .reference("label")
            .private_reference("secret"),
    );
    let v = world.alloc(&vault);
    assert_eq!(world.sizeof(v), SIZEOF_FAILED);
    let err = world.try_sizeof(v).unwrap_err();
    assert!(matches!(err, SizeofError::Inaccessible { ref field, .. } if field == "secret"));
}

#[test]
fn test_public_fields_of_public_only_class() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let open = world.define(
        ClassBuilder::new("Open")
            .extends(&object)
            .policy(ReflectPolicy::PublicOnly)
            .reference("label")
            .private_primitive("hidden", PrimitiveKind::Int),
    );
    let o = world.alloc(&open);
    // private primitives need no access
    expect_size(&world, o, 16);
}

#[test]
fn test_opaque_class() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let sealed = world.define(
        ClassBuilder::new("Sealed")
            .extends(&object)
            .policy(ReflectPolicy::Opaque),
    );
    let s = world.alloc(&sealed);
    assert_eq!(world.sizeof(s), SIZEOF_FAILED);
    assert!(matches!(
        world.try_sizeof(s).unwrap_err(),
        SizeofError::DeclaredFields { .. }
    ));
}

#[test]
fn test_failure_deep_in_graph_is_not_a_partial_sum() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let sealed = world.define(
        ClassBuilder::new("Sealed")
            .extends(&object)
            .policy(ReflectPolicy::Opaque),
    );
    let dates: Vec<ObjRef> = (0..5)
        .map(|i| world.lib.new_date(&mut world.heap, i).unwrap())
        .collect();
    let bad = world.alloc(&sealed);
    let mut items = dates.clone();
    items.push(bad);
    let list = world.list_of(&items);
    assert_eq!(world.sizeof(list), SIZEOF_FAILED);
}

#[test]
fn test_failure_does_not_poison_later_calls() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let sealed = world.define(
        ClassBuilder::new("Sealed")
            .extends(&object)
            .policy(ReflectPolicy::Opaque),
    );
    let bad = world.alloc(&sealed);
    let date = world.lib.new_date(&mut world.heap, 0).unwrap();
    let list = world.list_of(&[date, bad]);

    assert_eq!(world.sizeof(list), SIZEOF_FAILED);
    expect_size(&world, date, 20);
}

#[test]
fn test_subclass_of_opaque_class() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let sealed = world.define(
        ClassBuilder::new("Sealed")
            .extends(&object)
            .policy(ReflectPolicy::Opaque),
    );
    let child = world.define(ClassBuilder::new("Child").extends(&sealed).reference("x"));
    let c = world.alloc(&child);
    // describing the supertype fails
    assert!(matches!(
        world.try_sizeof(c).unwrap_err(),
        SizeofError::DeclaredFields { ref type_name, .. } if type_name == "Sealed"
    ));
}
