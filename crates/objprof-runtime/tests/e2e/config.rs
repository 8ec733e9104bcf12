//! Profilers built from TOML configuration files

use super::harness::*;

fn world_from(toml: &str) -> World {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("objprof.toml");
    std::fs::write(&path, toml).unwrap();
    let config = ProfilerConfig::from_file(&path).unwrap();
    World::with_profiler(config.build_profiler())
}

#[test]
fn test_wide_preset() {
    let mut world = world_from(
        r#"
        [profile]
        preset = "wide"
        "#,
    );
    let date = world.lib.new_date(&mut world.heap, 0).unwrap();
    let error = world.lib.new_throwable(&mut world.heap, "x").unwrap();
    expect_size(&world, date, 32);
    expect_size(&world, error, 48);
}

#[test]
fn test_shared_types_cover_subclasses() {
    let mut world = world_from(
        r#"
        [flyweights]
        shared_types = ["Number"]
        "#,
    );
    let n = world.lib.new_integer(&mut world.heap, 5).unwrap();
    let l = world.lib.new_long(&mut world.heap, 5).unwrap();
    let date = world.lib.new_date(&mut world.heap, 0).unwrap();
    let list = world.list_of(&[n, l, date]);
    expect_size(&world, n, 0);
    expect_size(&world, l, 0);
    expect_size(&world, list, 20 + 56 + 20);
}

#[test]
fn test_configured_workaround() {
    let mut world = world_from(
        r#"
        [workarounds]
        Socket = 40
        "#,
    );
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
fn test_breadth_first_configuration() {
    let mut world = world_from("traversal = \"breadth-first\"\n");
    assert_eq!(world.profiler.order(), TraversalOrder::BreadthFirst);
    let items: Vec<ObjRef> = (0..4)
        .map(|i| world.lib.new_integer(&mut world.heap, i).unwrap())
        .collect();
    let list = world.list_of(&items);
    expect_size(&world, list, 20 + 56 + 48);
}

#[test]
fn test_malformed_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("objprof.toml");
    std::fs::write(&path, "[profile\nreference = 8\n").unwrap();
    assert!(ProfilerConfig::from_file(&path).is_err());
}
