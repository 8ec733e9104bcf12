//! Concurrent sizing against one heap and one shared metadata cache

use std::sync::Arc;
use std::thread;

use super::harness::*;

const THREADS: usize = 8;

#[test]
fn test_concurrent_calls_agree() {
    let mut world = World::new();
    let items: Vec<ObjRef> = (0..50)
        .map(|i| world.lib.new_date(&mut world.heap, i).unwrap())
        .collect();
    let list = world.list_of(&items);
    let expected = world.sizeof(list);
    assert!(expected > 0);

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..20 {
                    assert_eq!(world.sizeof(list), expected);
                }
            });
        }
    });
}

#[test]
fn test_concurrent_population_of_a_cold_cache() {
    let mut world = World::new();
    let object = world.lib.object.clone();
    let classes: Vec<Arc<Class>> = (0..32)
        .map(|i| {
            world.define(
                ClassBuilder::new(format!("Type{}", i))
                    .extends(&object)
                    .primitive("value", PrimitiveKind::Int)
                    .reference("next"),
            )
        })
        .collect();
    let instances: Vec<ObjRef> = classes.iter().map(|c| world.alloc(c)).collect();
    assert!(world.profiler.cache().is_empty());

    thread::scope(|s| {
        for t in 0..THREADS {
            let world = &world;
            let instances = &instances;
            s.spawn(move || {
                for i in 0..instances.len() {
                    let obj = instances[(i + t) % instances.len()];
                    assert_eq!(world.sizeof(obj), 16);
                }
            });
        }
    });

    // one entry per class plus Object
    assert_eq!(world.profiler.cache().len(), 33);
}

#[test]
fn test_concurrent_deltas() {
    let mut world = World::new();
    let shared = world.lib.new_date(&mut world.heap, 0).unwrap();
    let bases: Vec<ObjRef> = (0..THREADS)
        .map(|i| {
            let own = world.lib.new_integer(&mut world.heap, i as i32).unwrap();
            world.list_of(&[shared, own])
        })
        .collect();
    let candidate = world.list_of(&[shared]);

    thread::scope(|s| {
        for base in &bases {
            let world = &world;
            s.spawn(move || {
                assert_eq!(world.sizedelta(*base, candidate), 20 + 56);
            });
        }
    });
}

#[test]
fn test_flyweights_extended_while_sizing() {
    let mut world = World::new();
    let date = world.lib.new_date(&mut world.heap, 0).unwrap();
    let list = world.list_of(&[date]);

    thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..100 {
                let size = world.sizeof(list);
                assert!(size == 96 || size == 76, "unexpected size {}", size);
            }
        });
        s.spawn(|| {
            world.profiler.flyweights().register_instance(date.object_id());
        });
    });
    expect_size(&world, list, 76);
}
