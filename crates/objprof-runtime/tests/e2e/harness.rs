//! Test harness for end-to-end sizing
//!
//! A [`World`] is a heap with the standard library installed and a
//! profiler with a private metadata cache, so tests never share cache
//! state through the global profiler.

use std::sync::Arc;

pub use objprof_engine::{
    FlyweightRegistry, MetadataCache, ObjectProfiler, PrimitiveKind, ProfilerConfig, SizeProfile,
    SizeofError, TraversalOrder, WorkaroundTable, SIZEOF_FAILED,
};
pub use objprof_runtime::{
    Class, ClassBuilder, ClassKind, Heap, ObjRef, ReflectPolicy, StandardLibrary, Value,
};

/// Heap, built-in classes and a profiler that knows the heap's constants
pub struct World {
    pub heap: Heap,
    pub lib: StandardLibrary,
    pub profiler: ObjectProfiler,
}

impl World {
    /// Narrow profile, standard tables
    pub fn new() -> Self {
        Self::with_profiler(ObjectProfiler::new())
    }

    /// Standard tables sized for `profile`
    pub fn with_profile(profile: SizeProfile) -> Self {
        Self::with_profiler(ObjectProfiler::with_profile(profile))
    }

    /// Use `profiler`'s settings with a fresh private cache
    pub fn with_profiler(profiler: ObjectProfiler) -> Self {
        let (heap, lib) = Heap::with_standard_library().expect("standard library");
        let profiler = profiler.with_cache(Arc::new(MetadataCache::new()));
        heap.register_shared_constants(profiler.flyweights());
        Self { heap, lib, profiler }
    }

    /// Define a class on the heap
    pub fn define(&self, builder: ClassBuilder) -> Arc<Class> {
        self.heap.define_class(builder).expect("define class")
    }

    /// Allocate an instance
    pub fn alloc(&mut self, class: &Arc<Class>) -> ObjRef {
        self.heap.new_instance(class).expect("allocate")
    }

    /// Point `field` of `obj` at `target`
    pub fn link(&mut self, obj: ObjRef, field: &str, target: ObjRef) {
        self.heap
            .set_field(obj, field, Value::Ref(target))
            .expect("set field");
    }

    /// Named heap constant
    pub fn constant(&self, name: &str) -> ObjRef {
        self.heap.constant(name).expect("constant")
    }

    /// `ArrayList` holding `elements`
    pub fn list_of(&mut self, elements: &[ObjRef]) -> ObjRef {
        let list = self.lib.new_array_list(&mut self.heap, 0).expect("list");
        for element in elements {
            self.lib
                .list_add(&mut self.heap, list, Value::Ref(*element))
                .expect("list add");
        }
        list
    }

    /// Sentinel-style size of `obj`
    pub fn sizeof(&self, obj: ObjRef) -> i64 {
        self.profiler.sizeof(&self.heap, Some(&obj))
    }

    /// Result-style size of `obj`
    pub fn try_sizeof(&self, obj: ObjRef) -> Result<u64, SizeofError> {
        self.profiler.try_sizeof(&self.heap, Some(&obj))
    }

    /// Sentinel-style delta of `obj` over `base`
    pub fn sizedelta(&self, base: ObjRef, obj: ObjRef) -> i64 {
        self.profiler
            .sizedelta(&self.heap, Some(&base), Some(&obj))
            .expect("base is present")
    }
}

/// Assert the size of `obj`
pub fn expect_size(world: &World, obj: ObjRef, expected: i64) {
    let actual = world.sizeof(obj);
    assert_eq!(
        actual, expected,
        "sizeof({}) of class {}",
        obj,
        world.heap.class_of(obj).map(|c| c.name().to_string()).unwrap_or_default()
    );
}
