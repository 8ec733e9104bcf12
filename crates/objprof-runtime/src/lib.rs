//! Objprof reference runtime
//!
//! A small managed runtime whose heap can be measured by `objprof-engine`:
//! - **Classes**: single inheritance, primitive and reference fields, statics (`class`)
//! - **Heap**: instances, arrays, strings, class mirrors and named constants (`heap`)
//! - **Introspection**: per-class reflective access policies (`introspect`)
//! - **Standard library**: built-in classes with classic layouts (`stdlib`)
//!
//! # Example
//!
//! ```rust,ignore
//! use objprof_engine::ObjectProfiler;
//! use objprof_runtime::Heap;
//!
//! let (mut heap, lib) = Heap::with_standard_library()?;
//! let date = lib.new_date(&mut heap, 0)?;
//!
//! let profiler = ObjectProfiler::new();
//! heap.register_shared_constants(profiler.flyweights());
//! assert_eq!(profiler.sizeof(&heap, Some(&date)), 20);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod class;
pub mod error;
pub mod heap;
pub mod introspect;
pub mod stdlib;
pub mod value;

pub use class::{Class, ClassBuilder, ClassId, ClassKind, ClassRegistry, ReflectPolicy};
pub use error::{HeapError, HeapResult};
pub use heap::Heap;
pub use stdlib::StandardLibrary;
pub use value::{HeapId, ObjRef, Value};
