//! Objprof Engine
//!
//! Estimates the memory retained by an object graph of a managed runtime:
//! - **Traversal**: identity-deduplicated walk with an explicit work queue (`traverse`)
//! - **Metadata**: per-type shell size and reference fields, memoized (`metadata`)
//! - **Flyweights**: shared instances that are never charged (`flyweight`)
//! - **Workarounds**: fixed sizes for types that must not be introspected (`workaround`)
//! - **Delta**: bytes owned by one graph beyond a baseline (`profiler`)
//!
//! The runtime being measured plugs in through [`Introspector`] and
//! [`RuntimeType`].
//!
//! # Example
//!
//! ```rust,ignore
//! use objprof_engine::{sizeof, sizedelta};
//!
//! let bytes = sizeof(&heap, Some(&session));
//! let owned = sizedelta(&heap, Some(&application), Some(&session))?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod flyweight;
pub mod introspect;
pub mod metadata;
pub mod profile;
pub mod profiler;
pub mod provider;
pub mod traverse;
pub mod workaround;


pub use config::ProfilerConfig;
pub use error::{ConfigError, IntrospectionError, SizeofError, SizeofResult};
pub use flyweight::{FlyweightRegistry, STANDARD_SHARED_TYPES};
pub use introspect::{
    is_subtype_of, ElementKind, FieldKind, FieldRef, Introspector, ObjectId, RuntimeType,
    TypeCategory, TypeRef, Visibility,
};
pub use metadata::{CacheStats, MetadataCache, TypeMetadata};
pub use profile::{PrimitiveKind, SizeProfile};
pub use profiler::{ObjectProfiler, SIZEOF_FAILED};
pub use provider::{ObjectProfilerProvider, ProviderRegistry, SizeOfProvider};
pub use traverse::{Traversal, TraversalOrder, TraversalReport, VisitedSet};
pub use workaround::WorkaroundTable;

/// Bytes reachable from `obj`, using the global profiler
///
/// Returns 0 for an absent or flyweight instance and [`SIZEOF_FAILED`]
/// if the traversal could not complete.
pub fn sizeof<I: Introspector>(introspector: &I, obj: Option<&I::Ref>) -> i64 {
    ObjectProfiler::global().sizeof(introspector, obj)
}

/// Bytes reachable from `obj` but not from `base`, using the global profiler
///
/// Fails with [`SizeofError::InvalidArgument`] if `base` is absent and
/// `obj` is neither absent nor a flyweight.
pub fn sizedelta<I: Introspector>(
    introspector: &I,
    base: Option<&I::Ref>,
    obj: Option<&I::Ref>,
) -> SizeofResult<i64> {
    ObjectProfiler::global().sizedelta(introspector, base, obj)
}
