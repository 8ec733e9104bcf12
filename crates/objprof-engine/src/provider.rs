//! Size-estimation providers
//!
//! Several sizing strategies can coexist behind [`SizeOfProvider`]. A
//! [`ProviderRegistry`] asks them in descending priority order and keeps the
//! first non-negative answer.

use std::sync::Arc;

use crate::introspect::Introspector;
use crate::profiler::{ObjectProfiler, SIZEOF_FAILED};

/// A pluggable size estimator
pub trait SizeOfProvider<I: Introspector>: Send + Sync {
    /// Provider name, for diagnostics
    fn name(&self) -> &str;

    /// Higher priorities are asked first
    fn priority(&self) -> i32;

    /// Estimated bytes for `obj`, or a negative value if unknown
    fn sizeof(&self, introspector: &I, obj: Option<&I::Ref>) -> i64;
}

/// Exposes an [`ObjectProfiler`] as a provider at priority 0
#[derive(Debug, Clone)]
pub struct ObjectProfilerProvider {
    profiler: Arc<ObjectProfiler>,
}

impl ObjectProfilerProvider {
    /// Provider over the global profiler settings
    pub fn new() -> Self {
        Self::with_profiler(Arc::new(ObjectProfiler::global().clone()))
    }

    /// Provider over a specific profiler
    pub fn with_profiler(profiler: Arc<ObjectProfiler>) -> Self {
        Self { profiler }
    }

    /// The wrapped profiler
    pub fn profiler(&self) -> &ObjectProfiler {
        &self.profiler
    }
}

impl Default for ObjectProfilerProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Introspector> SizeOfProvider<I> for ObjectProfilerProvider {
    fn name(&self) -> &str {
        "object-profiler"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn sizeof(&self, introspector: &I, obj: Option<&I::Ref>) -> i64 {
        self.profiler.sizeof(introspector, obj)
    }
}

/// Providers ordered by descending priority
///
/// Providers of equal priority are asked in registration order.
pub struct ProviderRegistry<I: Introspector> {
    providers: Vec<Arc<dyn SizeOfProvider<I>>>,
}

impl<I: Introspector> ProviderRegistry<I> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Registry holding only an [`ObjectProfilerProvider`]
    pub fn with_default_provider() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ObjectProfilerProvider::new()));
        registry
    }

    /// Add a provider
    pub fn register(&mut self, provider: Arc<dyn SizeOfProvider<I>>) {
        let at = self
            .providers
            .partition_point(|existing| existing.priority() >= provider.priority());
        log::debug!(
            "registered size provider {} at priority {}",
            provider.name(),
            provider.priority()
        );
        self.providers.insert(at, provider);
    }

    /// Remove every provider called `name`; returns how many were removed
    pub fn unregister(&mut self, name: &str) -> usize {
        let before = self.providers.len();
        self.providers.retain(|provider| provider.name() != name);
        before - self.providers.len()
    }

    /// Provider names in query order
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|provider| provider.name()).collect()
    }

    /// Number of providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// First non-negative estimate, or [`SIZEOF_FAILED`]
    pub fn sizeof(&self, introspector: &I, obj: Option<&I::Ref>) -> i64 {
        self.providers
            .iter()
            .map(|provider| provider.sizeof(introspector, obj))
            .find(|size| *size >= 0)
            .unwrap_or(SIZEOF_FAILED)
    }
}

impl<I: Introspector> Default for ProviderRegistry<I> {
    fn default() -> Self {
        Self::new()
    }
}
