//! Public sizing entry points
//!
//! [`ObjectProfiler`] bundles a size profile, the flyweight registry, the
//! workaround table and a metadata cache. Each call builds its own
//! [`VisitedSet`] and work queue, so one profiler can serve any number of
//! threads at once.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::error::{SizeofError, SizeofResult};
use crate::flyweight::FlyweightRegistry;
use crate::introspect::Introspector;
use crate::metadata::MetadataCache;
use crate::profile::SizeProfile;
use crate::traverse::{Traversal, TraversalOrder, TraversalReport, VisitedSet};
use crate::workaround::WorkaroundTable;

/// Returned by the sentinel APIs when a traversal could not complete
pub const SIZEOF_FAILED: i64 = -1;

static GLOBAL_PROFILER: Lazy<ObjectProfiler> = Lazy::new(ObjectProfiler::new);

/// Object-graph memory estimator
#[derive(Debug, Clone)]
pub struct ObjectProfiler {
    profile: SizeProfile,
    flyweights: Arc<FlyweightRegistry>,
    workarounds: WorkaroundTable,
    cache: Arc<MetadataCache>,
    order: TraversalOrder,
}

impl ObjectProfiler {
    /// Narrow profile, standard flyweights and workarounds, global cache
    pub fn new() -> Self {
        Self::with_profile(SizeProfile::narrow())
    }

    /// Standard tables sized for `profile`, global cache
    pub fn with_profile(profile: SizeProfile) -> Self {
        Self {
            workarounds: WorkaroundTable::standard(&profile),
            profile,
            flyweights: Arc::new(FlyweightRegistry::standard()),
            cache: MetadataCache::global(),
            order: TraversalOrder::default(),
        }
    }

    /// The process-wide default profiler
    pub fn global() -> &'static ObjectProfiler {
        &GLOBAL_PROFILER
    }

    /// Replace the flyweight registry
    pub fn with_flyweights(mut self, flyweights: Arc<FlyweightRegistry>) -> Self {
        self.flyweights = flyweights;
        self
    }

    /// Replace the workaround table
    pub fn with_workarounds(mut self, workarounds: WorkaroundTable) -> Self {
        self.workarounds = workarounds;
        self
    }

    /// Use a private metadata cache instead of the global one
    pub fn with_cache(mut self, cache: Arc<MetadataCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Select the work queue discipline
    pub fn with_order(mut self, order: TraversalOrder) -> Self {
        self.order = order;
        self
    }

    /// Size profile in use
    pub fn profile(&self) -> &SizeProfile {
        &self.profile
    }

    /// Flyweight registry; can be extended while the profiler is in use
    pub fn flyweights(&self) -> &Arc<FlyweightRegistry> {
        &self.flyweights
    }

    /// Workaround table in use
    pub fn workarounds(&self) -> &WorkaroundTable {
        &self.workarounds
    }

    /// Metadata cache in use
    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    /// Traversal order in use
    pub fn order(&self) -> TraversalOrder {
        self.order
    }

    fn traversal<'a, I: Introspector>(&'a self, introspector: &'a I) -> Traversal<'a, I> {
        Traversal::new(
            introspector,
            &self.profile,
            &self.flyweights,
            &self.workarounds,
            &self.cache,
        )
        .with_order(self.order)
    }

    /// Traverse from `obj` and return the full report
    pub fn report<I: Introspector>(
        &self,
        introspector: &I,
        obj: Option<&I::Ref>,
    ) -> SizeofResult<TraversalReport> {
        self.traversal(introspector).run(obj, &mut VisitedSet::new())
    }

    /// Bytes reachable from `obj`, or the error that stopped the traversal
    pub fn try_sizeof<I: Introspector>(&self, introspector: &I, obj: Option<&I::Ref>) -> SizeofResult<u64> {
        self.report(introspector, obj).map(|report| report.bytes)
    }

    /// Bytes reachable from `obj`
    ///
    /// Returns 0 for an absent or flyweight instance and
    /// [`SIZEOF_FAILED`] if the traversal could not complete.
    pub fn sizeof<I: Introspector>(&self, introspector: &I, obj: Option<&I::Ref>) -> i64 {
        self.try_sizeof(introspector, obj)
            .map_or(SIZEOF_FAILED, clamp)
    }

    /// Bytes reachable from `obj` but not from `base`
    ///
    /// An absent or flyweight `obj` yields 0 before `base` is looked at.
    /// An absent `base` is an [`SizeofError::InvalidArgument`].
    pub fn try_sizedelta<I: Introspector>(
        &self,
        introspector: &I,
        base: Option<&I::Ref>,
        obj: Option<&I::Ref>,
    ) -> SizeofResult<u64> {
        let Some(obj) = obj else {
            return Ok(0);
        };
        if self.flyweights.is_flyweight(introspector, Some(obj)) {
            return Ok(0);
        }
        let Some(base) = base else {
            return Err(SizeofError::InvalidArgument(
                "sizedelta requires a baseline instance".to_string(),
            ));
        };

        let traversal = self.traversal(introspector);
        let mut visited = VisitedSet::new();
        traversal.run(Some(base), &mut visited)?;
        if visited.contains(introspector.identity(obj)) {
            return Ok(0);
        }
        Ok(traversal.run(Some(obj), &mut visited)?.bytes)
    }

    /// Bytes reachable from `obj` but not from `base`
    ///
    /// Traversal failures map to `Ok(SIZEOF_FAILED)`; only an absent
    /// baseline is an error.
    pub fn sizedelta<I: Introspector>(
        &self,
        introspector: &I,
        base: Option<&I::Ref>,
        obj: Option<&I::Ref>,
    ) -> SizeofResult<i64> {
        match self.try_sizedelta(introspector, base, obj) {
            Ok(bytes) => Ok(clamp(bytes)),
            Err(err @ SizeofError::InvalidArgument(_)) => Err(err),
            Err(_) => Ok(SIZEOF_FAILED),
        }
    }
}

impl Default for ObjectProfiler {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn clamp(bytes: u64) -> i64 {
    i64::try_from(bytes).unwrap_or(i64::MAX)
}
