//! Graph traversal
//!
//! Sizes the graph reachable from a root with an explicit work queue (no
//! recursion, so deep chains cannot exhaust the stack). Every instance is
//! charged once, keyed by identity:
//!
//! ```text
//! root ─► mark visited ─► queue
//!           │
//!           ▼
//!   pop node ─┬─ workaround type?  charge fixed size, stop here
//!             ├─ array?            charge array shell, enqueue reference slots
//!             └─ instance          charge shell size, enqueue reference fields
//! ```
//!
//! A referent is enqueued only if it is non-null, not yet visited and not a
//! shared flyweight. Any introspection failure aborts the traversal.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::error::{SizeofError, SizeofResult};
use crate::flyweight::FlyweightRegistry;
use crate::introspect::{Introspector, ObjectId};
use crate::metadata::MetadataCache;
use crate::profile::SizeProfile;
use crate::workaround::WorkaroundTable;

/// Work queue discipline
///
/// The total does not depend on the order; only the peak queue length does.
/// Depth-first keeps the queue short for chain-like graphs, breadth-first
/// for wide and shallow ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraversalOrder {
    /// Process the most recently discovered instance first
    #[default]
    DepthFirst,
    /// Process instances in discovery order
    BreadthFirst,
}

/// Identity-keyed set of instances already charged or enqueued
///
/// Created per top-level call and never shared between calls.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    ids: FxHashSet<ObjectId>,
}

impl VisitedSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set with room for `capacity` identities
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: FxHashSet::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Mark an identity; returns false if it was already present
    #[inline]
    pub fn insert(&mut self, id: ObjectId) -> bool {
        self.ids.insert(id)
    }

    /// Check an identity
    #[inline]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.ids.contains(&id)
    }

    /// Number of identities
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate over identities in no particular order
    pub fn iter(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.ids.iter().copied()
    }
}

/// Outcome of one traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalReport {
    /// Bytes charged
    pub bytes: u64,
    /// Instances charged
    pub objects: usize,
    /// Largest work-queue length reached
    pub peak_queue: usize,
}

/// Borrowed view of everything a traversal needs
pub struct Traversal<'a, I: Introspector> {
    introspector: &'a I,
    profile: &'a SizeProfile,
    flyweights: &'a FlyweightRegistry,
    workarounds: &'a WorkaroundTable,
    cache: &'a MetadataCache,
    order: TraversalOrder,
}

impl<'a, I: Introspector> Traversal<'a, I> {
    /// Bind a traversal to its collaborators
    pub fn new(
        introspector: &'a I,
        profile: &'a SizeProfile,
        flyweights: &'a FlyweightRegistry,
        workarounds: &'a WorkaroundTable,
        cache: &'a MetadataCache,
    ) -> Self {
        Self {
            introspector,
            profile,
            flyweights,
            workarounds,
            cache,
            order: TraversalOrder::default(),
        }
    }

    /// Select the work queue discipline
    pub fn with_order(mut self, order: TraversalOrder) -> Self {
        self.order = order;
        self
    }

    /// Size everything reachable from `root` that is not yet in `visited`
    ///
    /// An absent or flyweight root charges nothing and leaves `visited`
    /// untouched. On success `visited` additionally holds every instance
    /// charged by this call.
    pub fn run(&self, root: Option<&I::Ref>, visited: &mut VisitedSet) -> SizeofResult<TraversalReport> {
        let mut report = TraversalReport::default();

        let Some(root) = root else {
            return Ok(report);
        };
        if self.flyweights.is_flyweight(self.introspector, Some(root)) {
            return Ok(report);
        }
        if !visited.insert(self.introspector.identity(root)) {
            return Ok(report);
        }

        let mut queue = VecDeque::new();
        queue.push_back(root.clone());
        report.peak_queue = 1;

        while let Some(node) = queue.pop_front() {
            report.bytes += self.charge(&node, visited, &mut queue)?;
            report.objects += 1;
            report.peak_queue = report.peak_queue.max(queue.len());
        }

        Ok(report)
    }

    /// Charge one node and enqueue its unvisited referents
    fn charge(
        &self,
        node: &I::Ref,
        visited: &mut VisitedSet,
        queue: &mut VecDeque<I::Ref>,
    ) -> SizeofResult<u64> {
        let ty = self
            .introspector
            .runtime_type(node)
            .map_err(SizeofError::TypeResolution)?;

        if let Some(fixed) = self.workarounds.known_fixed_size(ty.name()) {
            return Ok(fixed);
        }

        if let Some(element) = ty.array_element() {
            let length = self
                .introspector
                .array_len(node)
                .map_err(|source| SizeofError::ArrayLength {
                    type_name: ty.name().to_string(),
                    source,
                })?;

            if element.primitive().is_none() {
                for index in 0..length {
                    let slot = self.introspector.read_element(node, index).map_err(|source| {
                        SizeofError::ElementRead {
                            type_name: ty.name().to_string(),
                            index,
                            source,
                        }
                    })?;
                    self.enqueue(slot, visited, queue);
                }
            }
            return Ok(self.profile.array_shell(length, element.primitive()));
        }

        let metadata = self.cache.metadata_of(self.introspector, &ty, self.profile)?;
        for field in metadata.reference_fields() {
            let referent = self.introspector.read_field(node, field).map_err(|source| {
                SizeofError::FieldRead {
                    type_name: field.declaring_type().to_string(),
                    field: field.name().to_string(),
                    source,
                }
            })?;
            self.enqueue(referent, visited, queue);
        }
        Ok(metadata.shell_size())
    }

    #[inline]
    fn enqueue(&self, referent: Option<I::Ref>, visited: &mut VisitedSet, queue: &mut VecDeque<I::Ref>) {
        let Some(referent) = referent else {
            return;
        };
        let id = self.introspector.identity(&referent);
        if visited.contains(id) || self.flyweights.is_flyweight(self.introspector, Some(&referent)) {
            return;
        }
        visited.insert(id);
        match self.order {
            TraversalOrder::DepthFirst => queue.push_front(referent),
            TraversalOrder::BreadthFirst => queue.push_back(referent),
        }
    }
}
