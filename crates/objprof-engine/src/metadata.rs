//! Type metadata cache
//!
//! Describing a type (enumerating its fields, checking access, walking the
//! supertype chain) is far more expensive than sizing one instance, so the
//! result is computed once per distinct type and memoized.
//!
//! The cache is process-wide ([`MetadataCache::global`]) and shared by
//! every concurrent traversal. Entries are keyed by the address of the
//! type's `Arc` allocation together with the [`SizeProfile`] used, and
//! hold only a `Weak` anchor: a type that is unloaded elsewhere is not
//! kept alive by the cache. Dead entries are swept on insert once the
//! cache has doubled in size since the last sweep, or on [`MetadataCache::prune`].
//! Because the anchor keeps the allocation itself reserved, an address can
//! never be reused by another type while its entry exists.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{SizeofError, SizeofResult};
use crate::introspect::{type_address, FieldKind, FieldRef, Introspector, RuntimeType, TypeRef};
use crate::profile::SizeProfile;

/// Hierarchies deeper than this are treated as unresolvable
const MAX_HIERARCHY_DEPTH: usize = 4096;

/// Entry count below which inserts never sweep
const MIN_SWEEP_LEN: usize = 64;

/// Layout summary of a type, inclusive of all supertypes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMetadata {
    primitive_field_count: usize,
    primitive_bytes: u64,
    shell_size: u64,
    reference_fields: Arc<[FieldRef]>,
}

impl TypeMetadata {
    /// Metadata of the implicit root above every hierarchy
    fn root(profile: &SizeProfile) -> Self {
        Self {
            primitive_field_count: 0,
            primitive_bytes: 0,
            shell_size: profile.object_header,
            reference_fields: Arc::from(Vec::new()),
        }
    }

    /// Number of primitive instance fields
    pub fn primitive_field_count(&self) -> usize {
        self.primitive_field_count
    }

    /// Bytes taken by primitive instance fields
    pub fn primitive_bytes(&self) -> u64 {
        self.primitive_bytes
    }

    /// Shallow size of one instance
    pub fn shell_size(&self) -> u64 {
        self.shell_size
    }

    /// Reference-typed instance fields, supertype fields last
    pub fn reference_fields(&self) -> &[FieldRef] {
        &self.reference_fields
    }
}

struct CacheEntry {
    anchor: Weak<dyn RuntimeType>,
    metadata: Arc<TypeMetadata>,
}

type CacheKey = (usize, SizeProfile);

static GLOBAL_CACHE: Lazy<Arc<MetadataCache>> = Lazy::new(|| Arc::new(MetadataCache::new()));

/// Cache hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to describe the type
    pub misses: u64,
    /// Entries dropped because their type was unloaded
    pub pruned: u64,
}

/// Concurrent memo of [`TypeMetadata`] per type and profile
#[derive(Default)]
pub struct MetadataCache {
    entries: RwLock<FxHashMap<CacheKey, CacheEntry>>,
    sweep_at: AtomicUsize,
    hits: AtomicU64,
    misses: AtomicU64,
    pruned: AtomicU64,
}

impl MetadataCache {
    /// Create an empty, private cache
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache
    pub fn global() -> Arc<MetadataCache> {
        Arc::clone(&GLOBAL_CACHE)
    }

    /// Cached metadata for `ty`, without computing it
    pub fn get(&self, ty: &TypeRef, profile: &SizeProfile) -> Option<Arc<TypeMetadata>> {
        let entries = self.entries.read();
        entries
            .get(&(type_address(ty), *profile))
            .filter(|entry| entry.anchor.strong_count() > 0)
            .map(|entry| Arc::clone(&entry.metadata))
    }

    /// Metadata for `ty`, describing the type on first use
    ///
    /// Two threads missing on the same type may both describe it; the
    /// results are identical and the first stored entry wins.
    pub fn metadata_of<I: Introspector>(
        &self,
        introspector: &I,
        ty: &TypeRef,
        profile: &SizeProfile,
    ) -> SizeofResult<Arc<TypeMetadata>> {
        self.resolve(introspector, ty, profile, 0)
    }

    fn resolve<I: Introspector>(
        &self,
        introspector: &I,
        ty: &TypeRef,
        profile: &SizeProfile,
        depth: usize,
    ) -> SizeofResult<Arc<TypeMetadata>> {
        if let Some(found) = self.get(ty, profile) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(found);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        if depth > MAX_HIERARCHY_DEPTH {
            return Err(SizeofError::TypeResolution(
                crate::IntrospectionError::Other(format!(
                    "type hierarchy of {} exceeds {} levels",
                    ty.name(),
                    MAX_HIERARCHY_DEPTH
                )),
            ));
        }

        let declared = ty.declared_fields().map_err(|source| SizeofError::DeclaredFields {
            type_name: ty.name().to_string(),
            source,
        })?;

        let mut primitive_field_count = 0;
        let mut primitive_bytes = 0;
        let mut shell_size = profile.object_header;
        let mut reference_fields = Vec::new();

        for field in declared.into_iter().filter(|f| !f.is_static()) {
            match field.kind() {
                FieldKind::Primitive(kind) => {
                    // alignment ignored
                    let size = kind.size_in(profile);
                    primitive_bytes += size;
                    shell_size += size;
                    primitive_field_count += 1;
                }
                FieldKind::Reference => {
                    introspector.make_accessible(&field).map_err(|source| {
                        SizeofError::Inaccessible {
                            type_name: field.declaring_type().to_string(),
                            field: field.name().to_string(),
                            source,
                        }
                    })?;
                    shell_size += profile.reference;
                    reference_fields.push(field);
                }
            }
        }

        let parent = ty.supertype().map_err(SizeofError::TypeResolution)?;
        let parent = match parent {
            Some(parent) => self.resolve(introspector, &parent, profile, depth + 1)?,
            None => Arc::new(TypeMetadata::root(profile)),
        };
        primitive_field_count += parent.primitive_field_count;
        primitive_bytes += parent.primitive_bytes;
        shell_size += parent.shell_size - profile.object_header;
        reference_fields.extend(parent.reference_fields.iter().cloned());

        let metadata = Arc::new(TypeMetadata {
            primitive_field_count,
            primitive_bytes,
            shell_size,
            reference_fields: Arc::from(reference_fields),
        });
        log::trace!(
            "described type {}: shell {} bytes, {} reference fields",
            ty.name(),
            metadata.shell_size,
            metadata.reference_fields.len()
        );
        Ok(self.insert(ty, profile, metadata))
    }

    fn insert(
        &self,
        ty: &TypeRef,
        profile: &SizeProfile,
        metadata: Arc<TypeMetadata>,
    ) -> Arc<TypeMetadata> {
        let mut entries = self.entries.write();
        if entries.len() >= self.sweep_at.load(Ordering::Relaxed) {
            self.sweep(&mut entries);
        }

        let entry = entries
            .entry((type_address(ty), *profile))
            .or_insert_with(|| CacheEntry {
                anchor: Arc::downgrade(ty),
                metadata,
            });
        Arc::clone(&entry.metadata)
    }

    /// Drop entries whose type has been unloaded
    ///
    /// Returns the number of entries removed.
    pub fn prune(&self) -> usize {
        let mut entries = self.entries.write();
        self.sweep(&mut entries)
    }

    /// Drop dead entries and schedule the next sweep; caller holds the write lock
    fn sweep(&self, entries: &mut FxHashMap<CacheKey, CacheEntry>) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| entry.anchor.strong_count() > 0);
        let dropped = before - entries.len();
        self.sweep_at
            .store((entries.len() * 2).max(MIN_SWEEP_LEN), Ordering::Relaxed);
        if dropped > 0 {
            self.pruned.fetch_add(dropped as u64, Ordering::Relaxed);
            log::debug!("pruned {} metadata entries of unloaded types", dropped);
        }
        dropped
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of entries, live or not yet pruned
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            pruned: self.pruned.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCache")
            .field("entries", &self.len())
            .field("stats", &self.stats())
            .finish()
    }
}
