//! Bug-workaround table
//!
//! Some runtime-internal types crash or refuse introspection on certain
//! runtimes. Instances of those types are charged a fixed, pre-agreed size
//! and their fields are never traversed. This undercounts whatever they
//! reference; it is the best available estimate when describing the type
//! is unsafe.

use rustc_hash::FxHashMap;

use crate::profile::SizeProfile;

/// Static-field accessor types that fail introspection on some runtimes
const UNSAFE_STATIC_ACCESSORS: &[&str] = &[
    "UnsafeStaticFieldAccessorImpl",
    "UnsafeStaticBooleanFieldAccessorImpl",
    "UnsafeStaticByteFieldAccessorImpl",
    "UnsafeStaticShortFieldAccessorImpl",
    "UnsafeStaticIntegerFieldAccessorImpl",
    "UnsafeStaticLongFieldAccessorImpl",
    "UnsafeStaticCharacterFieldAccessorImpl",
    "UnsafeStaticFloatFieldAccessorImpl",
    "UnsafeStaticDoubleFieldAccessorImpl",
    "UnsafeStaticObjectFieldAccessorImpl",
];

/// Mapping from exact type name to fixed byte size
///
/// Immutable once handed to a profiler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkaroundTable {
    sizes: FxHashMap<String, u64>,
}

impl WorkaroundTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Known hostile types, sized in `profile` units
    pub fn standard(profile: &SizeProfile) -> Self {
        let header = profile.object_header;
        let mut table = Self::new()
            // shared anyway; nothing to gain from going further
            .with("Class", 0)
            .with("Enum", 0)
            .with("Throwable", header + 4 * profile.reference)
            .with("ConstantPool", header + header);
        for name in UNSAFE_STATIC_ACCESSORS {
            // real layout unknown
            table.insert(*name, header);
        }
        table
    }

    /// Builder form of [`WorkaroundTable::insert`]
    pub fn with(mut self, type_name: impl Into<String>, size: u64) -> Self {
        self.insert(type_name, size);
        self
    }

    /// Add or override an entry, returning the previous size
    pub fn insert(&mut self, type_name: impl Into<String>, size: u64) -> Option<u64> {
        self.sizes.insert(type_name.into(), size)
    }

    /// Merge `other` into this table; entries of `other` win
    pub fn merge(&mut self, other: &WorkaroundTable) {
        for (name, size) in &other.sizes {
            self.sizes.insert(name.clone(), *size);
        }
    }

    /// Fixed size of `type_name`, if it is a known hostile type
    #[inline]
    pub fn known_fixed_size(&self, type_name: &str) -> Option<u64> {
        if self.sizes.is_empty() {
            return None;
        }
        self.sizes.get(type_name).copied()
    }

    /// Iterate over entries
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.sizes.iter().map(|(name, size)| (name.as_str(), *size))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}
