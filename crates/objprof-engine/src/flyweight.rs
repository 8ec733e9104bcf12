//! Shared-flyweight oracle
//!
//! Runtime-owned singletons (boolean constants, empty-collection
//! singletons, standard streams, type mirrors, enum constants) are shared
//! by the whole process. Charging them to every graph that touches them
//! would attribute the shared subsystem to each caller, so they are
//! excluded from both traversal and accounting.
//!
//! An instance is a flyweight when any of these holds:
//! - it is absent (null)
//! - its identity was registered with [`FlyweightRegistry::register_instance`]
//! - its type category is [`TypeCategory::TypeDescriptor`] or [`TypeCategory::EnumConstant`]
//! - its type, or any supertype, is a registered shared type

use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use crate::introspect::{Introspector, ObjectId, TypeCategory, TypeRef};

/// Type names whose instances are always runtime-shared constants
pub const STANDARD_SHARED_TYPES: &[&str] = &[
    "Class",
    "Enum",
    "EnumSyntax",
    "UnicodeBlock",
    "ByteOrder",
    "MapMode",
    "CoderResult",
    "CodingErrorAction",
    "DateFormat.Field",
    "MessageFormat.Field",
    "NumberFormat.Field",
    "SimpleType",
    "LoginModuleControlFlag",
    "DatatypeConstants.Field",
];

/// Process-wide, read-mostly registry of shared instances and types
#[derive(Debug, Default)]
pub struct FlyweightRegistry {
    instances: RwLock<FxHashSet<ObjectId>>,
    shared_types: RwLock<FxHashSet<String>>,
}

impl FlyweightRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry preloaded with [`STANDARD_SHARED_TYPES`]
    pub fn standard() -> Self {
        let registry = Self::new();
        registry.extend_shared_types(STANDARD_SHARED_TYPES.iter().copied());
        registry
    }

    /// Register a shared instance by identity
    ///
    /// Returns false if it was already registered.
    pub fn register_instance(&self, id: ObjectId) -> bool {
        self.instances.write().insert(id)
    }

    /// Register many shared instances
    pub fn extend_instances(&self, ids: impl IntoIterator<Item = ObjectId>) {
        self.instances.write().extend(ids);
    }

    /// Remove a registered instance
    pub fn unregister_instance(&self, id: ObjectId) -> bool {
        self.instances.write().remove(&id)
    }

    /// Register a type whose instances (and subtype instances) are shared
    pub fn register_shared_type(&self, type_name: impl Into<String>) -> bool {
        self.shared_types.write().insert(type_name.into())
    }

    /// Register many shared types
    pub fn extend_shared_types<S: Into<String>>(&self, names: impl IntoIterator<Item = S>) {
        self.shared_types
            .write()
            .extend(names.into_iter().map(Into::into));
    }

    /// Check a registered identity
    pub fn contains_instance(&self, id: ObjectId) -> bool {
        self.instances.read().contains(&id)
    }

    /// Check a registered type name (exact match, no hierarchy walk)
    pub fn is_shared_type(&self, type_name: &str) -> bool {
        self.shared_types.read().contains(type_name)
    }

    /// Number of registered instances
    pub fn instance_count(&self) -> usize {
        self.instances.read().len()
    }

    /// Number of registered shared types
    pub fn shared_type_count(&self) -> usize {
        self.shared_types.read().len()
    }

    /// Decide whether `obj` is a shared flyweight
    ///
    /// Pure predicate. An instance whose type cannot be resolved is not a
    /// flyweight; the traversal reports the resolution failure itself.
    pub fn is_flyweight<I: Introspector>(&self, introspector: &I, obj: Option<&I::Ref>) -> bool {
        let Some(obj) = obj else {
            return true;
        };
        if self.contains_instance(introspector.identity(obj)) {
            return true;
        }
        match introspector.runtime_type(obj) {
            Ok(ty) => self.is_flyweight_type(&ty),
            Err(_) => false,
        }
    }

    /// Type-level part of [`FlyweightRegistry::is_flyweight`]
    pub fn is_flyweight_type(&self, ty: &TypeRef) -> bool {
        if ty.category() != TypeCategory::Ordinary {
            return true;
        }
        let shared = self.shared_types.read();
        if shared.is_empty() {
            return false;
        }
        let mut current = Some(ty.clone());
        while let Some(t) = current {
            if shared.contains(t.name()) {
                return true;
            }
            current = t.supertype().ok().flatten();
        }
        false
    }
}
