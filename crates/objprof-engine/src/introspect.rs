//! Type introspection capability
//!
//! The engine never assumes universal reflection. A runtime that wants its
//! object graphs measured implements two traits:
//!
//! - [`RuntimeType`] describes a type: name, category, array-ness, the
//!   fields it declares directly and its supertype.
//! - [`Introspector`] reads instances: identity, runtime type, reference
//!   fields and array slots.
//!
//! Types travel as [`TypeRef`] (`Arc<dyn RuntimeType>`). The Arc
//! allocation is the type's identity; the metadata cache keys on it and
//! keeps only a `Weak` so unloading a type is never prevented.

use std::fmt;
use std::sync::Arc;

use crate::error::IntrospectionError;
use crate::profile::PrimitiveKind;

/// Shared handle to a runtime type
pub type TypeRef = Arc<dyn RuntimeType>;

/// Stable identity token of an instance
///
/// Two instances are the same graph node iff their `ObjectId`s are equal.
/// Value equality of the instances themselves is never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// Raw identity value
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:x}", self.0)
    }
}

/// Broad classification of a type, used by the flyweight oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeCategory {
    /// Regular instances
    #[default]
    Ordinary,
    /// Instances describe a type (class mirrors); shared by the runtime
    TypeDescriptor,
    /// Instances are enumeration constants; shared by the runtime
    EnumConstant,
}

/// Element kind of an array-like type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Slots hold primitives of this kind inline
    Primitive(PrimitiveKind),
    /// Slots hold references
    Reference,
}

impl ElementKind {
    /// Primitive kind, if any
    #[inline]
    pub fn primitive(self) -> Option<PrimitiveKind> {
        match self {
            ElementKind::Primitive(kind) => Some(kind),
            ElementKind::Reference => None,
        }
    }
}

/// Kind of a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Primitive stored inline
    Primitive(PrimitiveKind),
    /// Reference to another instance
    Reference,
}

/// Declared visibility of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Readable without privileges
    #[default]
    Public,
    /// Readable only after [`Introspector::make_accessible`]
    Private,
}

/// A field declared by a type
///
/// `slot` is the runtime's own addressing for the field within an
/// instance; the engine treats it as opaque and hands it back to
/// [`Introspector::read_field`]. `owner` is likewise opaque: a runtime may
/// use it to identify the declaring type without a lookup by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    name: Arc<str>,
    declaring_type: Arc<str>,
    owner: u64,
    slot: usize,
    kind: FieldKind,
    is_static: bool,
    visibility: Visibility,
}

impl FieldRef {
    /// Describe an instance field
    pub fn new(
        name: impl Into<Arc<str>>,
        declaring_type: impl Into<Arc<str>>,
        slot: usize,
        kind: FieldKind,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_type: declaring_type.into(),
            owner: 0,
            slot,
            kind,
            is_static: false,
            visibility: Visibility::Public,
        }
    }

    /// Mark as a static (type-level) field
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Attach a runtime token for the declaring type
    pub fn with_owner(mut self, owner: u64) -> Self {
        self.owner = owner;
        self
    }

    /// Set declared visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the declaring type
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// Runtime token of the declaring type, 0 unless set
    pub fn owner(&self) -> u64 {
        self.owner
    }

    /// Runtime slot
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Field kind
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Whether the field is static
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Declared visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the field holds a reference
    pub fn is_reference(&self) -> bool {
        matches!(self.kind, FieldKind::Reference)
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.name)
    }
}

/// Type descriptor capability
pub trait RuntimeType: Send + Sync + 'static {
    /// Fully qualified type name
    fn name(&self) -> &str;

    /// Classification for the flyweight oracle
    fn category(&self) -> TypeCategory {
        TypeCategory::Ordinary
    }

    /// Element kind when the type is array-like
    fn array_element(&self) -> Option<ElementKind> {
        None
    }

    /// Fields declared directly on this type, static ones included
    ///
    /// Inherited fields are not returned; the engine walks [`RuntimeType::supertype`].
    fn declared_fields(&self) -> Result<Vec<FieldRef>, IntrospectionError>;

    /// Direct supertype, `None` at the root of the hierarchy
    fn supertype(&self) -> Result<Option<TypeRef>, IntrospectionError>;
}

impl fmt::Debug for dyn RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeType")
            .field("name", &self.name())
            .field("category", &self.category())
            .finish()
    }
}

/// Address of the type's shared allocation
#[inline]
pub(crate) fn type_address(ty: &TypeRef) -> usize {
    Arc::as_ptr(ty) as *const () as usize
}

/// Check whether `ty` is `type_name` or one of its subtypes
///
/// Supertype resolution failures end the walk with `false`.
pub fn is_subtype_of(ty: &TypeRef, type_name: &str) -> bool {
    let mut current = Some(ty.clone());
    while let Some(t) = current {
        if t.name() == type_name {
            return true;
        }
        current = t.supertype().ok().flatten();
    }
    false
}

/// Instance reading capability
///
/// Implementations must only read the graph; the engine never asks for
/// mutation and callers may size a graph while other threads read it.
pub trait Introspector {
    /// Handle to a live instance
    type Ref: Clone;

    /// Identity token of an instance
    fn identity(&self, obj: &Self::Ref) -> ObjectId;

    /// Runtime type of an instance
    fn runtime_type(&self, obj: &Self::Ref) -> Result<TypeRef, IntrospectionError>;

    /// Make a field readable regardless of its declared visibility
    fn make_accessible(&self, _field: &FieldRef) -> Result<(), IntrospectionError> {
        Ok(())
    }

    /// Current value of a reference field, `None` for null
    fn read_field(
        &self,
        obj: &Self::Ref,
        field: &FieldRef,
    ) -> Result<Option<Self::Ref>, IntrospectionError>;

    /// Number of slots of an array instance
    fn array_len(&self, obj: &Self::Ref) -> Result<usize, IntrospectionError>;

    /// Current value of a reference-typed array slot, `None` for null
    fn read_element(
        &self,
        obj: &Self::Ref,
        index: usize,
    ) -> Result<Option<Self::Ref>, IntrospectionError>;
}

impl<I: Introspector + ?Sized> Introspector for &I {
    type Ref = I::Ref;

    fn identity(&self, obj: &Self::Ref) -> ObjectId {
        (**self).identity(obj)
    }

    fn runtime_type(&self, obj: &Self::Ref) -> Result<TypeRef, IntrospectionError> {
        (**self).runtime_type(obj)
    }

    fn make_accessible(&self, field: &FieldRef) -> Result<(), IntrospectionError> {
        (**self).make_accessible(field)
    }

    fn read_field(
        &self,
        obj: &Self::Ref,
        field: &FieldRef,
    ) -> Result<Option<Self::Ref>, IntrospectionError> {
        (**self).read_field(obj, field)
    }

    fn array_len(&self, obj: &Self::Ref) -> Result<usize, IntrospectionError> {
        (**self).array_len(obj)
    }

    fn read_element(
        &self,
        obj: &Self::Ref,
        index: usize,
    ) -> Result<Option<Self::Ref>, IntrospectionError> {
        (**self).read_element(obj, index)
    }
}
