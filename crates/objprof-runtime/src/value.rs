//! Values and object handles

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use objprof_engine::{FieldKind, ObjectId, PrimitiveKind};

/// Global counter for heap ids
static NEXT_HEAP_ID: AtomicU32 = AtomicU32::new(1);

/// Identifies one heap; handles from other heaps are rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapId(u32);

impl HeapId {
    pub(crate) fn next() -> Self {
        Self(NEXT_HEAP_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Copyable handle to a heap object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    pub(crate) heap: HeapId,
    pub(crate) index: u32,
}

impl ObjRef {
    /// Heap that owns the object
    pub fn heap(self) -> HeapId {
        self.heap
    }

    /// Slot of the object in its heap
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// Identity used by the sizing engine
    pub fn object_id(self) -> ObjectId {
        ObjectId((u64::from(self.heap.0) << 32) | u64::from(self.index))
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.heap.0)
    }
}

/// A field or array slot value
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    /// Null reference
    #[default]
    Null,
    /// `boolean`
    Boolean(bool),
    /// `byte`
    Byte(i8),
    /// `char` (UTF-16 code unit)
    Char(u16),
    /// `short`
    Short(i16),
    /// `int`
    Int(i32),
    /// `float`
    Float(f32),
    /// `long`
    Long(i64),
    /// `double`
    Double(f64),
    /// Non-null reference
    Ref(ObjRef),
}

impl Value {
    /// Null reference
    pub const fn null() -> Self {
        Value::Null
    }

    /// Zero value of a slot of `kind`
    pub fn zero(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Reference => Value::Null,
            FieldKind::Primitive(p) => match p {
                PrimitiveKind::Boolean => Value::Boolean(false),
                PrimitiveKind::Byte => Value::Byte(0),
                PrimitiveKind::Char => Value::Char(0),
                PrimitiveKind::Short => Value::Short(0),
                PrimitiveKind::Int => Value::Int(0),
                PrimitiveKind::Float => Value::Float(0.0),
                PrimitiveKind::Long => Value::Long(0),
                PrimitiveKind::Double => Value::Double(0.0),
            },
        }
    }

    /// Check if null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Referenced object, if this is a non-null reference
    pub fn as_ref(&self) -> Option<ObjRef> {
        match self {
            Value::Ref(r) => Some(*r),
            _ => None,
        }
    }

    /// Kind of slot this value fits in
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::Null | Value::Ref(_) => FieldKind::Reference,
            Value::Boolean(_) => FieldKind::Primitive(PrimitiveKind::Boolean),
            Value::Byte(_) => FieldKind::Primitive(PrimitiveKind::Byte),
            Value::Char(_) => FieldKind::Primitive(PrimitiveKind::Char),
            Value::Short(_) => FieldKind::Primitive(PrimitiveKind::Short),
            Value::Int(_) => FieldKind::Primitive(PrimitiveKind::Int),
            Value::Float(_) => FieldKind::Primitive(PrimitiveKind::Float),
            Value::Long(_) => FieldKind::Primitive(PrimitiveKind::Long),
            Value::Double(_) => FieldKind::Primitive(PrimitiveKind::Double),
        }
    }

    /// Check whether this value may be stored in a slot of `kind`
    pub fn fits(&self, kind: FieldKind) -> bool {
        self.kind() == kind
    }
}

impl From<ObjRef> for Value {
    fn from(r: ObjRef) -> Self {
        Value::Ref(r)
    }
}

impl From<Option<ObjRef>> for Value {
    fn from(r: Option<ObjRef>) -> Self {
        r.map_or(Value::Null, Value::Ref)
    }
}

pub(crate) fn kind_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Reference => "reference",
        FieldKind::Primitive(p) => p.name(),
    }
}
