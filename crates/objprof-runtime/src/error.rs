//! Heap and class registry errors

use crate::value::ObjRef;

/// Result type for heap operations
pub type HeapResult<T> = Result<T, HeapError>;

/// Errors raised when building classes or mutating the heap
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HeapError {
    /// No class with this name is loaded
    #[error("unknown class: {0}")]
    UnknownClass(String),

    /// A class with this name is already loaded
    #[error("class already defined: {0}")]
    DuplicateClass(String),

    /// Two fields of one class share a name
    #[error("duplicate field {field} in class {class}")]
    DuplicateField {
        /// Class being defined
        class: String,
        /// Repeated field name
        field: String,
    },

    /// The class (or its supertypes) declares no such field
    #[error("class {class} has no field {field}")]
    NoSuchField {
        /// Class searched
        class: String,
        /// Requested field
        field: String,
    },

    /// A value of the wrong kind was stored
    #[error("cannot store {found} in {target} of kind {expected}")]
    TypeMismatch {
        /// Field or element description
        target: String,
        /// Kind the slot holds
        expected: String,
        /// Kind of the offered value
        found: String,
    },

    /// The handle belongs to another heap or does not exist
    #[error("invalid object reference {0}")]
    InvalidRef(ObjRef),

    /// An array operation was applied to a plain instance
    #[error("object {0} is not an array")]
    NotAnArray(ObjRef),

    /// A field operation was applied to an array
    #[error("object {0} is not an instance")]
    NotAnInstance(ObjRef),

    /// Array index outside the array
    #[error("index {index} out of bounds (length {len})")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Array length
        len: usize,
    },

    /// Every object index of the heap is taken
    #[error("heap is full ({count} objects)")]
    HeapFull {
        /// Objects already allocated
        count: usize,
    },

    /// The class cannot be instantiated this way
    #[error("cannot instantiate {class}: {reason}")]
    NotInstantiable {
        /// Class name
        class: String,
        /// Why
        reason: String,
    },
}
