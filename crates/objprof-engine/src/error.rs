//! Error types for object sizing
//!
//! Introspector implementations report [`IntrospectionError`]. The engine
//! wraps those into [`SizeofError`] with the type and field context of the
//! failing step, so a failed traversal says exactly where it stopped.

use std::path::PathBuf;

/// Result type for engine operations
pub type SizeofResult<T> = Result<T, SizeofError>;

/// Errors raised by a [`crate::Introspector`] or [`crate::RuntimeType`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntrospectionError {
    /// The runtime refused reflective access
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// A type could not be resolved (unloaded or never registered)
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// A slot held a primitive where a reference was expected
    #[error("not a reference: {0}")]
    NotAReference(String),

    /// Field slot or array index outside the instance
    #[error("index {index} out of bounds (length {len})")]
    OutOfBounds {
        /// Requested index
        index: usize,
        /// Actual length
        len: usize,
    },

    /// Any other runtime-specific failure
    #[error("{0}")]
    Other(String),
}

/// Engine errors
///
/// Every variant except [`SizeofError::InvalidArgument`] aborts a traversal;
/// a partial total is never returned.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SizeofError {
    /// Declared fields of a type could not be enumerated
    #[error("could not access declared fields of type {type_name}: {source}")]
    DeclaredFields {
        /// Type being described
        type_name: String,
        /// Underlying failure
        #[source]
        source: IntrospectionError,
    },

    /// A reference field could not be made readable
    #[error("could not make field {field} of type {type_name} accessible: {source}")]
    Inaccessible {
        /// Declaring type
        type_name: String,
        /// Field name
        field: String,
        /// Underlying failure
        #[source]
        source: IntrospectionError,
    },

    /// Reading a reference field failed
    #[error("cannot get field [{field}] of type [{type_name}]: {source}")]
    FieldRead {
        /// Declaring type
        type_name: String,
        /// Field name
        field: String,
        /// Underlying failure
        #[source]
        source: IntrospectionError,
    },

    /// The length of an array could not be read
    #[error("cannot get length of array [{type_name}]: {source}")]
    ArrayLength {
        /// Array type
        type_name: String,
        /// Underlying failure
        #[source]
        source: IntrospectionError,
    },

    /// Reading an array slot failed
    #[error("cannot get element {index} of array [{type_name}]: {source}")]
    ElementRead {
        /// Array type
        type_name: String,
        /// Slot index
        index: usize,
        /// Underlying failure
        #[source]
        source: IntrospectionError,
    },

    /// The runtime type of an instance or its supertype could not be resolved
    #[error("cannot resolve type: {0}")]
    TypeResolution(#[source] IntrospectionError),

    /// Caller error, reported before any traversal starts
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid TOML or does not match the schema
    #[error("failed to parse profiler configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is not acceptable
    #[error("invalid profiler configuration: {0}")]
    Invalid(String),
}
