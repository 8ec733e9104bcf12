//! Size profile and primitive size table
//!
//! Every byte constant the engine uses lives in a [`SizeProfile`]. The
//! numbers describe one runtime layout; they are estimates that ignore
//! alignment and padding.
//!
//! ```text
//! instance shell = header + Σ primitive sizes + Σ reference slots
//! array shell    = header + length field + reference + length × slot
//! ```

use serde::Deserialize;

/// Primitive field kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// `boolean`
    Boolean,
    /// `byte`
    Byte,
    /// `char` (UTF-16 code unit)
    Char,
    /// `short`
    Short,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `long`
    Long,
    /// `double`
    Double,
}

impl PrimitiveKind {
    /// All primitive kinds
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Char,
        PrimitiveKind::Short,
        PrimitiveKind::Int,
        PrimitiveKind::Float,
        PrimitiveKind::Long,
        PrimitiveKind::Double,
    ];

    /// Byte size of this kind under `profile`
    #[inline]
    pub fn size_in(self, profile: &SizeProfile) -> u64 {
        match self {
            PrimitiveKind::Boolean => profile.boolean,
            PrimitiveKind::Byte => profile.byte,
            PrimitiveKind::Char => profile.char,
            PrimitiveKind::Short => profile.short,
            PrimitiveKind::Int => profile.int,
            PrimitiveKind::Float => profile.float,
            PrimitiveKind::Long => profile.long,
            PrimitiveKind::Double => profile.double,
        }
    }

    /// Source-level name of the kind
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Double => "double",
        }
    }
}

/// Physical size constants of a runtime layout (bytes)
///
/// Missing keys in a configuration document fall back to [`SizeProfile::narrow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizeProfile {
    /// Shell of a field-less object
    pub object_header: u64,
    /// One reference slot
    pub reference: u64,
    /// Length word of an array
    pub array_length: u64,
    /// `boolean` field
    pub boolean: u64,
    /// `byte` field
    pub byte: u64,
    /// `char` field
    pub char: u64,
    /// `short` field
    pub short: u64,
    /// `int` field
    pub int: u64,
    /// `float` field
    pub float: u64,
    /// `long` field
    pub long: u64,
    /// `double` field
    pub double: u64,
}

impl SizeProfile {
    /// 32-bit layout with narrow references
    pub const fn narrow() -> Self {
        Self {
            object_header: 8,
            reference: 4,
            array_length: 4,
            boolean: 1,
            byte: 1,
            char: 2,
            short: 2,
            int: 4,
            float: 4,
            long: 8,
            double: 8,
        }
    }

    /// 64-bit layout with full-width references
    pub const fn wide() -> Self {
        Self {
            object_header: 16,
            reference: 8,
            ..Self::narrow()
        }
    }

    /// Look up a named preset
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "narrow" | "32" | "32-bit" => Some(Self::narrow()),
            "wide" | "64" | "64-bit" => Some(Self::wide()),
            _ => None,
        }
    }

    /// Shell size of an array with `length` slots of `element`
    ///
    /// `element` is `None` for reference-typed elements.
    #[inline]
    pub fn array_shell(&self, length: usize, element: Option<PrimitiveKind>) -> u64 {
        let slot = match element {
            Some(kind) => kind.size_in(self),
            None => self.reference,
        };
        self.object_header + self.array_length + self.reference + length as u64 * slot
    }
}

impl Default for SizeProfile {
    fn default() -> Self {
        Self::narrow()
    }
}
