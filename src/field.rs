//! Declared fields: kinds, kind-specific options, and common modifiers.

/// A single named field in a schema declaration.
///
/// The modifiers are orthogonal to the kind: `list` turns the field into an
/// ordered sequence with a `u16` count prefix, `optional` adds a one-bit
/// presence flag, and `dependencies` gates the field on boolean fields
/// elsewhere in the same schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Name used in encoded records.
    pub name: String,
    /// Primitive kind and its options.
    pub kind: FieldKind,
    /// The field holds an ordered sequence of the kind's values.
    pub list: bool,
    /// The value may be absent; presence is a single bit on the wire.
    pub optional: bool,
    /// Names of boolean fields whose truthy values gate this field.
    pub dependencies: Vec<String>,
}

impl Field {
    /// A scalar, required field with no dependencies.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Field {
            name: name.into(),
            kind,
            list: false,
            optional: false,
            dependencies: Vec::new(),
        }
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::FieldDef> for Field {
    fn from(value: crate::serde::FieldDef) -> Self {
        Field {
            name: value.name,
            kind: value.kind.into(),
            list: value.list,
            optional: value.optional,
            dependencies: value.dependencies,
        }
    }
}

/// The primitive family of a field, with kind-specific options.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Integer(IntegerSpec),
    Float16(FloatSpec),
    Float32(FloatSpec),
    Float64(FloatSpec),
    Boolean(BooleanSpec),
    String(StringSpec),
    Blob(BlobSpec),
}

#[cfg(feature = "serde")]
impl From<crate::serde::FieldKindDef> for FieldKind {
    fn from(value: crate::serde::FieldKindDef) -> Self {
        use crate::serde::FieldKindDef;

        match value {
            FieldKindDef::Integer {
                bits,
                signed,
                min,
                max,
                default,
            } => FieldKind::Integer(IntegerSpec {
                bits,
                signed,
                min,
                max,
                default,
            }),
            FieldKindDef::Float16 { min, max, default } => {
                FieldKind::Float16(FloatSpec { min, max, default })
            }
            FieldKindDef::Float32 { min, max, default } => {
                FieldKind::Float32(FloatSpec { min, max, default })
            }
            FieldKindDef::Float64 { min, max, default } => {
                FieldKind::Float64(FloatSpec { min, max, default })
            }
            FieldKindDef::Boolean { default } => FieldKind::Boolean(BooleanSpec { default }),
            FieldKindDef::String {
                include_size,
                pattern,
                min_length,
                max_length,
                default,
            } => FieldKind::String(StringSpec {
                include_size,
                pattern,
                min_length,
                max_length,
                default,
            }),
            FieldKindDef::Blob {
                include_size,
                min_length,
                max_length,
            } => FieldKind::Blob(BlobSpec {
                include_size,
                min_length,
                max_length,
            }),
        }
    }
}

/// Options for an integer field. `bits` is the wire width, 1..=53.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntegerSpec {
    pub bits: u32,
    pub signed: bool,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub default: Option<i64>,
}

/// Options shared by the three float widths.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FloatSpec {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub default: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BooleanSpec {
    pub default: Option<bool>,
}

/// Options for a string field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StringSpec {
    /// Emit a `u16` length prefix; defaults to true when absent, and must
    /// not be false on list fields.
    pub include_size: Option<bool>,
    /// Regex the value must match.
    pub pattern: Option<String>,
    /// Bounds on the encoded byte length.
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub default: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlobSpec {
    pub include_size: Option<bool>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

/// Record-level options attached to a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Metadata {
    /// 8-bit tag prepended to every encoded record, for multiplexed streams.
    pub prefix: Option<u8>,
    /// Marks schemas used in repeated streams. Informational only; does not
    /// change the single-record wire format.
    pub repeated: bool,
}

#[cfg(feature = "serde")]
impl From<crate::serde::MetadataDef> for Metadata {
    fn from(value: crate::serde::MetadataDef) -> Self {
        Metadata {
            prefix: value.prefix,
            repeated: value.repeated,
        }
    }
}
