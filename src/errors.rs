use thiserror::Error;

/// Errors raised while validating and freezing a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },
    #[error("field `{field}`: duplicate field name")]
    DuplicateField { field: String },
    #[error("field `{field}`: depends on unknown field `{dependency}`")]
    UnknownDependency { field: String, dependency: String },
    #[error("field `{field}`: dependency `{dependency}` is not a boolean field")]
    NonBooleanDependency { field: String, dependency: String },
    #[error("circular dependency involving `{field}`")]
    CircularDependency { field: String },
    #[cfg(feature = "serde")]
    #[error("invalid schema definition: {0}")]
    InvalidDefinition(String),
}

/// Errors raised while encoding a record or writing to a [crate::writer::BitWriter].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    /// A numeric value or a length fell outside its declared bounds.
    #[error("{0}")]
    OutOfRange(String),
    /// A value had the wrong shape for its field, or violated a pattern.
    #[error("{0}")]
    Malformed(String),
    /// A fixed-capacity writer ran out of space.
    #[error("buffer overflow: need {needed} more bytes at offset {offset}, capacity {capacity}")]
    Overflow {
        offset: usize,
        needed: usize,
        capacity: usize,
    },
    /// A required field was absent from the record.
    #[error("missing field `{0}`")]
    MissingField(String),
}

impl WriteError {
    /// Attaches a field name to a buffer-level error.
    pub(crate) fn in_field(self, field: &str) -> Self {
        match self {
            WriteError::OutOfRange(msg) => WriteError::OutOfRange(format!("field `{field}`: {msg}")),
            WriteError::Malformed(msg) => WriteError::Malformed(format!("field `{field}`: {msg}")),
            other => other,
        }
    }
}

/// Errors raised while decoding a record or reading from a [crate::reader::BitReader].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// The input ended before the requested bytes.
    #[error("buffer underflow: need {needed} more bytes at offset {offset}, length {len}")]
    Underflow {
        offset: usize,
        needed: usize,
        len: usize,
    },
    /// The input bytes do not form a valid value.
    #[error("{0}")]
    Malformed(String),
}

impl ReadError {
    pub(crate) fn in_field(self, field: &str) -> Self {
        match self {
            ReadError::Malformed(msg) => ReadError::Malformed(format!("field `{field}`: {msg}")),
            other => other,
        }
    }
}
