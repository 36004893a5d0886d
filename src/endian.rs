//! Byte order selection for multi-byte scalar reads and writes.

/// Byte order used by a writer or reader for fixed-width scalars.
///
/// Chosen at construction; senders and receivers must agree out-of-band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}
