//! # bitforge
//!
//! Schema-driven binary serialization with bit-level packing.
//!
//! Declare a data structure as named, typed fields with constraints, compile
//! it once, then encode records to compact byte sequences and decode them
//! back. Packing is bit-granular: seven one-bit booleans occupy one byte,
//! not seven. Fields take `list`, `optional`, `default`, and `dependencies`
//! modifiers; a dependent field is present on the wire only while every
//! named boolean resolved truthy, at no extra bit cost.
//!
//! ## Example
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use bitforge::field::{Field, FieldKind, IntegerSpec, Metadata};
//! use bitforge::schema::Schema;
//! use bitforge::value::Value;
//!
//! let fields = vec![Field::new(
//!     "id",
//!     FieldKind::Integer(IntegerSpec { bits: 12, ..Default::default() }),
//! )];
//! let schema = Schema::compile(&fields, Metadata::default()).unwrap();
//!
//! let record = BTreeMap::from([("id".to_string(), Value::Int(0x123))]);
//! let bytes = schema.encode(&record).unwrap();
//! assert_eq!(bytes, vec![0x23, 0x01]);
//! assert_eq!(schema.decode(&bytes).unwrap(), record);
//! ```

pub mod compiled;
pub mod endian;
pub mod errors;
pub mod field;
pub mod reader;
pub mod schema;
#[cfg(feature = "serde")]
pub mod serde;
pub mod value;
pub mod writer;
