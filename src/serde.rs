//! JSON-deserializable schema definitions.
//!
//! These types describe the *shape* of a schema declaration. They are
//! intended to be constructed from JSON (for example a schema table shipped
//! with your application) and then converted into the core declaration
//! types, where validation happens.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    errors::CompileError,
    schema::{define_schemas, Schema, SchemaDecl},
};

/// Top-level schema definition: fields plus optional record metadata.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchemaDef {
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub metadata: Option<MetadataDef>,
}

/// Record-level options.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MetadataDef {
    /// 8-bit tag prepended to every encoded record.
    #[serde(default)]
    pub prefix: Option<u8>,
    /// Informational flag for schemas used in repeated streams.
    #[serde(default)]
    pub repeated: bool,
}

/// Description of a single field.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FieldDef {
    /// Name used in encoded records.
    pub name: String,
    /// Kind tag and kind-specific options, flattened alongside the name.
    #[serde(flatten)]
    pub kind: FieldKindDef,
    /// The field holds an ordered sequence of values.
    #[serde(default)]
    pub list: bool,
    /// The value may be absent.
    #[serde(default)]
    pub optional: bool,
    /// Names of boolean fields gating this field's presence.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Kind of field, tagged by `type`.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type")]
pub enum FieldKindDef {
    Integer {
        /// Wire width in bits, 1..=53.
        bits: u32,
        #[serde(default)]
        signed: bool,
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        max: Option<i64>,
        #[serde(default)]
        default: Option<i64>,
    },
    Float16 {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
        #[serde(default)]
        default: Option<f64>,
    },
    Float32 {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
        #[serde(default)]
        default: Option<f64>,
    },
    Float64 {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
        #[serde(default)]
        default: Option<f64>,
    },
    Boolean {
        #[serde(default)]
        default: Option<bool>,
    },
    String {
        #[serde(default, rename = "includeSize")]
        include_size: Option<bool>,
        #[serde(default)]
        pattern: Option<String>,
        #[serde(default, rename = "minLength")]
        min_length: Option<usize>,
        #[serde(default, rename = "maxLength")]
        max_length: Option<usize>,
        #[serde(default)]
        default: Option<String>,
    },
    Blob {
        #[serde(default, rename = "includeSize")]
        include_size: Option<bool>,
        #[serde(default, rename = "minLength")]
        min_length: Option<usize>,
        #[serde(default, rename = "maxLength")]
        max_length: Option<usize>,
    },
}

/// Parses a JSON object of named schema definitions and compiles each into
/// a [Schema].
pub fn define_schemas_json(json: &str) -> Result<BTreeMap<String, Schema>, CompileError> {
    let table: BTreeMap<String, SchemaDef> =
        serde_json::from_str(json).map_err(|e| CompileError::InvalidDefinition(e.to_string()))?;
    define_schemas(
        table
            .into_iter()
            .map(|(name, def)| (name, SchemaDecl::from(def))),
    )
}
