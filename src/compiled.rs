//! Per-field operation descriptors produced by schema compilation.

use half::f16;
use regex::Regex;

use crate::{
    errors::{CompileError, ReadError, WriteError},
    field::{Field, FieldKind},
    reader::BitReader,
    value::Value,
    writer::{BitWriter, MAX_BITS},
};

/// A frozen field: kind constants, modifiers, and dependency slots resolved
/// to positions in the frozen order.
#[derive(Debug, Clone)]
pub struct CompiledField {
    pub name: String,
    pub kind: CompiledKind,
    pub list: bool,
    pub optional: bool,
    /// Frozen-order indices of the gating fields; always earlier slots.
    pub deps: Vec<usize>,
    /// Value materialized when the field was not written.
    pub default: Option<Value>,
}

/// Kind constants carried by a frozen field.
#[derive(Debug, Clone)]
pub enum CompiledKind {
    Integer {
        bits: u32,
        signed: bool,
        min: Option<i64>,
        max: Option<i64>,
    },
    Float16 {
        min: Option<f64>,
        max: Option<f64>,
    },
    Float32 {
        min: Option<f64>,
        max: Option<f64>,
    },
    Float64 {
        min: Option<f64>,
        max: Option<f64>,
    },
    Boolean,
    Str {
        include_size: bool,
        pattern: Option<Regex>,
        min_length: Option<usize>,
        max_length: Option<usize>,
    },
    Blob {
        include_size: bool,
        min_length: Option<usize>,
        max_length: Option<usize>,
    },
}

fn invalid(field: &str, reason: impl Into<String>) -> CompileError {
    CompileError::InvalidField {
        field: field.to_string(),
        reason: reason.into(),
    }
}

impl CompiledField {
    /// Checks the kind-specific rules and lowers a declared field.
    /// Dependency slots are resolved by the schema once the frozen order is
    /// known.
    pub(crate) fn lower(field: &Field) -> Result<Self, CompileError> {
        let name = &field.name;
        let (kind, default) = match &field.kind {
            FieldKind::Integer(spec) => {
                if spec.bits == 0 || spec.bits > MAX_BITS {
                    return Err(invalid(
                        name,
                        format!("integer width {} outside 1..={MAX_BITS}", spec.bits),
                    ));
                }
                let lo = BitWriter::range_min(spec.bits, spec.signed);
                let hi = BitWriter::range_max(spec.bits, spec.signed);
                for (label, bound) in [("min", spec.min), ("max", spec.max)] {
                    if let Some(b) = bound {
                        if b < lo || b > hi {
                            return Err(invalid(
                                name,
                                format!("{label} {b} outside the {}-bit range [{lo}, {hi}]", spec.bits),
                            ));
                        }
                    }
                }
                if let (Some(min), Some(max)) = (spec.min, spec.max) {
                    if min > max {
                        return Err(invalid(name, format!("min {min} exceeds max {max}")));
                    }
                }
                if let Some(d) = spec.default {
                    let lo = spec.min.unwrap_or(lo);
                    let hi = spec.max.unwrap_or(hi);
                    if d < lo || d > hi {
                        return Err(invalid(
                            name,
                            format!("default {d} outside [{lo}, {hi}]"),
                        ));
                    }
                }
                (
                    CompiledKind::Integer {
                        bits: spec.bits,
                        signed: spec.signed,
                        min: spec.min,
                        max: spec.max,
                    },
                    spec.default.map(Value::Int),
                )
            }
            FieldKind::Float16(spec) | FieldKind::Float32(spec) | FieldKind::Float64(spec) => {
                if let (Some(min), Some(max)) = (spec.min, spec.max) {
                    if min > max {
                        return Err(invalid(name, format!("min {min} exceeds max {max}")));
                    }
                }
                if let Some(d) = spec.default {
                    if spec.min.is_some_and(|min| d < min) || spec.max.is_some_and(|max| d > max) {
                        return Err(invalid(name, format!("default {d} outside min/max")));
                    }
                }
                let kind = match &field.kind {
                    FieldKind::Float16(_) => CompiledKind::Float16 {
                        min: spec.min,
                        max: spec.max,
                    },
                    FieldKind::Float32(_) => CompiledKind::Float32 {
                        min: spec.min,
                        max: spec.max,
                    },
                    _ => CompiledKind::Float64 {
                        min: spec.min,
                        max: spec.max,
                    },
                };
                (kind, spec.default.map(Value::Float))
            }
            FieldKind::Boolean(spec) => (CompiledKind::Boolean, spec.default.map(Value::Bool)),
            FieldKind::String(spec) => {
                let include_size = spec.include_size.unwrap_or(true);
                if field.list && !include_size {
                    return Err(invalid(name, "list string fields require includeSize"));
                }
                if let (Some(min), Some(max)) = (spec.min_length, spec.max_length) {
                    if min > max {
                        return Err(invalid(
                            name,
                            format!("minLength {min} exceeds maxLength {max}"),
                        ));
                    }
                }
                let pattern = match &spec.pattern {
                    Some(p) => Some(
                        Regex::new(p)
                            .map_err(|e| invalid(name, format!("invalid pattern: {e}")))?,
                    ),
                    None => None,
                };
                if let Some(d) = &spec.default {
                    if spec.min_length.is_some_and(|min| d.len() < min)
                        || spec.max_length.is_some_and(|max| d.len() > max)
                    {
                        return Err(invalid(name, "default violates minLength/maxLength"));
                    }
                    if let Some(re) = &pattern {
                        if !re.is_match(d) {
                            return Err(invalid(name, "default does not match pattern"));
                        }
                    }
                }
                (
                    CompiledKind::Str {
                        include_size,
                        pattern,
                        min_length: spec.min_length,
                        max_length: spec.max_length,
                    },
                    spec.default.clone().map(Value::Str),
                )
            }
            FieldKind::Blob(spec) => {
                let include_size = spec.include_size.unwrap_or(true);
                if field.list && !include_size {
                    return Err(invalid(name, "list blob fields require includeSize"));
                }
                if let (Some(min), Some(max)) = (spec.min_length, spec.max_length) {
                    if min > max {
                        return Err(invalid(
                            name,
                            format!("minLength {min} exceeds maxLength {max}"),
                        ));
                    }
                }
                (
                    CompiledKind::Blob {
                        include_size,
                        min_length: spec.min_length,
                        max_length: spec.max_length,
                    },
                    None,
                )
            }
        };

        Ok(CompiledField {
            name: field.name.clone(),
            kind,
            list: field.list,
            optional: field.optional,
            deps: Vec::new(),
            default,
        })
    }
}

fn wrong_type(field: &str, expected: &str) -> WriteError {
    WriteError::Malformed(format!("field `{field}`: expected {expected}"))
}

fn check_int_bounds(field: &str, v: i64, min: Option<i64>, max: Option<i64>) -> Result<(), WriteError> {
    if min.is_some_and(|min| v < min) || max.is_some_and(|max| v > max) {
        return Err(WriteError::OutOfRange(format!(
            "field `{field}`: value {v} outside its declared min/max"
        )));
    }
    Ok(())
}

fn check_float_bounds(field: &str, v: f64, min: Option<f64>, max: Option<f64>) -> Result<(), WriteError> {
    if min.is_some_and(|min| v < min) || max.is_some_and(|max| v > max) {
        return Err(WriteError::OutOfRange(format!(
            "field `{field}`: value {v} outside its declared min/max"
        )));
    }
    Ok(())
}

fn check_len(field: &str, len: usize, min: Option<usize>, max: Option<usize>) -> Result<(), WriteError> {
    if min.is_some_and(|min| len < min) || max.is_some_and(|max| len > max) {
        return Err(WriteError::OutOfRange(format!(
            "field `{field}`: length {len} outside its declared minLength/maxLength"
        )));
    }
    Ok(())
}

fn align8(bits: u64) -> u64 {
    bits.div_ceil(8) * 8
}

impl CompiledKind {
    /// Advances a running bit total by one element carrying `value`.
    ///
    /// Mirrors the writer exactly: booleans and integers pack into the open
    /// bit run, while byte-granular kinds (floats, strings, blobs) first
    /// abandon any partial byte.
    pub(crate) fn measure_element(
        &self,
        field: &str,
        value: &Value,
        at_bits: u64,
    ) -> Result<u64, WriteError> {
        match self {
            CompiledKind::Boolean => Ok(at_bits + 1),
            CompiledKind::Integer { bits, .. } => Ok(at_bits + *bits as u64),
            CompiledKind::Float16 { .. } => Ok(align8(at_bits) + 16),
            CompiledKind::Float32 { .. } => Ok(align8(at_bits) + 32),
            CompiledKind::Float64 { .. } => Ok(align8(at_bits) + 64),
            CompiledKind::Str { include_size, .. } => {
                let s = value.as_str().ok_or_else(|| wrong_type(field, "a string"))?;
                Ok(align8(at_bits) + if *include_size { 16 } else { 0 } + 8 * s.len() as u64)
            }
            CompiledKind::Blob { include_size, .. } => {
                let b = value
                    .as_bytes()
                    .ok_or_else(|| wrong_type(field, "a byte sequence"))?;
                Ok(align8(at_bits) + if *include_size { 16 } else { 0 } + 8 * b.len() as u64)
            }
        }
    }

    pub(crate) fn write_element(
        &self,
        field: &str,
        value: &Value,
        w: &mut BitWriter,
    ) -> Result<(), WriteError> {
        match self {
            CompiledKind::Boolean => {
                let b = value.as_bool().ok_or_else(|| wrong_type(field, "a boolean"))?;
                w.write_bool(b).map_err(|e| e.in_field(field))
            }
            CompiledKind::Integer {
                bits,
                signed,
                min,
                max,
            } => {
                let v = value.as_int().ok_or_else(|| wrong_type(field, "an integer"))?;
                check_int_bounds(field, v, *min, *max)?;
                w.write_bits(v, *bits, *signed).map_err(|e| e.in_field(field))
            }
            CompiledKind::Float16 { min, max } => {
                let v = value.as_f64().ok_or_else(|| wrong_type(field, "a number"))?;
                check_float_bounds(field, v, *min, *max)?;
                w.write_f16(f16::from_f64(v)).map_err(|e| e.in_field(field))
            }
            CompiledKind::Float32 { min, max } => {
                let v = value.as_f64().ok_or_else(|| wrong_type(field, "a number"))?;
                check_float_bounds(field, v, *min, *max)?;
                w.write_f32(v as f32).map_err(|e| e.in_field(field))
            }
            CompiledKind::Float64 { min, max } => {
                let v = value.as_f64().ok_or_else(|| wrong_type(field, "a number"))?;
                check_float_bounds(field, v, *min, *max)?;
                w.write_f64(v).map_err(|e| e.in_field(field))
            }
            CompiledKind::Str {
                include_size,
                pattern,
                min_length,
                max_length,
            } => {
                let s = value.as_str().ok_or_else(|| wrong_type(field, "a string"))?;
                check_len(field, s.len(), *min_length, *max_length)?;
                if let Some(re) = pattern {
                    if !re.is_match(s) {
                        return Err(WriteError::Malformed(format!(
                            "field `{field}`: value does not match pattern `{}`",
                            re.as_str()
                        )));
                    }
                }
                w.write_string(s, *include_size).map_err(|e| e.in_field(field))
            }
            CompiledKind::Blob {
                include_size,
                min_length,
                max_length,
            } => {
                let b = value
                    .as_bytes()
                    .ok_or_else(|| wrong_type(field, "a byte sequence"))?;
                check_len(field, b.len(), *min_length, *max_length)?;
                w.write_blob(b, *include_size).map_err(|e| e.in_field(field))
            }
        }
    }

    pub(crate) fn read_element(&self, field: &str, r: &mut BitReader) -> Result<Value, ReadError> {
        match self {
            CompiledKind::Boolean => Ok(Value::Bool(r.read_bool()?)),
            CompiledKind::Integer { bits, signed, .. } => {
                Ok(Value::Int(r.read_bits(*bits, *signed)?))
            }
            CompiledKind::Float16 { .. } => Ok(Value::Float(r.read_f16()?.to_f64())),
            CompiledKind::Float32 { .. } => Ok(Value::Float(r.read_f32()? as f64)),
            CompiledKind::Float64 { .. } => Ok(Value::Float(r.read_f64()?)),
            CompiledKind::Str { include_size, .. } => {
                let s = if *include_size {
                    r.read_string()
                } else {
                    r.read_string_rest()
                }
                .map_err(|e| e.in_field(field))?;
                Ok(Value::Str(s))
            }
            CompiledKind::Blob { include_size, .. } => {
                let b = if *include_size {
                    r.read_blob()?
                } else {
                    r.read_rest().to_vec()
                };
                Ok(Value::Bytes(b))
            }
        }
    }
}
