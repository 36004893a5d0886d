//! Frozen schemas: validation, dependency ordering, and the encode/decode
//! drivers.

use std::collections::{BTreeMap, HashMap};

use crate::{
    compiled::{CompiledField, CompiledKind},
    errors::{CompileError, ReadError, WriteError},
    field::{Field, FieldKind, Metadata},
    reader::BitReader,
    value::{Record, Value},
    writer::BitWriter,
};

/// A schema declaration: ordered fields plus record-level metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaDecl {
    pub fields: Vec<Field>,
    pub metadata: Metadata,
}

/// A validated, frozen schema.
///
/// Fields are stored in topological order (every field follows its
/// dependencies), each lowered to a [CompiledField] carrying its kind
/// constants. A frozen schema is immutable and safely shareable across
/// threads; [Schema::encode] and [Schema::decode] take only `&self`.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<CompiledField>,
    index: HashMap<String, usize>,
    static_bits: u64,
    metadata: Metadata,
}

/// Validates and compiles every schema in a declaration table. The first
/// invalid declaration aborts the call.
pub fn define_schemas<I>(table: I) -> Result<BTreeMap<String, Schema>, CompileError>
where
    I: IntoIterator<Item = (String, SchemaDecl)>,
{
    table
        .into_iter()
        .map(|(name, decl)| Schema::compile(&decl.fields, decl.metadata).map(|s| (name, s)))
        .collect()
}

#[cfg(feature = "serde")]
impl From<crate::serde::SchemaDef> for SchemaDecl {
    fn from(value: crate::serde::SchemaDef) -> Self {
        SchemaDecl {
            fields: value.fields.into_iter().map(Into::into).collect(),
            metadata: value.metadata.map(Into::into).unwrap_or_default(),
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<crate::serde::SchemaDef> for Schema {
    type Error = CompileError;

    fn try_from(value: crate::serde::SchemaDef) -> Result<Self, Self::Error> {
        let decl = SchemaDecl::from(value);
        Schema::compile(&decl.fields, decl.metadata)
    }
}

impl Schema {
    /// Validates a slice of declared fields and freezes them into a schema.
    pub fn compile(fields: &[Field], metadata: Metadata) -> Result<Self, CompileError> {
        let mut decl_index = HashMap::with_capacity(fields.len());
        for (i, f) in fields.iter().enumerate() {
            if decl_index.insert(f.name.clone(), i).is_some() {
                return Err(CompileError::DuplicateField {
                    field: f.name.clone(),
                });
            }
        }

        for f in fields {
            for dep in &f.dependencies {
                let Some(&d) = decl_index.get(dep) else {
                    return Err(CompileError::UnknownDependency {
                        field: f.name.clone(),
                        dependency: dep.clone(),
                    });
                };
                if !matches!(fields[d].kind, FieldKind::Boolean(_)) {
                    return Err(CompileError::NonBooleanDependency {
                        field: f.name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        let order = topo_order(fields, &decl_index)?;

        let mut index = HashMap::with_capacity(fields.len());
        for (slot, &i) in order.iter().enumerate() {
            index.insert(fields[i].name.clone(), slot);
        }

        let mut compiled = Vec::with_capacity(fields.len());
        for &i in &order {
            let mut cf = CompiledField::lower(&fields[i])?;
            cf.deps = fields[i].dependencies.iter().map(|d| index[d]).collect();
            compiled.push(cf);
        }

        let static_bits = static_bit_length(&compiled, &metadata);

        Ok(Schema {
            fields: compiled,
            index,
            static_bits,
            metadata,
        })
    }

    /// The frozen fields, in topological order.
    pub fn fields(&self) -> &[CompiledField] {
        &self.fields
    }

    /// Position of a field in the frozen order.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn metadata(&self) -> Metadata {
        self.metadata
    }

    /// Lower bound, in bits, contributed by fields whose presence and size
    /// are statically known. Computable without a value; the encoder adds
    /// variable contributions on top.
    pub fn static_bit_length(&self) -> u64 {
        self.static_bits
    }

    /// Encodes a record into a freshly allocated, exactly-sized buffer.
    pub fn encode(&self, record: &Record) -> Result<Vec<u8>, WriteError> {
        let plans = self.plan(record)?;
        let bits = self.measure(&plans)?;
        let mut w = BitWriter::new(bits.div_ceil(8) as usize);
        self.write_record(&plans, &mut w)?;
        Ok(w.into_bytes())
    }

    /// Encodes a record into a caller-supplied writer; returns the number of
    /// bytes written. Growable writers expand as needed, fixed writers fail
    /// with [WriteError::Overflow].
    pub fn encode_into(&self, record: &Record, w: &mut BitWriter) -> Result<usize, WriteError> {
        let plans = self.plan(record)?;
        let entry = w.position();
        self.write_record(&plans, w)?;
        Ok(w.position() - entry)
    }

    /// Decodes one record from a byte slice.
    pub fn decode(&self, data: &[u8]) -> Result<Record, ReadError> {
        let mut r = BitReader::new(data);
        self.decode_from(&mut r)
    }

    /// Decodes one record at the reader's cursor.
    pub fn decode_from(&self, r: &mut BitReader) -> Result<Record, ReadError> {
        if let Some(prefix) = self.metadata.prefix {
            let tag = r.read_u8()?;
            if tag != prefix {
                return Err(ReadError::Malformed(format!(
                    "record prefix {tag:#04x} does not match schema prefix {prefix:#04x}"
                )));
            }
        }

        let mut slots: Vec<Option<Value>> = vec![None; self.fields.len()];
        for (i, f) in self.fields.iter().enumerate() {
            let mut read = true;
            if f.optional {
                read = r.read_bool()?;
            }
            if f.deps
                .iter()
                .any(|&d| !slots[d].as_ref().is_some_and(Value::truthy))
            {
                read = false;
            }
            if read {
                let value = if f.list {
                    let count = r.read_u16()? as usize;
                    let mut items = Vec::with_capacity(count);
                    for _ in 0..count {
                        items.push(f.kind.read_element(&f.name, r)?);
                    }
                    Value::Array(items)
                } else {
                    f.kind.read_element(&f.name, r)?
                };
                slots[i] = Some(value);
            }
            if slots[i].is_none() {
                slots[i] = f.default.clone();
            }
        }

        let mut record = Record::new();
        for (f, slot) in self.fields.iter().zip(slots) {
            if let Some(v) = slot {
                record.insert(f.name.clone(), v);
            }
        }
        Ok(record)
    }

    /// Resolves, per field, the effective value (supplied or default) and
    /// whether its payload is written: the dependency gate is open and the
    /// value exists. `payload` is `Some` exactly when the field is written.
    fn plan<'a>(&'a self, record: &'a Record) -> Result<Vec<FieldPlan<'a>>, WriteError> {
        let mut plans: Vec<FieldPlan> = Vec::with_capacity(self.fields.len());
        for f in &self.fields {
            let effective = record.get(&f.name).or(f.default.as_ref());
            let gate = f.deps.iter().all(|&d| {
                plans[d]
                    .payload
                    .or(self.fields[d].default.as_ref())
                    .is_some_and(Value::truthy)
            });
            let present = effective.is_some();
            if gate && !f.optional && !present {
                return Err(WriteError::MissingField(f.name.clone()));
            }
            plans.push(FieldPlan {
                present,
                payload: if present && gate { effective } else { None },
            });
        }
        Ok(plans)
    }

    /// Exact encoded size in bits, simulating the writer's cursor: bit
    /// fields pack into the open run, byte-granular fields (list counts,
    /// floats, strings, blobs) first abandon any partial byte.
    fn measure(&self, plans: &[FieldPlan]) -> Result<u64, WriteError> {
        let mut bits: u64 = if self.metadata.prefix.is_some() { 8 } else { 0 };
        for (f, plan) in self.fields.iter().zip(plans) {
            if f.optional {
                bits += 1;
            }
            let Some(value) = plan.payload else { continue };
            if f.list {
                let items = self.list_items(f, value)?;
                bits = bits.div_ceil(8) * 8 + 16;
                for item in items {
                    bits = f.kind.measure_element(&f.name, item, bits)?;
                }
            } else {
                bits = f.kind.measure_element(&f.name, value, bits)?;
            }
        }
        Ok(bits)
    }

    fn write_record(&self, plans: &[FieldPlan], w: &mut BitWriter) -> Result<(), WriteError> {
        if let Some(prefix) = self.metadata.prefix {
            w.write_u8(prefix)?;
        }
        for (f, plan) in self.fields.iter().zip(plans) {
            if f.optional {
                w.write_bool(plan.present).map_err(|e| e.in_field(&f.name))?;
            }
            let Some(value) = plan.payload else { continue };
            if f.list {
                let items = self.list_items(f, value)?;
                w.write_u16(items.len() as u16).map_err(|e| e.in_field(&f.name))?;
                for item in items {
                    f.kind.write_element(&f.name, item, w)?;
                }
            } else {
                f.kind.write_element(&f.name, value, w)?;
            }
        }
        Ok(())
    }

    fn list_items<'v>(&self, f: &CompiledField, value: &'v Value) -> Result<&'v [Value], WriteError> {
        let items = value.as_array().ok_or_else(|| {
            WriteError::Malformed(format!("field `{}`: expected a list value", f.name))
        })?;
        if items.len() > u16::MAX as usize {
            return Err(WriteError::OutOfRange(format!(
                "field `{}`: list length {} exceeds the u16 count prefix",
                f.name,
                items.len()
            )));
        }
        Ok(items)
    }
}

struct FieldPlan<'a> {
    present: bool,
    payload: Option<&'a Value>,
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    Visiting,
    Visited,
}

/// Depth-first topological sort over the dependency relation. Fields with no
/// dependencies keep their declaration order; a back edge is a cycle.
fn topo_order(
    fields: &[Field],
    decl_index: &HashMap<String, usize>,
) -> Result<Vec<usize>, CompileError> {
    fn visit(
        i: usize,
        fields: &[Field],
        decl_index: &HashMap<String, usize>,
        marks: &mut [Mark],
        order: &mut Vec<usize>,
    ) -> Result<(), CompileError> {
        match marks[i] {
            Mark::Visited => return Ok(()),
            Mark::Visiting => {
                return Err(CompileError::CircularDependency {
                    field: fields[i].name.clone(),
                })
            }
            Mark::Unvisited => {}
        }
        marks[i] = Mark::Visiting;
        for dep in &fields[i].dependencies {
            visit(decl_index[dep], fields, decl_index, marks, order)?;
        }
        marks[i] = Mark::Visited;
        order.push(i);
        Ok(())
    }

    let mut marks = vec![Mark::Unvisited; fields.len()];
    let mut order = Vec::with_capacity(fields.len());
    for i in 0..fields.len() {
        visit(i, fields, decl_index, &mut marks, &mut order)?;
    }
    Ok(order)
}

fn static_bit_length(fields: &[CompiledField], metadata: &Metadata) -> u64 {
    let mut bits: u64 = if metadata.prefix.is_some() { 8 } else { 0 };
    for f in fields {
        if f.optional {
            bits += 1;
        }
        if f.optional || !f.deps.is_empty() {
            continue;
        }
        if f.list {
            bits += 16;
            continue;
        }
        bits += match &f.kind {
            CompiledKind::Boolean => 1,
            CompiledKind::Integer { bits: b, .. } => *b as u64,
            CompiledKind::Float16 { .. } => 16,
            CompiledKind::Float32 { .. } => 32,
            CompiledKind::Float64 { .. } => 64,
            CompiledKind::Str { include_size, .. } | CompiledKind::Blob { include_size, .. } => {
                if *include_size {
                    16
                } else {
                    0
                }
            }
        };
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::Endian;
    use crate::field::{BlobSpec, BooleanSpec, FloatSpec, IntegerSpec, StringSpec};

    fn bool_field(name: &str) -> Field {
        Field::new(name, FieldKind::Boolean(BooleanSpec::default()))
    }

    fn int_field(name: &str, bits: u32) -> Field {
        Field::new(
            name,
            FieldKind::Integer(IntegerSpec {
                bits,
                ..Default::default()
            }),
        )
    }

    fn record(entries: &[(&str, Value)]) -> Record {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_three_booleans_share_a_byte() {
        let schema = Schema::compile(
            &[bool_field("a"), bool_field("b"), bool_field("c")],
            Metadata::default(),
        )
        .unwrap();
        let rec = record(&[
            ("a", Value::Bool(true)),
            ("b", Value::Bool(false)),
            ("c", Value::Bool(true)),
        ]);
        let bytes = schema.encode(&rec).unwrap();
        assert_eq!(bytes, vec![0b00000101]);
        assert_eq!(schema.decode(&bytes).unwrap(), rec);
    }

    #[test]
    fn test_twelve_bit_integer() {
        let schema = Schema::compile(&[int_field("n", 12)], Metadata::default()).unwrap();
        let rec = record(&[("n", Value::Int(0x123))]);
        let bytes = schema.encode(&rec).unwrap();
        assert_eq!(bytes, vec![0x23, 0x01]);
        assert_eq!(schema.decode(&bytes).unwrap(), rec);
    }

    #[test]
    fn test_string_with_size_prefix() {
        let schema = Schema::compile(
            &[Field::new("name", FieldKind::String(StringSpec::default()))],
            Metadata::default(),
        )
        .unwrap();
        let rec = record(&[("name", Value::Str("Hi".to_string()))]);
        let bytes = schema.encode(&rec).unwrap();
        assert_eq!(bytes, vec![0x02, 0x00, 0x48, 0x69]);
        assert_eq!(schema.decode(&bytes).unwrap(), rec);
    }

    #[test]
    fn test_integer_list() {
        let schema = Schema::compile(
            &[Field {
                list: true,
                ..int_field("xs", 8)
            }],
            Metadata::default(),
        )
        .unwrap();
        let rec = record(&[(
            "xs",
            Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        )]);
        let bytes = schema.encode(&rec).unwrap();
        assert_eq!(bytes, vec![0x03, 0x00, 0x01, 0x02, 0x03]);
        assert_eq!(schema.decode(&bytes).unwrap(), rec);
    }

    #[test]
    fn test_empty_list() {
        let schema = Schema::compile(
            &[Field {
                list: true,
                ..int_field("xs", 8)
            }],
            Metadata::default(),
        )
        .unwrap();
        let rec = record(&[("xs", Value::Array(vec![]))]);
        let bytes = schema.encode(&rec).unwrap();
        assert_eq!(bytes, vec![0x00, 0x00]);
        assert_eq!(schema.decode(&bytes).unwrap(), rec);
    }

    #[test]
    fn test_dependency_gate_closed() {
        let schema = Schema::compile(
            &[
                bool_field("f"),
                Field {
                    dependencies: vec!["f".to_string()],
                    ..Field::new("p", FieldKind::String(StringSpec::default()))
                },
            ],
            Metadata::default(),
        )
        .unwrap();
        let rec = record(&[("f", Value::Bool(false))]);
        let bytes = schema.encode(&rec).unwrap();
        assert_eq!(bytes, vec![0b00000000]);
        assert_eq!(schema.decode(&bytes).unwrap(), rec);
    }

    #[test]
    fn test_dependency_gate_open() {
        let schema = Schema::compile(
            &[
                bool_field("f"),
                Field {
                    dependencies: vec!["f".to_string()],
                    ..int_field("n", 8)
                },
            ],
            Metadata::default(),
        )
        .unwrap();
        let rec = record(&[("f", Value::Bool(true)), ("n", Value::Int(9))]);
        let bytes = schema.encode(&rec).unwrap();
        // flag at bit 0, then the integer sharing the bit run
        assert_eq!(bytes, vec![0b00010011, 0b00000000]);
        assert_eq!(schema.decode(&bytes).unwrap(), rec);
    }

    #[test]
    fn test_gated_value_ignored_when_gate_closed() {
        let schema = Schema::compile(
            &[
                bool_field("flag"),
                Field {
                    dependencies: vec!["flag".to_string()],
                    ..int_field("n", 8)
                },
            ],
            Metadata::default(),
        )
        .unwrap();
        let without = schema
            .encode(&record(&[("flag", Value::Bool(false))]))
            .unwrap();
        let with = schema
            .encode(&record(&[("flag", Value::Bool(false)), ("n", Value::Int(0))]))
            .unwrap();
        assert_eq!(without.len(), with.len());
        assert_eq!(schema.decode(&with).unwrap(), record(&[("flag", Value::Bool(false))]));
    }

    #[test]
    fn test_prefix_and_bit_fields() {
        let schema = Schema::compile(
            &[int_field("t", 4), bool_field("flag")],
            Metadata {
                prefix: Some(0x42),
                repeated: false,
            },
        )
        .unwrap();
        let rec = record(&[("t", Value::Int(5)), ("flag", Value::Bool(true))]);
        let bytes = schema.encode(&rec).unwrap();
        assert_eq!(bytes, vec![0x42, 0b00010101]);
        assert_eq!(schema.decode(&bytes).unwrap(), rec);
    }

    #[test]
    fn test_prefix_mismatch() {
        let schema = Schema::compile(
            &[bool_field("a")],
            Metadata {
                prefix: Some(0x42),
                repeated: false,
            },
        )
        .unwrap();
        assert!(matches!(
            schema.decode(&[0x43, 0x01]),
            Err(ReadError::Malformed(_))
        ));
    }

    #[test]
    fn test_seven_one_bit_fields_fit_one_byte() {
        let fields: Vec<Field> = (0..7).map(|i| int_field(&format!("b{i}"), 1)).collect();
        let schema = Schema::compile(&fields, Metadata::default()).unwrap();
        let rec: Record = (0..7)
            .map(|i| (format!("b{i}"), Value::Int(i64::from(i % 2))))
            .collect();
        let bytes = schema.encode(&rec).unwrap();
        assert_eq!(bytes.len(), 1);
        assert_eq!(schema.decode(&bytes).unwrap(), rec);
    }

    #[test]
    fn test_optional_field_presence() {
        let schema = Schema::compile(
            &[Field {
                optional: true,
                ..int_field("n", 8)
            }],
            Metadata::default(),
        )
        .unwrap();

        let bytes = schema.encode(&Record::new()).unwrap();
        assert_eq!(bytes, vec![0x00]);
        assert_eq!(schema.decode(&bytes).unwrap(), Record::new());

        let rec = record(&[("n", Value::Int(7))]);
        let bytes = schema.encode(&rec).unwrap();
        // presence bit, then 8 bits of payload sharing the run
        assert_eq!(bytes, vec![0b00001111, 0b00000000]);
        assert_eq!(schema.decode(&bytes).unwrap(), rec);
    }

    #[test]
    fn test_default_materialized_on_both_sides() {
        let schema = Schema::compile(
            &[Field::new(
                "n",
                FieldKind::Integer(IntegerSpec {
                    bits: 8,
                    default: Some(42),
                    ..Default::default()
                }),
            )],
            Metadata::default(),
        )
        .unwrap();
        let bytes = schema.encode(&Record::new()).unwrap();
        assert_eq!(bytes, vec![42]);
        assert_eq!(schema.decode(&bytes).unwrap(), record(&[("n", Value::Int(42))]));
    }

    #[test]
    fn test_default_filled_when_gated_out() {
        let schema = Schema::compile(
            &[
                bool_field("flag"),
                Field {
                    dependencies: vec!["flag".to_string()],
                    ..Field::new(
                        "n",
                        FieldKind::Integer(IntegerSpec {
                            bits: 8,
                            default: Some(5),
                            ..Default::default()
                        }),
                    )
                },
            ],
            Metadata::default(),
        )
        .unwrap();
        let bytes = schema.encode(&record(&[("flag", Value::Bool(false))])).unwrap();
        assert_eq!(
            schema.decode(&bytes).unwrap(),
            record(&[("flag", Value::Bool(false)), ("n", Value::Int(5))])
        );
    }

    #[test]
    fn test_missing_required_field() {
        let schema = Schema::compile(&[int_field("n", 8)], Metadata::default()).unwrap();
        assert_eq!(
            schema.encode(&Record::new()),
            Err(WriteError::MissingField("n".to_string()))
        );
    }

    #[test]
    fn test_out_of_range_value() {
        let schema = Schema::compile(
            &[Field::new(
                "n",
                FieldKind::Integer(IntegerSpec {
                    bits: 8,
                    max: Some(10),
                    ..Default::default()
                }),
            )],
            Metadata::default(),
        )
        .unwrap();
        assert!(matches!(
            schema.encode(&record(&[("n", Value::Int(11))])),
            Err(WriteError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_pattern_mismatch() {
        let schema = Schema::compile(
            &[Field::new(
                "id",
                FieldKind::String(StringSpec {
                    pattern: Some("^[a-z]+$".to_string()),
                    ..Default::default()
                }),
            )],
            Metadata::default(),
        )
        .unwrap();
        assert!(matches!(
            schema.encode(&record(&[("id", Value::Str("No1".to_string()))])),
            Err(WriteError::Malformed(_))
        ));
    }

    #[test]
    fn test_circular_dependency_rejected() {
        let fields = vec![
            Field {
                dependencies: vec!["b".to_string()],
                ..bool_field("a")
            },
            Field {
                dependencies: vec!["a".to_string()],
                ..bool_field("b")
            },
        ];
        assert_eq!(
            Schema::compile(&fields, Metadata::default()).unwrap_err(),
            CompileError::CircularDependency {
                field: "a".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let fields = vec![Field {
            dependencies: vec!["ghost".to_string()],
            ..int_field("n", 8)
        }];
        assert!(matches!(
            Schema::compile(&fields, Metadata::default()),
            Err(CompileError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn test_non_boolean_dependency_rejected() {
        let fields = vec![
            int_field("n", 8),
            Field {
                dependencies: vec!["n".to_string()],
                ..bool_field("b")
            },
        ];
        assert!(matches!(
            Schema::compile(&fields, Metadata::default()),
            Err(CompileError::NonBooleanDependency { .. })
        ));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let fields = vec![int_field("n", 8), int_field("n", 4)];
        assert!(matches!(
            Schema::compile(&fields, Metadata::default()),
            Err(CompileError::DuplicateField { .. })
        ));
    }

    #[test]
    fn test_fields_reordered_after_dependencies() {
        let fields = vec![
            Field {
                dependencies: vec!["flag".to_string()],
                ..int_field("n", 8)
            },
            bool_field("flag"),
        ];
        let schema = Schema::compile(&fields, Metadata::default()).unwrap();
        assert_eq!(schema.field_index("flag"), Some(0));
        assert_eq!(schema.field_index("n"), Some(1));
    }

    #[test]
    fn test_static_bit_length() {
        let schema = Schema::compile(
            &[
                bool_field("a"),
                Field {
                    optional: true,
                    ..int_field("b", 8)
                },
                Field::new("c", FieldKind::String(StringSpec::default())),
                Field {
                    list: true,
                    ..int_field("d", 4)
                },
            ],
            Metadata {
                prefix: Some(1),
                repeated: false,
            },
        )
        .unwrap();
        // prefix 8 + a 1 + b presence 1 + c size prefix 16 + d count 16
        assert_eq!(schema.static_bit_length(), 42);
    }

    #[test]
    fn test_encoded_size_never_below_static_floor() {
        let schema = Schema::compile(
            &[
                bool_field("a"),
                Field {
                    optional: true,
                    ..int_field("b", 8)
                },
                Field::new("c", FieldKind::String(StringSpec::default())),
            ],
            Metadata::default(),
        )
        .unwrap();
        let floor = schema.static_bit_length().div_ceil(8) as usize;
        let minimal = schema
            .encode(&record(&[
                ("a", Value::Bool(false)),
                ("c", Value::Str(String::new())),
            ]))
            .unwrap();
        assert!(minimal.len() >= floor);
    }

    #[test]
    fn test_round_trip_mixed_schema() {
        let schema = Schema::compile(
            &[
                bool_field("on"),
                Field::new(
                    "temp",
                    FieldKind::Integer(IntegerSpec {
                        bits: 11,
                        signed: true,
                        ..Default::default()
                    }),
                ),
                Field::new("ratio", FieldKind::Float32(FloatSpec::default())),
                Field::new("mass", FieldKind::Float64(FloatSpec::default())),
                Field {
                    optional: true,
                    ..Field::new("tag", FieldKind::String(StringSpec::default()))
                },
                Field::new("payload", FieldKind::Blob(BlobSpec::default())),
                Field {
                    list: true,
                    ..Field::new(
                        "samples",
                        FieldKind::Integer(IntegerSpec {
                            bits: 6,
                            ..Default::default()
                        }),
                    )
                },
            ],
            Metadata::default(),
        )
        .unwrap();
        let rec = record(&[
            ("on", Value::Bool(true)),
            ("temp", Value::Int(-273)),
            ("ratio", Value::Float(0.5)),
            ("mass", Value::Float(12.25)),
            ("tag", Value::Str("θ-probe".to_string())),
            ("payload", Value::Bytes(vec![0xDE, 0xAD])),
            (
                "samples",
                Value::Array(vec![Value::Int(0), Value::Int(33), Value::Int(63)]),
            ),
        ]);
        let bytes = schema.encode(&rec).unwrap();
        assert_eq!(schema.decode(&bytes).unwrap(), rec);
    }

    #[test]
    fn test_float16_quantizes_on_the_wire() {
        let schema = Schema::compile(
            &[Field::new("h", FieldKind::Float16(FloatSpec::default()))],
            Metadata::default(),
        )
        .unwrap();
        let bytes = schema.encode(&record(&[("h", Value::Float(1.5))])).unwrap();
        assert_eq!(bytes, vec![0x00, 0x3E]);
        assert_eq!(
            schema.decode(&bytes).unwrap(),
            record(&[("h", Value::Float(1.5))])
        );
    }

    #[test]
    fn test_encode_into_external_writer() {
        let schema = Schema::compile(&[int_field("n", 16)], Metadata::default()).unwrap();
        let rec = record(&[("n", Value::Int(0x0123))]);

        let mut w = BitWriter::new(0);
        w.write_u8(0xEE).unwrap();
        let written = schema.encode_into(&rec, &mut w).unwrap();
        assert_eq!(written, 2);
        assert_eq!(w.bytes(), &[0xEE, 0x23, 0x01]);

        let mut big = BitWriter::with_endian(0, Endian::Big);
        schema.encode_into(&rec, &mut big).unwrap();
        assert_eq!(big.bytes(), &[0x01, 0x23]);
    }

    #[test]
    fn test_encode_into_fixed_writer_overflow() {
        let schema = Schema::compile(&[int_field("n", 32)], Metadata::default()).unwrap();
        let mut w = BitWriter::new(2);
        assert!(matches!(
            schema.encode_into(&record(&[("n", Value::Int(1))]), &mut w),
            Err(WriteError::Overflow { .. })
        ));
    }

    #[test]
    fn test_truncated_input_underflow() {
        let schema = Schema::compile(&[int_field("n", 32)], Metadata::default()).unwrap();
        assert!(matches!(
            schema.decode(&[0x01, 0x02]),
            Err(ReadError::Underflow { .. })
        ));
    }

    #[test]
    fn test_define_schemas() {
        let table = vec![
            (
                "point".to_string(),
                SchemaDecl {
                    fields: vec![int_field("x", 8), int_field("y", 8)],
                    metadata: Metadata::default(),
                },
            ),
            (
                "flags".to_string(),
                SchemaDecl {
                    fields: vec![bool_field("a"), bool_field("b")],
                    metadata: Metadata::default(),
                },
            ),
        ];
        let schemas = define_schemas(table).unwrap();
        assert_eq!(schemas.len(), 2);
        let bytes = schemas["point"]
            .encode(&record(&[("x", Value::Int(1)), ("y", Value::Int(2))]))
            .unwrap();
        assert_eq!(bytes, vec![0x01, 0x02]);
    }
}
