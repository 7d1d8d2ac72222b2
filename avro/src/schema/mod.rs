// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Logic for parsing and interacting with schemas in Avro format.

mod name;
mod parser;
mod record;
mod resolve;
mod union;

pub use name::{Aliases, Name, Names, Namespace};
pub use record::{RecordField, RecordSchema};
pub use resolve::ResolvedSchema;
pub(crate) use resolve::deref;
pub use union::UnionSchema;

use crate::{
    AvroResult,
    default::validate_default,
    error::{Details, Error},
    validator::validate_enum_symbol_name,
};
use bon::bon;
use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashSet};
use strum_macros::EnumDiscriminants;

/// Represents any valid Avro schema
/// More information about Avro schemas can be found in the
/// [Avro Specification](https://avro.apache.org/docs/++version++/specification/#schema-declaration)
#[derive(Clone, Debug, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(SchemaKind), derive(Hash, Ord, PartialOrd))]
pub enum Schema {
    /// A `null` Avro schema.
    Null,
    /// A `boolean` Avro schema.
    Boolean,
    /// An `int` Avro schema.
    Int,
    /// A `long` Avro schema.
    Long,
    /// A `float` Avro schema.
    Float,
    /// A `double` Avro schema.
    Double,
    /// A `bytes` Avro schema.
    Bytes,
    /// A `string` Avro schema.
    String,
    /// An `array` Avro schema. All items have the same schema.
    Array(ArraySchema),
    /// A `map` Avro schema. Keys are always strings.
    Map(MapSchema),
    /// A `union` Avro schema.
    Union(UnionSchema),
    /// A `record` Avro schema.
    Record(RecordSchema),
    /// An `enum` Avro schema.
    Enum(EnumSchema),
    /// A `fixed` Avro schema.
    Fixed(FixedSchema),
    /// Logical type which represents `Decimal` values over `bytes` or `fixed`.
    Decimal(DecimalSchema),
    /// A universally unique identifier, annotating a `string` or a `fixed` of size 16.
    Uuid(UuidSchema),
    /// The number of days since the unix epoch, over `int`.
    Date,
    /// The time of day in milliseconds after midnight, over `int`.
    TimeMillis,
    /// The time of day in microseconds after midnight, over `long`.
    TimeMicros,
    /// An instant as the number of milliseconds after the unix epoch, over `long`.
    TimestampMillis,
    /// An instant as the number of microseconds after the unix epoch, over `long`.
    TimestampMicros,
    /// A reference to a named schema defined elsewhere in the same tree.
    Ref { name: Name },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArraySchema {
    pub items: Box<Schema>,
    pub attributes: BTreeMap<String, JsonValue>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MapSchema {
    pub values: Box<Schema>,
    pub attributes: BTreeMap<String, JsonValue>,
}

/// A description of an Enum schema.
#[derive(bon::Builder, Clone, Debug, PartialEq)]
pub struct EnumSchema {
    /// The name of the schema
    pub name: Name,
    /// The aliases of the schema
    #[builder(default)]
    pub aliases: Aliases,
    /// The documentation of the schema
    pub doc: Option<String>,
    /// The symbols, their position is the encoded ordinal
    pub symbols: Vec<String>,
    /// The symbol readers fall back to when the writer's symbol is unknown to them
    pub default: Option<String>,
    #[builder(default)]
    pub attributes: BTreeMap<String, JsonValue>,
}

impl EnumSchema {
    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }
}

/// A description of a Fixed schema.
#[derive(bon::Builder, Clone, Debug, PartialEq)]
pub struct FixedSchema {
    /// The name of the schema
    pub name: Name,
    /// The aliases of the schema
    #[builder(default)]
    pub aliases: Aliases,
    /// The documentation of the schema
    pub doc: Option<String>,
    /// The size of the fixed schema
    pub size: usize,
    #[builder(default)]
    pub attributes: BTreeMap<String, JsonValue>,
}

/// A description of a Decimal schema.
///
/// `scale` defaults to 0 and is at most `precision`, which is strictly positive.
#[derive(Clone, Debug, PartialEq)]
pub struct DecimalSchema {
    /// The number of digits in the unscaled value
    pub precision: usize,
    /// The number of digits to the right of the decimal point
    pub scale: usize,
    /// The physical schema of the decimal
    pub inner: InnerDecimalSchema,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InnerDecimalSchema {
    Bytes,
    Fixed(FixedSchema),
}

impl TryFrom<Schema> for InnerDecimalSchema {
    type Error = Error;

    fn try_from(value: Schema) -> Result<Self, Self::Error> {
        match value {
            Schema::Bytes => Ok(InnerDecimalSchema::Bytes),
            Schema::Fixed(fixed) => Ok(InnerDecimalSchema::Fixed(fixed)),
            _ => Err(Details::ResolveDecimalSchema(value.kind()).into()),
        }
    }
}

/// The physical schema of the Uuid type.
#[derive(Clone, Debug, PartialEq)]
pub enum UuidSchema {
    /// The hyphenated textual form in a [`Schema::String`].
    String,
    /// The 16 raw bytes in a [`Schema::Fixed`].
    Fixed(FixedSchema),
}

/// Maximum number of decimal digits a two's complement integer of `len` bytes can hold.
pub(crate) fn max_prec_for_len(len: usize) -> usize {
    let bits = i32::try_from(len)
        .ok()
        .and_then(|len| len.checked_mul(8))
        .unwrap_or(i32::MAX);
    (2.0_f64.powi(bits - 1) - 1.0).log10().floor() as usize
}

impl SchemaKind {
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            SchemaKind::Null
                | SchemaKind::Boolean
                | SchemaKind::Int
                | SchemaKind::Long
                | SchemaKind::Double
                | SchemaKind::Float
                | SchemaKind::Bytes
                | SchemaKind::String,
        )
    }
}

#[bon]
impl Schema {
    /// Returns a `Schema::Array` with the given items and optional custom attributes.
    #[builder(finish_fn = build)]
    pub fn array(
        #[builder(start_fn)] items: Schema,
        #[builder(default)] attributes: BTreeMap<String, JsonValue>,
    ) -> Self {
        Schema::Array(ArraySchema {
            items: Box::new(items),
            attributes,
        })
    }

    /// Returns a `Schema::Map` with the given value schema and optional custom attributes.
    #[builder(finish_fn = build)]
    pub fn map(
        #[builder(start_fn)] values: Schema,
        #[builder(default)] attributes: BTreeMap<String, JsonValue>,
    ) -> Self {
        Schema::Map(MapSchema {
            values: Box::new(values),
            attributes,
        })
    }

    /// Returns a validated `Schema::Record`.
    ///
    /// Field positions are assigned from the order of `fields`; field names must be unique and
    /// every field default must resolve against the field's schema.
    #[builder(finish_fn = build)]
    pub fn record(
        #[builder(start_fn)] name: Name,
        #[builder(default)] fields: Vec<RecordField>,
        aliases: Option<Vec<Name>>,
        doc: Option<String>,
        #[builder(default)] attributes: BTreeMap<String, JsonValue>,
    ) -> AvroResult<Self> {
        RecordSchema::new(name, aliases, doc, fields, attributes).map(Schema::Record)
    }

    /// Returns a validated `Schema::Enum`.
    #[builder(finish_fn = build)]
    pub fn r#enum(
        #[builder(start_fn)] name: Name,
        #[builder(start_fn)] symbols: Vec<impl Into<String>>,
        aliases: Option<Vec<Name>>,
        doc: Option<String>,
        default: Option<String>,
        #[builder(default)] attributes: BTreeMap<String, JsonValue>,
    ) -> AvroResult<Self> {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        let mut seen = HashSet::with_capacity(symbols.len());
        for symbol in &symbols {
            validate_enum_symbol_name(symbol)?;
            if !seen.insert(symbol.as_str()) {
                return Err(Details::EnumSymbolDuplicate(symbol.clone()).into());
            }
        }
        if let Some(default) = &default
            && !seen.contains(default.as_str())
        {
            return Err(Details::EnumDefaultNotSymbol {
                symbol: default.clone(),
                symbols,
            }
            .into());
        }
        Ok(Schema::Enum(EnumSchema {
            name,
            aliases,
            doc,
            symbols,
            default,
            attributes,
        }))
    }

    /// Returns a validated `Schema::Fixed`.
    #[builder(finish_fn = build)]
    pub fn fixed(
        #[builder(start_fn)] name: Name,
        #[builder(start_fn)] size: usize,
        aliases: Option<Vec<Name>>,
        doc: Option<String>,
        #[builder(default)] attributes: BTreeMap<String, JsonValue>,
    ) -> AvroResult<Self> {
        if size == 0 {
            return Err(Details::FixedSizeNotPositive(name.to_string()).into());
        }
        Ok(Schema::Fixed(FixedSchema {
            name,
            aliases,
            doc,
            size,
            attributes,
        }))
    }

    /// Returns a validated `Schema::Decimal` over `inner`, which must be `bytes` or `fixed`.
    #[builder(finish_fn = build)]
    pub fn decimal(
        #[builder(start_fn)] precision: usize,
        #[builder(start_fn)] inner: Schema,
        #[builder(default)] scale: usize,
    ) -> AvroResult<Self> {
        let inner = InnerDecimalSchema::try_from(inner)?;
        if precision == 0 {
            return Err(Details::DecimalPrecisionMustBePositive { precision }.into());
        }
        if scale > precision {
            return Err(Details::DecimalPrecisionLessThanScale { precision, scale }.into());
        }
        if let InnerDecimalSchema::Fixed(fixed) = &inner
            && max_prec_for_len(fixed.size) < precision
        {
            return Err(Details::DecimalFixedTooSmall {
                size: fixed.size,
                precision,
            }
            .into());
        }
        Ok(Schema::Decimal(DecimalSchema {
            precision,
            scale,
            inner,
        }))
    }
}

impl Schema {
    /// Returns a validated `Schema::Union`.
    pub fn union(branches: Vec<Schema>) -> AvroResult<Self> {
        UnionSchema::new(branches).map(Schema::Union)
    }

    /// The canonical type tag of this schema.
    pub fn kind(&self) -> SchemaKind {
        SchemaKind::from(self)
    }

    /// The tag of the type this schema is physically encoded as.
    ///
    /// Logical types report their underlying type, everything else reports [`Self::kind`].
    pub fn physical_kind(&self) -> SchemaKind {
        match self {
            Schema::Date | Schema::TimeMillis => SchemaKind::Int,
            Schema::TimeMicros | Schema::TimestampMillis | Schema::TimestampMicros => {
                SchemaKind::Long
            }
            Schema::Decimal(DecimalSchema {
                inner: InnerDecimalSchema::Bytes,
                ..
            }) => SchemaKind::Bytes,
            Schema::Uuid(UuidSchema::String) => SchemaKind::String,
            Schema::Decimal(DecimalSchema {
                inner: InnerDecimalSchema::Fixed(_),
                ..
            })
            | Schema::Uuid(UuidSchema::Fixed(_)) => SchemaKind::Fixed,
            other => other.kind(),
        }
    }

    /// Returns whether the schema represents a named type according to the avro specification
    pub fn is_named(&self) -> bool {
        self.name().is_some()
    }

    /// Whether `null` is a legal value: the schema is `null` or a union with a `null` branch.
    pub fn is_nullable(&self) -> bool {
        match self {
            Schema::Null => true,
            Schema::Union(union) => union.is_nullable(),
            _ => false,
        }
    }

    /// Returns the name of the schema if it has one.
    pub fn name(&self) -> Option<&Name> {
        match self {
            Schema::Ref { name }
            | Schema::Record(RecordSchema { name, .. })
            | Schema::Enum(EnumSchema { name, .. })
            | Schema::Fixed(FixedSchema { name, .. })
            | Schema::Decimal(DecimalSchema {
                inner: InnerDecimalSchema::Fixed(FixedSchema { name, .. }),
                ..
            })
            | Schema::Uuid(UuidSchema::Fixed(FixedSchema { name, .. })) => Some(name),
            _ => None,
        }
    }

    /// Returns the aliases of the schema if it has ones.
    pub fn aliases(&self) -> Option<&Vec<Name>> {
        match self {
            Schema::Record(RecordSchema { aliases, .. })
            | Schema::Enum(EnumSchema { aliases, .. })
            | Schema::Fixed(FixedSchema { aliases, .. })
            | Schema::Decimal(DecimalSchema {
                inner: InnerDecimalSchema::Fixed(FixedSchema { aliases, .. }),
                ..
            })
            | Schema::Uuid(UuidSchema::Fixed(FixedSchema { aliases, .. })) => aliases.as_ref(),
            _ => None,
        }
    }

    /// Returns the doc of the schema if it has one.
    pub fn doc(&self) -> Option<&String> {
        match self {
            Schema::Record(RecordSchema { doc, .. })
            | Schema::Enum(EnumSchema { doc, .. })
            | Schema::Fixed(FixedSchema { doc, .. }) => doc.as_ref(),
            _ => None,
        }
    }

    /// Whether data written with `self` can be interpreted with `reader`.
    ///
    /// This is the structural check used to pick union branches: the physical tags are equal, a
    /// numeric or `string`/`bytes` promotion applies, or both sides are named types whose names
    /// match (directly, by simple name, or through one of the reader's aliases). It does not look
    /// inside records, so a match can still fail once the data is decoded.
    pub fn can_be_read_by(&self, reader: &Schema) -> bool {
        use SchemaKind as K;

        match (self, reader) {
            (Schema::Union(_), Schema::Union(_)) => return true,
            (_, Schema::Union(union)) => {
                return union.variants().iter().any(|b| self.can_be_read_by(b));
            }
            (Schema::Union(union), _) => {
                return union.variants().iter().any(|b| b.can_be_read_by(reader));
            }
            _ => {}
        }

        if let (Some(writer_name), Some(reader_name)) = (self.name(), reader.name()) {
            let kinds_agree = matches!(self, Schema::Ref { .. })
                || matches!(reader, Schema::Ref { .. })
                || self.physical_kind() == reader.physical_kind();
            return kinds_agree && names_match(writer_name, reader_name, reader.aliases());
        }

        match (self.physical_kind(), reader.physical_kind()) {
            (w, r) if w == r => !matches!(w, K::Record | K::Enum | K::Fixed | K::Ref),
            (K::Int, K::Long | K::Float | K::Double)
            | (K::Long, K::Float | K::Double)
            | (K::Float, K::Double)
            | (K::String, K::Bytes)
            | (K::Bytes, K::String) => true,
            _ => false,
        }
    }
}

/// Whether a writer type named `writer` may be read as the reader type named `reader`.
pub(crate) fn names_match(writer: &Name, reader: &Name, reader_aliases: Option<&Vec<Name>>) -> bool {
    writer == reader
        || writer.name == reader.name
        || reader_aliases.is_some_and(|aliases| aliases.iter().any(|a| a == writer))
}

/// Entries shared by every named type, in the order Avro JSON usually lists them.
fn named_entries<M: SerializeMap>(
    map: &mut M,
    kind: &str,
    name: &Name,
    aliases: &Aliases,
    doc: Option<&String>,
) -> Result<(), M::Error> {
    map.serialize_entry("type", kind)?;
    if let Some(namespace) = &name.namespace {
        map.serialize_entry("namespace", namespace)?;
    }
    map.serialize_entry("name", &name.name)?;
    if let Some(doc) = doc {
        map.serialize_entry("doc", doc)?;
    }
    if let Some(aliases) = aliases {
        map.serialize_entry("aliases", aliases)?;
    }
    Ok(())
}

fn fixed_entries<M: SerializeMap>(map: &mut M, fixed: &FixedSchema) -> Result<(), M::Error> {
    named_entries(map, "fixed", &fixed.name, &fixed.aliases, fixed.doc.as_ref())?;
    map.serialize_entry("size", &fixed.size)?;
    custom_entries(map, &fixed.attributes)
}

fn logical_entries<M: SerializeMap>(
    map: &mut M,
    physical: &str,
    logical_type: &str,
) -> Result<(), M::Error> {
    map.serialize_entry("type", physical)?;
    map.serialize_entry("logicalType", logical_type)
}

fn custom_entries<M: SerializeMap>(
    map: &mut M,
    attributes: &BTreeMap<String, JsonValue>,
) -> Result<(), M::Error> {
    attributes
        .iter()
        .try_for_each(|(key, value)| map.serialize_entry(key, value))
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = match self {
            Schema::Ref { name } => return serializer.serialize_str(&name.fullname()),
            Schema::Null => return serializer.serialize_str("null"),
            Schema::Boolean => return serializer.serialize_str("boolean"),
            Schema::Int => return serializer.serialize_str("int"),
            Schema::Long => return serializer.serialize_str("long"),
            Schema::Float => return serializer.serialize_str("float"),
            Schema::Double => return serializer.serialize_str("double"),
            Schema::Bytes => return serializer.serialize_str("bytes"),
            Schema::String => return serializer.serialize_str("string"),
            Schema::Union(union) => {
                let mut seq = serializer.serialize_seq(Some(union.variants().len()))?;
                for branch in union.variants() {
                    seq.serialize_element(branch)?;
                }
                return seq.end();
            }
            _ => serializer.serialize_map(None)?,
        };

        match self {
            Schema::Array(array) => {
                map.serialize_entry("type", "array")?;
                map.serialize_entry("items", &array.items)?;
                custom_entries(&mut map, &array.attributes)?;
            }
            Schema::Map(values) => {
                map.serialize_entry("type", "map")?;
                map.serialize_entry("values", &values.values)?;
                custom_entries(&mut map, &values.attributes)?;
            }
            Schema::Record(record) => {
                named_entries(&mut map, "record", &record.name, &record.aliases, record.doc.as_ref())?;
                map.serialize_entry("fields", &record.fields)?;
                custom_entries(&mut map, &record.attributes)?;
            }
            Schema::Enum(e) => {
                named_entries(&mut map, "enum", &e.name, &e.aliases, e.doc.as_ref())?;
                map.serialize_entry("symbols", &e.symbols)?;
                if let Some(default) = &e.default {
                    map.serialize_entry("default", default)?;
                }
                custom_entries(&mut map, &e.attributes)?;
            }
            Schema::Fixed(fixed) => fixed_entries(&mut map, fixed)?,
            Schema::Decimal(decimal) => {
                match &decimal.inner {
                    InnerDecimalSchema::Fixed(fixed) => fixed_entries(&mut map, fixed)?,
                    InnerDecimalSchema::Bytes => map.serialize_entry("type", "bytes")?,
                }
                map.serialize_entry("logicalType", "decimal")?;
                map.serialize_entry("scale", &decimal.scale)?;
                map.serialize_entry("precision", &decimal.precision)?;
            }
            Schema::Uuid(uuid) => {
                match uuid {
                    UuidSchema::Fixed(fixed) => fixed_entries(&mut map, fixed)?,
                    UuidSchema::String => map.serialize_entry("type", "string")?,
                }
                map.serialize_entry("logicalType", "uuid")?;
            }
            Schema::Date => logical_entries(&mut map, "int", "date")?,
            Schema::TimeMillis => logical_entries(&mut map, "int", "time-millis")?,
            Schema::TimeMicros => logical_entries(&mut map, "long", "time-micros")?,
            Schema::TimestampMillis => logical_entries(&mut map, "long", "timestamp-millis")?,
            Schema::TimestampMicros => logical_entries(&mut map, "long", "timestamp-micros")?,
            // written as plain strings or sequences above
            Schema::Ref { .. }
            | Schema::Null
            | Schema::Boolean
            | Schema::Int
            | Schema::Long
            | Schema::Float
            | Schema::Double
            | Schema::Bytes
            | Schema::String
            | Schema::Union(_) => {}
        }
        map.end()
    }
}

impl RecordSchema {
    pub(crate) fn new(
        name: Name,
        aliases: Aliases,
        doc: Option<String>,
        mut fields: Vec<RecordField>,
        attributes: BTreeMap<String, JsonValue>,
    ) -> AvroResult<Self> {
        let mut lookup = BTreeMap::new();
        for (position, field) in fields.iter_mut().enumerate() {
            crate::validator::validate_record_field_name(&field.name)?;
            field.position = position;
            if lookup.insert(field.name.clone(), position).is_some() {
                return Err(Details::FieldNameDuplicate {
                    record: name.to_string(),
                    field: field.name.clone(),
                }
                .into());
            }
            if let Some(default) = &field.default {
                validate_default(&field.schema, default).map_err(|source| {
                    Details::GetDefaultRecordField {
                        field: field.name.clone(),
                        record: name.to_string(),
                        source,
                    }
                })?;
            }
        }
        Ok(RecordSchema {
            name,
            aliases,
            doc,
            fields,
            lookup,
            attributes,
        })
    }
}
