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

//! Decoding data written with one schema as values of another.
//!
//! The [`Resolver`] walks the writer and the reader schema side by side, as described in the
//! [schema resolution](https://avro.apache.org/docs/++version++/specification/#schema-resolution)
//! section of the Avro specification. Writer bytes drive the walk: every writer field is either
//! decoded into the reader field it corresponds to or skipped, and reader fields the writer does
//! not know receive their default.
//!
//! With a target [`Shape`] the produced values are additionally bound to it: record fields are
//! stored under the names of the shape members and logical values get the representation the
//! shape asks for.

pub(crate) mod plan;
pub mod skip;

use crate::{
    AvroResult,
    decode::{
        block::BlockReader, decode_bool, decode_bytes, decode_double, decode_fixed, decode_float,
        decode_int, decode_long, decode_string,
    },
    error::Details,
    resolution::plan::{FieldStep, PlanCache},
    schema::{
        DecimalSchema, EnumSchema, FixedSchema, InnerDecimalSchema, Names, RecordSchema, Schema,
        UuidSchema, deref, names_match,
    },
    shape::{RecordShape, Shape, ShapeRegistry},
    types::{Value, ValueKind},
};
use bigdecimal::BigDecimal;
use log::trace;
use num_bigint::BigInt;
use std::{collections::HashMap, io::Read, str::FromStr};
use uuid::Uuid;

/// Resolves values written with one schema against another.
///
/// A resolver is obtained from a [`Decoder`](crate::Decoder), which owns both schemas and the
/// plans compiled for their records.
pub struct Resolver<'a> {
    writer_names: &'a Names,
    reader_names: &'a Names,
    plans: &'a PlanCache,
    shapes: Option<&'a ShapeRegistry>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(
        writer_names: &'a Names,
        reader_names: &'a Names,
        plans: &'a PlanCache,
        shapes: Option<&'a ShapeRegistry>,
    ) -> Self {
        Self {
            writer_names,
            reader_names,
            plans,
            shapes,
        }
    }

    /// Read one value written with `writer` from `cursor` and interpret it with `reader`.
    ///
    /// Without a `shape` the value is shaped by the reader schema alone.
    pub fn resolve<R: Read>(
        &self,
        writer: &Schema,
        reader: &Schema,
        cursor: &mut R,
        shape: Option<&Shape>,
    ) -> AvroResult<Value> {
        let writer = deref(writer, self.writer_names)?;
        let reader = deref(reader, self.reader_names)?;
        // the nullable wrapper is kept until the written branch is known
        let shape = match shape {
            Some(shape) if !matches!(writer, Schema::Null | Schema::Union(_)) => {
                Some(self.target(shape)?)
            }
            shape => shape,
        };

        match (writer, reader) {
            (Schema::Union(union), _) => {
                let index = decode_long(cursor)?;
                let branch = usize::try_from(index)
                    .ok()
                    .and_then(|i| union.variants().get(i))
                    .ok_or(Details::GetUnionVariant {
                        index,
                        num_variants: union.variants().len(),
                    })?;
                self.resolve(branch, reader, cursor, shape)
            }
            (_, Schema::Union(union)) => {
                let (index, branch) = union
                    .find_reader_branch(writer)
                    .ok_or_else(|| Details::NoMatchingUnionBranch {
                        writer: writer.kind(),
                        branches: union.kinds(),
                    })?;
                let value = self.resolve(writer, branch, cursor, shape)?;
                Ok(Value::Union(index as u32, Box::new(value)))
            }
            (Schema::Record(w), Schema::Record(r)) => {
                check_names(writer, reader)?;
                self.resolve_record(w, r, cursor, shape)
            }
            (Schema::Enum(w), Schema::Enum(r)) => {
                check_names(writer, reader)?;
                let value = resolve_enum(w, r, cursor)?;
                conform(value, shape, self.shapes)
            }
            (Schema::Array(w), Schema::Array(r)) => {
                let items = element_shape(shape, ValueKind::Array)?;
                let mut values = Vec::new();
                let mut blocks = BlockReader::new();
                while blocks.next_item(cursor)? {
                    values.push(self.resolve(&w.items, &r.items, cursor, items)?);
                }
                Ok(Value::Array(values))
            }
            (Schema::Map(w), Schema::Map(r)) => {
                let values_shape = element_shape(shape, ValueKind::Map)?;
                let mut entries = HashMap::new();
                let mut blocks = BlockReader::new();
                while blocks.next_item(cursor)? {
                    let key = decode_string(cursor)?;
                    let value = self.resolve(&w.values, &r.values, cursor, values_shape)?;
                    entries.insert(key, value);
                }
                Ok(Value::Map(entries))
            }
            _ if is_composite(writer) || is_composite(reader) => Err(Details::SchemaMismatch {
                writer: writer.kind(),
                reader: reader.kind(),
            }
            .into()),
            _ => {
                let value = decode_physical(writer, cursor)?;
                let value = adapt(value, writer, reader)?;
                conform(value, shape, self.shapes)
            }
        }
    }

    /// Follow `shape` through the registry and through nullable wrappers.
    fn target<'s>(&'s self, mut shape: &'s Shape) -> AvroResult<&'s Shape> {
        loop {
            shape = match shape {
                Shape::Nullable(inner) => inner,
                Shape::Named(key) => match self.shapes {
                    Some(shapes) => shapes.resolve(shape)?,
                    None => return Err(Details::UnknownShape(key.clone()).into()),
                },
                other => return Ok(other),
            };
        }
    }

    /// Read exactly `items_count` array items, without block framing.
    pub fn resolve_array_items<R: Read>(
        &self,
        writer_items: &Schema,
        reader_items: &Schema,
        cursor: &mut R,
        shape: Option<&Shape>,
        items_count: usize,
    ) -> AvroResult<Vec<Value>> {
        (0..items_count)
            .map(|_| self.resolve(writer_items, reader_items, cursor, shape))
            .collect()
    }

    fn resolve_record<R: Read>(
        &self,
        writer: &RecordSchema,
        reader: &RecordSchema,
        cursor: &mut R,
        shape: Option<&Shape>,
    ) -> AvroResult<Value> {
        let record_shape = match shape {
            None => None,
            Some(Shape::Record(record)) => Some(record),
            Some(other) => {
                return Err(Details::ShapeMismatch {
                    value: ValueKind::Record,
                    shape: other.to_string(),
                }
                .into());
            }
        };
        let plan = self.plans.get_or_compile(
            writer,
            reader,
            record_shape,
            self.reader_names,
            self.shapes,
        )?;

        let mut slots: Vec<Option<Value>> = vec![None; plan.slots.len()];
        for step in &plan.steps {
            match *step {
                FieldStep::Read {
                    writer_field,
                    reader_field,
                    slot,
                    member,
                } => {
                    let field = &reader.fields[reader_field];
                    let member_shape = member.and_then(|m| member_shape(record_shape, m));
                    let value = self
                        .resolve(
                            &writer.fields[writer_field].schema,
                            &field.schema,
                            cursor,
                            member_shape,
                        )
                        .map_err(|e| e.in_field(&reader.name, &field.name))?;
                    slots[slot] = Some(value);
                }
                FieldStep::Skip { writer_field } => {
                    let field = &writer.fields[writer_field];
                    trace!("Skipping field {} of {}", field.name, writer.name);
                    skip::skip(&field.schema, cursor, self.writer_names)
                        .map_err(|e| e.in_field(&writer.name, &field.name))?;
                }
            }
        }
        for (slot, default) in &plan.defaults {
            slots[*slot].get_or_insert_with(|| default.clone());
        }

        let fields = plan
            .slots
            .iter()
            .zip(slots)
            .map(|(name, value)| {
                value
                    .map(|value| (name.clone(), value))
                    .ok_or_else(|| Details::GetField(name.clone()).into())
            })
            .collect::<AvroResult<Vec<_>>>()?;
        Ok(Value::Record(fields))
    }
}

fn member_shape(shape: Option<&RecordShape>, member: usize) -> Option<&Shape> {
    shape.and_then(|s| s.members.get(member)).map(|m| &m.shape)
}

/// The shape of the items of an array or of the values of a map.
fn element_shape(shape: Option<&Shape>, kind: ValueKind) -> AvroResult<Option<&Shape>> {
    match (shape, kind) {
        (None, _) => Ok(None),
        (Some(Shape::Array(items)), ValueKind::Array) => Ok(Some(items)),
        (Some(Shape::Map(values)), ValueKind::Map) => Ok(Some(values)),
        (Some(other), kind) => Err(Details::ShapeMismatch {
            value: kind,
            shape: other.to_string(),
        }
        .into()),
    }
}

fn is_composite(schema: &Schema) -> bool {
    matches!(
        schema,
        Schema::Record(_) | Schema::Enum(_) | Schema::Array(_) | Schema::Map(_)
    )
}

fn check_names(writer: &Schema, reader: &Schema) -> AvroResult<()> {
    match (writer.name(), reader.name()) {
        (Some(w), Some(r)) if !names_match(w, r, reader.aliases()) => {
            Err(Details::NameMismatch {
                writer: w.to_string(),
                reader: r.to_string(),
            }
            .into())
        }
        _ => Ok(()),
    }
}

fn resolve_enum<R: Read>(writer: &EnumSchema, reader: &EnumSchema, cursor: &mut R) -> AvroResult<Value> {
    let index = decode_int(cursor)?;
    let symbol = usize::try_from(index)
        .ok()
        .and_then(|i| writer.symbols.get(i))
        .ok_or_else(|| Details::EnumIndexOutOfRange {
            name: writer.name.to_string(),
            index: i64::from(index),
            num_symbols: writer.symbols.len(),
        })?;
    reader
        .index_of(symbol)
        .map(|i| (i, symbol))
        .or_else(|| {
            reader
                .default
                .as_ref()
                .and_then(|default| reader.index_of(default).map(|i| (i, default)))
        })
        .map(|(i, symbol)| Value::Enum(i as u32, symbol.clone()))
        .ok_or_else(|| {
            Details::EnumSymbolMissing {
                name: reader.name.to_string(),
                symbol: symbol.clone(),
            }
            .into()
        })
}

/// Decode a value of a non-composite schema in its physical representation.
fn decode_physical<R: Read>(schema: &Schema, cursor: &mut R) -> AvroResult<Value> {
    Ok(match schema {
        Schema::Null => Value::Null,
        Schema::Boolean => Value::Boolean(decode_bool(cursor)?),
        Schema::Int | Schema::Date | Schema::TimeMillis => Value::Int(decode_int(cursor)?),
        Schema::Long
        | Schema::TimeMicros
        | Schema::TimestampMillis
        | Schema::TimestampMicros => Value::Long(decode_long(cursor)?),
        Schema::Float => Value::Float(decode_float(cursor)?),
        Schema::Double => Value::Double(decode_double(cursor)?),
        Schema::Bytes
        | Schema::Decimal(DecimalSchema {
            inner: InnerDecimalSchema::Bytes,
            ..
        }) => Value::Bytes(decode_bytes(cursor)?),
        Schema::String | Schema::Uuid(UuidSchema::String) => Value::String(decode_string(cursor)?),
        Schema::Fixed(FixedSchema { size, .. })
        | Schema::Decimal(DecimalSchema {
            inner: InnerDecimalSchema::Fixed(FixedSchema { size, .. }),
            ..
        })
        | Schema::Uuid(UuidSchema::Fixed(FixedSchema { size, .. })) => {
            Value::Fixed(*size, decode_fixed(cursor, *size)?)
        }
        // unions, refs and composites are handled by the resolver
        other => {
            return Err(Details::SchemaMismatch {
                writer: other.kind(),
                reader: other.kind(),
            }
            .into());
        }
    })
}

/// Convert a physical writer value into the value the reader schema asks for.
fn adapt(value: Value, writer: &Schema, reader: &Schema) -> AvroResult<Value> {
    use crate::schema::SchemaKind as K;

    let mismatch = || -> crate::Error {
        Details::SchemaMismatch {
            writer: writer.kind(),
            reader: reader.kind(),
        }
        .into()
    };

    if let (K::Fixed, K::Fixed) = (writer.physical_kind(), reader.physical_kind()) {
        check_names(writer, reader)?;
        let (Value::Fixed(size, _), Some(expected)) = (&value, fixed_size(reader)) else {
            return Err(mismatch());
        };
        if *size != expected {
            return Err(Details::FixedSizeMismatch {
                writer: *size,
                reader: expected,
            }
            .into());
        }
    }

    Ok(match (value, reader) {
        (Value::Null, Schema::Null) => Value::Null,
        (Value::Boolean(b), Schema::Boolean) => Value::Boolean(b),

        (Value::Int(i), Schema::Int) => Value::Int(i),
        (Value::Int(i), Schema::Long) => Value::Long(i64::from(i)),
        (Value::Int(i), Schema::Float) => Value::Float(i as f32),
        (Value::Int(i), Schema::Double) => Value::Double(f64::from(i)),
        (Value::Int(i), Schema::Date) => Value::Date(i),
        (Value::Int(i), Schema::TimeMillis) => Value::TimeMillis(i),

        (Value::Long(i), Schema::Long) => Value::Long(i),
        (Value::Long(i), Schema::Float) => Value::Float(i as f32),
        (Value::Long(i), Schema::Double) => Value::Double(i as f64),
        (Value::Long(i), Schema::TimeMicros) => Value::TimeMicros(i),
        (Value::Long(i), Schema::TimestampMillis) => Value::TimestampMillis(i),
        (Value::Long(i), Schema::TimestampMicros) => Value::TimestampMicros(i),

        (Value::Float(x), Schema::Float) => Value::Float(x),
        (Value::Float(x), Schema::Double) => Value::Double(f64::from(x)),
        (Value::Double(x), Schema::Double) => Value::Double(x),

        (Value::Bytes(b), Schema::Bytes) => Value::Bytes(b),
        (Value::Bytes(b), Schema::String) => {
            Value::String(String::from_utf8(b).map_err(Details::ConvertToUtf8)?)
        }
        (Value::String(s), Schema::String) => Value::String(s),
        (Value::String(s), Schema::Bytes) => Value::Bytes(s.into_bytes()),
        (Value::String(s), Schema::Uuid(UuidSchema::String)) => Value::Uuid(parse_uuid(s)?),

        (
            Value::Bytes(b),
            Schema::Decimal(DecimalSchema {
                scale,
                inner: InnerDecimalSchema::Bytes,
                ..
            }),
        )
        | (
            Value::Fixed(_, b),
            Schema::Decimal(DecimalSchema {
                scale,
                inner: InnerDecimalSchema::Fixed(_),
                ..
            }),
        ) => Value::Decimal(decimal_from_bytes(&b, *scale)),

        (Value::Fixed(size, b), Schema::Fixed(_)) => Value::Fixed(size, b),
        (Value::Fixed(_, b), Schema::Uuid(UuidSchema::Fixed(_))) => Value::Uuid(uuid_from_bytes(&b)?),

        _ => return Err(mismatch()),
    })
}

fn fixed_size(schema: &Schema) -> Option<usize> {
    match schema {
        Schema::Fixed(FixedSchema { size, .. })
        | Schema::Decimal(DecimalSchema {
            inner: InnerDecimalSchema::Fixed(FixedSchema { size, .. }),
            ..
        })
        | Schema::Uuid(UuidSchema::Fixed(FixedSchema { size, .. })) => Some(*size),
        _ => None,
    }
}

fn parse_uuid(s: String) -> AvroResult<Uuid> {
    Uuid::parse_str(&s).map_err(|e| Details::ConvertStrToUuid(s, e).into())
}

fn uuid_from_bytes(bytes: &[u8]) -> AvroResult<Uuid> {
    Uuid::from_slice(bytes).map_err(|_| Details::ConvertFixedToUuid(bytes.len()).into())
}

/// Big-endian two's complement unscaled value.
fn decimal_from_bytes(bytes: &[u8], scale: usize) -> BigDecimal {
    BigDecimal::new(BigInt::from_signed_bytes_be(bytes), scale as i64)
}

/// Give a resolved value the representation `shape` asks for.
pub(crate) fn conform(
    value: Value,
    shape: Option<&Shape>,
    shapes: Option<&ShapeRegistry>,
) -> AvroResult<Value> {
    let Some(shape) = shape else {
        return Ok(value);
    };
    let shape = match (shape, shapes) {
        (Shape::Named(_), Some(shapes)) => shapes.resolve(shape)?,
        (shape, _) => shape,
    };
    let mismatch = |value: &Value| -> crate::Error {
        Details::ShapeMismatch {
            value: value.kind(),
            shape: shape.to_string(),
        }
        .into()
    };

    Ok(match (shape, value) {
        (shape, Value::Union(index, inner)) => {
            Value::Union(index, Box::new(conform(*inner, Some(shape), shapes)?))
        }
        (Shape::Nullable(_), Value::Null) => Value::Null,
        (Shape::Nullable(inner), value) => conform(value, Some(inner), shapes)?,

        (Shape::Null, Value::Null) => Value::Null,
        (Shape::Boolean, Value::Boolean(b)) => Value::Boolean(b),
        (Shape::Int, Value::Int(i)) => Value::Int(i),
        (Shape::Long, Value::Int(i)) => Value::Long(i64::from(i)),
        (Shape::Long, Value::Long(i)) => Value::Long(i),
        (Shape::Float, Value::Int(i)) => Value::Float(i as f32),
        (Shape::Float, Value::Long(i)) => Value::Float(i as f32),
        (Shape::Float, Value::Float(x)) => Value::Float(x),
        (Shape::Double, Value::Int(i)) => Value::Double(f64::from(i)),
        (Shape::Double, Value::Long(i)) => Value::Double(i as f64),
        (Shape::Double, Value::Float(x)) => Value::Double(f64::from(x)),
        (Shape::Double, Value::Double(x)) => Value::Double(x),

        (Shape::String, Value::String(s)) => Value::String(s),
        (Shape::String, Value::Bytes(b)) => {
            Value::String(String::from_utf8(b).map_err(Details::ConvertToUtf8)?)
        }
        (Shape::String, Value::Enum(_, symbol)) => Value::String(symbol),
        (Shape::String, Value::Uuid(uuid)) => Value::String(uuid.to_string()),
        (Shape::Bytes, Value::Bytes(b) | Value::Fixed(_, b)) => Value::Bytes(b),
        (Shape::Bytes, Value::String(s)) => Value::Bytes(s.into_bytes()),

        (Shape::Uuid, Value::Uuid(uuid)) => Value::Uuid(uuid),
        (Shape::Uuid, Value::String(s)) => Value::Uuid(parse_uuid(s)?),
        (Shape::Uuid, Value::Fixed(_, b) | Value::Bytes(b)) => Value::Uuid(uuid_from_bytes(&b)?),

        (Shape::Decimal { .. }, Value::Decimal(d)) => Value::Decimal(d),
        (Shape::Decimal { .. }, Value::String(s)) => Value::Decimal(
            BigDecimal::from_str(s.trim()).map_err(|e| Details::ConvertStrToDecimal(s, e))?,
        ),
        (Shape::Decimal { scale, .. }, Value::Bytes(b) | Value::Fixed(_, b)) => {
            Value::Decimal(decimal_from_bytes(&b, *scale))
        }

        (Shape::Date, Value::Int(i) | Value::Date(i)) => Value::Date(i),
        (Shape::TimeMillis, Value::Int(i) | Value::TimeMillis(i)) => Value::TimeMillis(i),
        (Shape::TimeMicros, Value::Long(i) | Value::TimeMicros(i)) => Value::TimeMicros(i),
        (Shape::TimestampMillis, Value::Long(i) | Value::TimestampMillis(i)) => {
            Value::TimestampMillis(i)
        }
        (Shape::TimestampMicros, Value::Long(i) | Value::TimestampMicros(i)) => {
            Value::TimestampMicros(i)
        }

        (Shape::Fixed(fixed), Value::Fixed(size, b)) if fixed.size == size => Value::Fixed(size, b),
        (Shape::Enum(_), value @ Value::Enum(..)) => value,
        (Shape::Array(_), value @ Value::Array(_))
        | (Shape::Map(_), value @ Value::Map(_))
        | (Shape::Record(_), value @ Value::Record(_)) => value,

        (_, value) => return Err(mismatch(&value)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        encode::encode_to_vec,
        error::ErrorKind,
        schema::{Name, RecordField, ResolvedSchema},
    };
    use apache_avro_test_helper::TestResult;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn read(writer: &Schema, reader: &Schema, bytes: &[u8], shape: Option<&Shape>) -> AvroResult<Value> {
        let writer = ResolvedSchema::try_from(writer.clone())?;
        let reader = ResolvedSchema::try_from(reader.clone())?;
        let plans = PlanCache::new();
        let resolver = Resolver::new(writer.get_names(), reader.get_names(), &plans, None);
        let mut cursor = bytes;
        let value = resolver.resolve(
            writer.get_root_schema(),
            reader.get_root_schema(),
            &mut cursor,
            shape,
        )?;
        assert!(cursor.is_empty(), "{} bytes left over", cursor.len());
        Ok(value)
    }

    #[rstest]
    #[case(Schema::Int, Value::Int(7), Schema::Long, Value::Long(7))]
    #[case(Schema::Int, Value::Int(7), Schema::Double, Value::Double(7.0))]
    #[case(Schema::Long, Value::Long(-3), Schema::Float, Value::Float(-3.0))]
    #[case(Schema::Float, Value::Float(1.5), Schema::Double, Value::Double(1.5))]
    #[case(Schema::String, Value::from("hi"), Schema::Bytes, Value::Bytes(b"hi".to_vec()))]
    #[case(Schema::Bytes, Value::from(&b"hi"[..]), Schema::String, Value::from("hi"))]
    #[case(Schema::Int, Value::Int(19000), Schema::Date, Value::Date(19000))]
    #[case(Schema::TimestampMillis, Value::Long(5), Schema::Long, Value::Long(5))]
    fn promotions(
        #[case] writer: Schema,
        #[case] written: Value,
        #[case] reader: Schema,
        #[case] expected: Value,
    ) -> TestResult {
        let bytes = encode_to_vec(&written, &writer)?;
        assert_eq!(read(&writer, &reader, &bytes, None)?, expected);
        Ok(())
    }

    #[rstest]
    #[case(Schema::Int, &[0x02], Schema::String)]
    #[case(Schema::Long, &[0x02], Schema::Int)]
    #[case(Schema::Double, &[0; 8], Schema::Float)]
    #[case(Schema::Boolean, &[0x01], Schema::Int)]
    #[case(Schema::Int, &[0x02], Schema::array(Schema::Int).build())]
    fn illegal_promotions(#[case] writer: Schema, #[case] bytes: &[u8], #[case] reader: Schema) {
        let err = read(&writer, &reader, bytes, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
        assert!(matches!(err.details(), Details::SchemaMismatch { .. }));
    }

    #[test]
    fn unions_in_both_directions() -> TestResult {
        let optional = Schema::union(vec![Schema::Null, Schema::Long])?;

        // plain writer, union reader
        let bytes = encode_to_vec(&Value::Int(4), &Schema::Int)?;
        assert_eq!(
            read(&Schema::Int, &optional, &bytes, None)?,
            Value::Union(1, Box::new(Value::Long(4)))
        );

        // union writer, plain reader
        let bytes = encode_to_vec(&Value::Long(9), &optional)?;
        assert_eq!(read(&optional, &Schema::Double, &bytes, None)?, Value::Double(9.0));

        // union writer, union reader with other branch order
        let reordered = Schema::union(vec![Schema::String, Schema::Long, Schema::Null])?;
        assert_eq!(
            read(&optional, &reordered, &bytes, None)?,
            Value::Union(1, Box::new(Value::Long(9)))
        );
        let null = encode_to_vec(&Value::Null, &optional)?;
        assert_eq!(
            read(&optional, &reordered, &null, None)?,
            Value::Union(2, Box::new(Value::Null))
        );

        // the written branch cannot be read
        let err = read(&optional, &Schema::Long, &null, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);

        let err = read(&Schema::Boolean, &optional, &[1], None).unwrap_err();
        assert!(matches!(err.details(), Details::NoMatchingUnionBranch { .. }));

        let err = read(&optional, &optional, &[0x06], None).unwrap_err();
        assert!(matches!(
            err.details(),
            Details::GetUnionVariant {
                index: 3,
                num_variants: 2
            }
        ));
        Ok(())
    }

    #[test]
    fn enums() -> TestResult {
        let writer = Schema::r#enum(Name::new("Suit")?, vec!["HEARTS", "SPADES", "CLUBS"]).build()?;
        let reader = Schema::r#enum(Name::new("Suit")?, vec!["SPADES", "HEARTS", "UNKNOWN"])
            .default("UNKNOWN".to_string())
            .build()?;
        assert_eq!(
            read(&writer, &reader, &[0x00], None)?,
            Value::Enum(1, "HEARTS".into())
        );
        assert_eq!(
            read(&writer, &reader, &[0x04], None)?,
            Value::Enum(2, "UNKNOWN".into())
        );

        let strict = Schema::r#enum(Name::new("Suit")?, vec!["HEARTS"]).build()?;
        let err = read(&writer, &strict, &[0x02], None).unwrap_err();
        assert!(matches!(err.details(), Details::EnumSymbolMissing { symbol, .. } if symbol == "SPADES"));

        let err = read(&writer, &reader, &[0x06], None).unwrap_err();
        assert!(matches!(err.details(), Details::EnumIndexOutOfRange { index: 3, .. }));
        Ok(())
    }

    #[test]
    fn fixed_sizes_must_match() -> TestResult {
        let writer = Schema::fixed(Name::new("Hash")?, 4).build()?;
        let reader = Schema::fixed(Name::new("Hash")?, 8).build()?;
        let err = read(&writer, &reader, &[1, 2, 3, 4], None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
        assert!(matches!(
            err.details(),
            Details::FixedSizeMismatch { writer: 4, reader: 8 }
        ));

        let renamed = Schema::fixed(Name::new("Digest")?, 4).build()?;
        let err = read(&writer, &renamed, &[1, 2, 3, 4], None).unwrap_err();
        assert!(matches!(err.details(), Details::NameMismatch { .. }));
        Ok(())
    }

    #[test]
    fn records_with_errors_report_the_field() -> TestResult {
        let writer = Schema::record(Name::new("R")?)
            .fields(vec![RecordField::builder().name("a").schema(Schema::Int).build()])
            .build()?;
        let reader = Schema::record(Name::new("R")?)
            .fields(vec![RecordField::builder().name("a").schema(Schema::String).build()])
            .build()?;
        let err = read(&writer, &reader, &[0x02], None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
        assert!(matches!(err.details(), Details::InField { field, .. } if field == "a"));
        Ok(())
    }

    #[test]
    fn record_names_must_match() -> TestResult {
        let writer = Schema::record(Name::new("a.Old")?).build()?;
        let reader = Schema::record(Name::new("b.New")?).build()?;
        let err = read(&writer, &reader, &[], None).unwrap_err();
        assert!(matches!(err.details(), Details::NameMismatch { .. }));

        let aliased = Schema::record(Name::new("b.New")?)
            .aliases(vec![Name::new("a.Old")?])
            .build()?;
        assert_eq!(read(&writer, &aliased, &[], None)?, Value::Record(vec![]));
        Ok(())
    }

    #[test]
    fn logical_shapes() -> TestResult {
        let uuid = "550e8400-e29b-41d4-a716-446655440000";
        let bytes = encode_to_vec(&Value::from(uuid), &Schema::String)?;
        assert_eq!(
            read(&Schema::String, &Schema::String, &bytes, Some(&Shape::Uuid))?,
            Value::Uuid(Uuid::parse_str(uuid)?)
        );

        let decimal = Shape::Decimal {
            precision: 5,
            scale: 2,
        };
        let bytes = encode_to_vec(&Value::from("12.50"), &Schema::String)?;
        assert_eq!(
            read(&Schema::String, &Schema::String, &bytes, Some(&decimal))?,
            Value::Decimal(BigDecimal::from_str("12.50")?)
        );
        let bytes = encode_to_vec(&Value::Bytes(vec![0x04, 0xE2]), &Schema::Bytes)?;
        assert_eq!(
            read(&Schema::Bytes, &Schema::Bytes, &bytes, Some(&decimal))?,
            Value::Decimal(BigDecimal::from_str("12.50")?)
        );

        let err = read(&Schema::Int, &Schema::Int, &[0x02], Some(&Shape::String)).unwrap_err();
        assert!(matches!(err.details(), Details::ShapeMismatch { .. }));
        Ok(())
    }

    #[test]
    fn fixed_array_items() -> TestResult {
        let plans = PlanCache::new();
        let names = Names::new();
        let resolver = Resolver::new(&names, &names, &plans, None);
        let mut cursor: &[u8] = &[0x02, 0x04, 0x06];
        let items =
            resolver.resolve_array_items(&Schema::Int, &Schema::Long, &mut cursor, None, 2)?;
        assert_eq!(items, vec![Value::Long(1), Value::Long(2)]);
        assert_eq!(cursor, &[0x06u8]);
        Ok(())
    }
}
