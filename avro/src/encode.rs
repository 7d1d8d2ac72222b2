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

use crate::{
    AvroResult,
    default::resolve_default,
    error::Details,
    schema::{
        DecimalSchema, EnumSchema, FixedSchema, InnerDecimalSchema, Names, RecordSchema,
        ResolvedSchema, Schema, UuidSchema, deref,
    },
    types::{Value, ValueKind},
    util::{zig_i32, zig_i64},
};
use bigdecimal::BigDecimal;
use log::error;
use std::{collections::HashMap, io::Write};
use uuid::Uuid;

/// Encode a `Value` into avro format, validating it against `schema` along the way.
///
/// Values may be narrower than the schema asks for (an `Int` for a `long` field), enums may be
/// given by symbol as a `Value::String`, and a value that is not a `Value::Union` is written to
/// the first union branch that accepts it.
pub fn encode<W: Write>(value: &Value, schema: &Schema, writer: &mut W) -> AvroResult<usize> {
    let resolved = ResolvedSchema::try_from(schema.clone())?;
    // branch probing fails quietly, so failures are only logged here
    encode_internal(value, schema, resolved.get_names(), writer).inspect_err(|err| {
        error!(
            "Failed to encode a {:?} value as {:?}: {err}",
            value.kind(),
            schema.kind()
        )
    })
}

pub fn encode_to_vec(value: &Value, schema: &Schema) -> AvroResult<Vec<u8>> {
    let mut buffer = Vec::new();
    encode(value, schema, &mut buffer)?;
    Ok(buffer)
}

fn write<W: Write>(bytes: &[u8], writer: &mut W) -> AvroResult<usize> {
    writer
        .write_all(bytes)
        .map_err(Details::WriteBytes)?;
    Ok(bytes.len())
}

pub(crate) fn encode_long<W: Write>(i: i64, writer: &mut W) -> AvroResult<usize> {
    zig_i64(i, writer)
}

pub(crate) fn encode_int<W: Write>(i: i32, writer: &mut W) -> AvroResult<usize> {
    zig_i32(i, writer)
}

pub(crate) fn encode_float<W: Write>(x: f32, writer: &mut W) -> AvroResult<usize> {
    write(&x.to_le_bytes(), writer)
}

pub(crate) fn encode_double<W: Write>(x: f64, writer: &mut W) -> AvroResult<usize> {
    write(&x.to_le_bytes(), writer)
}

pub(crate) fn encode_bool<W: Write>(b: bool, writer: &mut W) -> AvroResult<usize> {
    write(&[u8::from(b)], writer)
}

pub(crate) fn encode_bytes<B: AsRef<[u8]> + ?Sized, W: Write>(
    s: &B,
    writer: &mut W,
) -> AvroResult<usize> {
    let bytes = s.as_ref();
    let prefix = encode_long(bytes.len() as i64, writer)?;
    Ok(prefix + write(bytes, writer)?)
}

pub(crate) fn encode_string<W: Write>(s: &str, writer: &mut W) -> AvroResult<usize> {
    encode_bytes(s, writer)
}

/// Fixed values have no length prefix.
pub(crate) fn encode_fixed<W: Write>(bytes: &[u8], writer: &mut W) -> AvroResult<usize> {
    write(bytes, writer)
}

fn mismatch(value: &Value, schema: &Schema) -> crate::Error {
    Details::EncodeValueAsSchemaError {
        value_kind: value.kind(),
        supported_schema: vec![schema.kind()],
    }
    .into()
}

pub(crate) fn encode_internal<W: Write>(
    value: &Value,
    schema: &Schema,
    names: &Names,
    writer: &mut W,
) -> AvroResult<usize> {
    match (schema, value) {
        (Schema::Ref { .. }, _) => encode_internal(value, deref(schema, names)?, names, writer),
        (Schema::Union(union), Value::Union(index, item)) => {
            let branch = union.variants().get(*index as usize).ok_or_else(|| {
                Details::GetUnionVariant {
                    index: *index as i64,
                    num_variants: union.variants().len(),
                }
            })?;
            let written = encode_long(*index as i64, writer)?;
            Ok(written + encode_internal(item, branch, names, writer)?)
        }
        (Schema::Union(union), _) => {
            let mut buffer = Vec::new();
            for (index, branch) in union.variants().iter().enumerate() {
                encode_long(index as i64, &mut buffer)?;
                if encode_internal(value, branch, names, &mut buffer).is_ok() {
                    return write(&buffer, writer);
                }
                // undo any partial encoding
                buffer.clear();
            }
            Err(Details::EncodeUnionNoBranch(value.kind()).into())
        }
        (_, Value::Union(_, item)) => encode_internal(item, schema, names, writer),

        (Schema::Null, Value::Null) => Ok(0),
        (Schema::Boolean, Value::Boolean(b)) => encode_bool(*b, writer),
        (Schema::Int, Value::Int(i)) => encode_int(*i, writer),
        (Schema::Long, Value::Int(i)) => encode_long(i64::from(*i), writer),
        (Schema::Long, Value::Long(i)) => encode_long(*i, writer),
        (Schema::Float, Value::Int(i)) => encode_float(*i as f32, writer),
        (Schema::Float, Value::Long(i)) => encode_float(*i as f32, writer),
        (Schema::Float, Value::Float(x)) => encode_float(*x, writer),
        (Schema::Double, Value::Int(i)) => encode_double(f64::from(*i), writer),
        (Schema::Double, Value::Long(i)) => encode_double(*i as f64, writer),
        (Schema::Double, Value::Float(x)) => encode_double(f64::from(*x), writer),
        (Schema::Double, Value::Double(x)) => encode_double(*x, writer),
        (Schema::Bytes, Value::Bytes(bytes)) => encode_bytes(bytes, writer),
        (Schema::Bytes, Value::String(s)) => encode_bytes(s, writer),
        (Schema::String, Value::String(s)) => encode_string(s, writer),
        (Schema::String, Value::Uuid(uuid)) => encode_string(&uuid.to_string(), writer),

        (Schema::Date, Value::Int(i) | Value::Date(i))
        | (Schema::TimeMillis, Value::Int(i) | Value::TimeMillis(i)) => encode_int(*i, writer),
        (Schema::TimeMicros, Value::Long(i) | Value::TimeMicros(i))
        | (Schema::TimestampMillis, Value::Long(i) | Value::TimestampMillis(i))
        | (Schema::TimestampMicros, Value::Long(i) | Value::TimestampMicros(i)) => {
            encode_long(*i, writer)
        }

        (Schema::Fixed(fixed), Value::Fixed(_, bytes) | Value::Bytes(bytes)) => {
            if bytes.len() != fixed.size {
                return Err(Details::EncodeFixedSize {
                    expected: fixed.size,
                    actual: bytes.len(),
                }
                .into());
            }
            encode_fixed(bytes, writer)
        }

        (Schema::Enum(schema), Value::Enum(_, symbol) | Value::String(symbol)) => {
            encode_enum(schema, value, symbol, writer)
        }

        (Schema::Decimal(decimal), Value::Decimal(number)) => {
            encode_decimal(decimal, number, writer)
        }
        (
            Schema::Decimal(DecimalSchema {
                inner: InnerDecimalSchema::Bytes,
                ..
            }),
            Value::Bytes(bytes),
        ) => encode_bytes(bytes, writer),

        (Schema::Uuid(UuidSchema::String), Value::Uuid(uuid)) => {
            encode_string(&uuid.to_string(), writer)
        }
        (Schema::Uuid(UuidSchema::String), Value::String(s)) => {
            let uuid =
                Uuid::parse_str(s).map_err(|e| Details::ConvertStrToUuid(s.clone(), e))?;
            encode_string(&uuid.to_string(), writer)
        }
        (Schema::Uuid(UuidSchema::Fixed(FixedSchema { size, .. })), Value::Uuid(uuid)) => {
            if *size != 16 {
                return Err(Details::ConvertFixedToUuid(*size).into());
            }
            encode_fixed(uuid.as_bytes(), writer)
        }

        (Schema::Array(array), Value::Array(items)) => {
            let mut written = 0;
            if !items.is_empty() {
                written += encode_long(items.len() as i64, writer)?;
                for item in items {
                    written += encode_internal(item, &array.items, names, writer)?;
                }
            }
            Ok(written + write(&[0u8], writer)?)
        }
        (Schema::Map(map), Value::Map(entries)) => {
            let mut written = 0;
            if !entries.is_empty() {
                written += encode_long(entries.len() as i64, writer)?;
                for (key, value) in entries {
                    written += encode_string(key, writer)?;
                    written += encode_internal(value, &map.values, names, writer)?;
                }
            }
            Ok(written + write(&[0u8], writer)?)
        }
        (Schema::Record(record), Value::Record(fields)) => {
            encode_record(record, fields, names, writer)
        }

        _ => Err(mismatch(value, schema)),
    }
}

fn encode_enum<W: Write>(
    schema: &EnumSchema,
    value: &Value,
    symbol: &str,
    writer: &mut W,
) -> AvroResult<usize> {
    let index = match value {
        Value::Enum(index, _) if schema.symbols.get(*index as usize).is_some_and(|s| s == symbol) => {
            Some(*index as usize)
        }
        _ => schema.index_of(symbol),
    };
    match index {
        Some(index) => encode_int(index as i32, writer),
        None => Err(Details::EnumSymbolMissing {
            name: schema.name.to_string(),
            symbol: symbol.to_string(),
        }
        .into()),
    }
}

fn encode_record<W: Write>(
    record: &RecordSchema,
    fields: &[(String, Value)],
    names: &Names,
    writer: &mut W,
) -> AvroResult<usize> {
    let lookup: HashMap<&str, &Value> = fields.iter().map(|(n, v)| (n.as_str(), v)).collect();

    let mut written = 0;
    for field in &record.fields {
        let given = lookup.get(field.name.as_str()).copied().or_else(|| {
            field
                .aliases
                .iter()
                .flatten()
                .find_map(|alias| lookup.get(alias.as_str()).copied())
        });
        let result = match (given, &field.default) {
            (Some(value), _) => encode_internal(value, &field.schema, names, writer),
            (None, Some(default)) => resolve_default(&field.schema, default, names)
                .and_then(|value| encode_internal(&value, &field.schema, names, writer)),
            (None, None) => Err(Details::GetField(field.name.clone()).into()),
        };
        written += result.map_err(|e| e.in_field(&record.name, &field.name))?;
    }
    Ok(written)
}

fn encode_decimal<W: Write>(
    schema: &DecimalSchema,
    number: &BigDecimal,
    writer: &mut W,
) -> AvroResult<usize> {
    let (unscaled, _) = number.with_scale(schema.scale as i64).into_bigint_and_exponent();
    let bytes = unscaled.to_signed_bytes_be();
    match &schema.inner {
        InnerDecimalSchema::Bytes => encode_bytes(&bytes, writer),
        InnerDecimalSchema::Fixed(fixed) => encode_fixed(&sign_extend(&bytes, fixed.size)?, writer),
    }
}

/// Left-pad a big-endian two's complement number to `len` bytes.
pub(crate) fn sign_extend(bytes: &[u8], len: usize) -> AvroResult<Vec<u8>> {
    if bytes.len() > len {
        return Err(Details::SignExtend {
            requested: len,
            needed: bytes.len(),
        }
        .into());
    }
    let fill = match bytes.first() {
        Some(b) if b & 0x80 != 0 => 0xFF,
        _ => 0x00,
    };
    let mut extended = vec![fill; len - bytes.len()];
    extended.extend_from_slice(bytes);
    Ok(extended)
}
