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

//! Turning the JSON `default` of a record field into a [`Value`].
//!
//! Literals are interpreted by the schema they belong to. Besides the JSON types the Avro
//! specification prescribes, scalar targets also accept their textual form (`"42"` for an `int`,
//! `"true"` for a `boolean`, `"NaN"` for a `double`) since many schema generators emit defaults
//! as strings.

use crate::{
    AvroResult,
    error::Details,
    schema::{
        DecimalSchema, EnumSchema, FixedSchema, InnerDecimalSchema, Names, RecordSchema, Schema,
        UuidSchema,
    },
    types::Value,
};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde_json::{Map, Value as JsonValue};
use std::{borrow::Cow, collections::HashMap, str::FromStr};
use uuid::Uuid;

/// Resolve `literal` against `schema`, following `Schema::Ref`s through `names`.
pub fn resolve_default(schema: &Schema, literal: &JsonValue, names: &Names) -> AvroResult<Value> {
    let invalid = || Details::DefaultValue {
        literal: text(literal).into_owned(),
        target: schema.kind(),
    };

    match schema {
        Schema::Null => match literal {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::String(s) if s.is_empty() => Ok(Value::Null),
            _ => Err(invalid().into()),
        },
        Schema::Boolean => match literal {
            JsonValue::Bool(b) => Ok(Value::Boolean(*b)),
            _ => {
                let text = text(literal);
                let text = text.trim();
                if text.eq_ignore_ascii_case("true") {
                    Ok(Value::Boolean(true))
                } else if text.eq_ignore_ascii_case("false") {
                    Ok(Value::Boolean(false))
                } else {
                    Err(invalid().into())
                }
            }
        },
        Schema::Int | Schema::Date | Schema::TimeMillis => {
            let n = parse::<i32>(literal).ok_or_else(invalid)?;
            Ok(match schema {
                Schema::Date => Value::Date(n),
                Schema::TimeMillis => Value::TimeMillis(n),
                _ => Value::Int(n),
            })
        }
        Schema::Long | Schema::TimeMicros | Schema::TimestampMillis | Schema::TimestampMicros => {
            let n = parse::<i64>(literal).ok_or_else(invalid)?;
            Ok(match schema {
                Schema::TimeMicros => Value::TimeMicros(n),
                Schema::TimestampMillis => Value::TimestampMillis(n),
                Schema::TimestampMicros => Value::TimestampMicros(n),
                _ => Value::Long(n),
            })
        }
        Schema::Float => parse::<f32>(literal)
            .map(Value::Float)
            .ok_or_else(|| invalid().into()),
        Schema::Double => parse::<f64>(literal)
            .map(Value::Double)
            .ok_or_else(|| invalid().into()),
        Schema::String => Ok(Value::String(text(literal).into_owned())),
        Schema::Bytes => latin1_bytes(literal).map(Value::Bytes),
        Schema::Fixed(fixed) => resolve_fixed(fixed, literal).map(|b| Value::Fixed(b.len(), b)),
        Schema::Enum(enum_schema) => resolve_enum(enum_schema, literal),
        Schema::Array(array) => match structured(literal).as_deref() {
            Some(JsonValue::Array(items)) => items
                .iter()
                .map(|item| resolve_default(&array.items, item, names))
                .collect::<AvroResult<Vec<_>>>()
                .map(Value::Array),
            _ => Err(invalid().into()),
        },
        Schema::Map(map) => match structured(literal).as_deref() {
            Some(JsonValue::Object(entries)) => entries
                .iter()
                .map(|(key, value)| Ok((key.clone(), resolve_default(&map.values, value, names)?)))
                .collect::<AvroResult<HashMap<_, _>>>()
                .map(Value::Map),
            _ => Err(invalid().into()),
        },
        Schema::Record(record) => match structured(literal).as_deref() {
            Some(JsonValue::Object(entries)) => resolve_record(record, entries, names),
            _ => Err(invalid().into()),
        },
        Schema::Union(union) => {
            let first = union.variants().first().ok_or(Details::DefaultEmptyUnion)?;
            Ok(Value::Union(0, Box::new(resolve_default(first, literal, names)?)))
        }
        Schema::Uuid(UuidSchema::String) | Schema::Uuid(UuidSchema::Fixed(_)) => {
            let text = text(literal);
            Uuid::parse_str(text.trim())
                .map(Value::Uuid)
                .map_err(|source| {
                    Details::DefaultUuid {
                        literal: text.into_owned(),
                        source,
                    }
                    .into()
                })
        }
        Schema::Decimal(decimal) => resolve_decimal(decimal, literal).ok_or_else(|| invalid().into()),
        Schema::Ref { name } => {
            let schema = names
                .get(name)
                .ok_or_else(|| Details::SchemaResolutionError(name.clone()))?;
            resolve_default(schema, literal, names)
        }
    }
}

/// Check `literal` against `schema` at schema construction time.
///
/// References cannot be followed before the whole tree exists, so defaults reaching a
/// `Schema::Ref` are accepted here and resolved when a reader needs them.
pub(crate) fn validate_default(schema: &Schema, literal: &JsonValue) -> AvroResult<()> {
    match resolve_default(schema, literal, &Names::new()) {
        Err(e) if matches!(e.details(), Details::SchemaResolutionError(_)) => Ok(()),
        other => other.map(|_| ()),
    }
}

/// The textual form of a literal; strings are taken verbatim and `null` is empty.
fn text(literal: &JsonValue) -> Cow<'_, str> {
    match literal {
        JsonValue::String(s) => Cow::Borrowed(s),
        JsonValue::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}

fn parse<T: FromStr>(literal: &JsonValue) -> Option<T> {
    text(literal).trim().parse().ok()
}

/// Arrays, maps and records may also be given as a string holding their JSON.
fn structured(literal: &JsonValue) -> Option<Cow<'_, JsonValue>> {
    match literal {
        JsonValue::String(s) => serde_json::from_str(s).ok().map(Cow::Owned),
        other => Some(Cow::Borrowed(other)),
    }
}

/// Every code point of the literal is one byte, as the Avro specification prescribes for
/// `bytes` and `fixed` defaults.
fn latin1_bytes(literal: &JsonValue) -> AvroResult<Vec<u8>> {
    let text = text(literal);
    text.chars()
        .map(|c| u8::try_from(u32::from(c)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| Details::DefaultBytesOutOfRange(text.to_string()).into())
}

fn resolve_fixed(fixed: &FixedSchema, literal: &JsonValue) -> AvroResult<Vec<u8>> {
    let bytes = latin1_bytes(literal)?;
    if bytes.len() != fixed.size {
        return Err(Details::DefaultFixedSize {
            name: fixed.name.to_string(),
            expected: fixed.size,
            actual: bytes.len(),
        }
        .into());
    }
    Ok(bytes)
}

fn resolve_enum(schema: &EnumSchema, literal: &JsonValue) -> AvroResult<Value> {
    if let Some(index) = parse::<i64>(literal) {
        return usize::try_from(index)
            .ok()
            .and_then(|i| schema.symbols.get(i).map(|s| (i, s)))
            .map(|(i, symbol)| Value::Enum(i as u32, symbol.clone()))
            .ok_or_else(|| {
                Details::DefaultEnumIndex {
                    name: schema.name.to_string(),
                    index,
                    num_symbols: schema.symbols.len(),
                }
                .into()
            });
    }
    let symbol = text(literal);
    schema
        .index_of(&symbol)
        .map(|i| Value::Enum(i as u32, symbol.to_string()))
        .ok_or_else(|| {
            Details::DefaultEnumSymbol {
                name: schema.name.to_string(),
                symbol: symbol.to_string(),
            }
            .into()
        })
}

fn resolve_record(
    record: &RecordSchema,
    entries: &Map<String, JsonValue>,
    names: &Names,
) -> AvroResult<Value> {
    if let Some(unknown) = entries.keys().find(|key| !record.lookup.contains_key(*key)) {
        return Err(Details::DefaultUnknownField {
            record: record.name.to_string(),
            field: unknown.clone(),
        }
        .into());
    }
    record
        .fields
        .iter()
        .map(|field| {
            let literal = entries
                .get(&field.name)
                .or(field.default.as_ref())
                .ok_or_else(|| Details::DefaultMissingField {
                    record: record.name.to_string(),
                    field: field.name.clone(),
                })?;
            Ok((field.name.clone(), resolve_default(&field.schema, literal, names)?))
        })
        .collect::<AvroResult<Vec<_>>>()
        .map(Value::Record)
}

/// A decimal default is either its numeric text or its two's complement unscaled bytes.
fn resolve_decimal(decimal: &DecimalSchema, literal: &JsonValue) -> Option<Value> {
    let scale = decimal.scale as i64;
    if let Ok(number) = BigDecimal::from_str(text(literal).trim()) {
        return Some(Value::Decimal(number.with_scale(scale)));
    }
    let bytes = match &decimal.inner {
        InnerDecimalSchema::Bytes => latin1_bytes(literal).ok()?,
        InnerDecimalSchema::Fixed(fixed) => resolve_fixed(fixed, literal).ok()?,
    };
    Some(Value::Decimal(BigDecimal::new(
        BigInt::from_signed_bytes_be(&bytes),
        scale,
    )))
}
