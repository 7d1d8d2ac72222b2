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

//! Logic for serde-compatible serialization into [`Value`].

use crate::{Error, error::Details, types::Value};
use serde::{Serialize, ser};
use std::collections::HashMap;

/// Serializes any `T: Serialize` into a [`Value`].
///
/// Structs become records, sequences and tuples become arrays, and enum variants carrying data
/// become `Value::Union` with the variant index as the branch.
#[derive(Clone, Copy, Debug, Default)]
pub struct Serializer;

pub struct SeqSerializer {
    items: Vec<Value>,
    variant: Option<u32>,
}

pub struct MapSerializer {
    entries: HashMap<String, Value>,
    next_key: Option<String>,
}

pub struct StructSerializer {
    fields: Vec<(String, Value)>,
    variant: Option<u32>,
}

impl SeqSerializer {
    fn new(len: Option<usize>, variant: Option<u32>) -> Self {
        Self {
            items: Vec::with_capacity(len.unwrap_or(0)),
            variant,
        }
    }
}

impl StructSerializer {
    fn new(len: usize, variant: Option<u32>) -> Self {
        Self {
            fields: Vec::with_capacity(len),
            variant,
        }
    }
}

fn in_variant(variant: Option<u32>, value: Value) -> Value {
    match variant {
        Some(index) => Value::Union(index, Box::new(value)),
        None => value,
    }
}

impl ser::Serializer for Serializer {
    type Ok = Value;
    type Error = Error;
    type SerializeSeq = SeqSerializer;
    type SerializeTuple = SeqSerializer;
    type SerializeTupleStruct = SeqSerializer;
    type SerializeTupleVariant = SeqSerializer;
    type SerializeMap = MapSerializer;
    type SerializeStruct = StructSerializer;
    type SerializeStructVariant = StructSerializer;

    fn serialize_bool(self, v: bool) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Boolean(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Self::Ok, Self::Error> {
        self.serialize_i32(i32::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Self::Ok, Self::Error> {
        self.serialize_i32(i32::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Int(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Long(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Self::Ok, Self::Error> {
        self.serialize_i32(i32::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Self::Ok, Self::Error> {
        self.serialize_i32(i32::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Self::Ok, Self::Error> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Self::Ok, Self::Error> {
        match i64::try_from(v) {
            Ok(i) => self.serialize_i64(i),
            Err(_) => Err(ser::Error::custom(format!(
                "u64 {v} does not fit into an Avro long"
            ))),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Float(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Double(v))
    }

    fn serialize_char(self, v: char) -> Result<Self::Ok, Self::Error> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Self::Ok, Self::Error> {
        Ok(Value::String(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Bytes(v.to_owned()))
    }

    fn serialize_none(self) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _: &'static str) -> Result<Self::Ok, Self::Error> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _: &'static str,
        variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Enum(variant_index, variant.to_owned()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        variant_index: u32,
        _: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Union(variant_index, Box::new(value.serialize(self)?)))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Ok(SeqSerializer::new(len, None))
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple, Self::Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        variant_index: u32,
        _: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Ok(SeqSerializer::new(Some(len), Some(variant_index)))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Ok(MapSerializer {
            entries: HashMap::with_capacity(len.unwrap_or(0)),
            next_key: None,
        })
    }

    fn serialize_struct(
        self,
        _: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        Ok(StructSerializer::new(len, None))
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        variant_index: u32,
        _: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Ok(StructSerializer::new(len, Some(variant_index)))
    }
}

impl ser::SerializeSeq for SeqSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.items.push(value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(in_variant(self.variant, Value::Array(self.items)))
    }
}

impl ser::SerializeTuple for SeqSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleVariant for SeqSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeMap for MapSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), Self::Error> {
        let key = match key.serialize(Serializer)? {
            Value::String(s) | Value::Enum(_, s) => s,
            Value::Int(i) => i.to_string(),
            Value::Long(i) => i.to_string(),
            other => {
                return Err(Details::SerializeValue(format!(
                    "map keys must be strings, got {:?}",
                    other.kind()
                ))
                .into());
            }
        };
        self.next_key = Some(key);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        let key = self.next_key.take().ok_or_else(|| {
            Error::from(Details::SerializeValue(
                "map value serialized before its key".to_string(),
            ))
        })?;
        self.entries.insert(key, value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Map(self.entries))
    }
}

impl ser::SerializeStruct for StructSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        name: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        self.fields.push((name.to_owned(), value.serialize(Serializer)?));
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(in_variant(self.variant, Value::Record(self.fields)))
    }
}

impl ser::SerializeStructVariant for StructSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        name: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        ser::SerializeStruct::serialize_field(self, name, value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        ser::SerializeStruct::end(self)
    }
}

/// Interpret a `Serialize`-able type as a [`Value`].
///
/// The result is not tied to a schema; the encoder validates it against one when it is written.
pub fn to_value<S: Serialize>(value: S) -> Result<Value, Error> {
    value.serialize(Serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apache_avro_test_helper::TestResult;
    use pretty_assertions::assert_eq;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Reading {
        sensor: String,
        celsius: f64,
        count: u32,
        note: Option<String>,
        raw: Vec<u8>,
    }

    #[derive(Serialize)]
    enum Event {
        Started,
        Moved(i64),
        Resized { width: u16, height: u16 },
    }

    #[test]
    fn structs_become_records() -> TestResult {
        let value = to_value(Reading {
            sensor: "s-1".into(),
            celsius: 21.5,
            count: 3,
            note: None,
            raw: vec![1, 2],
        })?;
        assert_eq!(
            value,
            Value::Record(vec![
                ("sensor".into(), Value::String("s-1".into())),
                ("celsius".into(), Value::Double(21.5)),
                ("count".into(), Value::Long(3)),
                ("note".into(), Value::Null),
                (
                    "raw".into(),
                    Value::Array(vec![Value::Int(1), Value::Int(2)])
                ),
            ])
        );
        Ok(())
    }

    #[test]
    fn enum_variants() -> TestResult {
        assert_eq!(to_value(Event::Started)?, Value::Enum(0, "Started".into()));
        assert_eq!(
            to_value(Event::Moved(-4))?,
            Value::Union(1, Box::new(Value::Long(-4)))
        );
        assert_eq!(
            to_value(Event::Resized {
                width: 2,
                height: 3
            })?,
            Value::Union(
                2,
                Box::new(Value::Record(vec![
                    ("width".into(), Value::Int(2)),
                    ("height".into(), Value::Int(3)),
                ]))
            )
        );
        Ok(())
    }

    #[test]
    fn maps_need_string_keys() -> TestResult {
        let map = HashMap::from([("a".to_string(), 1i32)]);
        assert_eq!(
            to_value(&map)?,
            Value::Map(HashMap::from([("a".to_string(), Value::Int(1))]))
        );

        let err = to_value(HashMap::from([(vec![1u8], 1i32)])).unwrap_err();
        assert!(matches!(err.details(), Details::SerializeValue(_)));
        Ok(())
    }

    #[test]
    fn bytes_and_overflow() -> TestResult {
        assert_eq!(
            to_value(serde_bytes::Bytes::new(b"ab"))?,
            Value::Bytes(b"ab".to_vec())
        );
        assert!(to_value(u64::MAX).is_err());
        assert_eq!(to_value(u64::from(u32::MAX))?, Value::Long(i64::from(u32::MAX)));
        Ok(())
    }
}
