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

//! Logic for serde-compatible deserialization out of [`Value`].

use crate::{Error, error::Details, types::Value};
use serde::{
    Deserialize,
    de::{self, DeserializeSeed, IntoDeserializer, Visitor},
    forward_to_deserialize_any,
};
use std::{collections::hash_map, slice};

/// Deserializes Rust types from a borrowed [`Value`].
pub struct Deserializer<'de> {
    input: &'de Value,
}

struct SeqDeserializer<'de> {
    items: slice::Iter<'de, Value>,
}

struct MapDeserializer<'de> {
    entries: hash_map::Iter<'de, String, Value>,
    value: Option<&'de Value>,
}

struct RecordDeserializer<'de> {
    fields: slice::Iter<'de, (String, Value)>,
    value: Option<&'de Value>,
}

struct EnumDeserializer<'de> {
    variant: VariantKey<'de>,
    value: Option<&'de Value>,
}

enum VariantKey<'de> {
    Index(u32),
    Symbol(&'de str),
}

impl<'de> Deserializer<'de> {
    pub fn new(input: &'de Value) -> Self {
        Self { input }
    }

    fn unexpected(&self, expected: &str) -> Error {
        Details::DeserializeValue(format!(
            "expected {expected}, got {:?}",
            self.input.kind()
        ))
        .into()
    }
}

impl<'de> de::Deserializer<'de> for Deserializer<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input {
            Value::Null => visitor.visit_unit(),
            Value::Boolean(b) => visitor.visit_bool(*b),
            Value::Int(i) | Value::Date(i) | Value::TimeMillis(i) => visitor.visit_i32(*i),
            Value::Long(i)
            | Value::TimeMicros(i)
            | Value::TimestampMillis(i)
            | Value::TimestampMicros(i) => visitor.visit_i64(*i),
            Value::Float(x) => visitor.visit_f32(*x),
            Value::Double(x) => visitor.visit_f64(*x),
            Value::Bytes(b) | Value::Fixed(_, b) => visitor.visit_borrowed_bytes(b),
            Value::String(s) | Value::Enum(_, s) => visitor.visit_borrowed_str(s),
            Value::Uuid(uuid) => visitor.visit_string(uuid.to_string()),
            Value::Decimal(d) => visitor.visit_string(d.to_string()),
            Value::Union(_, inner) => {
                de::Deserializer::deserialize_any(Deserializer::new(inner), visitor)
            }
            Value::Array(items) => visitor.visit_seq(SeqDeserializer {
                items: items.iter(),
            }),
            Value::Map(entries) => visitor.visit_map(MapDeserializer {
                entries: entries.iter(),
                value: None,
            }),
            Value::Record(fields) => visitor.visit_map(RecordDeserializer {
                fields: fields.iter(),
                value: None,
            }),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input.unwrap_union() {
            Value::Null => visitor.visit_none(),
            inner => visitor.visit_some(Deserializer::new(inner)),
        }
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input.unwrap_union() {
            Value::Bytes(b) | Value::Fixed(_, b) => visitor.visit_borrowed_bytes(b),
            Value::String(s) => visitor.visit_borrowed_bytes(s.as_bytes()),
            Value::Uuid(uuid) => visitor.visit_bytes(uuid.as_bytes()),
            items @ Value::Array(_) => {
                de::Deserializer::deserialize_any(Deserializer::new(items), visitor)
            }
            _ => Err(self.unexpected("bytes")),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        de::Deserializer::deserialize_bytes(self, visitor)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input.unwrap_union() {
            Value::String(s) | Value::Enum(_, s) => visitor.visit_borrowed_str(s),
            Value::Bytes(b) | Value::Fixed(_, b) => match std::str::from_utf8(b) {
                Ok(s) => visitor.visit_borrowed_str(s),
                Err(_) => Err(self.unexpected("utf-8 text")),
            },
            Value::Uuid(uuid) => visitor.visit_string(uuid.to_string()),
            Value::Decimal(d) => visitor.visit_string(d.to_string()),
            _ => Err(self.unexpected("a string")),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        de::Deserializer::deserialize_str(self, visitor)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input.unwrap_union() {
            Value::Null => visitor.visit_unit(),
            _ => Err(self.unexpected("null")),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        de::Deserializer::deserialize_unit(self, visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _: &'static str,
        _: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.input.unwrap_union() {
            Value::Record(fields) => visitor.visit_map(RecordDeserializer {
                fields: fields.iter(),
                value: None,
            }),
            Value::Map(entries) => visitor.visit_map(MapDeserializer {
                entries: entries.iter(),
                value: None,
            }),
            _ => Err(self.unexpected("a record")),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _: &'static str,
        _: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.input {
            Value::Enum(_, symbol) | Value::String(symbol) => visitor.visit_enum(EnumDeserializer {
                variant: VariantKey::Symbol(symbol),
                value: None,
            }),
            Value::Union(index, inner) => visitor.visit_enum(EnumDeserializer {
                variant: VariantKey::Index(*index),
                value: Some(inner),
            }),
            _ => Err(self.unexpected("an enum symbol or a union")),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char
        seq tuple tuple_struct map identifier ignored_any
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer<'de> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Self::Error> {
        self.items
            .next()
            .map(|item| seed.deserialize(Deserializer::new(item)))
            .transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer<'de> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        match self.entries.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(key.as_str().into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Self::Error> {
        match self.value.take() {
            Some(value) => seed.deserialize(Deserializer::new(value)),
            None => Err(de::Error::custom("map value requested before its key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

impl<'de> de::MapAccess<'de> for RecordDeserializer<'de> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        match self.fields.next() {
            Some((name, value)) => {
                self.value = Some(value);
                seed.deserialize(name.as_str().into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Self::Error> {
        match self.value.take() {
            Some(value) => seed.deserialize(Deserializer::new(value)),
            None => Err(de::Error::custom("record field requested before its name")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len())
    }
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer<'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, Self::Variant), Self::Error> {
        let variant = match self.variant {
            VariantKey::Index(index) => {
                seed.deserialize(IntoDeserializer::<Error>::into_deserializer(index))?
            }
            VariantKey::Symbol(symbol) => {
                seed.deserialize(IntoDeserializer::<Error>::into_deserializer(symbol))?
            }
        };
        Ok((variant, self))
    }
}

impl<'de> de::VariantAccess<'de> for EnumDeserializer<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Self::Error> {
        match self.value {
            None | Some(Value::Null) => Ok(()),
            Some(other) => Err(Deserializer::new(other).unexpected("a unit variant")),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, Self::Error> {
        match self.value {
            Some(value) => seed.deserialize(Deserializer::new(value)),
            None => Err(de::Error::custom("newtype variant without a value")),
        }
    }

    fn tuple_variant<V: Visitor<'de>>(self, _: usize, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Some(Value::Array(items)) => visitor.visit_seq(SeqDeserializer {
                items: items.iter(),
            }),
            Some(other) => Err(Deserializer::new(other).unexpected("an array")),
            None => Err(de::Error::custom("tuple variant without a value")),
        }
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.value {
            Some(value) => de::Deserializer::deserialize_struct(
                Deserializer::new(value),
                "",
                fields,
                visitor,
            ),
            None => Err(de::Error::custom("struct variant without a value")),
        }
    }
}

/// Interpret a [`Value`] as an instance of type `D`.
///
/// Union wrappers are looked through, so values decoded against nullable schemas bind to
/// `Option` fields directly.
pub fn from_value<'de, D: Deserialize<'de>>(value: &'de Value) -> Result<D, Error> {
    D::deserialize(Deserializer::new(value))
}
