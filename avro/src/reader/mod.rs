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

//! Reading single values written with a possibly different schema.

use crate::{
    AvroResult,
    resolution::{Resolver, plan::PlanCache},
    schema::{ResolvedSchema, Schema},
    serde::from_value,
    shape::{AvroShape, Shape, ShapeRegistry, schema_of},
    types::Value,
};
use bon::bon;
use serde::de::DeserializeOwned;
use std::{io::Read, sync::Arc};

/// Decodes values written with one schema as values of a reader schema.
///
/// A decoder is built once per pair of schemas and reused for every value. It remembers how the
/// records of the writer schema map onto the records of the reader schema, so that matching
/// fields by name and resolving defaults happens once instead of once per value. Decoders are
/// `Send + Sync` and can be shared between threads.
///
/// ```
/// # use avro_evolve::{Decoder, Error, Schema, types::Value, writer::to_avro_datum};
/// let writer = Schema::parse_str(
///     r#"{"type": "record", "name": "User", "fields": [
///         {"name": "id", "type": "int"}
///     ]}"#,
/// )?;
/// let reader = Schema::parse_str(
///     r#"{"type": "record", "name": "User", "fields": [
///         {"name": "id", "type": "long"},
///         {"name": "active", "type": "boolean", "default": true}
///     ]}"#,
/// )?;
///
/// let bytes = to_avro_datum(&writer, Value::Record(vec![("id".into(), Value::Int(7))]))?;
/// let decoder = Decoder::builder(writer).reader(reader).build()?;
/// assert_eq!(
///     decoder.decode(&mut bytes.as_slice(), None)?,
///     Value::Record(vec![
///         ("id".into(), Value::Long(7)),
///         ("active".into(), Value::Boolean(true)),
///     ])
/// );
/// # Ok::<(), Error>(())
/// ```
#[derive(Debug)]
pub struct Decoder {
    // plans are keyed by the addresses of record nodes, which the `Arc`s keep in place
    writer: Arc<ResolvedSchema>,
    reader: Arc<ResolvedSchema>,
    plans: PlanCache,
}

#[bon]
impl Decoder {
    /// Create a decoder for data written with `writer`, read as `reader`.
    ///
    /// Without a reader schema the data is read with the writer schema itself.
    #[builder(finish_fn = build)]
    pub fn builder(#[builder(start_fn)] writer: Schema, reader: Option<Schema>) -> AvroResult<Self> {
        let writer = Arc::new(ResolvedSchema::try_from(writer)?);
        let reader = match reader {
            Some(reader) => Arc::new(ResolvedSchema::try_from(reader)?),
            None => Arc::clone(&writer),
        };
        Ok(Self {
            writer,
            reader,
            plans: PlanCache::new(),
        })
    }
}

impl Decoder {
    pub fn new(writer: Schema, reader: Schema) -> AvroResult<Self> {
        Self::builder(writer).reader(reader).build()
    }

    /// Create a decoder that reads `writer` data as `T`, with the schema derived from its shape.
    pub fn for_type<T: AvroShape>(writer: Schema) -> AvroResult<Self> {
        Self::new(writer, schema_of::<T>()?)
    }

    pub fn writer_schema(&self) -> &Schema {
        self.writer.get_root_schema()
    }

    pub fn reader_schema(&self) -> &Schema {
        self.reader.get_root_schema()
    }

    /// Decode one value from `cursor`.
    ///
    /// With a `shape`, record fields are bound to its members and logical values are converted to
    /// the representation it asks for. Shapes that refer to a registry must be decoded with
    /// [`decode_shaped`](Self::decode_shaped).
    pub fn decode<R: Read>(&self, cursor: &mut R, shape: Option<&Shape>) -> AvroResult<Value> {
        self.resolve(cursor, shape, None)
    }

    /// Decode one value from `cursor` bound to `shape`, following named shapes through `shapes`.
    pub fn decode_shaped<R: Read>(
        &self,
        cursor: &mut R,
        shape: &Shape,
        shapes: &ShapeRegistry,
    ) -> AvroResult<Value> {
        self.resolve(cursor, Some(shape), Some(shapes))
    }

    /// Decode one value from `cursor` into a `T`.
    pub fn decode_into<T: AvroShape + DeserializeOwned>(
        &self,
        cursor: &mut impl Read,
    ) -> AvroResult<T> {
        let (shape, shapes) = T::shape();
        let value = self.decode_shaped(cursor, &shape, &shapes)?;
        from_value(&value)
    }

    fn resolve<R: Read>(
        &self,
        cursor: &mut R,
        shape: Option<&Shape>,
        shapes: Option<&ShapeRegistry>,
    ) -> AvroResult<Value> {
        Resolver::new(
            self.writer.get_names(),
            self.reader.get_names(),
            &self.plans,
            shapes,
        )
        .resolve(
            self.writer.get_root_schema(),
            self.reader.get_root_schema(),
            cursor,
            shape,
        )
    }

    /// The number of record plans compiled so far.
    pub fn compiled_plans(&self) -> usize {
        self.plans.len()
    }
}

/// Decode one value written with `writer_schema`, read as `reader_schema` if given.
///
/// Each call starts without compiled plans; use a [`Decoder`] to decode many values.
pub fn from_avro_datum<R: Read>(
    writer_schema: &Schema,
    reader: &mut R,
    reader_schema: Option<&Schema>,
) -> AvroResult<Value> {
    Decoder::builder(writer_schema.clone())
        .maybe_reader(reader_schema.cloned())
        .build()?
        .decode(reader, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        schema::{Name, RecordField},
        shape::{MemberShape, RecordShape},
        writer::to_avro_datum,
    };
    use apache_avro_test_helper::TestResult;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    fn user_v1() -> AvroResult<Schema> {
        Schema::record(Name::new("User")?)
            .fields(vec![
                RecordField::builder().name("id").schema(Schema::Int).build(),
                RecordField::builder().name("name").schema(Schema::String).build(),
            ])
            .build()
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct User {
        id: i64,
        email: Option<String>,
    }

    impl AvroShape for User {
        fn shape_in(registry: &mut ShapeRegistry) -> Shape {
            Shape::Record(
                RecordShape::builder()
                    .name("User")
                    .members(vec![
                        MemberShape::builder()
                            .name("id")
                            .shape(i64::shape_in(registry))
                            .build(),
                        MemberShape::builder()
                            .name("email")
                            .shape(Option::<String>::shape_in(registry))
                            .build(),
                    ])
                    .build(),
            )
        }
    }

    fn record(id: i32, name: &str) -> Value {
        Value::Record(vec![
            ("id".into(), Value::Int(id)),
            ("name".into(), Value::from(name)),
        ])
    }

    #[test]
    fn decoders_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Decoder>();
    }

    #[test]
    fn without_reader_schema() -> TestResult {
        let schema = user_v1()?;
        let bytes = to_avro_datum(&schema, record(1, "ann"))?;
        assert_eq!(
            from_avro_datum(&schema, &mut bytes.as_slice(), None)?,
            record(1, "ann")
        );
        Ok(())
    }

    #[test]
    fn typed_decode() -> TestResult {
        let schema = user_v1()?;
        let decoder = Decoder::for_type::<User>(schema.clone())?;
        let mut bytes = to_avro_datum(&schema, record(5, "bo"))?;
        bytes.extend(to_avro_datum(&schema, record(6, "cy"))?);

        let mut cursor = bytes.as_slice();
        assert_eq!(
            decoder.decode_into::<User>(&mut cursor)?,
            User { id: 5, email: None }
        );
        assert_eq!(
            decoder.decode_into::<User>(&mut cursor)?,
            User { id: 6, email: None }
        );
        assert!(cursor.is_empty());
        assert_eq!(decoder.compiled_plans(), 1);
        Ok(())
    }

    #[test]
    fn truncated_input() -> TestResult {
        let schema = user_v1()?;
        let bytes = to_avro_datum(&schema, record(1, "ann"))?;
        let decoder = Decoder::builder(schema).build()?;
        let err = decoder
            .decode(&mut &bytes[..bytes.len() - 1], None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedInput);
        Ok(())
    }
}
