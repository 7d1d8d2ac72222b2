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
    decode::{block::BlockReader, decode_long, skip_bytes},
    error::Details,
    schema::{
        DecimalSchema, FixedSchema, InnerDecimalSchema, Names, Schema, UuidSchema, deref,
    },
    util::read_len,
};
use std::io::Read;

/// Consume one value written with `schema` without materializing it.
///
/// Blocks that carry their byte size are jumped over without looking at their items.
pub fn skip<R: Read>(schema: &Schema, cursor: &mut R, names: &Names) -> AvroResult<()> {
    match deref(schema, names)? {
        Schema::Null => Ok(()),
        Schema::Boolean => skip_bytes(cursor, 1),
        Schema::Int
        | Schema::Long
        | Schema::Enum(_)
        | Schema::Date
        | Schema::TimeMillis
        | Schema::TimeMicros
        | Schema::TimestampMillis
        | Schema::TimestampMicros => decode_long(cursor).map(drop),
        Schema::Float => skip_bytes(cursor, 4),
        Schema::Double => skip_bytes(cursor, 8),
        Schema::Bytes
        | Schema::String
        | Schema::Decimal(DecimalSchema {
            inner: InnerDecimalSchema::Bytes,
            ..
        })
        | Schema::Uuid(UuidSchema::String) => {
            let len = read_len(cursor)?;
            skip_bytes(cursor, len)
        }
        Schema::Fixed(FixedSchema { size, .. })
        | Schema::Decimal(DecimalSchema {
            inner: InnerDecimalSchema::Fixed(FixedSchema { size, .. }),
            ..
        })
        | Schema::Uuid(UuidSchema::Fixed(FixedSchema { size, .. })) => skip_bytes(cursor, *size),
        Schema::Array(array) => skip_blocks(cursor, |cursor| skip(&array.items, cursor, names)),
        Schema::Map(map) => skip_blocks(cursor, |cursor| {
            let len = read_len(cursor)?;
            skip_bytes(cursor, len)?;
            skip(&map.values, cursor, names)
        }),
        Schema::Union(union) => {
            let index = decode_long(cursor)?;
            let branch = usize::try_from(index)
                .ok()
                .and_then(|i| union.variants().get(i))
                .ok_or(Details::GetUnionVariant {
                    index,
                    num_variants: union.variants().len(),
                })?;
            skip(branch, cursor, names)
        }
        Schema::Record(record) => record.fields.iter().try_for_each(|field| {
            skip(&field.schema, cursor, names).map_err(|e| e.in_field(&record.name, &field.name))
        }),
        Schema::Ref { name } => Err(Details::SchemaResolutionError(name.clone()).into()),
    }
}

fn skip_blocks<R: Read>(
    cursor: &mut R,
    mut skip_item: impl FnMut(&mut R) -> AvroResult<()>,
) -> AvroResult<()> {
    let mut blocks = BlockReader::new();
    loop {
        if blocks.skip_sized(cursor)? {
            continue;
        }
        if !blocks.next_item(cursor)? {
            return Ok(());
        }
        skip_item(cursor)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        encode::encode_to_vec,
        error::ErrorKind,
        schema::{Name, RecordField},
        types::Value,
    };
    use apache_avro_test_helper::TestResult;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn skip_all(schema: &Schema, bytes: &[u8]) -> AvroResult<usize> {
        let mut cursor = bytes;
        skip(schema, &mut cursor, &Names::new())?;
        Ok(bytes.len() - cursor.len())
    }

    #[test]
    fn skips_exactly_one_value() -> TestResult {
        let schema = Schema::record(Name::new("R")?)
            .fields(vec![
                RecordField::builder()
                    .name("tags")
                    .schema(Schema::map(Schema::array(Schema::String).build()).build())
                    .build(),
                RecordField::builder()
                    .name("choice")
                    .schema(Schema::union(vec![Schema::Null, Schema::Double])?)
                    .build(),
                RecordField::builder().name("flag").schema(Schema::Boolean).build(),
            ])
            .build()?;
        let value = Value::Record(vec![
            (
                "tags".into(),
                Value::Map(HashMap::from([(
                    "k".to_string(),
                    Value::Array(vec!["a".into(), "bc".into()]),
                )])),
            ),
            ("choice".into(), Value::Double(2.5)),
            ("flag".into(), Value::Boolean(true)),
        ]);
        let mut bytes = encode_to_vec(&value, &schema)?;
        let len = bytes.len();
        bytes.extend_from_slice(&[0xDE, 0xAD]);
        assert_eq!(skip_all(&schema, &bytes)?, len);
        Ok(())
    }

    #[test]
    fn negative_blocks_are_skipped_by_size() -> TestResult {
        let schema = Schema::array(Schema::Long).build();
        // one block of two items announced as -2 with a byte size of 2, then the end marker
        let bytes = [0x03, 0x04, 0x02, 0x04, 0x00];
        assert_eq!(skip_all(&schema, &bytes)?, bytes.len());
        Ok(())
    }

    #[test]
    fn invalid_union_index() {
        let schema = Schema::union(vec![Schema::Null, Schema::Int]).expect("valid union");
        let err = skip_all(&schema, &[0x04]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    }

    #[test]
    fn truncated() {
        let err = skip_all(&Schema::Double, &[0; 4]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedInput);
    }
}
