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

//! Writing single values in Avro binary format.
//!
//! These are the entry points for containers that frame values on their own (object container
//! files, message envelopes): a datum is the bare encoding of one value, without header, marker
//! or schema fingerprint.

use crate::{AvroResult, encode::encode, error::Details, schema::Schema, types::Value};
use std::io::Write;

/// Encode `value` with `schema`, validating it as it goes, and return the bytes.
///
/// Values that are not [`Value::Union`] are written as the first union branch that accepts them.
pub fn to_avro_datum<T: Into<Value>>(schema: &Schema, value: T) -> AvroResult<Vec<u8>> {
    let mut buffer = Vec::new();
    write_avro_datum(schema, value, &mut buffer)?;
    Ok(buffer)
}

/// Encode `value` with `schema` into `writer`, returning the number of bytes written.
///
/// Nothing is written if the value does not match the schema.
pub fn write_avro_datum<T: Into<Value>, W: Write>(
    schema: &Schema,
    value: T,
    writer: &mut W,
) -> AvroResult<usize> {
    let mut buffer = Vec::new();
    encode(&value.into(), schema, &mut buffer)?;
    writer.write_all(&buffer).map_err(Details::WriteBytes)?;
    Ok(buffer.len())
}
