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

//! Schema-less readers for the primitive Avro encodings.
//!
//! Every function consumes exactly the bytes of one value from the cursor. Running out of input
//! before a value is complete is reported as [`ErrorKind::TruncatedInput`](crate::error::ErrorKind).

pub mod block;

use crate::{
    AvroResult,
    error::Details,
    util::{read_len, zag_i32, zag_i64},
};
use std::io::{self, Read};

pub fn decode_long<R: Read>(reader: &mut R) -> AvroResult<i64> {
    zag_i64(reader)
}

pub fn decode_int<R: Read>(reader: &mut R) -> AvroResult<i32> {
    zag_i32(reader)
}

pub fn decode_float<R: Read>(reader: &mut R) -> AvroResult<f32> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|e| Details::read("float", e))?;
    Ok(f32::from_le_bytes(buf))
}

pub fn decode_double<R: Read>(reader: &mut R) -> AvroResult<f64> {
    let mut buf = [0u8; 8];
    reader
        .read_exact(&mut buf)
        .map_err(|e| Details::read("double", e))?;
    Ok(f64::from_le_bytes(buf))
}

pub fn decode_bool<R: Read>(reader: &mut R) -> AvroResult<bool> {
    let mut buf = [0u8; 1];
    reader
        .read_exact(&mut buf)
        .map_err(|e| Details::read("boolean", e))?;
    match buf[0] {
        0u8 => Ok(false),
        1u8 => Ok(true),
        other => Err(Details::BoolValue(other).into()),
    }
}

pub fn decode_bytes<R: Read>(reader: &mut R) -> AvroResult<Vec<u8>> {
    let len = read_len(reader)?;
    decode_fixed(reader, len)
}

pub fn decode_string<R: Read>(reader: &mut R) -> AvroResult<String> {
    let bytes = decode_bytes(reader)?;
    String::from_utf8(bytes).map_err(|e| Details::ConvertToUtf8(e).into())
}

/// Read exactly `size` bytes, the encoding of a `fixed` value.
pub fn decode_fixed<R: Read>(reader: &mut R, size: usize) -> AvroResult<Vec<u8>> {
    let mut buf = vec![0u8; size];
    reader
        .read_exact(&mut buf)
        .map_err(|e| Details::read("bytes", e))?;
    Ok(buf)
}

/// Discard `len` bytes from the cursor.
pub(crate) fn skip_bytes<R: Read>(reader: &mut R, len: usize) -> AvroResult<()> {
    let skipped = io::copy(&mut reader.by_ref().take(len as u64), &mut io::sink())
        .map_err(|e| Details::read("bytes", e))?;
    if skipped < len as u64 {
        return Err(Details::TruncatedInput { what: "bytes" }.into());
    }
    Ok(())
}
