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

//! An engine for the **[Apache Avro](https://avro.apache.org/)** binary format that reads data
//! written with one schema (the *writer* schema) as values of another (the *reader* schema).
//!
//! Avro data does not describe itself: decoding it requires the exact schema it was written
//! with. Applications evolve their schemas over time, so the schema a program expects is often
//! not the one old data was written with. This crate implements the
//! [schema resolution](https://avro.apache.org/docs/++version++/specification/#schema-resolution)
//! rules that bridge the two: numeric promotion, fields matched by name and alias, defaults for
//! fields the writer did not know, skipping of fields the reader does not want, union branch
//! selection and enum symbol mapping.
//!
//! There are two ways of working with the decoded data:
//!
//! 1. Via the generic [`Value`](types::Value) type, shaped by the reader schema.
//! 2. Via Rust types implementing [`AvroShape`](shape::AvroShape) and Serde's `Deserialize`,
//!    decoded with [`Decoder::decode_into`]. The schema of such a type is derived from its
//!    [`Shape`](shape::Shape) by the [`SchemaBuilder`](shape::SchemaBuilder).
//!
//! ```
//! # use avro_evolve::{Decoder, Error, Schema, types::Value, writer::to_avro_datum};
//! let writer = Schema::parse_str(
//!     r#"{"type": "record", "name": "Reading", "fields": [
//!         {"name": "sensor", "type": "string"},
//!         {"name": "celsius", "type": "float"},
//!         {"name": "raw", "type": {"type": "array", "items": "int"}}
//!     ]}"#,
//! )?;
//! let reader = Schema::parse_str(
//!     r#"{"type": "record", "name": "Reading", "fields": [
//!         {"name": "celsius", "type": "double"},
//!         {"name": "unit", "type": "string", "default": "C"},
//!         {"name": "sensor", "type": "string"}
//!     ]}"#,
//! )?;
//!
//! let written = Value::Record(vec![
//!     ("sensor".into(), Value::from("s-1")),
//!     ("celsius".into(), Value::Float(21.5)),
//!     ("raw".into(), Value::Array(vec![Value::Int(3), Value::Int(4)])),
//! ]);
//! let bytes = to_avro_datum(&writer, written)?;
//!
//! let decoder = Decoder::new(writer, reader)?;
//! assert_eq!(
//!     decoder.decode(&mut bytes.as_slice(), None)?,
//!     Value::Record(vec![
//!         ("celsius".into(), Value::Double(21.5)),
//!         ("unit".into(), Value::from("C")),
//!         ("sensor".into(), Value::from("s-1")),
//!     ])
//! );
//! # Ok::<(), Error>(())
//! ```
//!
//! The engine works on single values. Containers that frame values into files or messages use
//! [`writer::to_avro_datum`], [`Decoder`] and the block [`codec`]s.
//!
//! # Features
//!
//! - `snappy`: enable support for the Snappy codec
//! - `zstandard`: enable support for the Zstandard codec

pub mod codec;
pub mod decode;
pub mod default;
pub mod encode;
pub mod error;
pub mod reader;
pub mod resolution;
pub mod schema;
pub mod serde;
pub mod shape;
pub mod types;
pub mod util;
pub mod validator;
pub mod writer;

#[cfg(feature = "zstandard")]
pub use codec::ZstandardSettings;
pub use codec::{Codec, CodecRegistry, Compressor, DeflateSettings};
pub use error::Error;
pub use reader::{Decoder, from_avro_datum};
pub use schema::Schema;
pub use crate::serde::{from_value, to_value};
pub use shape::{AvroShape, Shape, ShapeRegistry, schema_of};
pub use uuid::Uuid;
pub use writer::{to_avro_datum, write_avro_datum};

/// A convenience type alias for `Result`s with `Error`s.
pub type AvroResult<T> = Result<T, Error>;
