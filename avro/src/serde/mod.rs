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

//! Bridging Rust types and [`Value`](crate::types::Value) through Serde.
//!
//! A type that implements [`AvroShape`](crate::shape::AvroShape) together with Serde's traits can
//! be written with the schema derived from its shape and decoded from data written with any
//! compatible schema:
//!
//! ```
//! # use avro_evolve::{
//! #     Decoder, Error,
//! #     serde::to_value,
//! #     shape::{AvroShape, MemberShape, RecordShape, Shape, ShapeRegistry, schema_of},
//! #     writer::to_avro_datum,
//! # };
//! # use serde::{Deserialize, Serialize};
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Point {
//!     x: i64,
//!     y: i64,
//! }
//!
//! impl AvroShape for Point {
//!     fn shape_in(registry: &mut ShapeRegistry) -> Shape {
//!         Shape::Record(
//!             RecordShape::builder()
//!                 .name("Point".to_string())
//!                 .members(vec![
//!                     MemberShape::builder().name("x").shape(i64::shape_in(registry)).build(),
//!                     MemberShape::builder().name("y").shape(i64::shape_in(registry)).build(),
//!                 ])
//!                 .build(),
//!         )
//!     }
//! }
//!
//! let schema = schema_of::<Point>()?;
//! let point = Point { x: 1, y: -2 };
//! let bytes = to_avro_datum(&schema, to_value(&point)?)?;
//!
//! let decoder = Decoder::new(schema.clone(), schema)?;
//! assert_eq!(decoder.decode_into::<Point>(&mut bytes.as_slice())?, point);
//! # Ok::<(), Error>(())
//! ```

pub mod de;
pub mod ser;

#[doc(inline)]
pub use de::from_value;
#[doc(inline)]
pub use ser::to_value;
