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

//! Descriptions of in-memory object shapes.
//!
//! A [`Shape`] says what a Rust type looks like to Avro: which primitive it is, which members a
//! struct has and how they are named. Shapes serve two purposes:
//!
//! * [`SchemaBuilder`] derives a writer or reader [`Schema`](crate::Schema) from them.
//! * The [`Decoder`](crate::Decoder) uses them as the target of a decode, so that record fields
//!   are bound to struct members and logical values get their native representation.
//!
//! Types describe themselves through the [`AvroShape`] trait. Self-referential types register
//! their shape in a [`ShapeRegistry`] under a key and refer to it with [`Shape::Named`]:
//!
//! ```
//! use avro_evolve::shape::{AvroShape, MemberShape, RecordShape, Shape, ShapeRegistry};
//!
//! struct Node {
//!     value: i64,
//!     next: Option<Box<Node>>,
//! }
//!
//! impl AvroShape for Node {
//!     fn shape_in(registry: &mut ShapeRegistry) -> Shape {
//!         registry.define("Node", |registry| {
//!             Shape::Record(
//!                 RecordShape::builder()
//!                     .name("Node")
//!                     .members(vec![
//!                         MemberShape::builder().name("value").shape(i64::shape_in(registry)).build(),
//!                         MemberShape::builder()
//!                             .name("next")
//!                             .shape(Option::<Box<Node>>::shape_in(registry))
//!                             .build(),
//!                     ])
//!                     .build(),
//!             )
//!         })
//!     }
//! }
//!
//! let schema = avro_evolve::shape::schema_of::<Node>().unwrap();
//! assert_eq!(schema.name().unwrap().fullname(), "Node");
//! ```

mod builder;
mod component;

pub use builder::SchemaBuilder;
pub use component::{AvroShape, schema_of};

use crate::{AvroResult, error::Details};
use bon::bon;
use serde_json::Value as JsonValue;
use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
};

/// The shape of an in-memory value.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    Bytes,
    Uuid,
    Decimal { precision: usize, scale: usize },
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    Fixed(FixedShape),
    Enum(EnumShape),
    Array(Box<Shape>),
    /// A map with string keys.
    Map(Box<Shape>),
    /// A value that may be absent.
    Nullable(Box<Shape>),
    Record(RecordShape),
    /// The shape registered under this key in a [`ShapeRegistry`].
    Named(String),
}

impl Shape {
    pub fn array(items: Shape) -> Self {
        Shape::Array(Box::new(items))
    }

    pub fn map(values: Shape) -> Self {
        Shape::Map(Box::new(values))
    }

    pub fn nullable(inner: Shape) -> Self {
        match inner {
            nullable @ Shape::Nullable(_) => nullable,
            inner => Shape::Nullable(Box::new(inner)),
        }
    }

    pub fn named(key: impl Into<String>) -> Self {
        Shape::Named(key.into())
    }

    /// Whether the schema derived from this shape is a named Avro type.
    pub fn is_named(&self) -> bool {
        matches!(self, Shape::Record(_) | Shape::Enum(_) | Shape::Fixed(_))
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Null => f.write_str("null"),
            Shape::Boolean => f.write_str("boolean"),
            Shape::Int => f.write_str("int"),
            Shape::Long => f.write_str("long"),
            Shape::Float => f.write_str("float"),
            Shape::Double => f.write_str("double"),
            Shape::String => f.write_str("string"),
            Shape::Bytes => f.write_str("bytes"),
            Shape::Uuid => f.write_str("uuid"),
            Shape::Decimal { precision, scale } => write!(f, "decimal({precision}, {scale})"),
            Shape::Date => f.write_str("date"),
            Shape::TimeMillis => f.write_str("time-millis"),
            Shape::TimeMicros => f.write_str("time-micros"),
            Shape::TimestampMillis => f.write_str("timestamp-millis"),
            Shape::TimestampMicros => f.write_str("timestamp-micros"),
            Shape::Fixed(fixed) => write!(f, "fixed {}", fixed.name),
            Shape::Enum(e) => write!(f, "enum {}", e.name),
            Shape::Array(items) => write!(f, "array<{items}>"),
            Shape::Map(values) => write!(f, "map<{values}>"),
            Shape::Nullable(inner) => write!(f, "nullable<{inner}>"),
            Shape::Record(record) => write!(f, "record {}", record.name),
            Shape::Named(key) => write!(f, "{key}"),
        }
    }
}

#[derive(bon::Builder, Clone, Debug, PartialEq)]
pub struct FixedShape {
    #[builder(into)]
    pub name: String,
    #[builder(into)]
    pub namespace: Option<String>,
    pub size: usize,
}

#[derive(bon::Builder, Clone, Debug, PartialEq)]
pub struct EnumShape {
    #[builder(into)]
    pub name: String,
    #[builder(into)]
    pub namespace: Option<String>,
    pub symbols: Vec<String>,
    /// Symbol used when reading a symbol this enum does not know.
    #[builder(into)]
    pub default: Option<String>,
}

/// A struct: a named record with members.
#[derive(bon::Builder, Clone, Debug, PartialEq)]
pub struct RecordShape {
    #[builder(into)]
    pub name: String,
    #[builder(into)]
    pub namespace: Option<String>,
    #[builder(into)]
    pub doc: Option<String>,
    #[builder(default)]
    pub aliases: Vec<String>,
    #[builder(default)]
    pub members: Vec<MemberShape>,
}

impl RecordShape {
    /// The name plans are cached under.
    pub(crate) fn fullname(&self) -> String {
        match &self.namespace {
            Some(ns) if !self.name.contains('.') => format!("{ns}.{}", self.name),
            _ => self.name.clone(),
        }
    }
}

/// A member of a struct.
#[derive(Clone, Debug, PartialEq)]
pub struct MemberShape {
    /// The member name, the key the decoded value is stored under.
    pub name: String,
    pub shape: Shape,
    /// The Avro field name, when it differs from the member name.
    pub rename: Option<String>,
    /// JSON default for the derived record field.
    pub default: Option<JsonValue>,
    /// Former Avro field names of this member.
    pub aliases: Vec<String>,
    pub doc: Option<String>,
}

#[bon]
impl MemberShape {
    /// A nullable member has the shape [`Shape::Nullable`] over the given shape.
    #[builder]
    pub fn new(
        #[builder(into)] name: String,
        shape: Shape,
        #[builder(default)] nullable: bool,
        #[builder(into)] rename: Option<String>,
        default: Option<JsonValue>,
        #[builder(default)] aliases: Vec<String>,
        #[builder(into)] doc: Option<String>,
    ) -> Self {
        let shape = if nullable { Shape::nullable(shape) } else { shape };
        Self {
            name,
            shape,
            rename,
            default,
            aliases,
            doc,
        }
    }
}

impl MemberShape {
    /// The name of the Avro field this member is written as.
    pub fn field_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self.shape, Shape::Nullable(_))
    }

    /// Whether this member binds the Avro field `field`, matched case-insensitively.
    pub(crate) fn binds(&self, field: &str) -> bool {
        self.field_name().eq_ignore_ascii_case(field)
    }
}

/// Shapes by type key.
///
/// Keys are free-form. They usually are the name of the type, but may also name an anonymous
/// shape such as an array alias.
#[derive(Clone, Debug, Default)]
pub struct ShapeRegistry {
    shapes: HashMap<String, Shape>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `shape` under `key`, replacing any previous shape, and return a reference to it.
    pub fn register(&mut self, key: impl Into<String>, shape: Shape) -> Shape {
        let key = key.into();
        self.shapes.insert(key.clone(), shape);
        Shape::Named(key)
    }

    /// Register the shape produced by `describe` under `key`, unless `key` is already known.
    ///
    /// The key is reserved before `describe` runs, so the description may refer to itself.
    pub fn define(&mut self, key: &str, describe: impl FnOnce(&mut Self) -> Shape) -> Shape {
        if !self.shapes.contains_key(key) {
            self.shapes
                .insert(key.to_string(), Shape::Named(key.to_string()));
            let shape = describe(self);
            self.shapes.insert(key.to_string(), shape);
        }
        Shape::Named(key.to_string())
    }

    pub fn get(&self, key: &str) -> Option<&Shape> {
        self.shapes.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.shapes.contains_key(key)
    }

    /// Follow `shape` through the registry until it is not a [`Shape::Named`].
    pub(crate) fn resolve<'s>(&'s self, mut shape: &'s Shape) -> AvroResult<&'s Shape> {
        let mut hops = 0;
        while let Shape::Named(key) = shape {
            shape = self
                .get(key)
                .ok_or_else(|| Details::UnknownShape(key.clone()))?;
            hops += 1;
            if hops > self.shapes.len() {
                return Err(Details::UnresolvableShapeCycle(key.clone()).into());
            }
        }
        Ok(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use apache_avro_test_helper::TestResult;
    use pretty_assertions::assert_eq;

    #[test]
    fn define_reserves_the_key() -> TestResult {
        let mut registry = ShapeRegistry::new();
        let mut seen_self = false;
        let named = registry.define("List", |registry| {
            seen_self = registry.contains("List");
            Shape::array(Shape::named("List"))
        });
        assert!(seen_self);
        assert_eq!(named, Shape::named("List"));
        assert_eq!(registry.get("List"), Some(&Shape::array(Shape::named("List"))));

        // a second definition keeps the first one
        registry.define("List", |_| Shape::Int);
        assert_eq!(registry.resolve(&named)?, &Shape::array(Shape::named("List")));
        Ok(())
    }

    #[test]
    fn resolving_unknown_and_aliased_keys() {
        let mut registry = ShapeRegistry::new();
        registry.register("A", Shape::named("B"));
        registry.register("B", Shape::named("A"));
        let err = registry.resolve(&Shape::named("A")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedShape);

        let err = registry.resolve(&Shape::named("C")).unwrap_err();
        assert!(matches!(err.details(), Details::UnknownShape(key) if key == "C"));
    }

    #[test]
    fn members() {
        let member = MemberShape::builder()
            .name("userName")
            .rename("user_name")
            .shape(Shape::String)
            .nullable(true)
            .build();
        assert!(member.is_nullable());
        assert_eq!(member.shape, Shape::nullable(Shape::String));
        assert!(member.binds("USER_NAME"));
        assert!(!member.binds("userName"));
    }

    #[test]
    fn display() {
        assert_eq!(
            Shape::map(Shape::nullable(Shape::Decimal {
                precision: 4,
                scale: 2
            }))
            .to_string(),
            "map<nullable<decimal(4, 2)>>"
        );
    }
}
