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
    error::Details,
    schema::{Name, RecordField, Schema, UuidSchema},
    shape::{MemberShape, RecordShape, Shape, ShapeRegistry},
};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Derives a [`Schema`] from a [`Shape`].
///
/// Named types seen a second time become `Schema::Ref`s, so self-referential shapes produce
/// recursive schemas. Two different shapes with the same full name are rejected with
/// `Details::AmbiguousSchemaDefinition`. A shape that reaches itself without passing through a named type cannot be
/// expressed in Avro and is rejected with `Details::UnresolvableShapeCycle`.
#[derive(Debug, Default)]
pub struct SchemaBuilder<'r> {
    registry: Option<&'r ShapeRegistry>,
    name: Option<String>,
    namespace: Option<String>,
}

impl<'r> SchemaBuilder<'r> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry [`Shape::Named`] keys are looked up in.
    pub fn with_registry(mut self, registry: &'r ShapeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Name the root type `name`, whatever the shape calls it.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Put the root type in `namespace`, whatever the shape says.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn build(&self, shape: &Shape) -> AvroResult<Schema> {
        let mut walk = Walk {
            registry: self.registry,
            defined: HashMap::new(),
            expanding: Vec::new(),
            key_names: HashMap::new(),
        };
        let root = Root {
            name: self.name.as_deref(),
            namespace: self.namespace.as_deref(),
        };
        walk.schema(shape, self.namespace.as_deref(), Some(root))
    }
}

/// Naming overrides for the root type.
#[derive(Clone, Copy)]
struct Root<'a> {
    name: Option<&'a str>,
    namespace: Option<&'a str>,
}

struct Walk<'r> {
    registry: Option<&'r ShapeRegistry>,
    defined: HashMap<Name, Shape>,
    // keys of the registry entries currently being expanded, innermost last
    expanding: Vec<String>,
    key_names: HashMap<String, Name>,
}

impl Walk<'_> {
    /// Whether `name` was already defined by `shape`. A different shape under the same name is an
    /// error.
    fn seen(&mut self, name: &Name, shape: &Shape) -> AvroResult<bool> {
        match self.defined.get(name) {
            Some(defined) if defined == shape => Ok(true),
            Some(_) => Err(Details::AmbiguousSchemaDefinition(name.clone()).into()),
            None => {
                self.defined.insert(name.clone(), shape.clone());
                Ok(false)
            }
        }
    }

    fn schema(
        &mut self,
        shape: &Shape,
        enclosing_namespace: Option<&str>,
        root: Option<Root<'_>>,
    ) -> AvroResult<Schema> {
        Ok(match shape {
            Shape::Null => Schema::Null,
            Shape::Boolean => Schema::Boolean,
            Shape::Int => Schema::Int,
            Shape::Long => Schema::Long,
            Shape::Float => Schema::Float,
            Shape::Double => Schema::Double,
            Shape::String => Schema::String,
            Shape::Bytes => Schema::Bytes,
            Shape::Uuid => Schema::Uuid(UuidSchema::String),
            Shape::Decimal { precision, scale } => {
                Schema::decimal(*precision, Schema::Bytes)
                    .scale(*scale)
                    .build()?
            }
            Shape::Date => Schema::Date,
            Shape::TimeMillis => Schema::TimeMillis,
            Shape::TimeMicros => Schema::TimeMicros,
            Shape::TimestampMillis => Schema::TimestampMillis,
            Shape::TimestampMicros => Schema::TimestampMicros,
            Shape::Array(items) => {
                Schema::array(self.schema(items, enclosing_namespace, None)?).build()
            }
            Shape::Map(values) => {
                Schema::map(self.schema(values, enclosing_namespace, None)?).build()
            }
            Shape::Nullable(inner) => {
                let inner = self.schema(inner, enclosing_namespace, root)?;
                nullable(inner)?
            }
            Shape::Fixed(fixed) => {
                let name = name_of(shape, enclosing_namespace, root)?;
                if self.seen(&name, shape)? {
                    return Ok(Schema::Ref { name });
                }
                Schema::fixed(name, fixed.size).build()?
            }
            Shape::Enum(e) => {
                let name = name_of(shape, enclosing_namespace, root)?;
                if self.seen(&name, shape)? {
                    return Ok(Schema::Ref { name });
                }
                Schema::r#enum(name, e.symbols.clone())
                    .maybe_default(e.default.clone())
                    .build()?
            }
            Shape::Record(record) => {
                let name = name_of(shape, enclosing_namespace, root)?;
                if self.seen(&name, shape)? {
                    return Ok(Schema::Ref { name });
                }
                self.record(record, name)?
            }
            Shape::Named(key) => self.named(key, enclosing_namespace, root)?,
        })
    }

    fn named(
        &mut self,
        key: &str,
        enclosing_namespace: Option<&str>,
        root: Option<Root<'_>>,
    ) -> AvroResult<Schema> {
        if self.expanding.iter().any(|k| k == key) {
            return match self.key_names.get(key) {
                Some(name) => Ok(Schema::Ref { name: name.clone() }),
                None => Err(Details::UnresolvableShapeCycle(key.to_string()).into()),
            };
        }
        let shape = self
            .registry
            .and_then(|registry| registry.get(key))
            .ok_or_else(|| Details::UnknownShape(key.to_string()))?;
        if shape.is_named() {
            let name = name_of(shape, enclosing_namespace, root)?;
            self.key_names.insert(key.to_string(), name);
        }

        self.expanding.push(key.to_string());
        let schema = self.schema(shape, enclosing_namespace, root);
        self.expanding.pop();
        schema
    }

    fn record(&mut self, record: &RecordShape, name: Name) -> AvroResult<Schema> {
        let namespace = name.namespace.clone();
        let fields = record
            .members
            .iter()
            .map(|member| self.field(member, namespace.as_deref()))
            .collect::<AvroResult<Vec<_>>>()?;
        let aliases = name.qualify_aliases(Some(record.aliases.clone()).filter(|a| !a.is_empty()))?;
        Schema::record(name)
            .fields(fields)
            .maybe_aliases(aliases)
            .maybe_doc(record.doc.clone())
            .build()
    }

    fn field(&mut self, member: &MemberShape, namespace: Option<&str>) -> AvroResult<RecordField> {
        let schema = self.schema(&member.shape, namespace, None)?;
        let default = match &member.default {
            Some(default) => Some(default.clone()),
            None if member.is_nullable() => Some(JsonValue::Null),
            None => None,
        };
        Ok(RecordField::builder()
            .name(member.field_name())
            .maybe_doc(member.doc.clone())
            .maybe_aliases(Some(member.aliases.clone()).filter(|a| !a.is_empty()))
            .maybe_default(default)
            .schema(schema)
            .build())
    }
}

/// `Union[Null, T]`, flattened when `T` already is a union.
fn nullable(inner: Schema) -> AvroResult<Schema> {
    match inner {
        Schema::Union(union) if union.is_nullable() => Ok(Schema::Union(union)),
        Schema::Union(union) => {
            let mut branches = vec![Schema::Null];
            branches.extend(union.variants().iter().cloned());
            Schema::union(branches)
        }
        Schema::Null => Ok(Schema::Null),
        inner => Schema::union(vec![Schema::Null, inner]),
    }
}

/// The full name of a named shape.
fn name_of(shape: &Shape, enclosing_namespace: Option<&str>, root: Option<Root<'_>>) -> AvroResult<Name> {
    let (name, namespace) = match shape {
        Shape::Record(r) => (r.name.as_str(), r.namespace.as_deref()),
        Shape::Enum(e) => (e.name.as_str(), e.namespace.as_deref()),
        Shape::Fixed(f) => (f.name.as_str(), f.namespace.as_deref()),
        other => return Err(Details::InvalidShape(other.to_string()).into()),
    };
    let name = root.and_then(|r| r.name).unwrap_or(name);
    let namespace = root
        .and_then(|r| r.namespace)
        .or(namespace)
        .or(enclosing_namespace);
    Name::new_with_enclosing_namespace(name, namespace)
}
