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
    schema::{FixedSchema, Name, RecordField, RecordSchema, Schema, SchemaKind, UuidSchema},
    util::MapHelper,
};
use log::warn;
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, HashSet};

/// Keys with a meaning of their own; everything else on a complex type is a custom attribute.
const RESERVED: &[&str] = &[
    "type",
    "name",
    "namespace",
    "doc",
    "aliases",
    "fields",
    "symbols",
    "default",
    "items",
    "values",
    "size",
    "logicalType",
    "precision",
    "scale",
];

impl Schema {
    /// Create a `Schema` from a string representing a JSON Avro schema.
    pub fn parse_str(input: &str) -> AvroResult<Schema> {
        let value: JsonValue = serde_json::from_str(input).map_err(Details::ParseSchemaJson)?;
        Self::parse(&value)
    }

    /// Create a `Schema` from a `serde_json::Value` representing a JSON Avro schema.
    pub fn parse(value: &JsonValue) -> AvroResult<Schema> {
        Parser::default().parse(value, None)
    }
}

/// Single-document parser. Named types may only be referenced after (or inside) their definition.
#[derive(Default)]
struct Parser {
    defined: HashSet<Name>,
}

impl Parser {
    fn parse(&mut self, value: &JsonValue, enclosing_namespace: Option<&str>) -> AvroResult<Schema> {
        match value {
            JsonValue::String(t) => self.parse_known_schema(t, enclosing_namespace),
            JsonValue::Object(data) => self.parse_complex(data, enclosing_namespace),
            JsonValue::Array(data) => Schema::union(
                data.iter()
                    .map(|variant| self.parse(variant, enclosing_namespace))
                    .collect::<AvroResult<Vec<_>>>()?,
            ),
            _ => Err(Details::ParseSchemaFromValidJson.into()),
        }
    }

    /// Parse a string as a primitive type or a reference to an already defined named type.
    fn parse_known_schema(
        &mut self,
        name: &str,
        enclosing_namespace: Option<&str>,
    ) -> AvroResult<Schema> {
        match name {
            "null" => Ok(Schema::Null),
            "boolean" => Ok(Schema::Boolean),
            "int" => Ok(Schema::Int),
            "long" => Ok(Schema::Long),
            "double" => Ok(Schema::Double),
            "float" => Ok(Schema::Float),
            "bytes" => Ok(Schema::Bytes),
            "string" => Ok(Schema::String),
            _ => {
                let fully_qualified_name =
                    Name::new_with_enclosing_namespace(name, enclosing_namespace)
                        .map_err(|_| Details::ParsePrimitive(name.to_string()))?;
                if self.defined.contains(&fully_qualified_name) {
                    Ok(Schema::Ref {
                        name: fully_qualified_name,
                    })
                } else {
                    Err(Details::ParsePrimitive(fully_qualified_name.to_string()).into())
                }
            }
        }
    }

    fn parse_complex(
        &mut self,
        complex: &Map<String, JsonValue>,
        enclosing_namespace: Option<&str>,
    ) -> AvroResult<Schema> {
        let physical = match complex.get("type") {
            Some(JsonValue::String(t)) => match t.as_str() {
                "record" => self.parse_record(complex, enclosing_namespace)?,
                "enum" => self.parse_enum(complex, enclosing_namespace)?,
                "array" => {
                    let items = complex.get("items").ok_or(Details::GetArrayItemsField)?;
                    Schema::array(self.parse(items, enclosing_namespace)?)
                        .attributes(attributes(complex))
                        .build()
                }
                "map" => {
                    let values = complex.get("values").ok_or(Details::GetMapValuesField)?;
                    Schema::map(self.parse(values, enclosing_namespace)?)
                        .attributes(attributes(complex))
                        .build()
                }
                "fixed" => self.parse_fixed(complex, enclosing_namespace)?,
                other => self.parse_known_schema(other, enclosing_namespace)?,
            },
            Some(JsonValue::Object(data)) => self.parse_complex(data, enclosing_namespace)?,
            Some(JsonValue::Array(variants)) => {
                self.parse(&JsonValue::Array(variants.clone()), enclosing_namespace)?
            }
            Some(unknown) => return Err(Details::GetComplexType(unknown.clone()).into()),
            None => return Err(Details::GetComplexTypeField.into()),
        };

        match complex.get("logicalType").and_then(JsonValue::as_str) {
            Some(logical_type) => Ok(logical(logical_type, physical, complex)),
            None => Ok(physical),
        }
    }

    fn parse_record(
        &mut self,
        complex: &Map<String, JsonValue>,
        enclosing_namespace: Option<&str>,
    ) -> AvroResult<Schema> {
        let name = Name::parse(complex, enclosing_namespace)?;
        let aliases = name.qualify_aliases(complex.aliases())?;
        self.define(&name)?;

        let fields = complex
            .get("fields")
            .and_then(JsonValue::as_array)
            .ok_or(Details::GetRecordFieldsJson)?
            .iter()
            .map(|field| {
                let field = field.as_object().ok_or(Details::GetRecordFieldsJson)?;
                self.parse_field(field, &name)
            })
            .collect::<AvroResult<Vec<_>>>()?;

        RecordSchema::new(name, aliases, complex.doc(), fields, attributes(complex))
            .map(Schema::Record)
    }

    fn parse_field(
        &mut self,
        field: &Map<String, JsonValue>,
        record: &Name,
    ) -> AvroResult<RecordField> {
        let name = field.name().ok_or(Details::GetNameField)?;
        let schema = self.parse_complex(field, record.namespace.as_deref())?;
        Ok(RecordField {
            name,
            doc: field.doc(),
            aliases: field.aliases(),
            default: field.get("default").cloned(),
            schema,
            position: 0,
        })
    }

    fn parse_enum(
        &mut self,
        complex: &Map<String, JsonValue>,
        enclosing_namespace: Option<&str>,
    ) -> AvroResult<Schema> {
        let name = Name::parse(complex, enclosing_namespace)?;
        let aliases = name.qualify_aliases(complex.aliases())?;
        let symbols = complex
            .get("symbols")
            .and_then(JsonValue::as_array)
            .and_then(|symbols| {
                symbols
                    .iter()
                    .map(|s| s.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or(Details::GetEnumSymbolsField)?;
        self.define(&name)?;

        Schema::r#enum(name, symbols)
            .maybe_aliases(aliases)
            .maybe_doc(complex.doc())
            .maybe_default(complex.string("default"))
            .attributes(attributes(complex))
            .build()
    }

    fn parse_fixed(
        &mut self,
        complex: &Map<String, JsonValue>,
        enclosing_namespace: Option<&str>,
    ) -> AvroResult<Schema> {
        let size = complex.get("size").cloned().unwrap_or(JsonValue::Null);
        let size = size
            .as_u64()
            .and_then(|s| usize::try_from(s).ok())
            .ok_or_else(|| Details::GetFixedSizeField(size.clone()))?;
        let name = Name::parse(complex, enclosing_namespace)?;
        let aliases = name.qualify_aliases(complex.aliases())?;
        self.define(&name)?;

        Schema::fixed(name, size)
            .maybe_aliases(aliases)
            .maybe_doc(complex.doc())
            .attributes(attributes(complex))
            .build()
    }

    fn define(&mut self, name: &Name) -> AvroResult<()> {
        if self.defined.insert(name.clone()) {
            Ok(())
        } else {
            Err(Details::AmbiguousSchemaDefinition(name.clone()).into())
        }
    }
}

fn attributes(complex: &Map<String, JsonValue>) -> BTreeMap<String, JsonValue> {
    complex
        .iter()
        .filter(|(key, _)| !RESERVED.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Layer a logical type over its physical schema. Unknown or ill-fitting logical types leave the
/// physical schema untouched.
fn logical(logical_type: &str, physical: Schema, complex: &Map<String, JsonValue>) -> Schema {
    let expected: &[SchemaKind] = match logical_type {
        "decimal" => &[SchemaKind::Bytes, SchemaKind::Fixed],
        "uuid" => &[SchemaKind::String, SchemaKind::Fixed],
        "date" | "time-millis" => &[SchemaKind::Int],
        "time-micros" | "timestamp-millis" | "timestamp-micros" => &[SchemaKind::Long],
        _ => {
            warn!("Ignoring unknown logical type '{logical_type}'");
            return physical;
        }
    };
    if !expected.contains(&physical.kind()) {
        warn!("Ignoring logical type '{logical_type}' for schema of type {:?}", physical.kind());
        return physical;
    }

    match (logical_type, physical) {
        ("decimal", inner) => match decimal(inner.clone(), complex) {
            Ok(schema) => schema,
            Err(err) => {
                warn!("Ignoring invalid decimal logical type: {err}");
                inner
            }
        },
        ("uuid", Schema::String) => Schema::Uuid(UuidSchema::String),
        ("uuid", Schema::Fixed(fixed @ FixedSchema { size: 16, .. })) => {
            Schema::Uuid(UuidSchema::Fixed(fixed))
        }
        ("uuid", other) => {
            warn!("Ignoring uuid logical type on a fixed schema whose size is not 16");
            other
        }
        ("date", _) => Schema::Date,
        ("time-millis", _) => Schema::TimeMillis,
        ("time-micros", _) => Schema::TimeMicros,
        ("timestamp-millis", _) => Schema::TimestampMillis,
        (_, _) => Schema::TimestampMicros,
    }
}

fn decimal(inner: Schema, complex: &Map<String, JsonValue>) -> AvroResult<Schema> {
    let metadata = |key: &'static str| -> AvroResult<Option<usize>> {
        match complex.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|v| usize::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| {
                    Details::GetDecimalMetadataFromJson {
                        key,
                        value: value.clone(),
                    }
                    .into()
                }),
        }
    };
    let precision = metadata("precision")?.ok_or(Details::GetDecimalMetadataFromJson {
        key: "precision",
        value: JsonValue::Null,
    })?;
    let scale = metadata("scale")?.unwrap_or(0);
    Schema::decimal(precision, inner).scale(scale).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        schema::{DecimalSchema, InnerDecimalSchema, ResolvedSchema},
    };
    use apache_avro_test_helper::TestResult;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_records_with_namespaces_and_references() -> TestResult {
        let schema = Schema::parse_str(
            r#"{
                "type": "record",
                "name": "LongList",
                "namespace": "com.example",
                "aliases": ["LinkedLongs"],
                "fields": [
                    {"name": "value", "type": "long"},
                    {"name": "next", "type": ["null", "LongList"], "default": null}
                ]
            }"#,
        )?;
        let Schema::Record(record) = &schema else {
            panic!("Expected a record, got {schema:?}");
        };
        assert_eq!(record.name.fullname(), "com.example.LongList");
        assert_eq!(
            record.aliases,
            Some(vec![Name::new("com.example.LinkedLongs")?])
        );
        assert_eq!(
            record.fields[1].schema,
            Schema::union(vec![
                Schema::Null,
                Schema::Ref {
                    name: Name::new("com.example.LongList")?
                }
            ])?
        );
        ResolvedSchema::try_from(schema.clone())?;
        Ok(())
    }

    #[test]
    fn nested_names_inherit_namespace() -> TestResult {
        let schema = Schema::parse(&json!({
            "type": "record",
            "name": "outer.Rec",
            "fields": [
                {"name": "suit", "type": {"type": "enum", "name": "Suit", "symbols": ["H", "S"]}},
                {"name": "again", "type": "Suit"}
            ]
        }))?;
        let Schema::Record(record) = schema else {
            panic!("Expected a record");
        };
        assert_eq!(
            record.fields[0].schema.name().map(Name::fullname),
            Some("outer.Suit".to_string())
        );
        assert!(matches!(&record.fields[1].schema, Schema::Ref { name } if name.fullname() == "outer.Suit"));
        Ok(())
    }

    #[test]
    fn logical_types() -> TestResult {
        assert_eq!(
            Schema::parse_str(r#"{"type": "int", "logicalType": "date"}"#)?,
            Schema::Date
        );
        assert_eq!(
            Schema::parse_str(r#"{"type": "string", "logicalType": "uuid"}"#)?,
            Schema::Uuid(UuidSchema::String)
        );
        assert!(matches!(
            Schema::parse_str(
                r#"{"type": "bytes", "logicalType": "decimal", "precision": 9, "scale": 2}"#
            )?,
            Schema::Decimal(DecimalSchema {
                precision: 9,
                scale: 2,
                inner: InnerDecimalSchema::Bytes
            })
        ));
        // ill-fitting logical types degrade to the physical type
        assert_eq!(
            Schema::parse_str(r#"{"type": "string", "logicalType": "date"}"#)?,
            Schema::String
        );
        assert_eq!(
            Schema::parse_str(r#"{"type": "bytes", "logicalType": "decimal", "precision": 0}"#)?,
            Schema::Bytes
        );
        assert_eq!(
            Schema::parse_str(r#"{"type": "long", "logicalType": "fancy"}"#)?,
            Schema::Long
        );
        Ok(())
    }

    #[test]
    fn round_trips_through_json() -> TestResult {
        let text = json!({
            "type": "record",
            "name": "Rec",
            "namespace": "ns",
            "fields": [
                {"name": "id", "type": {"type": "fixed", "name": "Id", "size": 16, "logicalType": "uuid"}},
                {"name": "amount", "type": {"type": "bytes", "logicalType": "decimal", "scale": 2, "precision": 10}},
                {"name": "tags", "type": {"type": "map", "values": "string"}, "default": {}}
            ]
        });
        let schema = Schema::parse(&text)?;
        let reparsed = Schema::parse(&serde_json::to_value(&schema)?)?;
        assert_eq!(schema, reparsed);
        Ok(())
    }

    #[test]
    fn errors() {
        assert!(matches!(
            Schema::parse_str("{").unwrap_err().details(),
            Details::ParseSchemaJson(_)
        ));
        assert!(matches!(
            Schema::parse_str(r#""Unknown""#).unwrap_err().details(),
            Details::ParsePrimitive(_)
        ));
        assert!(matches!(
            Schema::parse_str(r#"{"type": "fixed", "name": "F", "size": -1}"#)
                .unwrap_err()
                .details(),
            Details::GetFixedSizeField(_)
        ));
        assert_eq!(
            Schema::parse_str(r#"["null", "int", "null"]"#)
                .unwrap_err()
                .kind(),
            ErrorKind::Schema
        );
        assert!(matches!(
            Schema::parse_str(
                r#"["null", {"type": "fixed", "name": "F", "size": 1}, {"type": "fixed", "name": "F", "size": 2}]"#
            )
            .unwrap_err()
            .details(),
            Details::AmbiguousSchemaDefinition(_)
        ));
    }
}
