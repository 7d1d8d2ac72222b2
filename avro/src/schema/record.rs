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

use crate::schema::{Aliases, Name, Schema};
use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// A description of a Record schema.
///
/// Build one with [`Schema::record`], which validates the fields and fills the lookup table.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordSchema {
    /// The name of the schema
    pub name: Name,
    /// The aliases of the schema
    pub aliases: Aliases,
    /// The documentation of the schema
    pub doc: Option<String>,
    /// The fields, in declaration order
    pub fields: Vec<RecordField>,
    /// Maps field names to their position in `fields`
    pub lookup: BTreeMap<String, usize>,
    /// The custom attributes of the schema
    pub attributes: BTreeMap<String, JsonValue>,
}

impl RecordSchema {
    pub fn field(&self, name: &str) -> Option<&RecordField> {
        self.lookup.get(name).map(|&i| &self.fields[i])
    }

    /// The field a writer field called `writer_name` is read into: same name first, then the
    /// first field listing `writer_name` among its aliases.
    pub fn reader_field_for(&self, writer_name: &str) -> Option<&RecordField> {
        self.field(writer_name).or_else(|| {
            self.fields.iter().find(|f| {
                f.aliases
                    .as_ref()
                    .is_some_and(|aliases| aliases.iter().any(|a| a == writer_name))
            })
        })
    }
}

/// Represents a `field` in a `record` Avro schema.
#[derive(bon::Builder, Clone, Debug, PartialEq)]
pub struct RecordField {
    /// Name of the field.
    #[builder(into)]
    pub name: String,
    /// Documentation of the field.
    #[builder(into)]
    pub doc: Option<String>,
    /// Former names of the field, matched against writer field names.
    pub aliases: Option<Vec<String>>,
    /// The value readers use when the writer did not have this field.
    pub default: Option<JsonValue>,
    /// Schema of the field.
    pub schema: Schema,
    /// Position of the field in the list of `fields` of its parent record
    #[builder(default)]
    pub position: usize,
}

impl RecordField {
    pub fn is_nullable(&self) -> bool {
        self.schema.is_nullable()
    }
}

impl Serialize for RecordField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("type", &self.schema)?;

        if let Some(doc) = &self.doc {
            map.serialize_entry("doc", doc)?;
        }
        if let Some(default) = &self.default {
            map.serialize_entry("default", default)?;
        }
        if let Some(aliases) = &self.aliases {
            map.serialize_entry("aliases", aliases)?;
        }

        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apache_avro_test_helper::TestResult;
    use pretty_assertions::assert_eq;

    #[test]
    fn reader_field_lookup_prefers_names_over_aliases() -> TestResult {
        let schema = Schema::record(Name::new("Rec")?)
            .fields(vec![
                RecordField::builder()
                    .name("full_name")
                    .aliases(vec!["name".into()])
                    .schema(Schema::String)
                    .build(),
                RecordField::builder().name("name").schema(Schema::String).build(),
            ])
            .build()?;
        let Schema::Record(record) = schema else {
            unreachable!()
        };

        assert_eq!(record.reader_field_for("name").map(|f| f.position), Some(1));
        assert_eq!(
            record.reader_field_for("full_name").map(|f| f.position),
            Some(0)
        );
        assert!(record.reader_field_for("age").is_none());
        Ok(())
    }
}
