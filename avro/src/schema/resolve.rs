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
    AvroResult, Error,
    error::Details,
    schema::{Name, Names, RecordSchema, Schema, UnionSchema},
};
use std::collections::HashSet;

/// A schema together with every named schema defined in it.
///
/// `Schema::Ref` nodes of the root can be followed through [`ResolvedSchema::get_names`].
#[derive(Clone, Debug)]
pub struct ResolvedSchema {
    names: Names,
    root_schema: Schema,
}

impl TryFrom<Schema> for ResolvedSchema {
    type Error = Error;

    fn try_from(schema: Schema) -> AvroResult<Self> {
        let mut names = Names::new();
        collect_names(&schema, &mut names)?;
        let mut references = HashSet::new();
        collect_references(&schema, &mut references);
        if let Some(dangling) = references.into_iter().find(|n| !names.contains_key(n)) {
            return Err(Details::SchemaResolutionError(dangling).into());
        }
        Ok(ResolvedSchema {
            names,
            root_schema: schema,
        })
    }
}

impl ResolvedSchema {
    pub fn get_root_schema(&self) -> &Schema {
        &self.root_schema
    }

    pub fn get_names(&self) -> &Names {
        &self.names
    }
}

/// Follow `schema` through `names` if it is a reference.
pub(crate) fn deref<'s>(schema: &'s Schema, names: &'s Names) -> AvroResult<&'s Schema> {
    match schema {
        Schema::Ref { name } => names
            .get(name)
            .ok_or_else(|| Details::SchemaResolutionError(name.clone()).into()),
        other => Ok(other),
    }
}

fn collect_names(schema: &Schema, names: &mut Names) -> AvroResult<()> {
    if let Some(name) = schema.name()
        && !matches!(schema, Schema::Ref { .. })
        && names.insert(name.clone(), schema.clone()).is_some()
    {
        return Err(Details::AmbiguousSchemaDefinition(name.clone()).into());
    }
    match schema {
        Schema::Array(array) => collect_names(&array.items, names),
        Schema::Map(map) => collect_names(&map.values, names),
        Schema::Union(UnionSchema { schemas, .. }) => {
            schemas.iter().try_for_each(|s| collect_names(s, names))
        }
        Schema::Record(RecordSchema { fields, .. }) => fields
            .iter()
            .try_for_each(|field| collect_names(&field.schema, names)),
        _ => Ok(()),
    }
}

fn collect_references(schema: &Schema, references: &mut HashSet<Name>) {
    match schema {
        Schema::Ref { name } => {
            references.insert(name.clone());
        }
        Schema::Array(array) => collect_references(&array.items, references),
        Schema::Map(map) => collect_references(&map.values, references),
        Schema::Union(union) => union
            .variants()
            .iter()
            .for_each(|s| collect_references(s, references)),
        Schema::Record(record) => record
            .fields
            .iter()
            .for_each(|field| collect_references(&field.schema, references)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RecordField;
    use apache_avro_test_helper::TestResult;
    use pretty_assertions::assert_eq;

    fn linked_list() -> AvroResult<Schema> {
        let name = Name::new("ns.Node")?;
        Schema::record(name.clone())
            .fields(vec![
                RecordField::builder().name("value").schema(Schema::Long).build(),
                RecordField::builder()
                    .name("next")
                    .schema(Schema::union(vec![Schema::Null, Schema::Ref { name }])?)
                    .build(),
            ])
            .build()
    }

    #[test]
    fn resolves_recursive_references() -> TestResult {
        let resolved = ResolvedSchema::try_from(linked_list()?)?;
        let name = Name::new("ns.Node")?;
        assert_eq!(resolved.get_names().len(), 1);
        let reference = Schema::Ref { name };
        assert!(matches!(
            deref(&reference, resolved.get_names())?,
            Schema::Record(_)
        ));
        Ok(())
    }

    #[test]
    fn rejects_dangling_references() -> TestResult {
        let schema = Schema::array(Schema::Ref {
            name: Name::new("Missing")?,
        })
        .build();
        let err = ResolvedSchema::try_from(schema).unwrap_err();
        assert!(matches!(err.details(), Details::SchemaResolutionError(n) if n.name == "Missing"));
        Ok(())
    }

    #[test]
    fn rejects_duplicate_definitions() -> TestResult {
        let fixed = Schema::fixed(Name::new("ns.Id")?, 4).build()?;
        let schema = Schema::union(vec![Schema::Null, fixed.clone(), Schema::array(fixed).build()])?;
        let err = ResolvedSchema::try_from(schema).unwrap_err();
        assert!(matches!(err.details(), Details::AmbiguousSchemaDefinition(_)));
        Ok(())
    }
}
