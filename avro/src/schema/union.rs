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
    schema::{Schema, SchemaKind},
};
use std::collections::{BTreeMap, BTreeSet};

/// A description of a Union schema
#[derive(Debug, Clone)]
pub struct UnionSchema {
    /// The schemas that make up this union
    pub(crate) schemas: Vec<Schema>,
    // Branch position of every unnamed type, used for uniqueness and value matching.
    variant_index: BTreeMap<SchemaKind, usize>,
}

impl UnionSchema {
    /// Creates a new UnionSchema from a vector of schemas.
    ///
    /// # Errors
    /// Will return an error if `schemas` has two unnamed schemas with the same encoding (a
    /// `uuid` and a `string` branch, say) or if `schemas` contains a union.
    pub fn new(schemas: Vec<Schema>) -> AvroResult<Self> {
        let mut vindex = BTreeMap::new();
        let mut encodings = BTreeSet::new();
        for (i, schema) in schemas.iter().enumerate() {
            if let Schema::Union(_) = schema {
                return Err(Details::GetNestedUnion.into());
            }
            if schema.is_named() {
                continue;
            }
            if !encodings.insert(schema.physical_kind()) {
                return Err(Details::GetUnionDuplicate(schema.physical_kind()).into());
            }
            vindex.insert(schema.kind(), i);
        }
        Ok(UnionSchema {
            schemas,
            variant_index: vindex,
        })
    }

    /// Returns a slice to all variants of this schema.
    pub fn variants(&self) -> &[Schema] {
        &self.schemas
    }

    /// Returns true if the any of the variants of this `UnionSchema` is `Null`.
    pub fn is_nullable(&self) -> bool {
        self.variant_index.contains_key(&SchemaKind::Null)
    }

    /// Position of the unnamed branch of the given kind.
    pub(crate) fn index_of_kind(&self, kind: SchemaKind) -> Option<usize> {
        self.variant_index.get(&kind).copied()
    }

    /// The kinds of all branches, for error reporting.
    pub(crate) fn kinds(&self) -> Vec<SchemaKind> {
        self.schemas.iter().map(Schema::kind).collect()
    }

    /// The first branch that data written with `writer` can be read as.
    pub fn find_reader_branch(&self, writer: &Schema) -> Option<(usize, &Schema)> {
        self.schemas
            .iter()
            .enumerate()
            .find(|(_, branch)| writer.can_be_read_by(branch))
    }
}

// No need to compare variant_index, it is derivative of schemas.
impl PartialEq for UnionSchema {
    fn eq(&self, other: &UnionSchema) -> bool {
        self.schemas.eq(&other.schemas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Name, UuidSchema};
    use apache_avro_test_helper::TestResult;
    use pretty_assertions::assert_eq;

    #[test]
    fn rejects_duplicates_and_nesting() -> TestResult {
        let err = UnionSchema::new(vec![Schema::Null, Schema::Int, Schema::Null]).unwrap_err();
        assert!(matches!(err.details(), Details::GetUnionDuplicate(SchemaKind::Null)));

        // a logical type is a duplicate of the type it is encoded as
        let err = UnionSchema::new(vec![Schema::String, Schema::Uuid(UuidSchema::String)])
            .unwrap_err();
        assert!(matches!(err.details(), Details::GetUnionDuplicate(SchemaKind::String)));
        let err = UnionSchema::new(vec![Schema::Null, Schema::Date, Schema::Int]).unwrap_err();
        assert!(matches!(err.details(), Details::GetUnionDuplicate(SchemaKind::Int)));

        let inner = Schema::union(vec![Schema::Int])?;
        let err = UnionSchema::new(vec![Schema::Null, inner]).unwrap_err();
        assert!(matches!(err.details(), Details::GetNestedUnion));
        Ok(())
    }

    #[test]
    fn named_branches_may_repeat_kinds() -> TestResult {
        let a = Schema::fixed(Name::new("A")?, 4).build()?;
        let b = Schema::fixed(Name::new("B")?, 8).build()?;
        let union = UnionSchema::new(vec![Schema::Null, a, b])?;
        assert!(union.is_nullable());
        assert_eq!(union.variants().len(), 3);
        Ok(())
    }

    #[test]
    fn first_readable_branch_wins() -> TestResult {
        let union = UnionSchema::new(vec![Schema::Null, Schema::Double, Schema::Long])?;
        assert_eq!(union.find_reader_branch(&Schema::Int).map(|(i, _)| i), Some(1));
        assert_eq!(union.find_reader_branch(&Schema::Long).map(|(i, _)| i), Some(1));
        assert!(union.find_reader_branch(&Schema::String).is_none());
        Ok(())
    }
}
