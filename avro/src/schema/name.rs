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
    AvroResult, Error, Schema,
    error::Details,
    util::MapHelper,
    validator::{validate_namespace, validate_schema_name},
};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
};

/// The name of a `record`, `enum` or `fixed` schema.
///
/// Names inside a [`Schema`] are always fully qualified: the enclosing namespace has already
/// been applied when the schema was built or parsed.
///
/// More information about schema names can be found in the
/// [Avro specification](https://avro.apache.org/docs/++version++/specification/#names)
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Name {
    pub name: String,
    pub namespace: Namespace,
}

/// Named schemas of a tree, keyed by full name.
pub type Names = HashMap<Name, Schema>;
/// The namespace of a named schema.
pub type Namespace = Option<String>;
/// Aliases of a named schema, already qualified.
pub type Aliases = Option<Vec<Name>>;

impl Name {
    /// Create a `Name`, splitting an optional dotted namespace off `name`.
    pub fn new(name: &str) -> AvroResult<Self> {
        Self::new_with_enclosing_namespace(name, None)
    }

    /// Create a `Name`, using `enclosing_namespace` when `name` carries no namespace of its own.
    pub fn new_with_enclosing_namespace(
        name: &str,
        enclosing_namespace: Option<&str>,
    ) -> AvroResult<Self> {
        let index_of_name = validate_schema_name(name)?;
        let simple = name[index_of_name..].to_string();
        let namespace = match index_of_name {
            0 => enclosing_namespace
                .filter(|ns| !ns.is_empty())
                .map(|ns| {
                    validate_namespace(ns)?;
                    Ok::<_, Error>(ns.to_string())
                })
                .transpose()?,
            // ".Name" explicitly selects the null namespace
            1 => None,
            _ => Some(name[..index_of_name - 1].to_string()),
        };
        Ok(Self {
            name: simple,
            namespace,
        })
    }

    /// Parse the `name`/`namespace` attributes of a JSON schema object.
    pub(crate) fn parse(
        complex: &Map<String, JsonValue>,
        enclosing_namespace: Option<&str>,
    ) -> AvroResult<Self> {
        let name = complex.name().ok_or(Details::GetNameField)?;
        let namespace = complex.string("namespace");
        Self::new_with_enclosing_namespace(&name, namespace.as_deref().or(enclosing_namespace))
    }

    /// Qualify every alias with this name's namespace, unless it already has one.
    pub(crate) fn qualify_aliases(&self, aliases: Option<Vec<String>>) -> AvroResult<Aliases> {
        aliases
            .map(|aliases| {
                aliases
                    .iter()
                    .map(|alias| Self::new_with_enclosing_namespace(alias, self.namespace.as_deref()))
                    .collect::<AvroResult<Vec<_>>>()
            })
            .transpose()
    }

    /// The namespace-qualified name, e.g. `com.example.User`.
    pub fn fullname(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{ns}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl TryFrom<&str> for Name {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for Name {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.fullname())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apache_avro_test_helper::TestResult;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_namespace() -> TestResult {
        let name = Name::new("com.example.User")?;
        assert_eq!(name.name, "User");
        assert_eq!(name.namespace.as_deref(), Some("com.example"));
        assert_eq!(name.fullname(), "com.example.User");
        Ok(())
    }

    #[test]
    fn enclosing_namespace_only_applies_to_simple_names() -> TestResult {
        assert_eq!(
            Name::new_with_enclosing_namespace("User", Some("outer"))?.fullname(),
            "outer.User"
        );
        assert_eq!(
            Name::new_with_enclosing_namespace("inner.User", Some("outer"))?.fullname(),
            "inner.User"
        );
        assert_eq!(
            Name::new_with_enclosing_namespace(".User", Some("outer"))?.fullname(),
            "User"
        );
        assert_eq!(Name::new_with_enclosing_namespace("User", Some(""))?.namespace, None);
        Ok(())
    }

    #[test]
    fn aliases_inherit_namespace() -> TestResult {
        let name = Name::new("a.b.Rec")?;
        let aliases = name.qualify_aliases(Some(vec!["Old".into(), "x.Older".into()]))?;
        assert_eq!(
            aliases,
            Some(vec![Name::new("a.b.Old")?, Name::new("x.Older")?])
        );
        Ok(())
    }

    #[test]
    fn rejects_invalid_names() {
        assert!(Name::new("ns..Rec").is_err());
        assert!(Name::new_with_enclosing_namespace("Rec", Some("bad-ns")).is_err());
    }
}
