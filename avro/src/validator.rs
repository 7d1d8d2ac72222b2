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

//! # Name grammar
//!
//! Schema names, namespaces, enum symbols and record field names follow the
//! [Avro naming rules](https://avro.apache.org/docs/++version++/specification/#names) by default.
//!
//! Schemas produced by other toolchains sometimes use looser names. Each of the four grammars can
//! be replaced once per process, before the first schema is built:
//!
//! ```
//! # use avro_evolve::validator::{NameGrammar, set_record_field_name_validator};
//! # use regex_lite::Regex;
//! # use std::sync::OnceLock;
//! struct AllowDashes;
//!
//! impl NameGrammar for AllowDashes {
//!     fn regex(&self) -> &'static Regex {
//!         static DASHES: OnceLock<Regex> = OnceLock::new();
//!         DASHES.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("Regex is valid"))
//!     }
//! }
//!
//! if set_record_field_name_validator(Box::new(AllowDashes)).is_err() {
//!     panic!("A record field name validator was already configured")
//! }
//! ```
//!
//! Once a schema has been built the default grammar is locked in.

use crate::{AvroResult, error::Details};
use log::debug;
use regex_lite::Regex;
use std::sync::OnceLock;

/// A pluggable grammar for one category of Avro identifiers.
pub trait NameGrammar: Send + Sync {
    /// The regex an identifier must match in full.
    fn regex(&self) -> &'static Regex;
}

type BoxedGrammar = Box<dyn NameGrammar>;

struct FullName;
struct Namespace;
struct Simple;

impl NameGrammar for FullName {
    fn regex(&self) -> &'static Regex {
        static FULL_NAME: OnceLock<Regex> = OnceLock::new();
        FULL_NAME.get_or_init(|| {
            // An optional dotted namespace followed by a name without dots.
            Regex::new(
                r"^((?P<namespace>([A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*)?)\.)?(?P<name>[A-Za-z_][A-Za-z0-9_]*)$",
            )
            .expect("Full name regex is valid")
        })
    }
}

impl NameGrammar for Namespace {
    fn regex(&self) -> &'static Regex {
        static NAMESPACE: OnceLock<Regex> = OnceLock::new();
        NAMESPACE.get_or_init(|| {
            Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*)?$")
                .expect("Namespace regex is valid")
        })
    }
}

impl NameGrammar for Simple {
    fn regex(&self) -> &'static Regex {
        static SIMPLE: OnceLock<Regex> = OnceLock::new();
        SIMPLE.get_or_init(|| {
            Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Simple name regex is valid")
        })
    }
}

static SCHEMA_NAME: OnceLock<BoxedGrammar> = OnceLock::new();
static NAMESPACE: OnceLock<BoxedGrammar> = OnceLock::new();
static ENUM_SYMBOL: OnceLock<BoxedGrammar> = OnceLock::new();
static FIELD_NAME: OnceLock<BoxedGrammar> = OnceLock::new();

fn grammar(
    cell: &'static OnceLock<BoxedGrammar>,
    what: &str,
    default: fn() -> BoxedGrammar,
) -> &'static Regex {
    cell.get_or_init(|| {
        debug!("Going to use the default {what} validator.");
        default()
    })
    .regex()
}

/// Sets a custom schema name grammar. A custom regex may provide a capture group named `name`
/// marking where the simple name starts; without it the whole input is the simple name.
///
/// Returns `Err(validator)` if a grammar is already configured.
pub fn set_schema_name_validator(validator: BoxedGrammar) -> Result<(), BoxedGrammar> {
    debug!("Setting a custom schema name validator.");
    SCHEMA_NAME.set(validator)
}

/// Sets a custom namespace grammar.
pub fn set_schema_namespace_validator(validator: BoxedGrammar) -> Result<(), BoxedGrammar> {
    debug!("Setting a custom namespace validator.");
    NAMESPACE.set(validator)
}

/// Sets a custom enum symbol grammar.
pub fn set_enum_symbol_name_validator(validator: BoxedGrammar) -> Result<(), BoxedGrammar> {
    debug!("Setting a custom enum symbol validator.");
    ENUM_SYMBOL.set(validator)
}

/// Sets a custom record field name grammar.
pub fn set_record_field_name_validator(validator: BoxedGrammar) -> Result<(), BoxedGrammar> {
    debug!("Setting a custom record field name validator.");
    FIELD_NAME.set(validator)
}

/// Validates a possibly dotted schema name and returns the byte offset of its simple name.
pub(crate) fn validate_schema_name(schema_name: &str) -> AvroResult<usize> {
    let regex = grammar(&SCHEMA_NAME, "schema name", || Box::new(FullName));
    let caps = regex
        .captures(schema_name)
        .ok_or_else(|| Details::InvalidSchemaName(schema_name.to_string(), regex.as_str()))?;
    Ok(caps.name("name").map_or(0, |m| m.start()))
}

pub(crate) fn validate_namespace(ns: &str) -> AvroResult<()> {
    let regex = grammar(&NAMESPACE, "namespace", || Box::new(Namespace));
    if regex.is_match(ns) {
        Ok(())
    } else {
        Err(Details::InvalidNamespace(ns.to_string(), regex.as_str()).into())
    }
}

pub(crate) fn validate_enum_symbol_name(symbol: &str) -> AvroResult<()> {
    if grammar(&ENUM_SYMBOL, "enum symbol", || Box::new(Simple)).is_match(symbol) {
        Ok(())
    } else {
        Err(Details::EnumSymbolName(symbol.to_string()).into())
    }
}

pub(crate) fn validate_record_field_name(field_name: &str) -> AvroResult<()> {
    if grammar(&FIELD_NAME, "record field name", || Box::new(Simple)).is_match(field_name) {
        Ok(())
    } else {
        Err(Details::FieldName(field_name.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apache_avro_test_helper::TestResult;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("example", 0)]
    #[case("com.example.Record", 12)]
    #[case("_private", 0)]
    fn valid_schema_names(#[case] name: &str, #[case] start: usize) -> TestResult {
        assert_eq!(validate_schema_name(name)?, start);
        Ok(())
    }

    #[rstest]
    #[case("com-example")]
    #[case("ns.0.record1")]
    #[case("ns..record1")]
    #[case("1abc")]
    fn invalid_schema_names(#[case] name: &str) {
        let err = validate_schema_name(name).unwrap_err();
        assert!(matches!(err.details(), Details::InvalidSchemaName(n, _) if n == name));
    }

    #[test]
    fn namespaces() -> TestResult {
        validate_namespace("com.example")?;
        validate_namespace("")?;
        assert!(validate_namespace("com-example").is_err());
        Ok(())
    }

    #[test]
    fn symbols_and_fields() -> TestResult {
        validate_enum_symbol_name("SPADES")?;
        assert!(validate_enum_symbol_name("com-example").is_err());
        validate_record_field_name("test")?;
        assert!(validate_record_field_name("a.b").is_err());
        Ok(())
    }
}
