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

use apache_avro_test_helper::TestResult;
use avro_evolve::{
    AvroShape, Decoder, Schema, Shape, ShapeRegistry,
    error::{Details, ErrorKind},
    schema_of,
    shape::{MemberShape, RecordShape, SchemaBuilder},
    to_avro_datum,
    types::Value,
};
use pretty_assertions::assert_eq;
use serde::Deserialize;

#[derive(Debug, PartialEq, Deserialize)]
struct Node {
    value: i64,
    next: Option<Box<Node>>,
}

impl AvroShape for Node {
    fn shape_in(registry: &mut ShapeRegistry) -> Shape {
        registry.define("Node", |registry| {
            Shape::Record(
                RecordShape::builder()
                    .name("Node")
                    .members(vec![
                        MemberShape::builder()
                            .name("value")
                            .shape(i64::shape_in(registry))
                            .build(),
                        MemberShape::builder()
                            .name("next")
                            .shape(Option::<Box<Node>>::shape_in(registry))
                            .build(),
                    ])
                    .build(),
            )
        })
    }
}

const NODE_WRITER: &str = r#"{"type": "record", "name": "Node", "fields": [
    {"name": "value", "type": "long"},
    {"name": "next", "type": ["null", "Node"]}
]}"#;

#[test]
fn derived_schema_of_a_recursive_type() -> TestResult {
    let schema = schema_of::<Node>()?;
    let Schema::Record(record) = &schema else {
        panic!("Expected a record schema, got {schema:?}");
    };
    assert_eq!(record.name.fullname(), "Node");
    assert_eq!(record.fields[0].schema, Schema::Long);

    let next = &record.fields[1];
    assert_eq!(next.default, Some(serde_json::Value::Null));
    let Schema::Union(union) = &next.schema else {
        panic!("Expected a union, got {:?}", next.schema);
    };
    assert_eq!(union.variants()[0], Schema::Null);
    assert!(matches!(&union.variants()[1], Schema::Ref { name } if name.fullname() == "Node"));
    Ok(())
}

#[test]
fn decode_a_linked_list() -> TestResult {
    let decoder = Decoder::for_type::<Node>(Schema::parse_str(NODE_WRITER)?)?;
    // 1 -> 2 -> 3
    let bytes: &[u8] = &[0x02, 0x02, 0x04, 0x02, 0x06, 0x00];
    let mut cursor = bytes;
    assert_eq!(
        decoder.decode_into::<Node>(&mut cursor)?,
        Node {
            value: 1,
            next: Some(Box::new(Node {
                value: 2,
                next: Some(Box::new(Node {
                    value: 3,
                    next: None,
                })),
            })),
        }
    );
    assert!(cursor.is_empty());
    Ok(())
}

#[derive(Debug, PartialEq, Deserialize)]
struct Account {
    user_id: i64,
    email: String,
    nickname: Option<String>,
    score: f64,
}

fn account_shape() -> Shape {
    Shape::Record(
        RecordShape::builder()
            .name("Account")
            .members(vec![
                MemberShape::builder()
                    .name("user_id")
                    .rename("userid")
                    .shape(Shape::Long)
                    .build(),
                MemberShape::builder().name("email").shape(Shape::String).build(),
                MemberShape::builder()
                    .name("nickname")
                    .shape(Shape::String)
                    .nullable(true)
                    .build(),
                MemberShape::builder()
                    .name("score")
                    .shape(Shape::Double)
                    .default(serde_json::json!(1.5))
                    .build(),
            ])
            .build(),
    )
}

impl AvroShape for Account {
    fn shape_in(_: &mut ShapeRegistry) -> Shape {
        account_shape()
    }
}

#[test]
fn members_bind_fields_case_insensitively() -> TestResult {
    let writer = Schema::parse_str(
        r#"{"type": "record", "name": "Account", "fields": [
            {"name": "UserID", "type": "int"},
            {"name": "legacy", "type": "boolean"},
            {"name": "EMAIL", "type": "string"}
        ]}"#,
    )?;
    let bytes = to_avro_datum(
        &writer,
        Value::Record(vec![
            ("UserID".into(), Value::Int(12)),
            ("legacy".into(), Value::Boolean(false)),
            ("EMAIL".into(), Value::from("a@b.c")),
        ]),
    )?;

    let decoder = Decoder::builder(writer).build()?;
    let (shape, shapes) = Account::shape();
    assert_eq!(
        decoder.decode_shaped(&mut bytes.as_slice(), &shape, &shapes)?,
        Value::Record(vec![
            ("user_id".into(), Value::Long(12)),
            ("email".into(), Value::from("a@b.c")),
            ("nickname".into(), Value::Null),
            ("score".into(), Value::Double(1.5)),
        ])
    );
    assert_eq!(
        decoder.decode_into::<Account>(&mut bytes.as_slice())?,
        Account {
            user_id: 12,
            email: "a@b.c".into(),
            nickname: None,
            score: 1.5,
        }
    );
    Ok(())
}

#[test]
fn unbound_required_member() -> TestResult {
    let writer = Schema::parse_str(
        r#"{"type": "record", "name": "Account", "fields": [
            {"name": "email", "type": "string"}
        ]}"#,
    )?;
    let shape = Shape::Record(
        RecordShape::builder()
            .name("Account")
            .members(vec![
                MemberShape::builder().name("email").shape(Shape::String).build(),
                MemberShape::builder().name("other").shape(Shape::Int).build(),
            ])
            .build(),
    );
    let decoder = Decoder::builder(writer).build()?;
    let err = decoder
        .decode_shaped(&mut &[0x02, b'x'][..], &shape, &ShapeRegistry::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resolution);
    assert!(matches!(
        err.details(),
        Details::UnboundShapeMember { member, .. } if member == "other"
    ));
    Ok(())
}

#[test]
fn builder_naming_overrides() -> TestResult {
    let schema = SchemaBuilder::new()
        .with_name("Profile")
        .with_namespace("com.example")
        .build(&account_shape())?;
    assert_eq!(
        schema.name().map(|name| name.fullname()),
        Some("com.example.Profile".to_string())
    );
    let Schema::Record(record) = &schema else {
        panic!("Expected a record schema, got {schema:?}");
    };
    let names: Vec<_> = record.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["userid", "email", "nickname", "score"]);
    Ok(())
}

#[test]
fn logical_members_take_their_native_form() -> TestResult {
    let writer = Schema::parse_str(
        r#"{"type": "record", "name": "Payment", "fields": [
            {"name": "id", "type": "string"},
            {"name": "amount", "type": {"type": "bytes", "logicalType": "decimal",
                "precision": 10, "scale": 2}}
        ]}"#,
    )?;
    let id = "0b7c2c1e-8f4d-4a43-9a2f-3d6c7f0e1a55";
    let bytes = to_avro_datum(
        &writer,
        Value::Record(vec![
            ("id".into(), Value::from(id)),
            ("amount".into(), Value::Decimal("12.34".parse()?)),
        ]),
    )?;
    let shape = Shape::Record(
        RecordShape::builder()
            .name("Payment")
            .members(vec![
                MemberShape::builder().name("id").shape(Shape::Uuid).build(),
                MemberShape::builder()
                    .name("amount")
                    .shape(Shape::Decimal {
                        precision: 10,
                        scale: 2,
                    })
                    .build(),
            ])
            .build(),
    );

    let decoder = Decoder::builder(writer).build()?;
    let decoded = decoder.decode_shaped(&mut bytes.as_slice(), &shape, &ShapeRegistry::new())?;
    assert_eq!(
        decoded.field("id"),
        Some(&Value::Uuid(avro_evolve::Uuid::parse_str(id)?))
    );
    assert_eq!(
        decoded.field("amount"),
        Some(&Value::Decimal("12.34".parse()?))
    );
    Ok(())
}
