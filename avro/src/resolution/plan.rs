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

//! Compiled record resolution.
//!
//! Matching writer fields to reader fields and materializing defaults only depends on the two
//! record schemas and on the target shape, so it is done once per combination and reused for
//! every record decoded with it.

use crate::{
    AvroResult,
    default::resolve_default,
    error::Details,
    resolution::conform,
    schema::{Names, RecordField, RecordSchema, ResolvedSchema},
    shape::{MemberShape, RecordShape, SchemaBuilder, Shape, ShapeRegistry},
    types::Value,
};
use log::debug;
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

/// What to do with one writer field, in writer order.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FieldStep {
    /// Decode the writer field as the reader field and store it in `slot`.
    Read {
        writer_field: usize,
        reader_field: usize,
        slot: usize,
        /// The shape member bound to the slot, when decoding into a shape.
        member: Option<usize>,
    },
    /// Consume the writer field and drop it.
    Skip { writer_field: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RecordPlan {
    /// Output field names, in output order.
    pub(crate) slots: Vec<String>,
    pub(crate) steps: Vec<FieldStep>,
    /// Values of the slots the writer does not provide.
    pub(crate) defaults: Vec<(usize, Value)>,
}

impl RecordPlan {
    /// Plan the decoding of `writer` records as `reader` records, bound to `shape` if given.
    pub(crate) fn compile(
        writer: &RecordSchema,
        reader: &RecordSchema,
        shape: Option<&RecordShape>,
        reader_names: &Names,
        shapes: Option<&ShapeRegistry>,
    ) -> AvroResult<Self> {
        // slot of every reader field, and the member bound to it
        let (slots, bindings): (Vec<String>, Bindings) = match shape {
            None => (
                reader.fields.iter().map(|f| f.name.clone()).collect(),
                reader
                    .fields
                    .iter()
                    .enumerate()
                    .map(|(i, _)| Some((i, None)))
                    .collect(),
            ),
            Some(shape) => bind_members(reader, shape),
        };

        let mut produced = vec![false; reader.fields.len()];
        let mut steps = Vec::with_capacity(writer.fields.len());
        for (writer_field, field) in writer.fields.iter().enumerate() {
            let target = reader
                .reader_field_for(&field.name)
                .filter(|rf| !produced[rf.position])
                .and_then(|rf| bindings[rf.position].map(|binding| (rf.position, binding)));
            match target {
                Some((reader_field, (slot, member))) => {
                    produced[reader_field] = true;
                    steps.push(FieldStep::Read {
                        writer_field,
                        reader_field,
                        slot,
                        member,
                    });
                }
                None => steps.push(FieldStep::Skip { writer_field }),
            }
        }

        let mut defaults = Vec::new();
        let mut bound = vec![false; slots.len()];
        for (reader_field, field) in reader.fields.iter().enumerate() {
            let Some((slot, member)) = bindings[reader_field] else {
                continue;
            };
            bound[slot] = true;
            if produced[reader_field] {
                continue;
            }
            let member_shape = member.and_then(|m| shape.map(|s| &s.members[m].shape));
            defaults.push((
                slot,
                field_default(reader, field, member_shape, reader_names, shapes)?,
            ));
        }

        if let Some(shape) = shape {
            for (slot, member) in shape.members.iter().enumerate() {
                if !bound[slot] {
                    defaults.push((slot, unbound_member(reader, shape, member, shapes)?));
                }
            }
        }

        debug!(
            "Compiled plan for {} -> {}: {} steps, {} defaults",
            writer.name,
            reader.name,
            steps.len(),
            defaults.len()
        );
        Ok(RecordPlan {
            slots,
            steps,
            defaults,
        })
    }
}

type Bindings = Vec<Option<(usize, Option<usize>)>>;

/// Bind every shape member to a reader field: by field name first, then by the reader field's
/// aliases. Slots are the members, in member order.
fn bind_members(reader: &RecordSchema, shape: &RecordShape) -> (Vec<String>, Bindings) {
    let mut bindings: Bindings = vec![None; reader.fields.len()];
    for (slot, member) in shape.members.iter().enumerate() {
        let by_name = reader.fields.iter().find(|f| member.binds(&f.name));
        let field = by_name.or_else(|| {
            reader.fields.iter().find(|f| {
                f.aliases
                    .iter()
                    .flatten()
                    .any(|alias| member.binds(alias))
            })
        });
        if let Some(field) = field
            && bindings[field.position].is_none()
        {
            bindings[field.position] = Some((slot, Some(slot)));
        }
    }
    let slots = shape.members.iter().map(|m| m.name.clone()).collect();
    (slots, bindings)
}

fn field_default(
    reader: &RecordSchema,
    field: &RecordField,
    member_shape: Option<&Shape>,
    reader_names: &Names,
    shapes: Option<&ShapeRegistry>,
) -> AvroResult<Value> {
    let literal = field.default.as_ref().ok_or_else(|| Details::MissingDefault {
        record: reader.name.to_string(),
        field: field.name.clone(),
    })?;
    let value = resolve_default(&field.schema, literal, reader_names)
        .map_err(|e| e.in_field(&reader.name, &field.name))?;
    conform(value, member_shape, shapes)
}

/// The value of a member no reader field binds: `null` for nullable members, else the member's
/// own default interpreted with the schema derived from its shape.
fn unbound_member(
    reader: &RecordSchema,
    shape: &RecordShape,
    member: &MemberShape,
    shapes: Option<&ShapeRegistry>,
) -> AvroResult<Value> {
    if member.is_nullable() {
        return Ok(Value::Null);
    }
    let Some(literal) = &member.default else {
        return Err(Details::UnboundShapeMember {
            shape: shape.name.clone(),
            member: member.name.clone(),
            record: reader.name.to_string(),
        }
        .into());
    };
    let mut builder = SchemaBuilder::new();
    if let Some(registry) = shapes {
        builder = builder.with_registry(registry);
    }
    let schema = ResolvedSchema::try_from(builder.build(&member.shape)?)?;
    let value = resolve_default(schema.get_root_schema(), literal, schema.get_names())?;
    conform(value, Some(&member.shape), shapes)
}

/// Identity of a group of record plans: the writer and reader record nodes, and the shape name.
///
/// Nodes are identified by address, which is only meaningful while the schemas they live in are
/// kept alive and unmoved by the owner of the cache.
type PlanKey = (usize, usize, Option<String>);

/// Plans of one key, told apart by the full shape they were compiled for.
type PlanGroup = Vec<(Option<RecordShape>, Arc<RecordPlan>)>;

fn find_plan(group: &PlanGroup, shape: Option<&RecordShape>) -> Option<Arc<RecordPlan>> {
    group
        .iter()
        .find(|(compiled_for, _)| compiled_for.as_ref() == shape)
        .map(|(_, plan)| Arc::clone(plan))
}

/// Memoized record plans, shared by all decode calls of one decoder.
#[derive(Debug, Default)]
pub(crate) struct PlanCache {
    plans: RwLock<HashMap<PlanKey, PlanGroup>>,
}

impl PlanCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get_or_compile(
        &self,
        writer: &RecordSchema,
        reader: &RecordSchema,
        shape: Option<&RecordShape>,
        reader_names: &Names,
        shapes: Option<&ShapeRegistry>,
    ) -> AvroResult<Arc<RecordPlan>> {
        let key: PlanKey = (
            writer as *const RecordSchema as usize,
            reader as *const RecordSchema as usize,
            shape.map(RecordShape::fullname),
        );
        if let Some(plan) = self
            .plans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .and_then(|group| find_plan(group, shape))
        {
            return Ok(plan);
        }

        // Two threads may compile the same plan, the first one inserted is kept.
        let plan = Arc::new(RecordPlan::compile(
            writer,
            reader,
            shape,
            reader_names,
            shapes,
        )?);
        let mut plans = self.plans.write().unwrap_or_else(PoisonError::into_inner);
        let group = plans.entry(key).or_default();
        if let Some(existing) = find_plan(group, shape) {
            return Ok(existing);
        }
        group.push((shape.cloned(), Arc::clone(&plan)));
        Ok(plan)
    }

    pub(crate) fn len(&self) -> usize {
        self.plans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }
}
