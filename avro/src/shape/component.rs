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
    AvroResult, Schema,
    shape::{SchemaBuilder, Shape, ShapeRegistry},
};
use bigdecimal::BigDecimal;
use std::collections::HashMap;
use uuid::Uuid;

/// Types that can describe their own [`Shape`].
///
/// Named types that may contain themselves register their shape with
/// [`ShapeRegistry::define`] and return the resulting [`Shape::Named`].
pub trait AvroShape {
    fn shape_in(registry: &mut ShapeRegistry) -> Shape;

    /// The shape of this type together with the registry it refers to.
    fn shape() -> (Shape, ShapeRegistry) {
        let mut registry = ShapeRegistry::new();
        let shape = Self::shape_in(&mut registry);
        (shape, registry)
    }
}

/// Derive the Avro schema of `T`.
pub fn schema_of<T: AvroShape + ?Sized>() -> AvroResult<Schema> {
    let (shape, registry) = T::shape();
    SchemaBuilder::new().with_registry(&registry).build(&shape)
}

macro_rules! impl_primitive(
    ($($type:ty => $shape:expr),+ $(,)?) => (
        $(
            impl AvroShape for $type {
                fn shape_in(_: &mut ShapeRegistry) -> Shape {
                    $shape
                }
            }
        )+
    );
);

impl_primitive!(
    bool => Shape::Boolean,
    i8 => Shape::Int,
    i16 => Shape::Int,
    i32 => Shape::Int,
    u8 => Shape::Int,
    u16 => Shape::Int,
    i64 => Shape::Long,
    u32 => Shape::Long,
    f32 => Shape::Float,
    f64 => Shape::Double,
    String => Shape::String,
    str => Shape::String,
    char => Shape::String,
    Uuid => Shape::Uuid,
    BigDecimal => Shape::Decimal { precision: 38, scale: 0 },
);

impl<T: AvroShape> AvroShape for Vec<T> {
    fn shape_in(registry: &mut ShapeRegistry) -> Shape {
        Shape::array(T::shape_in(registry))
    }
}

impl<T: AvroShape> AvroShape for [T] {
    fn shape_in(registry: &mut ShapeRegistry) -> Shape {
        Shape::array(T::shape_in(registry))
    }
}

impl<T: AvroShape> AvroShape for HashMap<String, T> {
    fn shape_in(registry: &mut ShapeRegistry) -> Shape {
        Shape::map(T::shape_in(registry))
    }
}

impl<T: AvroShape> AvroShape for Option<T> {
    fn shape_in(registry: &mut ShapeRegistry) -> Shape {
        Shape::nullable(T::shape_in(registry))
    }
}

impl<T: AvroShape + ?Sized> AvroShape for Box<T> {
    fn shape_in(registry: &mut ShapeRegistry) -> Shape {
        T::shape_in(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DecimalSchema, InnerDecimalSchema, UuidSchema};
    use apache_avro_test_helper::TestResult;
    use pretty_assertions::assert_eq;

    #[test]
    fn primitives() -> TestResult {
        assert_eq!(schema_of::<i16>()?, Schema::Int);
        assert_eq!(schema_of::<u32>()?, Schema::Long);
        assert_eq!(schema_of::<str>()?, Schema::String);
        assert_eq!(schema_of::<Uuid>()?, Schema::Uuid(UuidSchema::String));
        assert_eq!(
            schema_of::<BigDecimal>()?,
            Schema::Decimal(DecimalSchema {
                precision: 38,
                scale: 0,
                inner: InnerDecimalSchema::Bytes,
            })
        );
        Ok(())
    }

    #[test]
    fn containers() -> TestResult {
        assert_eq!(
            schema_of::<Vec<Option<i64>>>()?,
            Schema::array(Schema::union(vec![Schema::Null, Schema::Long])?).build()
        );
        assert_eq!(
            schema_of::<HashMap<String, Box<[f32]>>>()?,
            Schema::map(Schema::array(Schema::Float).build()).build()
        );
        Ok(())
    }
}
