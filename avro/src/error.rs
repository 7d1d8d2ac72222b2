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
    schema::{Name, SchemaKind},
    types::ValueKind,
};
use std::{error::Error as _, fmt};

/// Errors encountered while building schemas, encoding or decoding Avro data.
///
/// To inspect the error use [`kind`](Self::kind) for the broad category, or
/// [`details`](Self::details) / [`into_details`](Self::into_details) for the precise cause.
#[derive(thiserror::Error, Debug)]
#[repr(transparent)]
#[error(transparent)]
pub struct Error {
    details: Box<Details>,
}

impl Error {
    pub fn new(details: Details) -> Self {
        Self {
            details: Box::new(details),
        }
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn into_details(self) -> Details {
        *self.details
    }

    /// The category of this error.
    ///
    /// Errors wrapped with record field context report the kind of the underlying cause.
    pub fn kind(&self) -> ErrorKind {
        self.details.kind()
    }

    /// Attach the record and field that were being processed when `self` happened.
    pub(crate) fn in_field(self, record: &Name, field: &str) -> Self {
        Details::InField {
            record: record.to_string(),
            field: field.to_string(),
            source: self,
        }
        .into()
    }
}

impl From<Details> for Error {
    fn from(details: Details) -> Self {
        Self::new(details)
    }
}

/// The broad category of an [`Error`].
///
/// Callers are expected to branch on this instead of matching every [`Details`] variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum ErrorKind {
    /// The schema is malformed or contradicts itself.
    Schema,
    /// An object shape cannot be mapped to a schema.
    UnsupportedShape,
    /// A default literal cannot be resolved against its schema.
    DefaultValue,
    /// The input ended in the middle of a value.
    TruncatedInput,
    /// The input is not valid Avro binary data.
    InvalidData,
    /// Writer and reader schemas (or a value and its schema) are incompatible.
    SchemaMismatch,
    /// A record field could not be bound to its target.
    Resolution,
    /// Compression or decompression of a block failed.
    Codec,
    /// Writing to or reading from the underlying I/O failed.
    Io,
}

#[derive(thiserror::Error)]
pub enum Details {
    // --- schema construction -------------------------------------------------------------
    #[error("Unions may not directly contain a union")]
    GetNestedUnion,

    #[error("Unions cannot contain duplicate types, found at least two {0:?}")]
    GetUnionDuplicate(SchemaKind),

    #[error("Duplicate field name '{field}' in record {record}")]
    FieldNameDuplicate { record: String, field: String },

    #[error("Fixed schema {0} must have a positive size")]
    FixedSizeNotPositive(String),

    #[error("Decimal precision must be a positive integer, got {precision}")]
    DecimalPrecisionMustBePositive { precision: usize },

    #[error("Decimal scale {scale} is greater than precision {precision}")]
    DecimalPrecisionLessThanScale { precision: usize, scale: usize },

    #[error(
        "Fixed type number of bytes {size} is not large enough to hold decimal values of precision {precision}"
    )]
    DecimalFixedTooSmall { size: usize, precision: usize },

    #[error("Not a fixed or bytes type, required for decimal schema, got: {0:?}")]
    ResolveDecimalSchema(SchemaKind),

    #[error("Duplicate enum symbol '{0}'")]
    EnumSymbolDuplicate(String),

    #[error("Enum default '{symbol}' is not among allowed symbols {symbols:?}")]
    EnumDefaultNotSymbol {
        symbol: String,
        symbols: Vec<String>,
    },

    #[error("Invalid schema name {0}. It must match the regex '{1}'")]
    InvalidSchemaName(String, &'static str),

    #[error("Invalid namespace {0}. It must match the regex '{1}'")]
    InvalidNamespace(String, &'static str),

    #[error("Invalid field name {0}")]
    FieldName(String),

    #[error("Invalid enum symbol name {0}")]
    EnumSymbolName(String),

    #[error("Two named schema defined for same fullname: {0}.")]
    AmbiguousSchemaDefinition(Name),

    #[error("Unresolved schema reference: {0}")]
    SchemaResolutionError(Name),

    #[error("Failed to parse schema from JSON")]
    ParseSchemaJson(#[source] serde_json::Error),

    #[error("Must be a JSON string, object or array")]
    ParseSchemaFromValidJson,

    #[error("Unknown primitive type: {0}")]
    ParsePrimitive(String),

    #[error("No `name` field")]
    GetNameField,

    #[error("No `fields` in record, or it is not an array")]
    GetRecordFieldsJson,

    #[error("No `symbols` field in enum, or it is not an array of strings")]
    GetEnumSymbolsField,

    #[error("No `size` in fixed, or it is not a non-negative integer: {0:?}")]
    GetFixedSizeField(serde_json::Value),

    #[error("No `items` in array")]
    GetArrayItemsField,

    #[error("No `values` in map")]
    GetMapValuesField,

    #[error("Unknown complex type: {0}")]
    GetComplexType(serde_json::Value),

    #[error("No `type` in complex type")]
    GetComplexTypeField,

    #[error("Invalid `{key}` for decimal: {value:?}")]
    GetDecimalMetadataFromJson {
        key: &'static str,
        value: serde_json::Value,
    },

    #[error("Invalid default for field '{field}' in record {record}")]
    GetDefaultRecordField {
        field: String,
        record: String,
        #[source]
        source: Error,
    },

    // --- shapes ---------------------------------------------------------------------------
    #[error("Shape '{0}' contains itself through an unnamed type, which Avro cannot express")]
    UnresolvableShapeCycle(String),

    #[error("Shape '{0}' is not registered")]
    UnknownShape(String),

    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    // --- default values -------------------------------------------------------------------
    #[error("Could not parse default '{literal}' as {target:?}")]
    DefaultValue { literal: String, target: SchemaKind },

    #[error("Default '{0}' contains characters outside of 0-255")]
    DefaultBytesOutOfRange(String),

    #[error("Default has {actual} bytes but fixed schema {name} has size {expected}")]
    DefaultFixedSize {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Default '{symbol}' is not a symbol of enum {name}")]
    DefaultEnumSymbol { name: String, symbol: String },

    #[error("Default ordinal {index} is out of bounds for enum {name} with {num_symbols} symbols")]
    DefaultEnumIndex {
        name: String,
        index: i64,
        num_symbols: usize,
    },

    #[error("Default contains field '{field}' that does not exist in record {record}")]
    DefaultUnknownField { record: String, field: String },

    #[error("Default for record {record} has no value for field '{field}'")]
    DefaultMissingField { record: String, field: String },

    #[error("Default '{literal}' is not a valid UUID")]
    DefaultUuid {
        literal: String,
        #[source]
        source: uuid::Error,
    },

    #[error("A union without branches cannot have a default")]
    DefaultEmptyUnion,

    // --- input ----------------------------------------------------------------------------
    #[error("Input ended while reading {what}")]
    TruncatedInput { what: &'static str },

    #[error("Failed to read {what}")]
    ReadInput {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid u8 for bool: {0}")]
    BoolValue(u8),

    #[error("Decoded integer out of range for i32: {1}")]
    ZagI32(#[source] std::num::TryFromIntError, i64),

    #[error("Variable-length integer is longer than 10 bytes")]
    IntegerOverflow,

    #[error("Negative length {0}")]
    NegativeLength(i64),

    #[error("Unable to allocate {desired} bytes (maximum allowed: {maximum})")]
    MemoryAllocation { desired: usize, maximum: usize },

    #[error("Invalid utf-8 string")]
    ConvertToUtf8(#[source] std::string::FromUtf8Error),

    #[error("Failed to convert '{0}' to UUID")]
    ConvertStrToUuid(String, #[source] uuid::Error),

    #[error("Failed to convert '{0}' to a decimal")]
    ConvertStrToDecimal(String, #[source] bigdecimal::ParseBigDecimalError),

    #[error("Failed to convert Fixed bytes to UUID. It must be exactly 16 bytes, got {0}")]
    ConvertFixedToUuid(usize),

    // --- schema mismatch ------------------------------------------------------------------
    #[error("Writer schema {writer:?} cannot be read as {reader:?}")]
    SchemaMismatch {
        writer: SchemaKind,
        reader: SchemaKind,
    },

    #[error("No branch of reader union {branches:?} can read writer schema {writer:?}")]
    NoMatchingUnionBranch {
        writer: SchemaKind,
        branches: Vec<SchemaKind>,
    },

    #[error("Union index {index} out of bounds: {num_variants}")]
    GetUnionVariant { index: i64, num_variants: usize },

    #[error("Writer fixed size {writer} does not match reader fixed size {reader}")]
    FixedSizeMismatch { writer: usize, reader: usize },

    #[error("Writer name {writer} does not match reader name {reader} or its aliases")]
    NameMismatch { writer: String, reader: String },

    #[error("Enum ordinal {index} out of bounds for enum {name} with {num_symbols} symbols")]
    EnumIndexOutOfRange {
        name: String,
        index: i64,
        num_symbols: usize,
    },

    #[error("Symbol '{symbol}' is unknown to reader enum {name}, which has no default")]
    EnumSymbolMissing { name: String, symbol: String },

    #[error("Can only encode value type {value_kind:?} as one of {supported_schema:?}")]
    EncodeValueAsSchemaError {
        value_kind: ValueKind,
        supported_schema: Vec<SchemaKind>,
    },

    #[error("No union branch accepts a value of type {0:?}")]
    EncodeUnionNoBranch(ValueKind),

    #[error("Fixed schema of size {expected} cannot hold {actual} bytes")]
    EncodeFixedSize { expected: usize, actual: usize },

    #[error(
        "Number of bytes requested for decimal sign extension {requested} is less than the number of bytes needed to encode {needed}"
    )]
    SignExtend { requested: usize, needed: usize },

    // --- resolution -----------------------------------------------------------------------
    #[error("Reader field '{field}' of record {record} is missing from the writer and has no default")]
    MissingDefault { record: String, field: String },

    #[error("Member '{member}' of shape {shape} matches no field of reader record {record}")]
    UnboundShapeMember {
        shape: String,
        member: String,
        record: String,
    },

    #[error("Value of type {value:?} cannot be bound to shape {shape}")]
    ShapeMismatch { value: ValueKind, shape: String },

    #[error("Missing field in record: {0:?}")]
    GetField(String),

    #[error("Failed to serialize value into Avro value: {0}")]
    SerializeValue(String),

    #[error("Failed to deserialize Avro value into value: {0}")]
    DeserializeValue(String),

    #[error("In field '{field}' of record {record}")]
    InField {
        record: String,
        field: String,
        #[source]
        source: Error,
    },

    // --- codecs and I/O -------------------------------------------------------------------
    #[error("Codec '{0}' is not supported/enabled")]
    CodecNotSupported(String),

    #[error("Failed to decompress with deflate")]
    DeflateDecompress(#[source] std::io::Error),

    #[cfg(feature = "snappy")]
    #[error("Failed to compress with snappy")]
    SnappyCompress(#[source] snap::Error),

    #[cfg(feature = "snappy")]
    #[error("Failed to get snappy decompression length")]
    GetSnappyDecompressLen(#[source] snap::Error),

    #[cfg(feature = "snappy")]
    #[error("Failed to decompress with snappy")]
    SnappyDecompress(#[source] snap::Error),

    #[cfg(feature = "snappy")]
    #[error("Bad Snappy CRC32; expected {expected:x} but got {actual:x}")]
    SnappyCrc32 { expected: u32, actual: u32 },

    #[cfg(feature = "zstandard")]
    #[error("Failed to compress with zstd")]
    ZstdCompress(#[source] std::io::Error),

    #[cfg(feature = "zstandard")]
    #[error("Failed to decompress with zstd")]
    ZstdDecompress(#[source] std::io::Error),

    #[error("Failed to write bytes")]
    WriteBytes(#[source] std::io::Error),
}

impl Details {
    /// Map a failed `read_exact` to a truncation or a plain I/O failure.
    pub(crate) fn read(what: &'static str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::UnexpectedEof {
            Details::TruncatedInput { what }
        } else {
            Details::ReadInput { what, source }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Details::GetNestedUnion
            | Details::GetUnionDuplicate(_)
            | Details::FieldNameDuplicate { .. }
            | Details::FixedSizeNotPositive(_)
            | Details::DecimalPrecisionMustBePositive { .. }
            | Details::DecimalPrecisionLessThanScale { .. }
            | Details::DecimalFixedTooSmall { .. }
            | Details::ResolveDecimalSchema(_)
            | Details::EnumSymbolDuplicate(_)
            | Details::EnumDefaultNotSymbol { .. }
            | Details::InvalidSchemaName(..)
            | Details::InvalidNamespace(..)
            | Details::FieldName(_)
            | Details::EnumSymbolName(_)
            | Details::AmbiguousSchemaDefinition(_)
            | Details::SchemaResolutionError(_)
            | Details::ParseSchemaJson(_)
            | Details::ParseSchemaFromValidJson
            | Details::ParsePrimitive(_)
            | Details::GetNameField
            | Details::GetRecordFieldsJson
            | Details::GetEnumSymbolsField
            | Details::GetFixedSizeField(_)
            | Details::GetArrayItemsField
            | Details::GetMapValuesField
            | Details::GetComplexType(_)
            | Details::GetComplexTypeField
            | Details::GetDecimalMetadataFromJson { .. }
            | Details::GetDefaultRecordField { .. } => ErrorKind::Schema,

            Details::UnresolvableShapeCycle(_)
            | Details::UnknownShape(_)
            | Details::InvalidShape(_) => ErrorKind::UnsupportedShape,

            Details::DefaultValue { .. }
            | Details::DefaultBytesOutOfRange(_)
            | Details::DefaultFixedSize { .. }
            | Details::DefaultEnumSymbol { .. }
            | Details::DefaultEnumIndex { .. }
            | Details::DefaultUnknownField { .. }
            | Details::DefaultMissingField { .. }
            | Details::DefaultUuid { .. }
            | Details::DefaultEmptyUnion => ErrorKind::DefaultValue,

            Details::TruncatedInput { .. } => ErrorKind::TruncatedInput,

            Details::BoolValue(_)
            | Details::ZagI32(..)
            | Details::IntegerOverflow
            | Details::NegativeLength(_)
            | Details::MemoryAllocation { .. }
            | Details::ConvertToUtf8(_)
            | Details::ConvertStrToUuid(..)
            | Details::ConvertStrToDecimal(..)
            | Details::ConvertFixedToUuid(_) => ErrorKind::InvalidData,

            Details::SchemaMismatch { .. }
            | Details::NoMatchingUnionBranch { .. }
            | Details::GetUnionVariant { .. }
            | Details::FixedSizeMismatch { .. }
            | Details::NameMismatch { .. }
            | Details::EnumIndexOutOfRange { .. }
            | Details::EnumSymbolMissing { .. }
            | Details::EncodeValueAsSchemaError { .. }
            | Details::EncodeUnionNoBranch(_)
            | Details::EncodeFixedSize { .. }
            | Details::SignExtend { .. } => ErrorKind::SchemaMismatch,

            Details::MissingDefault { .. }
            | Details::UnboundShapeMember { .. }
            | Details::ShapeMismatch { .. }
            | Details::GetField(_)
            | Details::SerializeValue(_)
            | Details::DeserializeValue(_) => ErrorKind::Resolution,

            Details::InField { source, .. } => source.kind(),

            Details::CodecNotSupported(_) | Details::DeflateDecompress(_) => ErrorKind::Codec,
            #[cfg(feature = "snappy")]
            Details::SnappyCompress(_)
            | Details::GetSnappyDecompressLen(_)
            | Details::SnappyDecompress(_)
            | Details::SnappyCrc32 { .. } => ErrorKind::Codec,
            #[cfg(feature = "zstandard")]
            Details::ZstdCompress(_) | Details::ZstdDecompress(_) => ErrorKind::Codec,

            Details::ReadInput { .. } | Details::WriteBytes(_) => ErrorKind::Io,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Details::SerializeValue(msg.to_string()).into()
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Details::DeserializeValue(msg.to_string()).into()
    }
}

impl fmt::Debug for Details {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut msg = self.to_string();
        if let Some(e) = self.source() {
            msg.extend([": ", &e.to_string()]);
        }
        write!(f, "{msg}")
    }
}
