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

//! Block compression for container collaborators.
//!
//! The engine itself never compresses anything; containers that frame encoded values into
//! blocks look codecs up by their Avro name in a [`CodecRegistry`].

use crate::{AvroResult, error::Details};
use miniz_oxide::deflate::CompressionLevel;
use std::{collections::HashMap, fmt, sync::Arc};
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

/// Settings for the `Deflate` codec.
#[derive(bon::Builder, Clone, Copy, Eq, PartialEq, Debug)]
pub struct DeflateSettings {
    #[builder(default = CompressionLevel::DefaultCompression)]
    compression_level: CompressionLevel,
}

impl Default for DeflateSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Settings for the `Zstandard` codec.
#[cfg(feature = "zstandard")]
#[derive(bon::Builder, Clone, Copy, Eq, PartialEq, Debug, Default)]
pub struct ZstandardSettings {
    /// `0` selects the zstd default level.
    #[builder(default)]
    pub compression_level: i32,
}

/// The compression codec used to compress blocks.
#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab_case")]
pub enum Codec {
    /// Data is passed through uncompressed.
    Null,
    /// A raw RFC 1951 deflate stream, without the zlib header and checksum of RFC 1950.
    Deflate(DeflateSettings),
    /// [Snappy](http://google.github.io/snappy/) compressed data followed by the 4-byte,
    /// big-endian CRC32 checksum of the uncompressed data.
    #[cfg(feature = "snappy")]
    Snappy,
    /// [Zstandard](https://facebook.github.io/zstd/) compressed data.
    #[cfg(feature = "zstandard")]
    Zstandard(ZstandardSettings),
}

impl Codec {
    /// Compress a stream of bytes in-place.
    pub fn compress(self, stream: &mut Vec<u8>) -> AvroResult<()> {
        match self {
            Codec::Null => {}
            Codec::Deflate(settings) => {
                *stream = miniz_oxide::deflate::compress_to_vec(
                    stream,
                    settings.compression_level as u8,
                );
            }
            #[cfg(feature = "snappy")]
            Codec::Snappy => {
                let mut encoded = vec![0; snap::raw::max_compress_len(stream.len())];
                let compressed_size = snap::raw::Encoder::new()
                    .compress(stream, &mut encoded)
                    .map_err(Details::SnappyCompress)?;
                encoded.truncate(compressed_size);
                encoded.extend_from_slice(&crc32fast::hash(stream).to_be_bytes());
                *stream = encoded;
            }
            #[cfg(feature = "zstandard")]
            Codec::Zstandard(settings) => {
                *stream = zstd::stream::encode_all(stream.as_slice(), settings.compression_level)
                    .map_err(Details::ZstdCompress)?;
            }
        }
        Ok(())
    }

    /// Decompress a stream of bytes in-place.
    pub fn decompress(self, stream: &mut Vec<u8>) -> AvroResult<()> {
        *stream = match self {
            Codec::Null => return Ok(()),
            Codec::Deflate(_) => {
                miniz_oxide::inflate::decompress_to_vec(stream).map_err(|e| {
                    use miniz_oxide::inflate::TINFLStatus;
                    use std::io;

                    let source = match e.status {
                        TINFLStatus::FailedCannotMakeProgress | TINFLStatus::NeedsMoreInput => {
                            io::Error::from(io::ErrorKind::UnexpectedEof)
                        }
                        status => io::Error::new(io::ErrorKind::InvalidData, format!("{status:?}")),
                    };
                    Details::DeflateDecompress(source)
                })?
            }
            #[cfg(feature = "snappy")]
            Codec::Snappy => {
                let Some(body_len) = stream.len().checked_sub(4) else {
                    return Err(Details::SnappyDecompress(snap::Error::Empty).into());
                };
                let (body, checksum) = stream.split_at(body_len);
                let mut decoded = vec![
                    0;
                    snap::raw::decompress_len(body)
                        .map_err(Details::GetSnappyDecompressLen)?
                ];
                snap::raw::Decoder::new()
                    .decompress(body, &mut decoded)
                    .map_err(Details::SnappyDecompress)?;

                let mut expected = [0; 4];
                expected.copy_from_slice(checksum);
                let expected = u32::from_be_bytes(expected);
                let actual = crc32fast::hash(&decoded);
                if expected != actual {
                    return Err(Details::SnappyCrc32 { expected, actual }.into());
                }
                decoded
            }
            #[cfg(feature = "zstandard")]
            Codec::Zstandard(_) => {
                zstd::stream::decode_all(stream.as_slice()).map_err(Details::ZstdDecompress)?
            }
        };
        Ok(())
    }
}

/// A block compression algorithm known by its Avro codec name.
pub trait Compressor: Send + Sync {
    fn name(&self) -> &str;

    fn compress(&self, data: &[u8]) -> AvroResult<Vec<u8>>;

    fn decompress(&self, data: &[u8]) -> AvroResult<Vec<u8>>;
}

impl Compressor for Codec {
    fn name(&self) -> &str {
        (*self).into()
    }

    fn compress(&self, data: &[u8]) -> AvroResult<Vec<u8>> {
        let mut stream = data.to_vec();
        Codec::compress(*self, &mut stream)?;
        Ok(stream)
    }

    fn decompress(&self, data: &[u8]) -> AvroResult<Vec<u8>> {
        let mut stream = data.to_vec();
        Codec::decompress(*self, &mut stream)?;
        Ok(stream)
    }
}

/// Codecs by name: the built-in ones plus any registered by the application.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn Compressor>>,
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.codecs.keys().collect();
        names.sort();
        f.debug_struct("CodecRegistry").field("codecs", &names).finish()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        let mut registry = Self {
            codecs: HashMap::new(),
        };
        for codec in Codec::iter() {
            registry.register(codec);
        }
        registry
    }
}

impl CodecRegistry {
    /// A registry with every built-in codec enabled in this build.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `compressor` under its name, replacing any codec of the same name.
    pub fn register(&mut self, compressor: impl Compressor + 'static) -> &mut Self {
        self.codecs
            .insert(compressor.name().to_string(), Arc::new(compressor));
        self
    }

    pub fn get(&self, name: &str) -> AvroResult<Arc<dyn Compressor>> {
        self.codecs
            .get(name)
            .cloned()
            .ok_or_else(|| Details::CodecNotSupported(name.to_string()).into())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.codecs.keys().map(String::as_str)
    }
}
