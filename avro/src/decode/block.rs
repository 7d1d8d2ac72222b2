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

//! Iteration over the blocks arrays and maps are encoded in.
//!
//! A collection is a sequence of blocks, each starting with an item count. A count of zero ends
//! the collection. A negative count `-n` announces `n` items and is followed by the size of the
//! block in bytes, which lets readers that are not interested in the items jump over them.

use crate::{
    AvroResult,
    decode::skip_bytes,
    error::Details,
    util::{safe_len, zag_i64},
};
use std::io::Read;

/// The header of one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    /// Number of items in the block, zero for the terminating block.
    pub count: usize,
    /// Size of the block in bytes, present when the count was written negated.
    pub byte_size: Option<usize>,
}

pub fn read_block_header<R: Read>(reader: &mut R) -> AvroResult<BlockHeader> {
    let raw = zag_i64(reader)?;
    let count = usize::try_from(raw.unsigned_abs()).map_err(|_| Details::IntegerOverflow)?;
    let count = safe_len(count)?;
    let byte_size = if raw < 0 {
        let size = zag_i64(reader)?;
        let size = usize::try_from(size).map_err(|_| Details::NegativeLength(size))?;
        Some(safe_len(size)?)
    } else {
        None
    };
    Ok(BlockHeader { count, byte_size })
}

/// Walks the items of one array or map.
///
/// ```ignore
/// let mut blocks = BlockReader::new();
/// while blocks.next_item(reader)? {
///     // decode one item
/// }
/// ```
#[derive(Debug, Default)]
pub struct BlockReader {
    left_in_current_block: usize,
    block_byte_size: Option<usize>,
    finished: bool,
}

impl BlockReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position the cursor on the next item.
    ///
    /// Returns `false` once the terminating block has been consumed.
    pub fn next_item<R: Read>(&mut self, reader: &mut R) -> AvroResult<bool> {
        if self.left_in_current_block == 0 && !self.start_block(reader)? {
            return Ok(false);
        }
        self.left_in_current_block -= 1;
        // part of the block is consumed, its byte size is useless from now on
        self.block_byte_size = None;
        Ok(true)
    }

    /// Jump over the current block if its byte size is known and none of its items was read.
    ///
    /// Returns whether a block was skipped.
    pub fn skip_sized<R: Read>(&mut self, reader: &mut R) -> AvroResult<bool> {
        if self.left_in_current_block == 0 && !self.start_block(reader)? {
            return Ok(false);
        }
        match self.block_byte_size.take() {
            Some(size) => {
                skip_bytes(reader, size)?;
                self.left_in_current_block = 0;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Whether the terminating block was read.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn start_block<R: Read>(&mut self, reader: &mut R) -> AvroResult<bool> {
        if self.finished {
            return Ok(false);
        }
        let header = read_block_header(reader)?;
        if header.count == 0 {
            self.finished = true;
            return Ok(false);
        }
        self.left_in_current_block = header.count;
        self.block_byte_size = header.byte_size;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_int;
    use apache_avro_test_helper::TestResult;
    use pretty_assertions::assert_eq;

    fn read_ints(mut input: &[u8]) -> AvroResult<Vec<i32>> {
        let mut blocks = BlockReader::new();
        let mut items = Vec::new();
        while blocks.next_item(&mut input)? {
            items.push(decode_int(&mut input)?);
        }
        assert!(input.is_empty());
        Ok(items)
    }

    #[test]
    fn headers() -> TestResult {
        assert_eq!(
            read_block_header(&mut &[0x04u8][..])?,
            BlockHeader {
                count: 2,
                byte_size: None
            }
        );
        assert_eq!(
            read_block_header(&mut &[0x03u8, 0x08][..])?,
            BlockHeader {
                count: 2,
                byte_size: Some(4)
            }
        );
        Ok(())
    }

    #[test]
    fn positive_and_negative_blocks() -> TestResult {
        // [1, 2] in a positive block, then [3] in a negative one carrying its size
        let input = [0x04, 0x02, 0x04, 0x01, 0x02, 0x06, 0x00];
        assert_eq!(read_ints(&input)?, vec![1, 2, 3]);
        assert_eq!(read_ints(&[0x00])?, Vec::<i32>::new());
        Ok(())
    }

    #[test]
    fn sized_blocks_are_skipped_whole() -> TestResult {
        let mut input: &[u8] = &[0x03, 0x04, 0x02, 0x04, 0x02, 0x06, 0x00, 0xAA];
        let mut blocks = BlockReader::new();
        assert!(blocks.skip_sized(&mut input)?);
        // the second block carries no size
        assert!(!blocks.skip_sized(&mut input)?);
        assert!(blocks.next_item(&mut input)?);
        assert_eq!(decode_int(&mut input)?, 3);
        assert!(!blocks.next_item(&mut input)?);
        assert!(blocks.is_finished());
        assert_eq!(input, &[0xAAu8]);
        Ok(())
    }

    #[test]
    fn truncated_blocks() {
        let err = read_ints(&[0x04, 0x02]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::TruncatedInput);
    }
}
