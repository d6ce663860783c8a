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

use std::iter::FusedIterator;

/// Maps a timestamp to its bucket index at `level`: `1 + floor(timestamp / 2^level)`.
///
/// The addition wraps for `u64::MAX` at level zero, giving bucket `0`, which no
/// other timestamp maps to.
///
/// # Panics
///
/// Panics if `level` is 64 or more.
#[inline]
pub fn bucket_index(timestamp: u64, level: u8) -> u64 {
    (timestamp >> level).wrapping_add(1)
}

/// An aligned block of `2^level` base units, answered by one bucket of one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    level: u8,
    bucket: u64,
}

impl Block {
    /// Returns the resolution level answering this block.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Returns the bucket index inside that level.
    pub fn bucket(&self) -> u64 {
        self.bucket
    }

    /// Returns the first base unit covered by the block.
    pub fn start(&self) -> u64 {
        self.bucket.wrapping_sub(1) << self.level
    }

    /// Returns the last base unit covered by the block (inclusive).
    pub fn end(&self) -> u64 {
        self.start() + (self.width() - 1)
    }

    /// Returns the number of base units covered by the block.
    pub fn width(&self) -> u64 {
        1 << self.level
    }
}

/// Greedy decomposition of an inclusive window into canonical dyadic blocks.
///
/// Produced by [`dyadic_blocks`]. Clone it before consuming to replay the same plan.
#[derive(Debug, Clone)]
pub struct DyadicBlocks {
    next: Option<u64>,
    end: u64,
    max_level: u32,
}

/// Splits the inclusive window `[start, end]` into the minimal sequence of
/// aligned power-of-two blocks, using levels `0..num_levels`.
///
/// Each step takes the largest block that starts at the cursor, is aligned to
/// its own width, does not run past `end`, and does not exceed the top level.
/// An empty iterator is returned when `start > end`.
///
/// # Panics
///
/// Panics if `num_levels` is not in [1, 64].
///
/// # Examples
///
/// ```
/// use rangesketch::hierarchy::dyadic_blocks;
///
/// let plan: Vec<_> = dyadic_blocks(3, 12, 9)
///     .map(|block| (block.start(), block.end()))
///     .collect();
/// assert_eq!(plan, vec![(3, 3), (4, 7), (8, 11), (12, 12)]);
/// ```
pub fn dyadic_blocks(start: u64, end: u64, num_levels: u8) -> DyadicBlocks {
    assert!(
        (1..=64).contains(&num_levels),
        "num_levels must be in [1, 64], got {num_levels}"
    );
    DyadicBlocks {
        next: (start <= end).then_some(start),
        end,
        max_level: u32::from(num_levels) - 1,
    }
}

impl Iterator for DyadicBlocks {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        let start = self.next.filter(|start| *start <= self.end)?;

        // Largest k with start + 2^k - 1 <= end. The window is at most 2^64
        // units long, which only happens for [0, u64::MAX].
        let remaining = self.end - start;
        let fits = remaining.checked_add(1).map_or(u64::BITS, u64::ilog2);
        // Zero is aligned to every power of two.
        let aligned = start.trailing_zeros();
        let level = aligned.min(fits).min(self.max_level) as u8;

        self.next = start.checked_add(1 << level);
        Some(Block {
            level,
            bucket: bucket_index(start, level),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next {
            Some(start) if start <= self.end => (1, None),
            _ => (0, Some(0)),
        }
    }
}

impl FusedIterator for DyadicBlocks {}
