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

//! Multi-resolution hierarchy for approximate range-sum frequency queries.
//!
//! A [`RangeSketch`] keeps one approximate counter per resolution level; level
//! `i` counts an item in buckets `2^i` base units wide. Every observation is
//! written to all levels. A query window `[start, end]` is split greedily into
//! the fewest aligned power-of-two blocks (see [`dyadic_blocks`]), each read
//! from the level whose bucket width matches, and the reads are summed.
//!
//! Windows wider than the configured maximum are rejected by
//! [`RangeSketch::estimate`]; [`RangeSketch::estimate_over_range`] splits them
//! into chunks instead.
//!
//! Time is an unsigned count of a caller-chosen base unit (for instance hours
//! since some origin). The sketch does no calendar arithmetic.
//!
//! # Usage
//!
//! ```rust
//! use rangesketch::hierarchy::RangeSketch;
//!
//! let mut sketch = RangeSketch::new(720, 512, 7, 1.004).unwrap();
//! sketch.update_with_weight("foo", 0, 1337).unwrap();
//! sketch.update_with_weight("foo", 2, 100_000).unwrap();
//!
//! assert_eq!(sketch.estimate("foo", 0, 2).unwrap(), 101_337);
//! assert!(sketch.estimate("foo", 0, 1000).is_err());
//! assert_eq!(sketch.estimate_over_range("foo", 0, 1000).unwrap(), 101_337);
//! ```
//!
//! # Concurrency
//!
//! Writes take `&mut self` and reads take `&self`; share a sketch across threads
//! behind a `Mutex` or `RwLock`.

mod builder;
mod decompose;
mod sketch;

pub use self::builder::RangeSketchBuilder;
pub use self::decompose::Block;
pub use self::decompose::DyadicBlocks;
pub use self::decompose::bucket_index;
pub use self::decompose::dyadic_blocks;
pub use self::sketch::RangeSketch;
