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

//! The contract between a [`RangeSketch`](crate::hierarchy::RangeSketch) and
//! the approximate counter it keeps at every resolution level.

use crate::error::Error;
use crate::hash::DEFAULT_UPDATE_SEED;

/// Parameters every level counter of a hierarchy is built from.
///
/// All levels of one hierarchy share the same configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterConfig {
    num_buckets: u32,
    num_hashes: u8,
    decay: f64,
    seed: u64,
}

impl CounterConfig {
    /// Creates a configuration with the default hash seed.
    ///
    /// Validation is deferred to the counter constructor.
    pub fn new(num_buckets: u32, num_hashes: u8, decay: f64) -> Self {
        Self {
            num_buckets,
            num_hashes,
            decay,
            seed: DEFAULT_UPDATE_SEED,
        }
    }

    /// Replaces the hash seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of cells per row (the counter width).
    pub fn num_buckets(&self) -> u32 {
        self.num_buckets
    }

    /// Number of rows (the counter depth).
    pub fn num_hashes(&self) -> u8 {
        self.num_hashes
    }

    /// Time-decay factor, interpreted by the counter.
    pub fn decay(&self) -> f64 {
        self.decay
    }

    /// Hash seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.num_buckets == 0 {
            return Err(Error::config_invalid("number of buckets must be at least 1")
                .with_context("num_buckets", self.num_buckets));
        }
        if self.num_hashes == 0 {
            return Err(Error::config_invalid("number of hashes must be at least 1")
                .with_context("num_hashes", self.num_hashes));
        }
        Ok(())
    }
}

/// An approximate, non-negative counter keyed by `(item, bucket)`.
///
/// Implementations are expected to never undercount a cell they still
/// remember, so that range sums built from them keep a one-sided error.
pub trait LevelCounter: Sized {
    /// Builds an empty counter.
    ///
    /// Fails with [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid)
    /// if the width or the depth is zero.
    fn from_config(config: &CounterConfig) -> Result<Self, Error>;

    /// Adds `delta` occurrences of `item` to `bucket`.
    fn update(&mut self, item: &[u8], bucket: u64, delta: u64) -> Result<(), Error>;

    /// Returns the estimated number of occurrences of `item` in `bucket`.
    fn query(&self, item: &[u8], bucket: u64) -> Result<u64, Error>;

    /// Forgets everything counted so far.
    fn reset(&mut self);
}
