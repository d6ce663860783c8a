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

use std::time::Duration;

use super::RangeSketch;
use crate::counter::CounterConfig;
use crate::countmin::DecayingCountMinSketch;
use crate::error::Error;
use crate::hash::DEFAULT_UPDATE_SEED;

const DEFAULT_NUM_BUCKETS: u32 = 512;
const DEFAULT_NUM_HASHES: u8 = 7;
const DEFAULT_DECAY: f64 = 1.004;

/// Builder for creating [`RangeSketch`] instances.
///
/// Provides two ways to pick the maximum window:
/// - [`with_max_duration()`](Self::with_max_duration): a count of base units
/// - [`with_time_unit()`](Self::with_time_unit): a duration and the base unit it is
///   measured in
///
/// Counter sizing defaults to 512 buckets, 7 hashes and a decay of 1.004.
#[derive(Debug, Clone)]
pub struct RangeSketchBuilder {
    max_duration: u64,
    num_buckets: u32,
    num_hashes: u8,
    decay: f64,
    seed: u64,
}

impl RangeSketchBuilder {
    /// Creates a builder for windows of up to `max_duration` base units.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rangesketch::hierarchy::RangeSketchBuilder;
    /// let sketch = RangeSketchBuilder::with_max_duration(720)
    ///     .num_buckets(1024)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(sketch.config().num_buckets(), 1024);
    /// ```
    pub fn with_max_duration(max_duration: u64) -> Self {
        Self {
            max_duration,
            num_buckets: DEFAULT_NUM_BUCKETS,
            num_hashes: DEFAULT_NUM_HASHES,
            decay: DEFAULT_DECAY,
            seed: DEFAULT_UPDATE_SEED,
        }
    }

    /// Creates a builder for windows of up to `duration`, counted in units of `unit`.
    ///
    /// Partial units are dropped: 90 minutes in hours is one unit. Timestamps
    /// passed to the sketch must be expressed in the same unit.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid)
    /// if `unit` is zero or the unit count does not fit in a `u64`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::time::Duration;
    /// # use rangesketch::hierarchy::RangeSketchBuilder;
    /// let hour = Duration::from_secs(3600);
    /// let sketch = RangeSketchBuilder::with_time_unit(720 * hour, hour)
    ///     .unwrap()
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(sketch.max_duration(), 720);
    /// ```
    pub fn with_time_unit(duration: Duration, unit: Duration) -> Result<Self, Error> {
        if unit.is_zero() {
            return Err(Error::config_invalid("time unit must be non-zero"));
        }
        let units = duration.as_nanos() / unit.as_nanos();
        let max_duration = u64::try_from(units).map_err(|_| {
            Error::config_invalid("duration holds more units than fit in u64")
                .with_context("units", units)
        })?;
        Ok(Self::with_max_duration(max_duration))
    }

    /// Sets the number of buckets per counter row.
    pub fn num_buckets(mut self, num_buckets: u32) -> Self {
        self.num_buckets = num_buckets;
        self
    }

    /// Sets the number of counter rows.
    pub fn num_hashes(mut self, num_hashes: u8) -> Self {
        self.num_hashes = num_hashes;
        self
    }

    /// Sizes the counters for a relative error per bucket and a confidence.
    ///
    /// # Panics
    ///
    /// Panics if either argument is not in (0.0, 1.0).
    pub fn accuracy(mut self, relative_error: f64, confidence: f64) -> Self {
        self.num_buckets = DecayingCountMinSketch::suggest_num_buckets(relative_error);
        self.num_hashes = DecayingCountMinSketch::suggest_num_hashes(confidence);
        self
    }

    /// Sets the time-decay factor. `1.0` disables decay.
    pub fn decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    /// Sets a custom hash seed (default: 9001).
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builds the sketch.
    ///
    /// # Errors
    ///
    /// See [`RangeSketch::with_config`].
    pub fn build(self) -> Result<RangeSketch, Error> {
        let config = CounterConfig::new(self.num_buckets, self.num_hashes, self.decay)
            .with_seed(self.seed);
        RangeSketch::with_config(self.max_duration, config)
    }
}
