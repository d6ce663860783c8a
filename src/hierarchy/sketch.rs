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

use super::decompose::DyadicBlocks;
use super::decompose::bucket_index;
use super::decompose::dyadic_blocks;
use crate::counter::CounterConfig;
use crate::counter::LevelCounter;
use crate::countmin::DecayingCountMinSketch;
use crate::error::Error;
use crate::error::ErrorKind;

/// Multi-resolution frequency sketch answering "how often did this item occur
/// between `start` and `end`".
///
/// Level `i` counts in buckets of `2^i` base units. There are
/// `floor(log2(max_duration))` levels.
///
/// See the [hierarchy module level documentation](crate::hierarchy) for more.
#[derive(Debug, Clone)]
pub struct RangeSketch<C = DecayingCountMinSketch> {
    max_duration: u64,
    config: CounterConfig,
    levels: Vec<C>,
}

impl RangeSketch {
    /// Creates a sketch of Count-Min levels with the default seed.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`] if `max_duration < 2`, if
    /// `num_buckets` or `num_hashes` is zero, or if `decay` is rejected by the
    /// counter.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rangesketch::hierarchy::RangeSketch;
    /// let sketch = RangeSketch::new(720, 512, 7, 1.004).unwrap();
    /// assert_eq!(sketch.num_levels(), 9);
    /// ```
    pub fn new(
        max_duration: u64,
        num_buckets: u32,
        num_hashes: u8,
        decay: f64,
    ) -> Result<Self, Error> {
        Self::with_config(max_duration, CounterConfig::new(num_buckets, num_hashes, decay))
    }

    /// Returns the total weight observed, as counted by the finest level.
    pub fn total_weight(&self) -> u64 {
        self.levels.first().map_or(0, |level| level.total_weight())
    }

    /// Returns true if nothing has been observed.
    pub fn is_empty(&self) -> bool {
        self.total_weight() == 0
    }
}

impl<C: LevelCounter> RangeSketch<C> {
    /// Creates a sketch whose levels are built by `C::from_config`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`] if `max_duration < 2` (no level
    /// would exist), if the width or depth in `config` is zero, or if any
    /// counter fails to build. No partially built sketch is returned.
    pub fn with_config(max_duration: u64, config: CounterConfig) -> Result<Self, Error> {
        if max_duration < 2 {
            return Err(Error::config_invalid(
                "max duration must be at least 2 base units to hold one level",
            )
            .with_context("max_duration", max_duration));
        }
        config.validate()?;

        let num_levels = max_duration.ilog2() as usize;
        let levels = (0..num_levels)
            .map(|level| C::from_config(&config).map_err(|err| err.with_context("level", level)))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            max_duration,
            num_levels,
            num_buckets = config.num_buckets(),
            num_hashes = config.num_hashes(),
            decay = config.decay(),
            "created range sketch"
        );
        Ok(Self {
            max_duration,
            config,
            levels,
        })
    }

    /// Returns the widest window [`estimate`](Self::estimate) accepts, in base units.
    pub fn max_duration(&self) -> u64 {
        self.max_duration
    }

    /// Returns the number of resolution levels.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Returns the configuration every level was built from.
    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    /// Returns the counter of one level, if it exists.
    pub fn level(&self, level: usize) -> Option<&C> {
        self.levels.get(level)
    }

    /// Records one occurrence of `item` at `timestamp`.
    ///
    /// # Errors
    ///
    /// See [`update_with_weight`](Self::update_with_weight).
    pub fn update(&mut self, item: impl AsRef<[u8]>, timestamp: u64) -> Result<(), Error> {
        self.update_with_weight(item, timestamp, 1)
    }

    /// Records `count` occurrences of `item` at `timestamp` in every level.
    ///
    /// Levels are written finest first. A zero count is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UpdateFailed`] with the failing level in its context
    /// and the counter's error as source. Levels written before the failure keep
    /// the observation.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rangesketch::hierarchy::RangeSketch;
    /// let mut sketch = RangeSketch::new(720, 512, 7, 1.004).unwrap();
    /// sketch.update_with_weight("foo", 0, 1337).unwrap();
    /// sketch.update_with_weight("foo", 2, 100_000).unwrap();
    ///
    /// assert_eq!(sketch.estimate("foo", 0, 1).unwrap(), 1337);
    /// assert_eq!(sketch.estimate("foo", 0, 2).unwrap(), 101_337);
    /// assert_eq!(sketch.estimate("foo", 2, 3).unwrap(), 100_000);
    /// ```
    pub fn update_with_weight(
        &mut self,
        item: impl AsRef<[u8]>,
        timestamp: u64,
        count: u64,
    ) -> Result<(), Error> {
        if count == 0 {
            return Ok(());
        }
        let item = item.as_ref();
        for (level, counter) in self.levels.iter_mut().enumerate() {
            let bucket = bucket_index(timestamp, level as u8);
            counter.update(item, bucket, count).map_err(|err| {
                Error::new(ErrorKind::UpdateFailed, "level counter rejected the update")
                    .with_context("level", level)
                    .with_context("bucket", bucket)
                    .set_source(err)
            })?;
        }
        Ok(())
    }

    /// Returns the dyadic blocks that answer the window `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidWindow`] if `start > end` and
    /// [`ErrorKind::WindowTooLarge`] if `end - start > max_duration`.
    pub fn blocks(&self, start: u64, end: u64) -> Result<DyadicBlocks, Error> {
        if start > end {
            return Err(Error::invalid_window(start, end));
        }
        if end - start > self.max_duration {
            tracing::debug!(start, end, max_duration = self.max_duration, "window too large");
            return Err(Error::window_too_large(end - start, self.max_duration));
        }
        Ok(dyadic_blocks(start, end, self.levels.len() as u8))
    }

    /// Estimates how often `item` occurred in the inclusive window `[start, end]`.
    ///
    /// The window is decomposed into aligned power-of-two blocks, each read from
    /// the level of matching width, so a query costs O(log(end - start)) counter
    /// reads. With counters that never undercount, neither does the sum.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidWindow`] if `start > end`,
    /// [`ErrorKind::WindowTooLarge`] if `end - start > max_duration` (use
    /// [`estimate_over_range`](Self::estimate_over_range) for wider windows), and
    /// [`ErrorKind::QueryFailed`] if a counter read fails.
    pub fn estimate(&self, item: impl AsRef<[u8]>, start: u64, end: u64) -> Result<u64, Error> {
        let item = item.as_ref();
        let mut estimate = 0u64;
        for block in self.blocks(start, end)? {
            let level = usize::from(block.level());
            let count = self.levels[level]
                .query(item, block.bucket())
                .map_err(|err| {
                    Error::new(ErrorKind::QueryFailed, "level counter failed to answer")
                        .with_context("level", level)
                        .with_context("bucket", block.bucket())
                        .set_source(err)
                })?;
            tracing::trace!(level, bucket = block.bucket(), count, "read block");
            estimate = estimate.saturating_add(count);
        }
        Ok(estimate)
    }

    /// Estimates how often `item` occurred in `[start, end]`, for windows of any
    /// width.
    ///
    /// The window is cut into consecutive chunks `[start, start + max_duration - 1]`,
    /// `[start + max_duration, ...]`, and so on, the last one clipped at `end`. Each
    /// chunk is answered by [`estimate`](Self::estimate) and the results are summed.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidWindow`] if `start > end`, and the first error
    /// of any chunk otherwise. No partial sum is returned.
    pub fn estimate_over_range(
        &self,
        item: impl AsRef<[u8]>,
        start: u64,
        end: u64,
    ) -> Result<u64, Error> {
        if start > end {
            return Err(Error::invalid_window(start, end));
        }
        let item = item.as_ref();
        let mut estimate = 0u64;
        let mut chunk_start = Some(start);
        while let Some(lo) = chunk_start.filter(|lo| *lo <= end) {
            let hi = lo.saturating_add(self.max_duration - 1).min(end);
            estimate = estimate.saturating_add(self.estimate(item, lo, hi)?);
            chunk_start = lo.checked_add(self.max_duration);
        }
        Ok(estimate)
    }

    /// Resets every level to an empty state, keeping the configuration.
    pub fn reset(&mut self) {
        for counter in &mut self.levels {
            counter.reset();
        }
        tracing::debug!(num_levels = self.levels.len(), "reset range sketch");
    }
}
