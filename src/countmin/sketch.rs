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

use std::f64::consts::E;

use crate::counter::CounterConfig;
use crate::counter::LevelCounter;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::hash::hash_item_in_bucket;

/// Largest emphasis factor (as a power of two) written before the landmark moves.
const MAX_EMPHASIS_LOG2: f64 = 512.0;

/// Relative headroom applied to the rescale factor when the landmark moves.
///
/// The rescale factor and the emphasis recomputed afterwards are rounded
/// independently. The headroom keeps rescaled cells at or above the exact value.
const RESCALE_HEADROOM: f64 = 1.0 + 1.0 / (1u64 << 48) as f64;

/// Absolute slack removed from a quotient before it is rounded up to a count.
const ROUNDING_SLACK: f64 = 0.25;

/// Count-Min sketch over `(item, bucket)` keys with conservative update and
/// exponential time-decay pre-emphasis.
///
/// See the [countmin module level documentation](crate::countmin) for more.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayingCountMinSketch {
    num_hashes: u8,
    num_buckets: u32,
    decay: f64,
    seed: u64,
    /// Bucket whose emphasis factor is exactly one.
    landmark: u64,
    total_weight: u64,
    /// Row-major, `num_hashes` rows of `num_buckets` cells.
    counts: Vec<f64>,
}

impl DecayingCountMinSketch {
    /// Creates an empty sketch with the default seed.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`] if `num_hashes` or `num_buckets` is
    /// zero, or if `decay` is not a finite number of at least one.
    pub fn new(num_hashes: u8, num_buckets: u32, decay: f64) -> Result<Self, Error> {
        Self::with_seed(num_hashes, num_buckets, decay, DEFAULT_UPDATE_SEED)
    }

    /// Creates an empty sketch with a custom hash seed.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_seed(
        num_hashes: u8,
        num_buckets: u32,
        decay: f64,
        seed: u64,
    ) -> Result<Self, Error> {
        CounterConfig::new(num_buckets, num_hashes, decay).validate()?;
        if !decay.is_finite() || decay < 1.0 {
            return Err(
                Error::config_invalid("decay must be a finite number of at least 1")
                    .with_context("decay", decay),
            );
        }

        let num_cells = usize::from(num_hashes) * num_buckets as usize;
        Ok(Self {
            num_hashes,
            num_buckets,
            decay,
            seed,
            landmark: 0,
            total_weight: 0,
            counts: vec![0.0; num_cells],
        })
    }

    /// Suggests the number of buckets per row for a target relative error.
    ///
    /// # Panics
    ///
    /// Panics if `relative_error` is not in (0.0, 1.0), or if it is so small that
    /// the suggested width does not fit in a `u32`.
    pub fn suggest_num_buckets(relative_error: f64) -> u32 {
        assert!(
            relative_error > 0.0 && relative_error < 1.0,
            "relative_error must be between 0.0 and 1.0 (exclusive)"
        );
        let buckets = (E / relative_error).ceil();
        assert!(
            buckets <= f64::from(u32::MAX),
            "relative_error is too small, the suggested width exceeds u32::MAX"
        );
        buckets as u32
    }

    /// Suggests the number of rows for a target confidence.
    ///
    /// # Panics
    ///
    /// Panics if `confidence` is not in (0.0, 1.0).
    pub fn suggest_num_hashes(confidence: f64) -> u8 {
        assert!(
            confidence > 0.0 && confidence < 1.0,
            "confidence must be between 0.0 and 1.0 (exclusive)"
        );
        let hashes = (1.0 / (1.0 - confidence)).ln().ceil();
        hashes.clamp(1.0, f64::from(u8::MAX)) as u8
    }

    /// Returns the number of rows.
    pub fn num_hashes(&self) -> u8 {
        self.num_hashes
    }

    /// Returns the number of buckets per row.
    pub fn num_buckets(&self) -> u32 {
        self.num_buckets
    }

    /// Returns the decay factor.
    pub fn decay(&self) -> f64 {
        self.decay
    }

    /// Returns the hash seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the bucket whose emphasis factor is currently one.
    pub fn landmark(&self) -> u64 {
        self.landmark
    }

    /// Returns the sum of all weights added so far.
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Returns true if nothing has been counted.
    pub fn is_empty(&self) -> bool {
        self.total_weight == 0
    }

    /// Adds `weight` occurrences of `item` to `bucket`.
    ///
    /// A zero weight is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UpdateFailed`] if the emphasized weight cannot be
    /// represented: either it overflows, or `bucket` lies so far behind the
    /// landmark that it rounds to zero. A failed update leaves the sketch
    /// untouched.
    pub fn update_with_weight(
        &mut self,
        item: &[u8],
        bucket: u64,
        weight: u64,
    ) -> Result<(), Error> {
        if weight == 0 {
            return Ok(());
        }
        if self.emphasis_log2(bucket) > MAX_EMPHASIS_LOG2 {
            self.move_landmark(bucket);
        }

        let delta = mul_up(weight_to_f64(weight), self.emphasis(bucket));
        if delta == 0.0 {
            return Err(Error::new(
                ErrorKind::UpdateFailed,
                "bucket is too far behind the landmark to be recorded",
            )
            .with_context("bucket", bucket)
            .with_context("weight", weight)
            .with_context("landmark", self.landmark));
        }

        let (h1, h2) = hash_item_in_bucket(item, bucket, self.seed);
        let current = self.row_minimum(h1, h2);
        let target = add_up(current, delta);
        if !target.is_finite() {
            return Err(
                Error::new(ErrorKind::UpdateFailed, "emphasized count overflowed")
                    .with_context("bucket", bucket)
                    .with_context("weight", weight),
            );
        }

        // Conservative update: only raise the cells that sit below the new minimum.
        for row in 0..self.num_hashes {
            let index = self.cell_index(h1, h2, row);
            if self.counts[index] < target {
                self.counts[index] = target;
            }
        }
        self.total_weight = self.total_weight.saturating_add(weight);
        Ok(())
    }

    /// Returns the estimated number of occurrences of `item` in `bucket`.
    ///
    /// The estimate never undercounts, unless the bucket is so far behind the
    /// newest data that its history has decayed away, in which case it is zero.
    /// Cells are rounded up on every write, so counts beyond 2^53 may come back
    /// slightly high but never low.
    pub fn estimate(&self, item: &[u8], bucket: u64) -> u64 {
        let (h1, h2) = hash_item_in_bucket(item, bucket, self.seed);
        let minimum = self.row_minimum(h1, h2);
        let emphasis = self.emphasis(bucket);
        if minimum == 0.0 || emphasis == 0.0 {
            return 0;
        }
        (div_up(minimum, emphasis) - ROUNDING_SLACK).ceil() as u64
    }

    /// Resets the sketch to an empty state.
    pub fn reset(&mut self) {
        self.counts.fill(0.0);
        self.landmark = 0;
        self.total_weight = 0;
    }

    fn row_minimum(&self, h1: u64, h2: u64) -> f64 {
        (0..self.num_hashes)
            .map(|row| self.counts[self.cell_index(h1, h2, row)])
            .fold(f64::INFINITY, f64::min)
    }

    /// Double hashing (Kirsch-Mitzenmacher): `(h1 + row * h2) mod num_buckets`.
    fn cell_index(&self, h1: u64, h2: u64, row: u8) -> usize {
        let hash = h1.wrapping_add(u64::from(row).wrapping_mul(h2));
        let column = (hash % u64::from(self.num_buckets)) as usize;
        usize::from(row) * self.num_buckets as usize + column
    }

    /// Signed distance from the landmark, in buckets.
    fn distance(&self, bucket: u64) -> f64 {
        if bucket >= self.landmark {
            (bucket - self.landmark) as f64
        } else {
            -((self.landmark - bucket) as f64)
        }
    }

    fn emphasis_log2(&self, bucket: u64) -> f64 {
        self.distance(bucket) * self.decay.log2()
    }

    fn emphasis(&self, bucket: u64) -> f64 {
        self.decay.powf(self.distance(bucket))
    }

    /// Rescales every cell so that `bucket` becomes the new landmark.
    fn move_landmark(&mut self, bucket: u64) {
        let scale = self.decay.powf(-self.distance(bucket)) * RESCALE_HEADROOM;
        for count in &mut self.counts {
            *count *= scale;
        }
        tracing::trace!(
            from = self.landmark,
            to = bucket,
            scale,
            "moved count-min landmark"
        );
        self.landmark = bucket;
    }
}

/// Converts a weight to `f64`, rounding up when it is not representable.
fn weight_to_f64(weight: u64) -> f64 {
    let value = weight as f64;
    if (value as u64) < weight {
        value.next_up()
    } else {
        value
    }
}

/// `a * b` rounded toward positive infinity.
fn mul_up(a: f64, b: f64) -> f64 {
    let product = a * b;
    if a.mul_add(b, -product) > 0.0 {
        product.next_up()
    } else {
        product
    }
}

/// `a + b` rounded toward positive infinity (error term from TwoSum).
fn add_up(a: f64, b: f64) -> f64 {
    let sum = a + b;
    let b_part = sum - a;
    let error = (a - (sum - b_part)) + (b - b_part);
    if error > 0.0 { sum.next_up() } else { sum }
}

/// `a / b` rounded toward positive infinity, for positive `b`.
fn div_up(a: f64, b: f64) -> f64 {
    let quotient = a / b;
    if (-quotient).mul_add(b, a) > 0.0 {
        quotient.next_up()
    } else {
        quotient
    }
}

impl LevelCounter for DecayingCountMinSketch {
    fn from_config(config: &CounterConfig) -> Result<Self, Error> {
        Self::with_seed(
            config.num_hashes(),
            config.num_buckets(),
            config.decay(),
            config.seed(),
        )
    }

    fn update(&mut self, item: &[u8], bucket: u64, delta: u64) -> Result<(), Error> {
        self.update_with_weight(item, bucket, delta)
    }

    fn query(&self, item: &[u8], bucket: u64) -> Result<u64, Error> {
        Ok(self.estimate(item, bucket))
    }

    fn reset(&mut self) {
        DecayingCountMinSketch::reset(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_dimensions() {
        let err = DecayingCountMinSketch::new(0, 512, 1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.context_value("num_hashes"), Some("0"));

        let err = DecayingCountMinSketch::new(7, 0, 1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.context_value("num_buckets"), Some("0"));
    }

    #[test]
    fn test_rejects_bad_decay() {
        for decay in [0.5, 0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = DecayingCountMinSketch::new(3, 64, decay).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConfigInvalid, "decay {decay}");
        }
    }

    #[test]
    fn test_exact_without_collisions() {
        let mut sketch = DecayingCountMinSketch::new(7, 512, 1.004).unwrap();
        assert!(sketch.is_empty());

        sketch.update_with_weight(b"foo", 1, 1337).unwrap();
        sketch.update_with_weight(b"foo", 3, 100_000).unwrap();
        sketch.update_with_weight(b"foo", 3, 1).unwrap();

        assert_eq!(sketch.estimate(b"foo", 1), 1337);
        assert_eq!(sketch.estimate(b"foo", 3), 100_001);
        assert_eq!(sketch.estimate(b"foo", 2), 0);
        assert_eq!(sketch.estimate(b"bar", 1), 0);
        assert_eq!(sketch.total_weight(), 101_338);
    }

    #[test]
    fn test_zero_weight_is_noop() {
        let mut sketch = DecayingCountMinSketch::new(3, 64, 1.0).unwrap();
        sketch.update_with_weight(b"foo", 1, 0).unwrap();
        assert!(sketch.is_empty());
        assert!(sketch.counts.iter().all(|c| *c == 0.0));
    }

    #[test]
    fn test_never_undercounts_when_saturated() {
        // Few buckets force plenty of collisions.
        let mut sketch = DecayingCountMinSketch::new(2, 8, 1.0).unwrap();
        for i in 0..200u64 {
            let item = format!("item-{i}");
            sketch.update_with_weight(item.as_bytes(), i % 5, i + 1).unwrap();
        }
        for i in 0..200u64 {
            let item = format!("item-{i}");
            assert!(sketch.estimate(item.as_bytes(), i % 5) > i);
        }
    }

    #[test]
    fn test_landmark_moves_for_far_buckets() {
        let mut sketch = DecayingCountMinSketch::new(4, 128, 2.0).unwrap();
        sketch.update_with_weight(b"old", 0, 5).unwrap();
        assert_eq!(sketch.landmark, 0);

        // 2^1100 is past the limit, so the landmark must move.
        sketch.update_with_weight(b"new", 1100, 7).unwrap();
        assert_eq!(sketch.landmark, 1100);
        assert_eq!(sketch.estimate(b"new", 1100), 7);

        // 5 * 2^-1100 underflows: decayed away.
        assert_eq!(sketch.estimate(b"old", 0), 0);
    }

    #[test]
    fn test_nearby_history_survives_landmark_move() {
        let mut sketch = DecayingCountMinSketch::new(4, 128, 1.5).unwrap();
        sketch.update_with_weight(b"foo", 800, 42).unwrap();
        assert_eq!(sketch.landmark, 0);
        sketch.update_with_weight(b"foo", 1000, 3).unwrap();
        assert_eq!(sketch.landmark, 1000);
        assert_eq!(sketch.estimate(b"foo", 800), 42);
        assert_eq!(sketch.estimate(b"foo", 1000), 3);
    }

    #[test]
    fn test_rejects_write_that_decays_to_nothing() {
        let mut sketch = DecayingCountMinSketch::new(4, 128, 2.0).unwrap();
        sketch.update_with_weight(b"new", 2000, 1).unwrap();
        assert_eq!(sketch.landmark(), 2000);
        let before = sketch.counts.clone();

        // 2^-1999 underflows, so the write cannot be stored.
        let err = sketch.update_with_weight(b"late", 1, 5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpdateFailed);
        assert_eq!(err.context_value("bucket"), Some("1"));
        assert_eq!(err.context_value("weight"), Some("5"));
        assert_eq!(sketch.total_weight(), 1);
        assert_eq!(sketch.counts, before);

        // A late write that still fits is accepted.
        sketch.update_with_weight(b"late", 1990, 5).unwrap();
        assert_eq!(sketch.estimate(b"late", 1990), 5);
        assert_eq!(sketch.total_weight(), 6);
    }

    #[test]
    fn test_counts_beyond_f64_mantissa_never_undercount() {
        let huge = (1u64 << 53) + 1;
        for decay in [1.0, 1.004] {
            let mut sketch = DecayingCountMinSketch::new(4, 128, decay).unwrap();
            sketch.update_with_weight(b"foo", 1, huge).unwrap();
            assert!(sketch.estimate(b"foo", 1) >= huge, "decay {decay}");

            let mut sketch = DecayingCountMinSketch::new(4, 128, decay).unwrap();
            sketch.update_with_weight(b"foo", 1, 1 << 53).unwrap();
            sketch.update_with_weight(b"foo", 1, 1).unwrap();
            assert!(sketch.estimate(b"foo", 1) >= huge, "decay {decay}");
        }

        let mut sketch = DecayingCountMinSketch::new(4, 128, 1.0).unwrap();
        sketch.update_with_weight(b"foo", 1, u64::MAX).unwrap();
        assert_eq!(sketch.estimate(b"foo", 1), u64::MAX);
    }

    #[test]
    fn test_rounding_helpers() {
        assert_eq!(weight_to_f64(1 << 53), 9007199254740992.0);
        assert_eq!(weight_to_f64((1 << 53) + 1), 9007199254740994.0);
        assert_eq!(add_up(9007199254740992.0, 1.0), 9007199254740994.0);
        assert_eq!(add_up(1.0, 2.0), 3.0);
        assert_eq!(mul_up(3.0, 7.0), 21.0);
        assert!(mul_up(0.1, 3.0) >= 0.30000000000000004);
        assert!(div_up(1.0, 3.0) > 1.0 / 3.0);
    }

    #[test]
    fn test_reset() {
        let mut sketch = DecayingCountMinSketch::new(4, 128, 2.0).unwrap();
        sketch.update_with_weight(b"foo", 2000, 9).unwrap();
        sketch.reset();
        assert!(sketch.is_empty());
        assert_eq!(sketch.landmark, 0);
        assert_eq!(sketch.estimate(b"foo", 2000), 0);
    }

    #[test]
    fn test_suggestions() {
        assert_eq!(DecayingCountMinSketch::suggest_num_buckets(0.01), 272);
        assert_eq!(DecayingCountMinSketch::suggest_num_hashes(0.99), 5);
        assert_eq!(DecayingCountMinSketch::suggest_num_hashes(0.1), 1);
    }

    #[test]
    #[should_panic(expected = "the suggested width exceeds u32::MAX")]
    fn test_suggest_buckets_rejects_tiny_error() {
        DecayingCountMinSketch::suggest_num_buckets(1e-12);
    }

    #[test]
    #[should_panic(expected = "confidence must be between 0.0 and 1.0")]
    fn test_suggest_hashes_rejects_certainty() {
        DecayingCountMinSketch::suggest_num_hashes(1.0);
    }
}
