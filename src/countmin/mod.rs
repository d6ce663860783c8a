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

//! Count-Min sketch with time-decay pre-emphasis, keyed by `(item, bucket)`.
//!
//! Every cell keeps a conservative-update count. Observations in later
//! buckets are stored with a larger weight (`decay^(bucket - landmark)`) and
//! queries divide that weight back out, so collisions with older history
//! shrink relative to recent counts. With `decay = 1` this is a plain
//! conservative Count-Min sketch.
//!
//! # Usage
//!
//! ```rust
//! use rangesketch::countmin::DecayingCountMinSketch;
//!
//! let mut sketch = DecayingCountMinSketch::new(7, 512, 1.004).unwrap();
//!
//! sketch.update_with_weight(b"apple", 1, 1).unwrap();
//! sketch.update_with_weight(b"banana", 1, 3).unwrap();
//!
//! assert!(sketch.estimate(b"banana", 1) >= 3);
//! assert_eq!(sketch.estimate(b"banana", 2), 0);
//! ```
//!
//! # Configuration Helpers
//!
//! ```rust
//! use rangesketch::countmin::DecayingCountMinSketch;
//!
//! let num_buckets = DecayingCountMinSketch::suggest_num_buckets(0.01);
//! let num_hashes = DecayingCountMinSketch::suggest_num_hashes(0.99);
//!
//! let _sketch = DecayingCountMinSketch::new(num_hashes, num_buckets, 1.0).unwrap();
//! ```

mod sketch;
pub use self::sketch::DecayingCountMinSketch;
