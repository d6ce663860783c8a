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

//! Approximate per-item frequency over arbitrary time windows.
//!
//! Observations `(item, timestamp, count)` are kept in a hierarchy of
//! Count-Min sketches, one per power-of-two bucket width, so memory stays
//! bounded no matter how long the history or how wide the window. Estimates
//! only ever overstate the true count.
//!
//! - [`hierarchy`]: the multi-resolution sketch and its range decomposition.
//! - [`countmin`]: the decaying Count-Min sketch used at every level.
//! - [`counter`]: the contract a per-level counter fulfils.

#![deny(missing_docs)]

pub mod counter;
pub mod countmin;
pub mod error;
pub mod hierarchy;

mod hash;
