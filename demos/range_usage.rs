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

use rangesketch::hierarchy::RangeSketchBuilder;

fn main() {
    let hour = Duration::from_secs(3600);

    // Windows of up to 720 hours, one base unit per hour.
    let mut sketch = RangeSketchBuilder::with_time_unit(720 * hour, hour)
        .unwrap()
        .num_buckets(1 << 9)
        .num_hashes(7)
        .decay(1.004)
        .build()
        .unwrap();
    println!(
        "Created sketch with {} levels over {} hours",
        sketch.num_levels(),
        sketch.max_duration()
    );

    let item = "foo";
    let (t1, t2, t3, t4) = (0, 1, 2, 3);
    let (count1, count2) = (1337, 100_000);

    sketch.update_with_weight(item, t1, count1).unwrap();
    sketch.update_with_weight(item, t3, count2).unwrap();

    for (start, end, expected) in [
        (t1, t2, count1),
        (t1, t3, count1 + count2),
        (t3, t4, count2),
    ] {
        let got = sketch.estimate(item, start, end).unwrap();
        println!(
            "Expected count for {item:?} in hours [{start}, {end}] to be {expected}, got {got}"
        );
    }

    let year = 24 * 365;
    match sketch.estimate(item, 0, year) {
        Ok(_) => unreachable!("a year is wider than 720 hours"),
        Err(err) => println!("\nSingle query over a year fails: {err}"),
    }
    println!(
        "Chunked query over a year: {}",
        sketch.estimate_over_range(item, 0, year).unwrap()
    );

    println!("\nPlan for hours [3, 12]:");
    for block in sketch.blocks(3, 12).unwrap() {
        println!(
            "  level {} bucket {} covers [{}, {}]",
            block.level(),
            block.bucket(),
            block.start(),
            block.end()
        );
    }
}
