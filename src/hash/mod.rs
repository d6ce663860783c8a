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

use std::hash::Hasher;

/// The seed used when the caller does not pick one.
pub(crate) const DEFAULT_UPDATE_SEED: u64 = 9001;

/// Hashes an item together with the bucket it was observed in.
///
/// The key is the item bytes followed by the little-endian bucket index, fed
/// through MurmurHash3 x64 128.
pub(crate) fn hash_item_in_bucket(item: &[u8], bucket: u64, seed: u64) -> (u64, u64) {
    let mut hasher = mur3::Hasher128::with_seed(fold_seed(seed));
    hasher.write(item);
    hasher.write(&bucket.to_le_bytes());
    hasher.finish128()
}

/// MurmurHash3 takes a 32-bit seed; fold both halves so no seed bits are ignored.
fn fold_seed(seed: u64) -> u32 {
    ((seed >> 32) ^ (seed & 0xffff_ffff)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streamed_key_matches_concatenated_key() {
        let item = b"The quick brown fox jumps over the lazy dog";
        let bucket = 0x0102_0304_0506_0708u64;

        let mut key = item.to_vec();
        key.extend_from_slice(&bucket.to_le_bytes());
        let expected = mur3::murmurhash3_x64_128(&key, fold_seed(DEFAULT_UPDATE_SEED));

        assert_eq!(hash_item_in_bucket(item, bucket, DEFAULT_UPDATE_SEED), expected);
    }

    #[test]
    fn test_known_vector() {
        // 40-byte reference key, split into a 32-byte item and an 8-byte bucket.
        let key = b"The quick brown fox jumps over the lazy1";
        let (text, tail) = key.split_at(32);
        let bucket = u64::from_le_bytes(tail.try_into().unwrap());
        let (h1, h2) = hash_item_in_bucket(text, bucket, 0);
        assert_eq!(h1, 0xe3301a827e5cdfe3);
        assert_eq!(h2, 0xbdbf05f8da0f0392);
    }

    #[test]
    fn test_bucket_and_seed_change_the_hash() {
        let base = hash_item_in_bucket(b"foo", 1, DEFAULT_UPDATE_SEED);
        assert_ne!(base, hash_item_in_bucket(b"foo", 2, DEFAULT_UPDATE_SEED));
        assert_ne!(base, hash_item_in_bucket(b"bar", 1, DEFAULT_UPDATE_SEED));
        assert_ne!(base, hash_item_in_bucket(b"foo", 1, 42));
    }

    #[test]
    fn test_fold_seed() {
        assert_eq!(fold_seed(9001), 9001);
        assert_eq!(fold_seed(0x0000_0001_0000_0001), 0);
        assert_eq!(fold_seed(0xffff_ffff_0000_0000), 0xffff_ffff);
    }
}
