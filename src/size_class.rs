// Copyright 2025 The cmpctalloc Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Size-class mapper: eight segregated buckets, doubling from a 64-byte
//! base, clamped at the top bucket.

use crate::config::{BUCKET_BASE, NUM_BUCKETS};

/// Map a block size to its free-list bucket index in `0..NUM_BUCKETS`.
///
/// Bucket `i` holds sizes in `[64 * 2^i, 64 * 2^(i+1))`, except bucket 0
/// which also absorbs sizes below 64, and the top bucket which absorbs
/// everything at or above its threshold.
pub fn size_class(size: usize) -> usize {
    let mut pow = BUCKET_BASE;
    let mut index = 0usize;
    while pow <= size && index < NUM_BUCKETS - 1 {
        pow *= 2;
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_sizes_map_to_bucket_zero() {
        assert_eq!(size_class(0), 0);
        assert_eq!(size_class(32), 0);
        assert_eq!(size_class(63), 0);
    }

    #[test]
    fn boundary_goes_to_next_bucket() {
        assert_eq!(size_class(64), 1);
        assert_eq!(size_class(127), 1);
        assert_eq!(size_class(128), 2);
    }

    #[test]
    fn clamps_at_top_bucket() {
        assert_eq!(size_class(8192), 7);
        assert_eq!(size_class(1 << 30), 7);
    }

    #[test]
    fn doubling_sequence() {
        let expected = [
            (32, 0),
            (64, 1),
            (128, 2),
            (256, 3),
            (512, 4),
            (1024, 5),
            (2048, 6),
            (4096, 7),
        ];
        for (size, bucket) in expected {
            assert_eq!(size_class(size), bucket, "size {size}");
        }
    }
}
