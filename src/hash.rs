//! Key hashing.
//!
//! One xxh64 pass per key: the full 64 bits are the index key inside a bucket,
//! and the same value modulo the bucket count picks the bucket.
use xxhash_rust::xxh64::xxh64;

const SEED: u64 = 0;

#[inline]
pub fn hash_key(key: &[u8]) -> u64 {
    xxh64(key, SEED)
}

/// Checksum used to validate reassembled big values.
#[inline]
pub fn checksum(value: &[u8]) -> u64 {
    xxh64(value, SEED)
}

#[inline]
pub fn bucket_index(hash: u64, buckets: usize) -> usize {
    (hash % buckets as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(hash_key(b"abc"), hash_key(b"abc"));
        assert_ne!(hash_key(b"abc"), hash_key(b"abd"));
        // Reference value for xxh64("", 0).
        assert_eq!(hash_key(b""), 0xef46_db37_51d8_e999);
    }

    #[test]
    fn bucket_index_in_range() {
        for i in 0u64..10_000 {
            let h = hash_key(&i.to_be_bytes());
            assert!(bucket_index(h, 512) < 512);
            assert_eq!(bucket_index(h, 1), 0);
        }
    }

    #[test]
    fn sequential_integer_keys_spread_over_buckets() {
        let buckets = 512;
        let mut counts = vec![0usize; buckets];
        for i in 0u64..(buckets as u64 * 64) {
            counts[bucket_index(hash_key(&i.to_be_bytes()), buckets)] += 1;
        }
        // 64 per bucket on average; nothing should be empty or badly skewed.
        assert!(counts.iter().all(|&c| c > 16 && c < 160), "{counts:?}");
    }
}
