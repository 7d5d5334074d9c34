//! Values larger than a single arena record.
//!
//! `set_big` splits the value into chunks and stores each one as an ordinary
//! entry under a derived 24-byte key, then stores a 24-byte header under the
//! caller's key:
//!
//! ```text
//! header  = [value_hash: u64 LE][value_len: u64 LE][chunk_count: u64 LE]
//! chunk i = key [key_hash: u64 LE][value_hash: u64 LE][i: u64 LE] -> bytes
//! ```
//!
//! There is no atomicity across the pieces. Any chunk can be overwritten on
//! its own, so `get_big` checks every piece and the final checksum, and
//! reports a miss rather than a partial value.
use tracing::trace;

use crate::cache::Cache;
use crate::hash::{checksum, hash_key};
use crate::key::CacheKey;
use crate::storage::record::RECORD_HEADER_LEN;

const HEADER_LEN: usize = 24;
const CHUNK_KEY_LEN: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BigHeader {
    value_hash: u64,
    value_len: u64,
    chunks: u64,
}

impl BigHeader {
    fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..8].copy_from_slice(&self.value_hash.to_le_bytes());
        buf[8..16].copy_from_slice(&self.value_len.to_le_bytes());
        buf[16..24].copy_from_slice(&self.chunks.to_le_bytes());
        buf
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != HEADER_LEN {
            return None;
        }
        let word = |i: usize| -> Option<u64> {
            Some(u64::from_le_bytes(bytes[i..i + 8].try_into().ok()?))
        };
        Some(BigHeader {
            value_hash: word(0)?,
            value_len: word(8)?,
            chunks: word(16)?,
        })
    }
}

fn chunk_key(key_hash: u64, value_hash: u64, index: u64) -> [u8; CHUNK_KEY_LEN] {
    let mut buf = [0u8; CHUNK_KEY_LEN];
    buf[0..8].copy_from_slice(&key_hash.to_le_bytes());
    buf[8..16].copy_from_slice(&value_hash.to_le_bytes());
    buf[16..24].copy_from_slice(&index.to_le_bytes());
    buf
}

impl Cache {
    /// Payload bytes carried by each chunk of a big value.
    #[inline]
    pub fn chunk_len(&self) -> usize {
        self.layout().arena_size - RECORD_HEADER_LEN - CHUNK_KEY_LEN
    }

    /// Store a value of any size under `key`.
    ///
    /// Read it back with [`Cache::get_big`]; a plain [`Cache::get`] on the
    /// same key returns the 24-byte header instead.
    ///
    /// Returns `false` and writes nothing if the key is too long to sit next
    /// to the header in one record, or if some bucket would receive more
    /// pieces than its arena ring holds at once, which would make the value
    /// evict itself.
    ///
    /// `true` means every piece was written and fit. The chunks are still
    /// independent entries, so later writes by anyone can evict one of them
    /// and turn the value into a miss.
    pub fn set_big<K: CacheKey>(&self, key: K, value: &[u8]) -> bool {
        let key = key.key_bytes();
        let key = key.as_ref();
        if key.len() + HEADER_LEN > self.max_value_len() {
            trace!(key_len = key.len(), "big.set.key_too_long");
            return false;
        }

        let key_hash = hash_key(key);
        let value_hash = checksum(value);
        let chunks = value.len().div_ceil(self.chunk_len()) as u64;
        let chunk_keys: Vec<([u8; CHUNK_KEY_LEN], u64)> = (0..chunks)
            .map(|index| {
                let piece_key = chunk_key(key_hash, value_hash, index);
                (piece_key, hash_key(&piece_key))
            })
            .collect();

        if !self.pieces_fit(key_hash, chunk_keys.iter().map(|&(_, hash)| hash)) {
            trace!(
                value_len = value.len(),
                chunks = chunk_keys.len(),
                "big.set.self_evicting"
            );
            return false;
        }

        for ((piece_key, hash), chunk) in chunk_keys.iter().zip(value.chunks(self.chunk_len())) {
            self.set_hashed(*hash, piece_key, chunk);
        }

        let header = BigHeader {
            value_hash,
            value_len: value.len() as u64,
            chunks,
        };
        self.set_hashed(key_hash, key, &header.encode())
    }

    /// Whether the header and every chunk can be live at the same time.
    ///
    /// Every piece is counted as a whole arena, since a full chunk fills one
    /// exactly and any write moves the cursor at most one arena forward. A
    /// bucket stays intact while it receives no more pieces than it has
    /// arenas.
    fn pieces_fit(&self, header_hash: u64, chunk_hashes: impl Iterator<Item = u64>) -> bool {
        let arenas = self.layout().arenas_per_bucket;
        let mut load = vec![0usize; self.bucket_count()];
        load[self.bucket_of(header_hash)] += 1;
        for hash in chunk_hashes {
            let slot = &mut load[self.bucket_of(hash)];
            *slot += 1;
            if *slot > arenas {
                return false;
            }
        }
        load[self.bucket_of(header_hash)] <= arenas
    }

    /// Append the big value stored under `key` to `dst`.
    ///
    /// Returns `false` and leaves `dst` as it was if the header or any chunk is
    /// missing, or if the reassembled bytes fail the length or checksum test.
    pub fn get_big<K: CacheKey>(&self, dst: &mut Vec<u8>, key: K) -> bool {
        let key = key.key_bytes();
        let key = key.as_ref();
        let Some(header) = self.with_value(key, BigHeader::decode).flatten() else {
            return false;
        };

        let chunk_len = self.chunk_len() as u64;
        if header.chunks != header.value_len.div_ceil(chunk_len)
            || header.value_len > self.layout().total_bytes() as u64
        {
            trace!(
                value_len = header.value_len,
                chunks = header.chunks,
                "big.get.bad_header"
            );
            return false;
        }

        let start = dst.len();
        dst.reserve(header.value_len as usize);
        let key_hash = hash_key(key);
        for index in 0..header.chunks {
            if !self.get(dst, &chunk_key(key_hash, header.value_hash, index)) {
                trace!(index, chunks = header.chunks, "big.get.missing_chunk");
                dst.truncate(start);
                return false;
            }
        }

        let value = &dst[start..];
        if value.len() as u64 != header.value_len || checksum(value) != header.value_hash {
            trace!(
                expected_len = header.value_len,
                actual_len = value.len(),
                "big.get.corrupt"
            );
            dst.truncate(start);
            return false;
        }
        true
    }
}
