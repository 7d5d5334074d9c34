//! Conversion of caller keys into the raw bytes that get hashed and stored.
//!
//! Byte and string keys are used as-is. Integer keys are encoded to a fixed
//! 8-byte big-endian form, so `42u64` and the byte string
//! `[0, 0, 0, 0, 0, 0, 0, 42]` address the same entry.

/// Anything that can be turned into key bytes without allocating.
pub trait CacheKey {
    type Bytes: AsRef<[u8]>;

    fn key_bytes(&self) -> Self::Bytes;
}

impl CacheKey for u64 {
    type Bytes = [u8; 8];

    #[inline(always)]
    fn key_bytes(&self) -> [u8; 8] {
        self.to_be_bytes()
    }
}

impl<'a> CacheKey for &'a [u8] {
    type Bytes = &'a [u8];

    #[inline(always)]
    fn key_bytes(&self) -> &'a [u8] {
        *self
    }
}

impl<'a, const N: usize> CacheKey for &'a [u8; N] {
    type Bytes = &'a [u8];

    #[inline(always)]
    fn key_bytes(&self) -> &'a [u8] {
        self.as_slice()
    }
}

impl<'a> CacheKey for &'a Vec<u8> {
    type Bytes = &'a [u8];

    #[inline(always)]
    fn key_bytes(&self) -> &'a [u8] {
        self.as_slice()
    }
}

impl<'a> CacheKey for &'a str {
    type Bytes = &'a [u8];

    #[inline(always)]
    fn key_bytes(&self) -> &'a [u8] {
        self.as_bytes()
    }
}

impl<'a> CacheKey for &'a String {
    type Bytes = &'a [u8];

    #[inline(always)]
    fn key_bytes(&self) -> &'a [u8] {
        self.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_of<K: CacheKey>(key: K) -> Vec<u8> {
        key.key_bytes().as_ref().to_vec()
    }

    #[test]
    fn integers_are_fixed_width_big_endian() {
        assert_eq!(bytes_of(2u64), vec![0, 0, 0, 0, 0, 0, 0, 2]);
        assert_eq!(bytes_of(u64::MAX), vec![0xff; 8]);
        assert_eq!(bytes_of(0x0102u64), bytes_of(&[0u8, 0, 0, 0, 0, 0, 1, 2]));
    }

    #[test]
    fn borrowed_forms_agree() {
        let owned = String::from("user:42");
        let vec = owned.clone().into_bytes();
        assert_eq!(bytes_of("user:42"), b"user:42");
        assert_eq!(bytes_of(&owned), b"user:42");
        assert_eq!(bytes_of(&vec), b"user:42");
        assert_eq!(bytes_of(&vec[..]), b"user:42");
        assert_eq!(bytes_of(b"user:42"), b"user:42");
    }
}
