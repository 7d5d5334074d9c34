//! Length-prefixed records as they are laid out inside an arena.
//!
//! ```text
//! [key_len: u16 BE][value_len: u16 BE][key bytes][value bytes]
//! ```
//!
//! Records never straddle two arenas.

/// Bytes taken by the two length prefixes.
pub const RECORD_HEADER_LEN: usize = 4;

/// Largest key or value a single record can describe.
pub const MAX_FIELD_LEN: usize = u16::MAX as usize;

/// Total number of arena bytes a record for `key_len`/`value_len` occupies.
///
/// Returns `None` when either length cannot be encoded in the header.
#[inline]
pub fn encoded_len(key_len: usize, value_len: usize) -> Option<usize> {
    if key_len > MAX_FIELD_LEN || value_len > MAX_FIELD_LEN {
        return None;
    }
    Some(RECORD_HEADER_LEN + key_len + value_len)
}

/// Write a record at the start of `dst`.
///
/// `dst` must be exactly `encoded_len(key.len(), value.len())` bytes long.
#[inline]
pub fn encode(dst: &mut [u8], key: &[u8], value: &[u8]) {
    debug_assert_eq!(Some(dst.len()), encoded_len(key.len(), value.len()));
    let (header, body) = dst.split_at_mut(RECORD_HEADER_LEN);
    header[0..2].copy_from_slice(&(key.len() as u16).to_be_bytes());
    header[2..4].copy_from_slice(&(value.len() as u16).to_be_bytes());
    let (key_dst, value_dst) = body.split_at_mut(key.len());
    key_dst.copy_from_slice(key);
    value_dst.copy_from_slice(value);
}

/// Borrowed view of a record that lives inside an arena.
///
/// The slices point straight into the arena; nothing is copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    pub key: &'a [u8],
    pub value: &'a [u8],
}

impl<'a> Record<'a> {
    /// Decode the record starting at `offset` within `extent`.
    ///
    /// `extent` is the written part of the arena. Lengths that would run past
    /// it yield `None` instead of a record.
    #[inline]
    pub fn decode(extent: &'a [u8], offset: usize) -> Option<Self> {
        let header_end = offset.checked_add(RECORD_HEADER_LEN)?;
        let header = extent.get(offset..header_end)?;
        let key_len = u16::from_be_bytes([header[0], header[1]]) as usize;
        let value_len = u16::from_be_bytes([header[2], header[3]]) as usize;

        let key_end = header_end + key_len;
        let value_end = key_end + value_len;
        if value_end > extent.len() {
            return None;
        }
        Some(Record {
            key: &extent[header_end..key_end],
            value: &extent[key_end..value_end],
        })
    }

    #[cfg(test)]
    pub fn size(&self) -> usize {
        RECORD_HEADER_LEN + self.key.len() + self.value.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(key: &[u8], value: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8; encoded_len(key.len(), value.len()).unwrap()];
        encode(&mut buf, key, value);
        buf
    }

    #[test]
    fn header_is_big_endian_lengths() {
        let buf = encoded(b"ab", b"xyz");
        assert_eq!(&buf[..4], &[0, 2, 0, 3]);
        assert_eq!(&buf[4..], b"abxyz");
    }

    #[test]
    fn decode_at_offset() {
        let mut arena = encoded(b"k1", b"first");
        arena.extend_from_slice(&encoded(b"key2", b""));

        let first = Record::decode(&arena, 0).unwrap();
        assert_eq!(first.key, b"k1");
        assert_eq!(first.value, b"first");

        let second = Record::decode(&arena, first.size()).unwrap();
        assert_eq!(second.key, b"key2");
        assert!(second.value.is_empty());
        assert_eq!(first.size() + second.size(), arena.len());
    }

    #[test]
    fn decode_rejects_lengths_past_extent() {
        let buf = encoded(b"key", b"value");
        // Written extent ends in the middle of the value.
        assert_eq!(Record::decode(&buf[..buf.len() - 1], 0), None);
        // Header itself is cut off.
        assert_eq!(Record::decode(&buf[..3], 0), None);
        // Offset beyond the extent.
        assert_eq!(Record::decode(&buf, buf.len() + 10), None);
    }

    #[test]
    fn oversized_fields_have_no_encoding() {
        assert_eq!(encoded_len(MAX_FIELD_LEN + 1, 0), None);
        assert_eq!(encoded_len(0, MAX_FIELD_LEN + 1), None);
        assert_eq!(
            encoded_len(MAX_FIELD_LEN, MAX_FIELD_LEN),
            Some(RECORD_HEADER_LEN + 2 * MAX_FIELD_LEN)
        );
    }
}
