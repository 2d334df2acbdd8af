use std::fmt;

use crate::{FeedError, FeedResult};

/// Length of a serialized feed index in bytes.
pub const INDEX_LEN: usize = 8;

/// Monotonically increasing version number of a publication under a topic.
///
/// The wire form is 8 bytes big-endian, hex-encoded where it travels in URLs
/// or response headers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeedIndex(u64);

impl FeedIndex {
    pub const ZERO: FeedIndex = FeedIndex(0);

    #[must_use]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The successor index. Saturates at `u64::MAX` rather than wrapping back
    /// to an already-published index.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn to_be_bytes(self) -> [u8; INDEX_LEN] {
        self.0.to_be_bytes()
    }

    /// Parse the hex wire form (optional `0x` prefix, up to 16 digits).
    pub fn from_hex(s: &str) -> FeedResult<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.is_empty() || s.len() > 2 * INDEX_LEN {
            return Err(FeedError::InvalidHex(s.to_string()));
        }
        let value =
            u64::from_str_radix(s, 16).map_err(|_| FeedError::InvalidHex(s.to_string()))?;
        Ok(Self(value))
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        hex::encode(self.to_be_bytes())
    }
}

impl fmt::Display for FeedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_hex_round_trip() {
        let index = FeedIndex::new(5);
        assert_eq!(index.to_hex(), "0000000000000005");
        assert_eq!(FeedIndex::from_hex(&index.to_hex()).unwrap(), index);
    }

    #[test]
    fn index_accepts_short_hex() {
        assert_eq!(FeedIndex::from_hex("5").unwrap(), FeedIndex::new(5));
        assert_eq!(FeedIndex::from_hex("0x1f").unwrap(), FeedIndex::new(31));
    }

    #[test]
    fn index_rejects_garbage() {
        assert!(FeedIndex::from_hex("").is_err());
        assert!(FeedIndex::from_hex("not-hex").is_err());
        assert!(FeedIndex::from_hex(&"f".repeat(17)).is_err());
    }

    #[test]
    fn next_advances_by_one() {
        assert_eq!(FeedIndex::ZERO.next(), FeedIndex::new(1));
        assert_eq!(FeedIndex::new(41).next().value(), 42);
    }

    #[test]
    fn next_saturates_at_max() {
        let max = FeedIndex::new(u64::MAX);
        assert_eq!(max.next(), max);
    }

    #[test]
    fn wire_form_is_big_endian() {
        let index = FeedIndex::new(0x0102_0304_0506_0708);
        assert_eq!(
            index.to_be_bytes(),
            [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
        );
    }
}
