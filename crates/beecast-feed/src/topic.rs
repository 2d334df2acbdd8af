use std::{fmt, str::FromStr};

use sha3::{Digest, Keccak256};

use crate::{FeedError, FeedResult};

/// Length of a topic in bytes.
pub const TOPIC_LEN: usize = 32;

/// Identifier of a logical stream within the feed system.
///
/// Topics are opaque 32-byte values. They arrive either as a 64-character hex
/// string or as an arbitrary human-readable name, which is reduced to 32 bytes
/// with Keccak-256 (the feed system's topic-from-name rule).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Topic([u8; TOPIC_LEN]);

impl Topic {
    #[must_use]
    pub fn new(bytes: [u8; TOPIC_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a topic from its 64-character hex form (optional `0x` prefix).
    pub fn from_hex(s: &str) -> FeedResult<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(s).map_err(|_| FeedError::InvalidHex(s.to_string()))?;
        let bytes: [u8; TOPIC_LEN] =
            raw.try_into().map_err(|raw: Vec<u8>| FeedError::InvalidLength {
                expected: TOPIC_LEN,
                actual: raw.len(),
            })?;
        Ok(Self(bytes))
    }

    /// Derive a topic from a human-readable name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let hash = Keccak256::digest(name.as_bytes());
        Self(hash.into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; TOPIC_LEN] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Topic {
    type Err = FeedError;

    /// A well-formed hex id is taken verbatim; anything else is treated as a
    /// name and hashed.
    fn from_str(s: &str) -> FeedResult<Self> {
        match Self::from_hex(s) {
            Ok(topic) => Ok(topic),
            Err(_) => Ok(Self::from_name(s)),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Topic({})", self.to_hex())
    }
}
