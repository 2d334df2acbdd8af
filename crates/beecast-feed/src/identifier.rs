use std::fmt;

use sha3::{Digest, Keccak256};

use crate::{FeedIndex, Topic};

/// Content address of a single feed update: `keccak256(topic ‖ index)`.
///
/// Together with the owner address this locates the single-owner chunk that
/// carries the update's payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identifier([u8; 32]);

impl Identifier {
    /// Derive the identifier for one `(topic, index)` update.
    #[must_use]
    pub fn for_update(topic: &Topic, index: FeedIndex) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(topic.as_bytes());
        hasher.update(index.to_be_bytes());
        Self(hasher.finalize().into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.to_hex())
    }
}
