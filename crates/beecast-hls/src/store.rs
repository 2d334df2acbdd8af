#![forbid(unsafe_code)]

//! Per-topic cache of the accumulated playlist and the tracked feed index.

use std::collections::HashMap;

use beecast_feed::{FeedIndex, Topic};
use parking_lot::Mutex;

/// Mutable state of one topic. Created lazily on first access, destroyed by
/// an explicit clear. In-memory only; nothing survives the process.
#[derive(Clone, Debug, Default)]
struct TopicState {
    index: Option<FeedIndex>,
    manifest: String,
}

/// Per-topic store of accumulated playlists and tracked feed indices.
///
/// The store itself only guards map access; the merge-and-advance sequence is
/// kept atomic by the single merge worker (and the awaited initial fetch),
/// which are the only writers.
#[derive(Debug, Default)]
pub struct ManifestStore {
    topics: Mutex<HashMap<String, TopicState>>,
}

impl ManifestStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The accumulated playlist for a topic; empty string when absent.
    #[must_use]
    pub fn manifest(&self, topic: &Topic) -> String {
        self.topics
            .lock()
            .get(&topic.to_hex())
            .map(|state| state.manifest.clone())
            .unwrap_or_default()
    }

    pub fn set_manifest(&self, topic: &Topic, text: String) {
        let mut topics = self.topics.lock();
        topics.entry(topic.to_hex()).or_default().manifest = text;
    }

    /// The tracked feed index for a topic, if one has been resolved.
    #[must_use]
    pub fn index(&self, topic: &Topic) -> Option<FeedIndex> {
        self.topics
            .lock()
            .get(&topic.to_hex())
            .and_then(|state| state.index)
    }

    pub fn set_index(&self, topic: &Topic, index: Option<FeedIndex>) {
        let mut topics = self.topics.lock();
        topics.entry(topic.to_hex()).or_default().index = index;
    }

    /// Advance the tracked index to its successor, if one is tracked.
    pub fn advance_index(&self, topic: &Topic) {
        let mut topics = self.topics.lock();
        let state = topics.entry(topic.to_hex()).or_default();
        state.index = state.index.map(FeedIndex::next);
    }

    /// Drop all state for a topic (playback for it ended).
    pub fn clear(&self, topic: &Topic) {
        self.topics.lock().remove(&topic.to_hex());
    }

    /// Drop all topics.
    pub fn clear_all(&self) {
        self.topics.lock().clear();
    }
}
