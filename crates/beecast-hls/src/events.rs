use beecast_feed::Topic;
use tokio::sync::broadcast;

/// Observable milestones of manifest synchronization.
#[derive(Clone, Debug)]
pub enum SyncEvent {
    /// A snapshot was merged and extended the accumulated playlist.
    SnapshotApplied {
        topic: String,
        segments_added: usize,
    },
    /// The stream was finalized; no further polls will be issued.
    StreamFinalized { topic: String },
    /// A follow-up poll failed; the cached playlist kept serving.
    FollowUpFailed { topic: String, error: String },
}

#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<SyncEvent>,
}

impl EventEmitter {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    pub(crate) fn emit_snapshot_applied(&self, topic: &Topic, segments_added: usize) {
        let _ = self.tx.send(SyncEvent::SnapshotApplied {
            topic: topic.to_hex(),
            segments_added,
        });
    }

    pub(crate) fn emit_stream_finalized(&self, topic: &Topic) {
        let _ = self.tx.send(SyncEvent::StreamFinalized {
            topic: topic.to_hex(),
        });
    }

    pub(crate) fn emit_follow_up_failed(&self, topic: &Topic, error: &str) {
        let _ = self.tx.send(SyncEvent::FollowUpFailed {
            topic: topic.to_hex(),
            error: error.to_string(),
        });
    }
}
