#![forbid(unsafe_code)]

//! Single merge worker: serializes every merge-and-advance mutation.
//!
//! Snapshot merging reads the stored text and tracked index and writes both
//! back as one logical step. Two overlapping polls interleaving those reads
//! and writes could duplicate or lose segments, or advance the index twice
//! for one accepted snapshot, so all merge jobs across all topics drain
//! through one worker task in channel order.

use std::sync::Arc;

use beecast_feed::Topic;
use tracing::trace;

use crate::{
    events::EventEmitter,
    manifest::{self, MergeOutcome},
    store::ManifestStore,
};

/// One fetched snapshot awaiting merge.
#[derive(Clone, Debug)]
pub(crate) struct MergeJob {
    pub topic: Topic,
    pub body: String,
}

/// Merge a snapshot into the store and emit the matching event.
///
/// Shared by the worker (follow-up path) and the awaited initial path; the
/// caller decides what happens to the tracked index afterwards.
pub(crate) fn apply_snapshot(
    store: &ManifestStore,
    events: &EventEmitter,
    topic: &Topic,
    body: &str,
) -> MergeOutcome {
    let current = store.manifest(topic);
    let outcome = manifest::merge(&current, body);

    if outcome.changed {
        store.set_manifest(topic, outcome.text.clone());
        if outcome.accept {
            let before = manifest::segment_entries(&current).len();
            let after = manifest::segment_entries(&outcome.text).len();
            events.emit_snapshot_applied(topic, after.saturating_sub(before));
        } else {
            events.emit_stream_finalized(topic);
        }
    }

    outcome
}

/// Spawn the merge worker. It exits once every job sender is gone or the
/// channel is closed.
pub(crate) fn spawn_merge_worker(
    store: Arc<ManifestStore>,
    events: EventEmitter,
    jobs: kanal::AsyncReceiver<MergeJob>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        trace!("beecast-hls: merge worker started");

        while let Ok(job) = jobs.recv().await {
            let outcome = apply_snapshot(&store, &events, &job.topic, &job.body);
            if outcome.accept {
                store.advance_index(&job.topic);
            }
            trace!(
                topic = %job.topic,
                changed = outcome.changed,
                accept = outcome.accept,
                "beecast-hls: merge job applied"
            );
        }

        trace!("beecast-hls: merge worker stopped");
    })
}
