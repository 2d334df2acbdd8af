#![forbid(unsafe_code)]

//! Fetch orchestration: initial resolution vs. follow-up polling.
//!
//! The first load of a topic resolves the feed's latest publication and
//! blocks on it; every later load derives the identifier of the *next*
//! publication, fires the fetch off without awaiting it, and returns the
//! playlist accumulated so far. Merges happen on the single worker task, so
//! a caller never observes a half-applied snapshot.

use std::sync::Arc;

use beecast_feed::{FeedIndex, Identifier, Topic};
use beecast_net::{Headers, Net};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};
use url::Url;

use crate::{
    error::{SyncError, SyncResult},
    events::{EventEmitter, SyncEvent},
    manifest,
    options::SyncOptions,
    store::ManifestStore,
    worker::{apply_snapshot, spawn_merge_worker, MergeJob},
};

/// Response header carrying the resolved feed index.
pub const FEED_INDEX_HEADER: &str = "swarm-feed-index";

/// Request header bounding how long the node searches for a chunk.
pub const RETRIEVAL_TIMEOUT_HEADER: &str = "swarm-chunk-retrieval-timeout";

/// Manifest synchronization orchestrator.
///
/// Owns the merge worker; all per-topic state lives in the shared
/// [`ManifestStore`] handed in at construction.
pub struct ManifestSync<N> {
    store: Arc<ManifestStore>,
    net: N,
    options: SyncOptions,
    events: EventEmitter,
    jobs: kanal::AsyncSender<MergeJob>,
    worker: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl<N: Net + Clone + 'static> ManifestSync<N> {
    pub fn new(net: N, options: SyncOptions, store: Arc<ManifestStore>) -> Self {
        let events = EventEmitter::new(options.events_channel_capacity);
        let (jobs, job_rx) = kanal::bounded_async(options.job_channel_capacity);
        let worker = spawn_merge_worker(Arc::clone(&store), events.clone(), job_rx);

        Self {
            store,
            net,
            options,
            events,
            jobs,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Subscribe to synchronization events.
    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &Arc<ManifestStore> {
        &self.store
    }

    /// Drop all state for a topic (playback for it ended).
    pub fn clear(&self, topic: &Topic) {
        self.store.clear(topic);
    }

    pub fn clear_all(&self) {
        self.store.clear_all();
    }

    /// Stop the merge worker. In-flight follow-up continuations are dropped;
    /// per-topic state stays in the store until cleared.
    pub async fn shutdown(&self) {
        self.jobs.close();
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Load the best-currently-known playlist for `stream_url`
    /// (`owner/topicHex`).
    ///
    /// The first call for a topic blocks on the network; later calls return
    /// the cached playlist immediately and poll the next publication in the
    /// background. Only the first call can fail.
    pub async fn fetch(&self, stream_url: &str) -> SyncResult<String> {
        let (owner, topic) = parse_stream_url(stream_url)?;

        match self.store.index(&topic) {
            None => self.initial_fetch(&owner, &topic).await,
            Some(index) => Ok(self.follow_up_fetch(&owner, &topic, index)),
        }
    }

    /// First resolution for a topic: fetch the latest publication, record the
    /// index it was published under, and seed the store.
    async fn initial_fetch(&self, owner: &str, topic: &Topic) -> SyncResult<String> {
        let url = self.feed_endpoint(owner, topic)?;
        debug!(owner, topic = %topic, "beecast-hls: resolving latest feed update");

        let (bytes, headers) = self
            .net
            .get_with_headers(url, Some(self.request_headers()))
            .await?;
        let body = String::from_utf8(bytes.to_vec())?;

        let index_hex = headers
            .get(FEED_INDEX_HEADER)
            .ok_or(SyncError::MissingFeedIndex)?;
        let index = FeedIndex::from_hex(index_hex)?;

        let outcome = apply_snapshot(&self.store, &self.events, topic, &body);
        if outcome.accept {
            self.store.set_index(topic, Some(index));
        }

        debug!(
            topic = %topic,
            index = %index,
            accepted = outcome.accept,
            "beecast-hls: initial snapshot stored"
        );

        Ok(body)
    }

    /// Follow-up poll: fire off a fetch of the next publication and return
    /// the playlist accumulated so far without waiting for it.
    fn follow_up_fetch(&self, owner: &str, topic: &Topic, index: FeedIndex) -> String {
        let cached = self.store.manifest(topic);

        // Terminal: a finalized playlist never grows, so stop deriving new
        // identifiers for it.
        if manifest::is_final(&cached) {
            trace!(topic = %topic, "beecast-hls: stream finalized, not polling");
            return cached;
        }

        let next = index.next();
        let identifier = Identifier::for_update(topic, next);
        let url = match self.object_endpoint(owner, &identifier) {
            Ok(url) => url,
            Err(error) => {
                warn!(topic = %topic, %error, "beecast-hls: could not derive follow-up URL");
                return cached;
            }
        };

        trace!(topic = %topic, next_index = %next, "beecast-hls: polling next feed update");

        let net = self.net.clone();
        let jobs = self.jobs.clone();
        let events = self.events.clone();
        let headers = self.request_headers();
        let topic = *topic;

        tokio::spawn(async move {
            match net.get_bytes(url, Some(headers)).await {
                Ok(bytes) => match String::from_utf8(bytes.to_vec()) {
                    Ok(body) => {
                        if jobs.send(MergeJob { topic, body }).await.is_err() {
                            trace!(topic = %topic, "beecast-hls: merge worker gone, snapshot dropped");
                        }
                    }
                    Err(error) => {
                        warn!(topic = %topic, %error, "beecast-hls: follow-up snapshot is not UTF-8");
                        events.emit_follow_up_failed(&topic, &error.to_string());
                    }
                },
                // A failed poll is not an error for the caller; the next poll
                // interval retries naturally.
                Err(error) => {
                    warn!(topic = %topic, %error, "beecast-hls: follow-up fetch failed");
                    events.emit_follow_up_failed(&topic, &error.to_string());
                }
            }
        });

        cached
    }

    fn feed_endpoint(&self, owner: &str, topic: &Topic) -> SyncResult<Url> {
        self.endpoint(&format!("feeds/{owner}/{topic}"))
    }

    fn object_endpoint(&self, owner: &str, identifier: &Identifier) -> SyncResult<Url> {
        self.endpoint(&format!("soc/{owner}/{identifier}"))
    }

    fn endpoint(&self, path: &str) -> SyncResult<Url> {
        let base = self.options.node_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|e| SyncError::InvalidUrl(format!("Failed to build endpoint URL: {e}")))
    }

    fn request_headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert(
            RETRIEVAL_TIMEOUT_HEADER,
            format!("{}ms", self.options.retrieval_timeout.as_millis()),
        );
        headers
    }
}

/// Split `owner/topicHex` into its parts. The owner's `0x` prefix is dropped
/// to match the node's path format.
fn parse_stream_url(stream_url: &str) -> SyncResult<(String, Topic)> {
    let trimmed = stream_url.trim().trim_start_matches('/');
    let Some((owner, topic_part)) = trimmed.split_once('/') else {
        return Err(SyncError::InvalidStreamUrl(stream_url.to_string()));
    };

    let owner = owner.strip_prefix("0x").unwrap_or(owner);
    if owner.is_empty() || topic_part.is_empty() {
        return Err(SyncError::InvalidStreamUrl(stream_url.to_string()));
    }

    let topic: Topic = topic_part.parse()?;
    Ok((owner.to_string(), topic))
}
