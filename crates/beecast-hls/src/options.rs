#![forbid(unsafe_code)]

use std::time::Duration;

use beecast_net::NetOptions;
use url::Url;

/// Configuration for manifest synchronization.
///
/// Used with `ManifestSync::new`.
#[derive(Clone, Debug)]
pub struct SyncOptions {
    /// Base URL of the store node serving `/feeds` and `/soc`.
    pub node_url: Url,
    /// Network configuration.
    pub net: NetOptions,
    /// Per-call retrieval deadline forwarded to the node, so one stalled poll
    /// cannot block the next poll interval.
    pub retrieval_timeout: Duration,
    /// Capacity of the merge-job channel.
    pub job_channel_capacity: usize,
    /// Capacity of the events broadcast channel.
    pub events_channel_capacity: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            node_url: Url::parse("http://localhost:1633/").expect("valid default URL"),
            net: NetOptions::default(),
            retrieval_timeout: Duration::from_secs(2),
            job_channel_capacity: 16,
            events_channel_capacity: 32,
        }
    }
}

impl SyncOptions {
    /// Create options pointing at a store node.
    #[must_use]
    pub fn new(node_url: Url) -> Self {
        Self {
            node_url,
            ..Self::default()
        }
    }

    /// Set network options.
    #[must_use]
    pub fn with_net(mut self, net: NetOptions) -> Self {
        self.net = net;
        self
    }

    /// Set the per-call retrieval deadline.
    #[must_use]
    pub fn with_retrieval_timeout(mut self, timeout: Duration) -> Self {
        self.retrieval_timeout = timeout;
        self
    }

    /// Set merge-job channel capacity.
    #[must_use]
    pub fn with_job_channel_capacity(mut self, capacity: usize) -> Self {
        self.job_channel_capacity = capacity;
        self
    }

    /// Set events broadcast channel capacity.
    #[must_use]
    pub fn with_events_channel_capacity(mut self, capacity: usize) -> Self {
        self.events_channel_capacity = capacity;
        self
    }
}
