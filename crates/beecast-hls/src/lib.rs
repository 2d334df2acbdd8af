#![forbid(unsafe_code)]

//! Reconstructs a continuously growing live HLS playlist from immutable,
//! versioned snapshots published on a feed-indexed content-addressed store.

pub mod error;
pub mod events;
pub mod loader;
pub mod manifest;
pub mod options;
pub mod store;
pub mod sync;
mod worker;

pub use crate::{
    error::{SyncError, SyncResult},
    events::{EventEmitter, SyncEvent},
    loader::{
        FeedPlaylistLoader, Loader, LoaderCallbacks, LoaderConfig, LoaderContext, LoaderError,
        LoaderResponse, LoaderStats, RequestType,
    },
    manifest::{merge, MergeOutcome, SegmentEntry},
    options::SyncOptions,
    store::ManifestStore,
    sync::{ManifestSync, FEED_INDEX_HEADER, RETRIEVAL_TIMEOUT_HEADER},
};
