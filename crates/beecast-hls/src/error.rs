#![forbid(unsafe_code)]

use thiserror::Error;

/// Manifest synchronization errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Net(#[from] beecast_net::NetError),

    #[error("Feed error: {0}")]
    Feed(#[from] beecast_feed::FeedError),

    #[error("Resolution response carried no feed index header")]
    MissingFeedIndex,

    #[error("Invalid stream URL: {0}")]
    InvalidStreamUrl(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Snapshot is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

pub type SyncResult<T> = Result<T, SyncError>;
