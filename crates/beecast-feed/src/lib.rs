#![forbid(unsafe_code)]

//! Primitives of the feed-indexed content-addressed store: topics, feed
//! indices and the identifier derivation that addresses a single feed update.

mod errors;
mod identifier;
mod index;
mod topic;

pub use crate::{
    errors::{FeedError, FeedResult},
    identifier::Identifier,
    index::{FeedIndex, INDEX_LEN},
    topic::{Topic, TOPIC_LEN},
};
