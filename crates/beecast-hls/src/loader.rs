#![forbid(unsafe_code)]

//! Pluggable-loader bridge to the playback engine.
//!
//! The engine pulls playlists through a loader it knows nothing about;
//! playlist-class requests are answered from the synchronization core and
//! every other request type flows through the engine's default loader
//! untouched.

use std::sync::Arc;

use async_trait::async_trait;
use beecast_net::Net;

use crate::sync::ManifestSync;

/// Request classes issued by the playback engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestType {
    /// Top-level (multivariant) playlist.
    Manifest,
    /// Variant (media) playlist.
    Level,
    AudioTrack,
    SubtitleTrack,
    /// Media segment data.
    Fragment,
}

impl RequestType {
    /// Playlist-class requests are the ones this subsystem intercepts.
    #[must_use]
    pub fn is_playlist(self) -> bool {
        matches!(self, Self::Manifest | Self::Level)
    }
}

/// One load request from the engine.
#[derive(Clone, Debug)]
pub struct LoaderContext {
    pub url: String,
    pub request_type: RequestType,
}

/// Engine-supplied per-request tuning, passed through to the default loader.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoaderConfig {
    pub max_retries: u32,
}

/// Transfer statistics reported back with every callback.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoaderStats {
    pub loaded: u64,
}

/// Successful load result.
#[derive(Clone, Debug)]
pub struct LoaderResponse {
    pub url: String,
    pub data: String,
    pub code: u16,
}

/// Failed load result.
#[derive(Clone, Debug)]
pub struct LoaderError {
    pub code: u16,
    pub text: String,
}

/// Completion callbacks in the engine's expected shape.
pub struct LoaderCallbacks {
    pub on_success: Box<dyn FnOnce(LoaderResponse, LoaderStats, &LoaderContext) + Send>,
    pub on_error: Box<dyn FnOnce(LoaderError, &LoaderContext, LoaderStats) + Send>,
}

impl LoaderCallbacks {
    pub fn new(
        on_success: impl FnOnce(LoaderResponse, LoaderStats, &LoaderContext) + Send + 'static,
        on_error: impl FnOnce(LoaderError, &LoaderContext, LoaderStats) + Send + 'static,
    ) -> Self {
        Self {
            on_success: Box::new(on_success),
            on_error: Box::new(on_error),
        }
    }
}

/// The engine's pluggable loader contract.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, context: LoaderContext, config: LoaderConfig, callbacks: LoaderCallbacks);
}

/// Loader that serves playlist-class requests from [`ManifestSync`] and
/// delegates everything else to the engine's default loader.
pub struct FeedPlaylistLoader<N, L> {
    sync: Arc<ManifestSync<N>>,
    default_loader: L,
}

impl<N, L> FeedPlaylistLoader<N, L> {
    pub fn new(sync: Arc<ManifestSync<N>>, default_loader: L) -> Self {
        Self {
            sync,
            default_loader,
        }
    }
}

#[async_trait]
impl<N, L> Loader for FeedPlaylistLoader<N, L>
where
    N: Net + Clone + 'static,
    L: Loader,
{
    async fn load(&self, context: LoaderContext, config: LoaderConfig, callbacks: LoaderCallbacks) {
        if !context.request_type.is_playlist() {
            return self.default_loader.load(context, config, callbacks).await;
        }

        match self.sync.fetch(&context.url).await {
            Ok(body) => {
                let response = LoaderResponse {
                    url: context.url.clone(),
                    data: body,
                    code: 200,
                };
                let stats = LoaderStats {
                    loaded: response.data.len() as u64,
                };
                (callbacks.on_success)(response, stats, &context);
            }
            Err(error) => {
                let loader_error = LoaderError {
                    code: 0,
                    text: error.to_string(),
                };
                (callbacks.on_error)(loader_error, &context, LoaderStats::default());
            }
        }
    }
}
