//! Services the extractor borrows from its host framework
//!
//! The extractor never talks to the network directly. Everything goes
//! through a [`Host`], which lets a surrounding framework plug in its own
//! transport, caching and manifest handling. [`crate::client::HiAnimeClient`]
//! is the stock implementation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::Format;

/// Network and manifest services used by the extractor
#[async_trait]
pub trait Host: Send + Sync {
    /// Download a page as text. `note` describes the request for logging.
    async fn fetch_text(&self, url: &str, note: &str) -> Result<String>;

    /// Download and decode a JSON document.
    async fn fetch_json(&self, url: &str, note: &str) -> Result<Value>;

    /// Download an HLS manifest and expand it into one format per rendition.
    ///
    /// `video_id` identifies the video the manifest belongs to.
    async fn fetch_manifest_formats(&self, manifest_url: &str, video_id: &str) -> Result<Vec<Format>>;
}

#[async_trait]
impl<T: Host + ?Sized> Host for Arc<T> {
    async fn fetch_text(&self, url: &str, note: &str) -> Result<String> {
        (**self).fetch_text(url, note).await
    }

    async fn fetch_json(&self, url: &str, note: &str) -> Result<Value> {
        (**self).fetch_json(url, note).await
    }

    async fn fetch_manifest_formats(&self, manifest_url: &str, video_id: &str) -> Result<Vec<Format>> {
        (**self).fetch_manifest_formats(manifest_url, video_id).await
    }
}
