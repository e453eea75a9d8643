//! HiAnime Extractor Tauri Integration
//!
//! This crate provides Tauri commands for integrating the HiAnime extractor
//! into Tauri 2.0 applications.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hianime_tauri::ExtractorState;
//! use tauri::Manager;
//!
//! fn main() {
//!     tauri::Builder::default()
//!         .setup(|app| {
//!             app.manage(ExtractorState::new()?);
//!             Ok(())
//!         })
//!         .invoke_handler(tauri::generate_handler![
//!             hianime_tauri::commands::classify_url,
//!             hianime_tauri::commands::extract_url,
//!             hianime_tauri::commands::extract_series_episodes,
//!         ])
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
//!
//! # Commands
//! - `classify_url` - Split a page URL into series and episode ids
//! - `extract_url` - Resolve a series or episode URL
//! - `extract_series_episodes` - Resolve every episode of a series

pub mod commands;

use std::sync::Arc;

use hianime_core::{HiAnimeClient, HiAnimeExtractor};

/// Shared HTTP host for extraction commands.
///
/// The client (and its rate limiter) is shared by every command; each
/// command gets its own extractor so resolver caches live for one run only.
pub struct ExtractorState {
    client: Arc<HiAnimeClient>,
}

impl ExtractorState {
    /// Create a new ExtractorState with default configuration.
    ///
    /// # Errors
    /// Returns an error string if the HTTP client cannot be created.
    pub fn new() -> Result<Self, String> {
        let client = HiAnimeClient::new().map_err(|e| e.to_string())?;
        Ok(Self::with_client(client))
    }

    /// Create a state around a pre-configured client.
    pub fn with_client(client: HiAnimeClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Fresh extractor for one extraction run.
    pub fn extractor(&self) -> HiAnimeExtractor<Arc<HiAnimeClient>> {
        HiAnimeExtractor::new(Arc::clone(&self.client))
    }
}
