//! Tauri commands for the HiAnime extractor
//!
//! This module contains all Tauri commands that can be invoked from the frontend.

use tauri::State;

use crate::ExtractorState;
use hianime_core::{EpisodeInfo, ExtractionResult, Extractor, PageUrl};

/// Split a page URL into series slug, series id and episode id.
///
/// # Arguments
/// * `url` - Series or watch page URL
///
/// # Returns
/// * `Ok(PageUrl)` with the classified parts
/// * `Err(String)` if the URL is not a supported page
#[tauri::command]
pub fn classify_url(url: String) -> Result<PageUrl, String> {
    hianime_core::classify_url(&url).map_err(|e| e.to_string())
}

/// Resolve a series URL into a playlist or a watch URL into an episode.
///
/// # Arguments
/// * `url` - Series or watch page URL
///
/// # Returns
/// * `Ok(ExtractionResult)` tagged `playlist` or `video`
/// * `Err(String)` with error message if extraction fails
#[tauri::command]
pub async fn extract_url(
    state: State<'_, ExtractorState>,
    url: String,
) -> Result<ExtractionResult, String> {
    let mut extractor = state.extractor();
    extractor.extract(&url).await.map_err(|e| e.to_string())
}

/// Resolve every episode of the series a URL belongs to.
///
/// Runs in one extraction run, so the episode list is fetched once and
/// reused for each episode.
///
/// # Arguments
/// * `url` - Series or watch page URL
///
/// # Returns
/// * `Ok(Vec<EpisodeInfo>)` in playlist order
/// * `Err(String)` with the first fatal error
#[tauri::command]
pub async fn extract_series_episodes(
    state: State<'_, ExtractorState>,
    url: String,
) -> Result<Vec<EpisodeInfo>, String> {
    let page = hianime_core::classify_url(&url).map_err(|e| e.to_string())?;
    let mut extractor = state.extractor();

    let playlist = extractor
        .extract_playlist(&page.series)
        .await
        .map_err(|e| e.to_string())?;

    let mut episodes = Vec::with_capacity(playlist.entries.len());
    for entry in &playlist.entries {
        let episode = extractor
            .extract_episode(&page.series, &entry.id)
            .await
            .map_err(|e| e.to_string())?;
        episodes.push(episode);
    }
    Ok(episodes)
}
