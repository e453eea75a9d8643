//! Main HiAnime extractor API
//!
//! This module ties the URL classifier, the parsers and a [`Host`] together.
//! A series URL resolves into a playlist of episode links that point back into
//! the extractor. An episode URL walks the chain: server list, sources
//! endpoint, embed host, manifest.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::{HiAnimeError, Result};
use crate::host::Host;
use crate::parser::{extract_source_id, find_server_id, parse_series_title, EpisodeListParser};
use crate::types::{
    AbortReason, CaptionTrack, EpisodeInfo, EpisodeRef, ExtractionResult, Format, PartialReason,
    PlaylistEntry, PlaylistResult, SeriesRef, StreamVariant, SubtitleTrack, VariantKind,
    VariantOutcome, IE_KEY,
};
use crate::url::{
    classify_url, embed_sources_url, episode_list_url, same_host, series_page_url, servers_url,
    sources_url, watch_url, DEFAULT_BASE_URL, DEFAULT_EMBED_BASE_URL,
};

/// Suffix identifying HLS manifests among embed sources
const MANIFEST_SUFFIX: &str = ".m3u8";

/// Plug-in surface a host framework drives
#[async_trait]
pub trait Extractor: Send {
    /// Stable extractor name, used by playlist entries to route back here
    fn ie_key(&self) -> &'static str;

    /// Whether this extractor handles `url`
    fn suitable(&self, url: &str) -> bool;

    /// Resolve a URL into a playlist or a single episode
    async fn extract(&mut self, url: &str) -> Result<ExtractionResult>;
}

/// Site addresses used to build every request
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Site base, e.g. `https://hianime.to`
    pub base_url: String,
    /// Embed host base, e.g. `https://megacloud.tv`
    pub embed_base_url: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            embed_base_url: DEFAULT_EMBED_BASE_URL.to_string(),
        }
    }
}

/// Data remembered between resolutions of one extraction run
#[derive(Debug, Clone, Default)]
pub struct ResolverState {
    /// Series title per series id; None when the page had no title element
    series_titles: HashMap<String, Option<String>>,
    /// Episodes from every fetched episode list, by episode id
    episodes: HashMap<String, EpisodeRef>,
}

impl ResolverState {
    /// Empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached episode descriptor
    pub fn episode(&self, episode_id: &str) -> Option<&EpisodeRef> {
        self.episodes.get(episode_id)
    }

    /// Number of cached episodes
    pub fn episode_count(&self) -> usize {
        self.episodes.len()
    }

    /// Cached series title; the outer None means it was never fetched
    pub fn series_title(&self, series_id: &str) -> Option<Option<&str>> {
        self.series_titles.get(series_id).map(|t| t.as_deref())
    }
}

// Wire shapes of the site and embed host endpoints

#[derive(Debug, Deserialize)]
struct HtmlPayload {
    html: String,
}

#[derive(Debug, Deserialize)]
struct SourcesPayload {
    #[serde(default)]
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbedPayload {
    #[serde(default)]
    sources: Option<EmbedSources>,
    #[serde(default)]
    tracks: Option<Vec<EmbedTrack>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbedSources {
    List(Vec<EmbedSource>),
    Opaque(String),
}

#[derive(Debug, Deserialize)]
struct EmbedSource {
    #[serde(default)]
    file: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbedTrack {
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    kind: Option<String>,
}

fn decode<T: DeserializeOwned>(value: Value, endpoint: &'static str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| HiAnimeError::UnexpectedResponse {
        endpoint,
        reason: e.to_string(),
    })
}

/// Add captions to a subtitle map, keeping every URL under its label.
///
/// The map is ordered by label, so output keys are always sorted.
pub fn merge_captions(
    subtitles: &mut BTreeMap<String, Vec<SubtitleTrack>>,
    captions: impl IntoIterator<Item = CaptionTrack>,
) {
    for caption in captions {
        subtitles
            .entry(caption.label)
            .or_default()
            .push(SubtitleTrack { url: caption.url });
    }
}

/// Extractor for hianime.to series and episode pages
///
/// Holds the host services and the resolver state of one extraction run.
/// Create one per run; its caches are never evicted.
///
/// # Example
/// ```no_run
/// use hianime_core::{Extractor, ExtractionResult, HiAnimeClient, HiAnimeExtractor};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut extractor = HiAnimeExtractor::new(HiAnimeClient::new()?);
///
///     let result = extractor
///         .extract("https://hianime.to/watch/the-eminence-in-shadow-17473?ep=94440")
///         .await?;
///     if let ExtractionResult::Episode(episode) = result {
///         println!("{} formats", episode.formats.len());
///     }
///
///     Ok(())
/// }
/// ```
pub struct HiAnimeExtractor<H> {
    host: H,
    config: ExtractorConfig,
    state: ResolverState,
}

impl<H: Host> HiAnimeExtractor<H> {
    /// Create an extractor for the public site.
    pub fn new(host: H) -> Self {
        Self::with_config(host, ExtractorConfig::default())
    }

    /// Create an extractor with custom site addresses.
    pub fn with_config(host: H, config: ExtractorConfig) -> Self {
        Self {
            host,
            config,
            state: ResolverState::new(),
        }
    }

    /// Resolver state accumulated so far
    pub fn state(&self) -> &ResolverState {
        &self.state
    }

    /// Site addresses in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Series display title, fetched at most once per series id.
    pub async fn series_title(&mut self, series: &SeriesRef) -> Result<Option<String>> {
        if let Some(title) = self.state.series_titles.get(&series.id) {
            return Ok(title.clone());
        }

        let html = self
            .host
            .fetch_text(&series_page_url(&self.config.base_url, series), "Fetching anime title")
            .await?;
        let title = parse_series_title(&html)?;
        if title.is_none() {
            warn!(series_id = %series.id, "series page has no title element");
        }

        self.state.series_titles.insert(series.id.clone(), title.clone());
        Ok(title)
    }

    /// Resolve a series into its episode playlist.
    ///
    /// Every episode found is stored in the resolver state, so later episode
    /// lookups within this run don't fetch the list again.
    ///
    /// # Errors
    /// * `HiAnimeError::ParseError` if an episode number is not numeric
    /// * `HiAnimeError::UnexpectedResponse` if the episode list has no `html`
    #[instrument(skip(self), fields(series_id = %series.id))]
    pub async fn extract_playlist(&mut self, series: &SeriesRef) -> Result<PlaylistResult> {
        let title = self.series_title(series).await?;

        let payload: HtmlPayload = decode(
            self.host
                .fetch_json(&episode_list_url(&self.config.base_url, &series.id), "Fetching episode list")
                .await?,
            "episode list",
        )?;
        let parser = EpisodeListParser::new(&self.config.base_url)?;
        let mut entries = Vec::new();
        // Anchors are cached one by one; a malformed anchor keeps the earlier ones
        for episode in parser.episodes(&payload.html) {
            let episode = episode?;
            let url = episode
                .url
                .clone()
                .unwrap_or_else(|| watch_url(&self.config.base_url, series, &episode.id));
            entries.push(PlaylistEntry::to_self(url, episode.id.clone(), episode.title.clone()));
            self.state.episodes.insert(episode.id.clone(), episode);
        }
        info!(count = entries.len(), "episode list parsed");

        Ok(PlaylistResult {
            id: series.id.clone(),
            title,
            entries,
        })
    }

    /// Resolve one episode into formats and subtitles.
    ///
    /// # Errors
    /// * `HiAnimeError::NotFound` if the episode is not in the series'
    ///   episode list, even after refreshing it
    /// * transport errors from the server list, sources and embed endpoints
    #[instrument(skip(self), fields(series_id = %series.id))]
    pub async fn extract_episode(&mut self, series: &SeriesRef, episode_id: &str) -> Result<EpisodeInfo> {
        let series_title = self.series_title(series).await?;

        if self.state.episode(episode_id).is_none() {
            debug!("episode not cached, fetching episode list");
            self.extract_playlist(series).await?;
        }
        let episode = self.state.episode(episode_id).cloned().ok_or_else(|| {
            HiAnimeError::NotFound(format!("episode {} in series {}", episode_id, series.id))
        })?;

        let servers: HtmlPayload = decode(
            self.host
                .fetch_json(&servers_url(&self.config.base_url, episode_id), "Fetching server ids")
                .await?,
            "server list",
        )?;

        let mut formats = Vec::new();
        let mut subtitles = BTreeMap::new();

        for kind in VariantKind::ALL {
            let outcome = self.resolve_variant(&servers.html, episode_id, kind).await?;
            match &outcome {
                VariantOutcome::Resolved(variant) => {
                    debug!(%kind, formats = variant.formats.len(), captions = variant.captions.len(), "variant resolved");
                }
                VariantOutcome::Partial { variant, reason } => {
                    debug!(%kind, formats = variant.formats.len(), ?reason, "variant partially resolved");
                }
                VariantOutcome::Absent { reason, .. } => {
                    debug!(%kind, ?reason, "variant skipped");
                }
            }

            if outcome.stops_remaining_variants() {
                break;
            }
            if let Some(variant) = outcome.into_stream() {
                formats.extend(variant.formats);
                merge_captions(&mut subtitles, variant.captions);
            }
        }

        Ok(EpisodeInfo {
            id: episode_id.to_string(),
            title: episode.title.clone(),
            formats,
            subtitles,
            series: series_title,
            series_id: series.id.clone(),
            episode: episode.title,
            episode_number: episode.number,
            episode_id: episode_id.to_string(),
        })
    }

    /// Resolve the streams of one language variant.
    ///
    /// Missing data never fails: it shows up as [`VariantOutcome::Absent`] or
    /// [`VariantOutcome::Partial`]. Only transport and decoding failures of
    /// the sources and embed endpoints are errors.
    pub async fn resolve_variant(
        &self,
        servers_html: &str,
        episode_id: &str,
        kind: VariantKind,
    ) -> Result<VariantOutcome> {
        let tag = kind.tag().to_uppercase();

        let Some(server_id) = find_server_id(servers_html, kind)? else {
            return Ok(VariantOutcome::Absent { kind, reason: AbortReason::NoServer });
        };

        let sources: SourcesPayload = decode(
            self.host
                .fetch_json(
                    &sources_url(&self.config.base_url, &server_id),
                    &format!("Getting {}BED episode information", tag),
                )
                .await?,
            "episode sources",
        )?;
        let Some(link) = sources.link.filter(|link| !link.is_empty()) else {
            return Ok(VariantOutcome::Absent { kind, reason: AbortReason::NoEmbedLink });
        };

        let Some(source_id) = extract_source_id(&link)? else {
            return Ok(VariantOutcome::Absent { kind, reason: AbortReason::NoSourceId(link) });
        };

        let embed: EmbedPayload = decode(
            self.host
                .fetch_json(
                    &embed_sources_url(&self.config.embed_base_url, &source_id),
                    &format!("Getting {}BED episode formats", tag),
                )
                .await?,
            "embed sources",
        )?;

        let mut variant = StreamVariant::new(kind);
        let mut halted = None;

        match embed.sources {
            Some(EmbedSources::List(sources)) => {
                for source in sources {
                    // Anything but a manifest ends the source list for this variant
                    let file = match source.file {
                        Some(file) if file.ends_with(MANIFEST_SUFFIX) => file,
                        other => {
                            halted = Some(PartialReason::NonManifestSource(other));
                            break;
                        }
                    };
                    let formats = self.manifest_formats(&file, episode_id, kind).await;
                    variant.manifest_urls.push(file);
                    variant.formats.extend(formats);
                }
            }
            Some(EmbedSources::Opaque(_)) => {
                warn!(%kind, episode_id, "embed host returned encrypted sources");
                halted = Some(PartialReason::EncryptedSources);
            }
            None => {}
        }

        for track in embed.tracks.unwrap_or_default() {
            if track.kind.as_deref() != Some("captions") {
                continue;
            }
            let label = match track.label {
                Some(label) if label == "English" => kind.english_caption_label().to_string(),
                Some(label) => label,
                None => "Unknown".to_string(),
            };
            let Some(url) = track.file else {
                halted.get_or_insert(PartialReason::MissingCaptionFile(label));
                break;
            };
            variant.captions.push(CaptionTrack { label, url });
        }

        Ok(match halted {
            Some(reason) => VariantOutcome::Partial { variant, reason },
            None => VariantOutcome::Resolved(variant),
        })
    }

    /// Expand a manifest and tag its formats with the variant.
    ///
    /// Expansion failures are logged and yield no formats.
    async fn manifest_formats(&self, manifest_url: &str, episode_id: &str, kind: VariantKind) -> Vec<Format> {
        match self.host.fetch_manifest_formats(manifest_url, episode_id).await {
            Ok(formats) => formats
                .into_iter()
                .map(|mut format| {
                    format.format_id = kind.format_id(format.height);
                    format.language = Some(kind.language().to_string());
                    format
                })
                .collect(),
            Err(e) => {
                warn!(manifest_url, error = %e, "failed to expand manifest");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl<H: Host> Extractor for HiAnimeExtractor<H> {
    fn ie_key(&self) -> &'static str {
        IE_KEY
    }

    fn suitable(&self, url: &str) -> bool {
        same_host(url, &self.config.base_url) && classify_url(url).is_ok()
    }

    async fn extract(&mut self, url: &str) -> Result<ExtractionResult> {
        let page = classify_url(url)?;
        match page.episode_id {
            Some(episode_id) => Ok(ExtractionResult::Episode(
                self.extract_episode(&page.series, &episode_id).await?,
            )),
            None => Ok(ExtractionResult::Playlist(
                self.extract_playlist(&page.series).await?,
            )),
        }
    }
}
