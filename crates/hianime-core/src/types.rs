//! Data types for the HiAnime extractor
//!
//! This module contains all the core data structures used throughout the library.
//! Output types implement Serialize and Deserialize for JSON compatibility with Tauri.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key under which playlist entries point back into this extractor
pub const IE_KEY: &str = "HiAnime";

/// Identifies a show, parsed from a page URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesRef {
    /// URL slug of the series (e.g., "the-eminence-in-shadow")
    pub slug: String,
    /// Numeric series identifier, kept as text
    pub id: String,
}

/// Episode descriptor collected from the episode list fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRef {
    /// Episode identifier (`data-id`)
    pub id: String,
    /// Episode title, HTML-cleaned
    pub title: Option<String>,
    /// Episode number, None when the anchor carries no `data-number`
    pub number: Option<u32>,
    /// Absolute watch URL built from the anchor `href`
    pub url: Option<String>,
}

/// Language track type served by the site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    /// Original audio with captions
    Sub,
    /// Re-voiced audio
    Dub,
}

impl VariantKind {
    /// Variants in the order they are resolved
    pub const ALL: [VariantKind; 2] = [VariantKind::Sub, VariantKind::Dub];

    /// Value of the `data-type` attribute in the server list
    pub fn tag(self) -> &'static str {
        match self {
            VariantKind::Sub => "sub",
            VariantKind::Dub => "dub",
        }
    }

    /// Audio language code attached to formats of this variant
    pub fn language(self) -> &'static str {
        match self {
            VariantKind::Sub => "ja",
            VariantKind::Dub => "en",
        }
    }

    /// Label given to generic "English" captions of this variant
    pub fn english_caption_label(self) -> &'static str {
        match self {
            VariantKind::Sub => "English Subbed",
            VariantKind::Dub => "English Dubbed",
        }
    }

    /// Composite format identifier, e.g. `SUB1080p`
    pub fn format_id(self, height: Option<u32>) -> String {
        let tag = self.tag().to_uppercase();
        match height {
            Some(height) => format!("{}{}p", tag, height),
            None => tag,
        }
    }
}

impl std::fmt::Display for VariantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A concrete stream rendition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Format {
    /// Media playlist URL of this rendition
    pub url: String,
    /// Master manifest the rendition was found in
    pub manifest_url: Option<String>,
    /// Container extension
    pub ext: String,
    /// Download protocol hint
    pub protocol: String,
    /// Frame width in pixels
    pub width: Option<u32>,
    /// Frame height in pixels (resolution rung)
    pub height: Option<u32>,
    /// Total bitrate in kbit/s
    pub tbr: Option<f64>,
    /// Format identifier
    pub format_id: String,
    /// Audio language code
    pub language: Option<String>,
}

impl Format {
    /// Create an HLS format with only the URLs filled in
    pub fn hls(url: impl Into<String>, manifest_url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            manifest_url: Some(manifest_url.into()),
            ext: "mp4".to_string(),
            protocol: "m3u8_native".to_string(),
            width: None,
            height: None,
            tbr: None,
            format_id: "hls".to_string(),
            language: None,
        }
    }
}

/// Caption file found on the embed host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionTrack {
    /// Display label, disambiguated for English
    pub label: String,
    /// Caption file URL
    pub url: String,
}

/// Subtitle file in the output record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    /// Subtitle file URL
    pub url: String,
}

/// Streams and captions gathered for one variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamVariant {
    /// Which language track this is
    pub kind: VariantKind,
    /// Manifests that were expanded
    pub manifest_urls: Vec<String>,
    /// Formats expanded from the manifests
    pub formats: Vec<Format>,
    /// Caption tracks
    pub captions: Vec<CaptionTrack>,
}

impl StreamVariant {
    /// Create an empty variant
    pub fn new(kind: VariantKind) -> Self {
        Self {
            kind,
            manifest_urls: Vec::new(),
            formats: Vec::new(),
            captions: Vec::new(),
        }
    }
}

/// Why a variant produced no data at all
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// No server advertises this variant
    NoServer,
    /// The sources endpoint returned no embed link
    NoEmbedLink,
    /// The embed link does not carry a source id
    NoSourceId(String),
}

/// Why a variant stopped before consuming everything
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartialReason {
    /// A source without a manifest file halted the remaining sources
    NonManifestSource(Option<String>),
    /// A caption without a file halted the remaining tracks
    MissingCaptionFile(String),
    /// The embed host returned its sources as an opaque string
    EncryptedSources,
}

/// Result of resolving one variant
#[derive(Debug, Clone, PartialEq)]
pub enum VariantOutcome {
    /// Every source and track was processed
    Resolved(StreamVariant),
    /// Some data was gathered before processing stopped
    Partial {
        /// Data gathered so far
        variant: StreamVariant,
        /// What stopped processing
        reason: PartialReason,
    },
    /// Nothing could be gathered
    Absent {
        /// Which variant was attempted
        kind: VariantKind,
        /// What was missing
        reason: AbortReason,
    },
}

impl VariantOutcome {
    /// Gathered data, if any
    pub fn stream(&self) -> Option<&StreamVariant> {
        match self {
            VariantOutcome::Resolved(variant) | VariantOutcome::Partial { variant, .. } => {
                Some(variant)
            }
            VariantOutcome::Absent { .. } => None,
        }
    }

    /// Consume the outcome, keeping the gathered data
    pub fn into_stream(self) -> Option<StreamVariant> {
        match self {
            VariantOutcome::Resolved(variant) | VariantOutcome::Partial { variant, .. } => {
                Some(variant)
            }
            VariantOutcome::Absent { .. } => None,
        }
    }

    /// A missing server means later variants are not attempted
    pub fn stops_remaining_variants(&self) -> bool {
        matches!(
            self,
            VariantOutcome::Absent {
                reason: AbortReason::NoServer,
                ..
            }
        )
    }
}

/// Fully resolved episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeInfo {
    /// Episode identifier
    pub id: String,
    /// Episode title
    pub title: Option<String>,
    /// Formats from every variant, subtitled first
    pub formats: Vec<Format>,
    /// Subtitle files by label, in sorted key order
    pub subtitles: BTreeMap<String, Vec<SubtitleTrack>>,
    /// Series display title
    pub series: Option<String>,
    /// Series identifier
    pub series_id: String,
    /// Episode title (same as `title`)
    pub episode: Option<String>,
    /// Episode number within the series
    pub episode_number: Option<u32>,
    /// Episode identifier (same as `id`)
    pub episode_id: String,
}

/// Link to an episode page that this extractor can resolve later
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    /// Episode page URL
    pub url: String,
    /// Episode identifier
    pub id: String,
    /// Episode title
    pub title: Option<String>,
    /// Extractor that handles `url`
    pub ie_key: String,
}

impl PlaylistEntry {
    /// Create an entry that points back into this extractor
    pub fn to_self(url: impl Into<String>, id: impl Into<String>, title: Option<String>) -> Self {
        Self {
            url: url.into(),
            id: id.into(),
            title,
            ie_key: IE_KEY.to_string(),
        }
    }
}

/// Series playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistResult {
    /// Series identifier
    pub id: String,
    /// Series display title
    pub title: Option<String>,
    /// Episodes in page order
    pub entries: Vec<PlaylistEntry>,
}

/// What a URL resolved to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum ExtractionResult {
    /// Series page
    #[serde(rename = "playlist")]
    Playlist(PlaylistResult),
    /// Episode page
    #[serde(rename = "video")]
    Episode(EpisodeInfo),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_kind_tags() {
        assert_eq!(VariantKind::Sub.tag(), "sub");
        assert_eq!(VariantKind::Dub.tag(), "dub");
        assert_eq!(VariantKind::Sub.language(), "ja");
        assert_eq!(VariantKind::Dub.language(), "en");
    }

    #[test]
    fn test_variant_kind_format_id() {
        assert_eq!(VariantKind::Sub.format_id(Some(1080)), "SUB1080p");
        assert_eq!(VariantKind::Dub.format_id(Some(360)), "DUB360p");
        assert_eq!(VariantKind::Dub.format_id(None), "DUB");
    }

    #[test]
    fn test_english_caption_labels() {
        assert_eq!(VariantKind::Sub.english_caption_label(), "English Subbed");
        assert_eq!(VariantKind::Dub.english_caption_label(), "English Dubbed");
    }

    #[test]
    fn test_variant_kind_serialization() {
        let json = serde_json::to_string(&VariantKind::Dub).unwrap();
        assert_eq!(json, "\"dub\"");
    }

    #[test]
    fn test_outcome_stops_remaining_only_without_server() {
        let no_server = VariantOutcome::Absent {
            kind: VariantKind::Sub,
            reason: AbortReason::NoServer,
        };
        let no_link = VariantOutcome::Absent {
            kind: VariantKind::Sub,
            reason: AbortReason::NoEmbedLink,
        };
        assert!(no_server.stops_remaining_variants());
        assert!(!no_link.stops_remaining_variants());
        assert!(no_link.stream().is_none());
    }

    #[test]
    fn test_partial_outcome_keeps_stream() {
        let mut variant = StreamVariant::new(VariantKind::Sub);
        variant.captions.push(CaptionTrack {
            label: "French".to_string(),
            url: "https://cdn.example/fr.vtt".to_string(),
        });
        let outcome = VariantOutcome::Partial {
            variant,
            reason: PartialReason::NonManifestSource(None),
        };
        assert!(!outcome.stops_remaining_variants());
        assert_eq!(outcome.into_stream().unwrap().captions.len(), 1);
    }

    #[test]
    fn test_extraction_result_type_tag() {
        let result = ExtractionResult::Playlist(PlaylistResult {
            id: "19107".to_string(),
            title: Some("Show".to_string()),
            entries: vec![PlaylistEntry::to_self(
                "https://hianime.to/watch/show-19107?ep=1",
                "1",
                None,
            )],
        });

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["_type"], "playlist");
        assert_eq!(json["entries"][0]["ie_key"], IE_KEY);

        let back: ExtractionResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_hls_format_defaults() {
        let format = Format::hls("https://cdn/a.m3u8", "https://cdn/master.m3u8");
        assert_eq!(format.ext, "mp4");
        assert_eq!(format.protocol, "m3u8_native");
        assert!(format.height.is_none());
    }
}
