//! HiAnime Extractor Core Library
//!
//! This crate resolves hianime.to page URLs into playable media metadata.
//!
//! # Features
//! - Classify series and watch page URLs
//! - Resolve a series into an episode playlist
//! - Resolve an episode into HLS formats and subtitle tracks for the
//!   subtitled and dubbed variants
//! - Regex-based HTML fragment scanner for the site's AJAX fragments
//! - Rate-limited HTTP client implementing the [`Host`] services

pub mod client;
pub mod error;
pub mod extractor;
pub mod host;
pub mod manifest;
pub mod parser;
pub mod types;
pub mod url;

// Re-export main types for convenience
pub use client::{ClientConfig, HiAnimeClient, RateLimiter};
pub use error::{HiAnimeError, Result};
pub use extractor::{merge_captions, Extractor, ExtractorConfig, HiAnimeExtractor, ResolverState};
pub use host::Host;
pub use types::{
    AbortReason, CaptionTrack, EpisodeInfo, EpisodeRef, ExtractionResult, Format, PartialReason,
    PlaylistEntry, PlaylistResult, SeriesRef, StreamVariant, SubtitleTrack, VariantKind,
    VariantOutcome,
};
pub use url::{classify_url, PageUrl};
