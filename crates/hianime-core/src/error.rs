//! Error types for the HiAnime extractor
//!
//! This module defines all fatal error types used throughout the library.
//! Per-variant soft aborts are not errors; see [`crate::types::VariantOutcome`].
//! HiAnimeError implements Serialize for Tauri compatibility.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for HiAnime extraction operations
#[derive(Error, Debug)]
pub enum HiAnimeError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Response body was not valid JSON
    #[error("Failed to decode JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// URL does not match the supported page layout
    #[error("Unsupported URL: {0}")]
    UnsupportedUrl(String),

    /// A field was present but could not be parsed
    #[error("Failed to parse {field}: {value:?}")]
    ParseError {
        /// Name of the field being parsed
        field: &'static str,
        /// Raw value found in the document
        value: String,
    },

    /// Requested resource was not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// An endpoint answered with JSON of an unexpected shape
    #[error("Unexpected response from {endpoint}: {reason}")]
    UnexpectedResponse {
        /// Endpoint label
        endpoint: &'static str,
        /// Decoder message
        reason: String,
    },

    /// Fragment scanner query could not be compiled
    #[error("Invalid element pattern: {0}")]
    InvalidPattern(String),

    /// Stream manifest could not be parsed
    #[error("Invalid manifest {url}: {reason}")]
    ManifestError {
        /// Manifest URL
        url: String,
        /// Parser message
        reason: String,
    },

    /// Client configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Rate limited by the server (HTTP 429)
    #[error("Rate limited - too many requests")]
    RateLimited,
}

impl From<regex_lite::Error> for HiAnimeError {
    fn from(err: regex_lite::Error) -> Self {
        HiAnimeError::InvalidPattern(err.to_string())
    }
}

/// Serialize HiAnimeError as a string for Tauri compatibility
impl Serialize for HiAnimeError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for HiAnime extraction operations
pub type Result<T> = std::result::Result<T, HiAnimeError>;
