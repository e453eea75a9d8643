//! Episode list parser
//!
//! Parses the HTML fragment returned by the episode list endpoint.

use tracing::debug;

use crate::error::{HiAnimeError, Result};
use crate::types::EpisodeRef;
use crate::url::episode_page_url;

use super::fragment::{AttributeCapture, ElementMatches, ElementQuery, ElementScanner};
use super::html::clean_html;

/// Class carried by every episode anchor in the list fragment
pub const EPISODE_ANCHOR_CLASS: &str = "ssl-item  ep-item";

/// Episode list parser with its scanner and attribute lookups compiled once
///
/// Each attribute is captured independently, so a missing `title`,
/// `data-number` or `href` leaves that field empty instead of dropping the
/// episode. Anchors without `data-id` cannot be addressed and are skipped.
pub struct EpisodeListParser {
    base_url: String,
    scanner: ElementScanner,
    id: AttributeCapture,
    title: AttributeCapture,
    number: AttributeCapture,
    href: AttributeCapture,
}

impl EpisodeListParser {
    /// Create a parser making `href`s absolute against `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: base_url.to_string(),
            scanner: ElementScanner::new(
                &ElementQuery::new()
                    .tag("a")
                    .attribute("class")
                    .exact(EPISODE_ANCHOR_CLASS),
            )?,
            id: AttributeCapture::new("data-id")?,
            title: AttributeCapture::new("title")?,
            number: AttributeCapture::new("data-number")?,
            href: AttributeCapture::new("href")?,
        })
    }

    /// Lazily parse the anchors of `fragment`, in document order.
    ///
    /// A malformed anchor yields an error item; the anchors before it have
    /// already been yielded.
    pub fn episodes<'p, 'h>(&'p self, fragment: &'h str) -> EpisodeAnchors<'p, 'h> {
        EpisodeAnchors {
            parser: self,
            matches: self.scanner.find_iter(fragment),
        }
    }

    fn parse_anchor(&self, html: &str) -> Result<Option<EpisodeRef>> {
        let Some(id) = self.id.get(html) else {
            return Ok(None);
        };

        let title = self.title.get(html).map(clean_html).transpose()?;
        let number = self.number.get(html).map(parse_episode_number).transpose()?;
        let url = self.href.get(html).map(|href| episode_page_url(&self.base_url, href));

        Ok(Some(EpisodeRef {
            id: id.to_string(),
            title,
            number,
            url,
        }))
    }
}

/// Iterator returned by [`EpisodeListParser::episodes`]
pub struct EpisodeAnchors<'p, 'h> {
    parser: &'p EpisodeListParser,
    matches: ElementMatches<'p, 'h>,
}

impl Iterator for EpisodeAnchors<'_, '_> {
    type Item = Result<EpisodeRef>;

    fn next(&mut self) -> Option<Self::Item> {
        for element in self.matches.by_ref() {
            match self.parser.parse_anchor(element.full) {
                Ok(Some(episode)) => return Some(Ok(episode)),
                Ok(None) => {
                    debug!(offset = element.start, "skipping episode anchor without data-id");
                }
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

/// Parse every episode anchor of the episode list fragment.
///
/// # Arguments
/// * `fragment` - HTML from the `html` field of the episode list response
/// * `base_url` - Site base used to make `href` absolute
///
/// # Errors
/// * `HiAnimeError::ParseError` if a `data-number` is present but not a
///   positive integer
pub fn parse_episode_list(fragment: &str, base_url: &str) -> Result<Vec<EpisodeRef>> {
    EpisodeListParser::new(base_url)?.episodes(fragment).collect()
}

/// Parse a `data-number` attribute value. Episode numbers start at 1.
///
/// # Examples
/// ```
/// use hianime_core::parser::parse_episode_number;
///
/// assert_eq!(parse_episode_number("12").unwrap(), 12);
/// assert!(parse_episode_number("12a").is_err());
/// assert!(parse_episode_number("0").is_err());
/// ```
pub fn parse_episode_number(value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .ok()
        .filter(|&number: &u32| number >= 1)
        .ok_or_else(|| HiAnimeError::ParseError {
            field: "data-number",
            value: value.to_string(),
        })
}
