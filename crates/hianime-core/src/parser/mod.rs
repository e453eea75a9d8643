//! HTML parsers for hianime.to responses
//!
//! This module contains the parsers used by the resolvers:
//! - `fragment`: regex element scanner over raw HTML fragments
//! - `html`: entity-decoding text helpers and series title lookup
//! - `episodes`: episode list fragment
//! - `servers`: server list fragment and embed links

pub mod episodes;
pub mod fragment;
pub mod html;
pub mod servers;

// Re-export main parsing functions
pub use episodes::{parse_episode_list, parse_episode_number, EpisodeAnchors, EpisodeListParser};
pub use fragment::{
    capture_attribute, AttrValue, AttributeCapture, ElementMatch, ElementMatches, ElementQuery,
    ElementScanner,
};
pub use html::{clean_html, extract_element_text_by_class, parse_series_title};
pub use servers::{extract_source_id, find_server_id};
