//! Page URL classification and endpoint URL builders
//!
//! Every request the extractor makes is derived from the classifier output
//! and a configured site base, so tests can point the whole chain at a mock
//! server.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{HiAnimeError, Result};
use crate::types::SeriesRef;

/// Public site address
pub const DEFAULT_BASE_URL: &str = "https://hianime.to";

/// Third-party embed host serving the manifests
pub const DEFAULT_EMBED_BASE_URL: &str = "https://megacloud.tv";

const PAGE_URL_PATTERN: &str = r"^https?://[^/?]+/(?:watch/)?(?P<slug>[^/?]+)(?:-\d+)?-(?P<series_id>\d+)(?:\?ep=(?P<episode_id>\d+))?$";

/// Classified page URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageUrl {
    /// Series the page belongs to
    pub series: SeriesRef,
    /// Episode selected with `?ep=`, if any
    pub episode_id: Option<String>,
}

/// Split a page URL into series slug, series id and optional episode id.
///
/// Accepts series pages (`/<slug>-<id>`) and watch pages
/// (`/watch/<slug>-<id>?ep=<episode>`). The host is not checked here.
///
/// # Errors
/// * `HiAnimeError::UnsupportedUrl` if the URL has any other shape
///
/// # Examples
/// ```
/// use hianime_core::url::classify_url;
///
/// let page = classify_url("https://hianime.to/watch/show-title-19107?ep=124260").unwrap();
/// assert_eq!(page.series.slug, "show-title");
/// assert_eq!(page.series.id, "19107");
/// assert_eq!(page.episode_id.as_deref(), Some("124260"));
/// ```
pub fn classify_url(url: &str) -> Result<PageUrl> {
    let re = Regex::new(PAGE_URL_PATTERN)?;
    let caps = re
        .captures(url)
        .ok_or_else(|| HiAnimeError::UnsupportedUrl(url.to_string()))?;

    // Both groups are mandatory in the pattern
    let slug = caps.name("slug").map(|m| m.as_str().to_string());
    let series_id = caps.name("series_id").map(|m| m.as_str().to_string());
    let (Some(slug), Some(id)) = (slug, series_id) else {
        return Err(HiAnimeError::UnsupportedUrl(url.to_string()));
    };

    Ok(PageUrl {
        series: SeriesRef { slug, id },
        episode_id: caps.name("episode_id").map(|m| m.as_str().to_string()),
    })
}

/// Check whether two URLs point at the same host and explicit port.
pub fn same_host(url: &str, base_url: &str) -> bool {
    match (::url::Url::parse(url), ::url::Url::parse(base_url)) {
        (Ok(a), Ok(b)) => a.host_str().is_some() && a.host_str() == b.host_str() && a.port() == b.port(),
        _ => false,
    }
}

fn trim_base(base: &str) -> &str {
    base.trim_end_matches('/')
}

/// Series landing page, carrying the display title
pub fn series_page_url(base: &str, series: &SeriesRef) -> String {
    format!("{}/{}-{}", trim_base(base), series.slug, series.id)
}

/// Episode list endpoint, answering `{"html": ...}`
pub fn episode_list_url(base: &str, series_id: &str) -> String {
    format!("{}/ajax/v2/episode/list/{}", trim_base(base), series_id)
}

/// Server list endpoint, answering `{"html": ...}`
pub fn servers_url(base: &str, episode_id: &str) -> String {
    format!("{}/ajax/v2/episode/servers?episodeId={}", trim_base(base), episode_id)
}

/// Sources endpoint, answering `{"link": ...}`
pub fn sources_url(base: &str, server_id: &str) -> String {
    format!("{}/ajax/v2/episode/sources?id={}", trim_base(base), server_id)
}

/// Embed host source list, answering `{"sources": [...], "tracks": [...]}`
pub fn embed_sources_url(embed_base: &str, source_id: &str) -> String {
    format!("{}/embed-2/ajax/e-1/getSources?id={}", trim_base(embed_base), source_id)
}

/// Absolute URL for an episode anchor `href`
pub fn episode_page_url(base: &str, href: &str) -> String {
    format!("{}{}", trim_base(base), href)
}

/// Canonical watch page for an episode
pub fn watch_url(base: &str, series: &SeriesRef, episode_id: &str) -> String {
    format!("{}/watch/{}-{}?ep={}", trim_base(base), series.slug, series.id, episode_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_classify_watch_url() {
        let page = classify_url("https://site/watch/show-title-19107?ep=124260").unwrap();
        assert_eq!(page.series.slug, "show-title");
        assert_eq!(page.series.id, "19107");
        assert_eq!(page.episode_id.as_deref(), Some("124260"));
    }

    #[test]
    fn test_classify_series_url() {
        let page = classify_url(
            "https://hianime.to/demon-slayer-kimetsu-no-yaiba-hashira-training-arc-19107",
        )
        .unwrap();
        assert_eq!(page.series.slug, "demon-slayer-kimetsu-no-yaiba-hashira-training-arc");
        assert_eq!(page.series.id, "19107");
        assert!(page.episode_id.is_none());
    }

    #[test]
    fn test_classify_http_and_port() {
        let page = classify_url("http://127.0.0.1:8080/watch/the-eminence-in-shadow-17473?ep=94440")
            .unwrap();
        assert_eq!(page.series.slug, "the-eminence-in-shadow");
        assert_eq!(page.series.id, "17473");
        assert_eq!(page.episode_id.as_deref(), Some("94440"));
    }

    #[test]
    fn test_classify_numeric_slug_segment() {
        let page = classify_url("https://hianime.to/mob-psycho-100-3-1234").unwrap();
        assert_eq!(page.series.id, "1234");
        assert!(page.series.slug.starts_with("mob-psycho-100"));
    }

    #[test]
    fn test_classify_rejects_other_shapes() {
        for url in [
            "https://hianime.to/",
            "https://hianime.to/home",
            "https://hianime.to/watch/show-title",
            "https://hianime.to/watch/show-title-19107?ep=abc",
            "https://hianime.to/watch/show-title-19107?ep=1&x=2",
            "ftp://hianime.to/show-1",
            "not a url",
        ] {
            match classify_url(url) {
                Err(HiAnimeError::UnsupportedUrl(u)) => assert_eq!(u, url),
                other => panic!("Expected UnsupportedUrl for {url}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_same_host() {
        assert!(same_host("https://hianime.to/show-1", "https://hianime.to"));
        assert!(same_host("http://hianime.to/show-1", "https://hianime.to/"));
        assert!(!same_host("https://example.com/show-1", "https://hianime.to"));
        assert!(!same_host("http://127.0.0.1:1/a-1", "http://127.0.0.1:2"));
        assert!(!same_host("garbage", "https://hianime.to"));
    }

    #[test]
    fn test_endpoint_urls() {
        let series = SeriesRef {
            slug: "show-title".to_string(),
            id: "19107".to_string(),
        };
        let base = "https://hianime.to/";
        assert_eq!(series_page_url(base, &series), "https://hianime.to/show-title-19107");
        assert_eq!(
            episode_list_url(base, "19107"),
            "https://hianime.to/ajax/v2/episode/list/19107"
        );
        assert_eq!(
            servers_url(base, "124260"),
            "https://hianime.to/ajax/v2/episode/servers?episodeId=124260"
        );
        assert_eq!(
            sources_url(base, "4242"),
            "https://hianime.to/ajax/v2/episode/sources?id=4242"
        );
        assert_eq!(
            embed_sources_url(DEFAULT_EMBED_BASE_URL, "AbC123"),
            "https://megacloud.tv/embed-2/ajax/e-1/getSources?id=AbC123"
        );
        assert_eq!(
            episode_page_url(base, "/watch/show-title-19107?ep=1"),
            "https://hianime.to/watch/show-title-19107?ep=1"
        );
        assert_eq!(
            watch_url(base, &series, "124260"),
            "https://hianime.to/watch/show-title-19107?ep=124260"
        );
    }

    proptest! {
        #[test]
        fn prop_classifier_roundtrips_into_endpoints(
            slug in "[a-z]{1,8}(-[a-z]{1,8}){0,4}",
            id in "[1-9][0-9]{0,6}",
            episode in proptest::option::of("[1-9][0-9]{0,6}"),
            watch in any::<bool>(),
        ) {
            let series = SeriesRef { slug: slug.clone(), id: id.clone() };
            let url = match &episode {
                Some(ep) => watch_url(DEFAULT_BASE_URL, &series, ep),
                None if watch => format!("{}/watch/{}-{}", DEFAULT_BASE_URL, slug, id),
                None => series_page_url(DEFAULT_BASE_URL, &series),
            };

            let page = classify_url(&url).unwrap();
            prop_assert_eq!(&page.series, &series);
            prop_assert_eq!(&page.episode_id, &episode);
            prop_assert_eq!(
                series_page_url(DEFAULT_BASE_URL, &page.series),
                format!("{}/{}-{}", DEFAULT_BASE_URL, slug, id)
            );
            prop_assert_eq!(
                episode_list_url(DEFAULT_BASE_URL, &page.series.id),
                format!("{}/ajax/v2/episode/list/{}", DEFAULT_BASE_URL, id)
            );
        }
    }
}
