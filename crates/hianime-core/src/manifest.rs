//! HLS manifest expansion
//!
//! Turns a master playlist into one [`Format`] per resolution rung. A media
//! playlist yields a single format pointing at the manifest itself.

use m3u8_rs::Playlist;
use tracing::{debug, warn};

use crate::error::{HiAnimeError, Result};
use crate::types::Format;

/// Expand an M3U8 body into formats.
///
/// Relative variant URIs are resolved against `manifest_url`. I-frame only
/// variants are skipped.
///
/// # Errors
/// * `HiAnimeError::ManifestError` if `manifest_url` is not absolute or the
///   body is not an M3U8 playlist
pub fn parse_manifest(manifest_url: &str, body: &[u8]) -> Result<Vec<Format>> {
    let base = ::url::Url::parse(manifest_url).map_err(|e| HiAnimeError::ManifestError {
        url: manifest_url.to_string(),
        reason: e.to_string(),
    })?;

    let playlist = m3u8_rs::parse_playlist_res(body).map_err(|e| {
        debug!(manifest_url, error = ?e, "manifest parser rejected body");
        HiAnimeError::ManifestError {
            url: manifest_url.to_string(),
            reason: "not an M3U8 playlist".to_string(),
        }
    })?;

    let master = match playlist {
        Playlist::MasterPlaylist(master) => master,
        Playlist::MediaPlaylist(_) => {
            return Ok(vec![Format::hls(manifest_url, manifest_url)]);
        }
    };

    let mut formats = Vec::new();
    for variant in master.variants.iter().filter(|v| !v.is_i_frame) {
        let url = match base.join(&variant.uri) {
            Ok(url) => url,
            Err(e) => {
                warn!(manifest_url, uri = %variant.uri, error = %e, "skipping unresolvable variant");
                continue;
            }
        };

        let mut format = Format::hls(url.as_str(), manifest_url);
        if let Some(resolution) = &variant.resolution {
            format.width = u32::try_from(resolution.width).ok();
            format.height = u32::try_from(resolution.height).ok();
        }
        let tbr = variant.average_bandwidth.unwrap_or(variant.bandwidth) as f64 / 1000.0;
        format.tbr = Some(tbr);
        format.format_id = format!("hls-{}", tbr.round() as u64);
        formats.push(format);
    }

    Ok(formats)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-STREAM-INF:BANDWIDTH=2500000,RESOLUTION=1920x1080,CODECS=\"avc1.640028,mp4a.40.2\"
index-f1-v1-a1.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=1200000,RESOLUTION=1280x720
https://other.cdn/abs/index-f2-v1-a1.m3u8
#EXT-X-I-FRAME-STREAM-INF:BANDWIDTH=90000,RESOLUTION=1920x1080,URI=\"iframes.m3u8\"
";

    const MEDIA: &str = "#EXTM3U
#EXT-X-TARGETDURATION:10
#EXT-X-VERSION:3
#EXTINF:10.0,
seg-1.ts
#EXT-X-ENDLIST
";

    #[test]
    fn test_master_playlist_rungs() {
        let url = "https://cdn.example/hls/abc/master.m3u8";
        let formats = parse_manifest(url, MASTER.as_bytes()).unwrap();

        assert_eq!(formats.len(), 2);
        assert_eq!(formats[0].url, "https://cdn.example/hls/abc/index-f1-v1-a1.m3u8");
        assert_eq!(formats[0].height, Some(1080));
        assert_eq!(formats[0].width, Some(1920));
        assert_eq!(formats[0].tbr, Some(2500.0));
        assert_eq!(formats[0].format_id, "hls-2500");
        assert_eq!(formats[0].manifest_url.as_deref(), Some(url));

        assert_eq!(formats[1].url, "https://other.cdn/abs/index-f2-v1-a1.m3u8");
        assert_eq!(formats[1].height, Some(720));
    }

    #[test]
    fn test_media_playlist_single_format() {
        let url = "https://cdn.example/hls/abc/index.m3u8";
        let formats = parse_manifest(url, MEDIA.as_bytes()).unwrap();

        assert_eq!(formats.len(), 1);
        assert_eq!(formats[0].url, url);
        assert_eq!(formats[0].height, None);
    }

    #[test]
    fn test_not_a_playlist() {
        let result = parse_manifest("https://cdn.example/x.m3u8", b"<html>blocked</html>");
        assert!(matches!(result, Err(HiAnimeError::ManifestError { .. })));
    }

    #[test]
    fn test_relative_manifest_url_rejected() {
        let result = parse_manifest("master.m3u8", MASTER.as_bytes());
        assert!(matches!(result, Err(HiAnimeError::ManifestError { .. })));
    }
}
