//! Server list and embed link parsing

use regex_lite::Regex;

use crate::error::Result;
use crate::types::VariantKind;

use super::fragment::{AttributeCapture, ElementQuery, ElementScanner};

/// Server id of the first server offering `kind` in the server list fragment.
///
/// Servers are `div` elements whose `data-type` is the variant tag; the first
/// one carrying a `data-id` wins.
pub fn find_server_id(fragment: &str, kind: VariantKind) -> Result<Option<String>> {
    let scanner = ElementScanner::new(
        &ElementQuery::new()
            .tag("div")
            .attribute("data-type")
            .pattern(kind.tag()),
    )?;
    let data_id = AttributeCapture::new("data-id")?;

    let id = scanner
        .find_iter(fragment)
        .find_map(|element| data_id.get(element.full))
        .map(str::to_string);
    Ok(id)
}

/// Opaque source id in an embed link such as
/// `https://megacloud.tv/embed-2/e-1/AbC123?k=1`.
///
/// # Examples
/// ```
/// use hianime_core::parser::extract_source_id;
///
/// let id = extract_source_id("https://megacloud.tv/embed-2/e-1/AbC123?k=1").unwrap();
/// assert_eq!(id.as_deref(), Some("AbC123"));
/// ```
pub fn extract_source_id(link: &str) -> Result<Option<String>> {
    let re = Regex::new(r"/embed-2/[^/]+/([^?]+)\?")?;
    Ok(re
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVERS: &str = r#"
        <div class="ps_-status">You are watching <b>Episode 1</b></div>
        <div class="ps_-block ps_-block-sub servers-sub">
            <div class="ps__-title"><i class="fas fa-closed-captioning mr-2"></i>SUB:</div>
            <div class="ps__-list">
                <div class="item server-item" data-type="sub" data-id="611452" data-server-id="4">
                    <a href="javascript:;" class="btn">HD-1</a>
                </div>
                <div class="item server-item" data-type="sub" data-id="611453" data-server-id="1">
                    <a href="javascript:;" class="btn">HD-2</a>
                </div>
            </div>
        </div>
        <div class="ps_-block ps_-block-sub servers-dub">
            <div class="ps__-list">
                <div class="item server-item" data-type="dub" data-id="611460" data-server-id="4">
                    <a href="javascript:;" class="btn">HD-1</a>
                </div>
            </div>
        </div>
    "#;

    #[test]
    fn test_find_server_id_first_match() {
        assert_eq!(
            find_server_id(SERVERS, VariantKind::Sub).unwrap().as_deref(),
            Some("611452")
        );
        assert_eq!(
            find_server_id(SERVERS, VariantKind::Dub).unwrap().as_deref(),
            Some("611460")
        );
    }

    #[test]
    fn test_find_server_id_missing_variant() {
        let sub_only = r#"<div class="item server-item" data-type="sub" data-id="1">x</div>"#;
        assert_eq!(find_server_id(sub_only, VariantKind::Dub).unwrap(), None);
    }

    #[test]
    fn test_find_server_id_skips_servers_without_id() {
        let fragment = r#"
            <div class="item" data-type="sub">broken</div>
            <div class="item" data-type="sub" data-id="22">ok</div>
        "#;
        assert_eq!(
            find_server_id(fragment, VariantKind::Sub).unwrap().as_deref(),
            Some("22")
        );
    }

    #[test]
    fn test_find_server_id_ignores_data_server_id() {
        let fragment = r#"<div data-type="dub" data-server-id="4">x</div>"#;
        assert_eq!(find_server_id(fragment, VariantKind::Dub).unwrap(), None);
    }

    #[test]
    fn test_extract_source_id() {
        assert_eq!(
            extract_source_id("https://megacloud.tv/embed-2/v3/e-1/zXc9?k=1&autoPlay=1")
                .unwrap()
                .as_deref(),
            Some("e-1/zXc9")
        );
        assert_eq!(
            extract_source_id("https://megacloud.tv/embed-2/e-1/AbC123?k=1")
                .unwrap()
                .as_deref(),
            Some("AbC123")
        );
    }

    #[test]
    fn test_extract_source_id_requires_query() {
        assert_eq!(extract_source_id("https://megacloud.tv/embed-2/e-1/AbC123").unwrap(), None);
        assert_eq!(extract_source_id("https://other.host/player/AbC123?k=1").unwrap(), None);
        assert_eq!(extract_source_id("").unwrap(), None);
    }
}
