//! Text helpers backed by a real HTML parser
//!
//! Used where the page needs entity decoding or class-based lookup rather
//! than the regex fragment scanner.

use regex_lite::Regex;
use scraper::{Html, Selector};

use crate::error::{HiAnimeError, Result};

/// Class of the series title element on the landing page
pub const SERIES_TITLE_CLASS: &str = "film-name dynamic-name";

/// Turn an HTML snippet into plain text.
///
/// Newlines and surrounding whitespace collapse to a single space, `<br>`
/// becomes a newline, tags are dropped and entities are decoded.
///
/// # Examples
/// ```
/// use hianime_core::parser::clean_html;
///
/// assert_eq!(clean_html("Tom &amp; Jerry").unwrap(), "Tom & Jerry");
/// assert_eq!(clean_html("<b>Bold</b>\n  move").unwrap(), "Bold move");
/// ```
pub fn clean_html(html: &str) -> Result<String> {
    let newlines = Regex::new(r"\s*\n\s*")?;
    let breaks = Regex::new(r"(?i)<\s*br\s*/?\s*>")?;
    let paragraphs = Regex::new(r"(?i)<\s*/\s*p\s*>\s*<\s*p[^>]*>")?;

    let text = newlines.replace_all(html, " ");
    let text = breaks.replace_all(&text, "\n");
    let text = paragraphs.replace_all(&text, "\n");

    let fragment = Html::parse_fragment(&text);
    let plain = fragment.root_element().text().collect::<String>();
    Ok(plain.trim().to_string())
}

/// Text content of the first element carrying every class in `class_names`.
///
/// `class_names` is a space-separated class list, e.g. `"film-name dynamic-name"`.
/// Returns None when no element matches or its text is blank.
pub fn extract_element_text_by_class(html: &str, class_names: &str) -> Result<Option<String>> {
    let selector_text: String = class_names
        .split_whitespace()
        .map(|class| format!(".{}", class))
        .collect();
    if selector_text.is_empty() {
        return Ok(None);
    }

    let selector = Selector::parse(&selector_text).map_err(|e| HiAnimeError::ParseError {
        field: "class selector",
        value: format!("{}: {:?}", class_names, e),
    })?;

    let document = Html::parse_document(html);
    let text = document.select(&selector).next().map(|el| {
        el.text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    });

    Ok(text.filter(|t| !t.is_empty()))
}

/// Display title from a series landing page.
pub fn parse_series_title(html: &str) -> Result<Option<String>> {
    extract_element_text_by_class(html, SERIES_TITLE_CLASS)
}
