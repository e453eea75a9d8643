//! Regex-based HTML fragment scanner
//!
//! Finds elements by tag, attribute and attribute value in raw HTML without
//! building a document tree. The inner content match is non-greedy and stops
//! at the first closing tag of the same name, so nested elements with the
//! same tag are cut short. No entity decoding is done.

use regex_lite::{CaptureMatches, Regex};

use crate::error::{HiAnimeError, Result};

/// Any tag or attribute name
const NAME: &str = r"[a-zA-Z0-9:._-]+";

/// Zero or more attributes we don't care about, in any quoting style
const OTHER_ATTRIBUTES: &str = r#"(?:\s+[a-zA-Z0-9:._-]+(?:=[a-zA-Z0-9:._-]*|="[^"]*"|='[^']*'|))*?"#;

/// Value part of an attribute whose value is not constrained
const ANY_VALUE: &str = r#"(?:=[a-zA-Z0-9:._-]*|="[^"]*"|='[^']*'|)"#;

/// How an attribute value is matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Literal value, regex metacharacters escaped
    Exact(String),
    /// Regex used as-is
    Pattern(String),
}

/// Element selection criteria
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementQuery {
    /// Tag name, any tag when None
    pub tag: Option<String>,
    /// Attribute that must be present in the opening tag
    pub attribute: Option<String>,
    /// Constraint on the attribute value
    pub value: Option<AttrValue>,
}

impl ElementQuery {
    /// Query matching any element
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a tag name
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Require an attribute
    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Require the attribute to have exactly this value
    pub fn exact(mut self, value: impl Into<String>) -> Self {
        self.value = Some(AttrValue::Exact(value.into()));
        self
    }

    /// Require the attribute value to match this regex
    pub fn pattern(mut self, value: impl Into<String>) -> Self {
        self.value = Some(AttrValue::Pattern(value.into()));
        self
    }

    fn to_regex(&self) -> Result<String> {
        let tag = match &self.tag {
            Some(tag) => regex_lite::escape(tag),
            None => NAME.to_string(),
        };

        let attribute = match (&self.attribute, &self.value) {
            (None, None) => String::new(),
            (None, Some(_)) => {
                return Err(HiAnimeError::InvalidPattern(
                    "attribute value given without an attribute name".to_string(),
                ))
            }
            (Some(name), None) => format!(r"\s+{}{}", regex_lite::escape(name), ANY_VALUE),
            (Some(name), Some(value)) => {
                let value = match value {
                    AttrValue::Exact(v) => regex_lite::escape(v),
                    AttrValue::Pattern(p) => p.clone(),
                };
                format!(
                    r#"\s+{}=['"]?(?P<value>{})['"]?"#,
                    regex_lite::escape(name),
                    value
                )
            }
        };

        Ok(format!(
            r"(?s)<{tag}{other}{attribute}{other}\s*>(?P<content>.*?)</{tag}>",
            tag = tag,
            other = OTHER_ATTRIBUTES,
            attribute = attribute,
        ))
    }
}

/// One matched element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementMatch<'h> {
    /// Whole element text, opening to closing tag
    pub full: &'h str,
    /// Text between the opening and closing tag
    pub content: &'h str,
    /// Matched attribute value, when a value was queried
    pub value: Option<&'h str>,
    /// Byte offset of the element in the scanned text
    pub start: usize,
}

/// Compiled element query
#[derive(Debug, Clone)]
pub struct ElementScanner {
    regex: Regex,
}

impl ElementScanner {
    /// Compile a query.
    ///
    /// # Errors
    /// * `HiAnimeError::InvalidPattern` if a value pattern is not a valid
    ///   regex, or a value is given without an attribute
    pub fn new(query: &ElementQuery) -> Result<Self> {
        let regex = Regex::new(&query.to_regex()?)?;
        Ok(Self { regex })
    }

    /// Lazily iterate over non-overlapping matches in `html`.
    pub fn find_iter<'r, 'h>(&'r self, html: &'h str) -> ElementMatches<'r, 'h> {
        ElementMatches {
            inner: self.regex.captures_iter(html),
        }
    }
}

/// Iterator returned by [`ElementScanner::find_iter`]
pub struct ElementMatches<'r, 'h> {
    inner: CaptureMatches<'r, 'h>,
}

impl<'r, 'h> Iterator for ElementMatches<'r, 'h> {
    type Item = ElementMatch<'h>;

    fn next(&mut self) -> Option<Self::Item> {
        let caps = self.inner.next()?;
        let whole = caps.get(0)?;
        Some(ElementMatch {
            full: whole.as_str(),
            content: caps.name("content").map_or("", |m| m.as_str()),
            value: caps.name("value").map(|m| m.as_str()),
            start: whole.start(),
        })
    }
}

/// Precompiled lookup of one double-quoted attribute.
///
/// Build it once per fragment and apply it to every matched element.
#[derive(Debug, Clone)]
pub struct AttributeCapture {
    name: String,
    regex: Regex,
}

impl AttributeCapture {
    /// Compile the lookup for attribute `name`.
    ///
    /// # Errors
    /// * `HiAnimeError::InvalidPattern` if the pattern fails to compile
    pub fn new(name: &str) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            regex: Regex::new(&format!(r#"\s{}="([^"]+)""#, regex_lite::escape(name)))?,
        })
    }

    /// Attribute this lookup captures
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of the attribute in `element`; None when absent or empty.
    pub fn get<'h>(&self, element: &'h str) -> Option<&'h str> {
        self.regex
            .captures(element)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Capture the double-quoted value of an attribute anywhere in `element`.
///
/// Returns None when the attribute is absent or empty. Compiles the lookup
/// on every call; use [`AttributeCapture`] when scanning many elements.
pub fn capture_attribute<'h>(element: &'h str, name: &str) -> Result<Option<&'h str>> {
    Ok(AttributeCapture::new(name)?.get(element))
}
