use std::collections::HashSet;

use album_core::{select_highest_resolution, ResourceUrl};
use scraper::{Html, Selector};
use serde_json::Value;

use crate::{FailureKind, FetchError};

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const BACKGROUND_IMAGE: &str = "background-image";

/// Candidate URLs of one listing page, in page order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub candidates: Vec<ResourceUrl>,
}

impl ListingPage {
    pub fn is_end(&self) -> bool {
        self.candidates.is_empty()
    }
}

pub trait ListingParser: Send + Sync {
    fn parse(&self, body: &str) -> Result<ListingPage, FetchError>;
}

/// Parser for the album listing endpoint.
///
/// The body is JSON, possibly wrapped in an HTML comment. `payload[1]` holds the
/// page items: photo record objects exposing `<size>_src` fields, or HTML fragments
/// whose thumbnails carry the image in a `background-image: url(..)` style.
#[derive(Debug, Clone)]
pub struct PhotoListingParser {
    strip_suffix: String,
}

impl PhotoListingParser {
    pub fn new(strip_suffix: impl Into<String>) -> Self {
        Self {
            strip_suffix: strip_suffix.into(),
        }
    }

    fn clean(&self, raw: &str) -> Option<ResourceUrl> {
        let unescaped = raw.trim().replace("\\/", "/");
        let trimmed = if self.strip_suffix.is_empty() {
            unescaped.as_str()
        } else {
            unescaped
                .strip_suffix(self.strip_suffix.as_str())
                .unwrap_or(unescaped.as_str())
        };
        ResourceUrl::new(trimmed)
    }

    fn collect(&self, item: &Value, out: &mut Vec<String>) {
        match item {
            Value::Object(record) => {
                if let Some((_, url)) =
                    select_highest_resolution(|name| record.get(name).and_then(Value::as_str))
                {
                    out.push(url.to_string());
                }
            }
            Value::String(fragment) if fragment.contains(BACKGROUND_IMAGE) => {
                out.extend(background_image_urls(fragment));
            }
            Value::Array(nested) => {
                for inner in nested {
                    self.collect(inner, out);
                }
            }
            _ => {}
        }
    }
}

impl Default for PhotoListingParser {
    fn default() -> Self {
        Self::new("&from=bu&cs=240x0")
    }
}

impl ListingParser for PhotoListingParser {
    fn parse(&self, body: &str) -> Result<ListingPage, FetchError> {
        let raw = strip_comment(body.trim());
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| FetchError::new(FailureKind::Parse, err.to_string()))?;

        let Value::Object(root) = value else {
            return Err(FetchError::new(FailureKind::Parse, "listing is not a JSON object"));
        };
        let payload = match root.get("payload") {
            None | Some(Value::Null) => return Ok(ListingPage::default()),
            Some(Value::Array(payload)) => payload,
            Some(_) => {
                return Err(FetchError::new(FailureKind::Parse, "payload is not an array"));
            }
        };
        let Some(items) = payload.get(1) else {
            return Ok(ListingPage::default());
        };

        let mut raw_urls = Vec::new();
        self.collect(items, &mut raw_urls);

        let mut seen = HashSet::new();
        let candidates = raw_urls
            .iter()
            .filter_map(|raw| self.clean(raw))
            .filter(|url| seen.insert(url.clone()))
            .collect();
        Ok(ListingPage { candidates })
    }
}

fn strip_comment(raw: &str) -> &str {
    raw.strip_prefix(COMMENT_OPEN)
        .and_then(|inner| inner.strip_suffix(COMMENT_CLOSE))
        .map(str::trim)
        .unwrap_or(raw)
}

fn background_image_urls(fragment: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("[style]") else {
        return Vec::new();
    };
    let document = Html::parse_fragment(fragment);
    let urls = document
        .select(&selector)
        .filter_map(|element| element.value().attr("style"))
        .filter(|style| style.contains(BACKGROUND_IMAGE))
        .flat_map(css_urls)
        .collect();
    urls
}

/// Every `url(...)` argument in a CSS declaration list, quotes removed.
fn css_urls(style: &str) -> Vec<String> {
    let mut urls = Vec::new();
    let mut rest = style;
    while let Some(start) = rest.find("url(") {
        let after = &rest[start + 4..];
        let Some(end) = after.find(')') else {
            break;
        };
        let inner = after[..end].trim().trim_matches(['\'', '"'].as_ref()).trim();
        if !inner.is_empty() {
            urls.push(inner.to_string());
        }
        rest = &after[end + 1..];
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_urls_handles_quotes_and_multiple_values() {
        assert_eq!(
            css_urls("width: 10px; background-image: url('https://i/a.jpg'), url(\"https://i/b.jpg\")"),
            vec!["https://i/a.jpg".to_string(), "https://i/b.jpg".to_string()]
        );
        assert!(css_urls("background-image: url(").is_empty());
    }

    #[test]
    fn strips_comment_wrapper() {
        assert_eq!(strip_comment("<!-- {\"a\":1} -->"), "{\"a\":1}");
        assert_eq!(strip_comment("{\"a\":1}"), "{\"a\":1}");
    }
}
