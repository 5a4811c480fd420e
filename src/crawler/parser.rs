//! HTML parser for extracting links and titles
//!
//! This module handles turning fetched bytes into a [`Page`]:
//! - Page title (first `<title>` element)
//! - Outbound links (every `<a href>` that resolves to an http(s) URL)

use crate::crawler::Page;
use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

/// Hard parse failures; a page either parses completely or not at all
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("body of {url} is not valid UTF-8")]
    Encoding { url: String },
}

/// Turns raw page bytes into a [`Page`]
pub trait Parser: Send + Sync {
    /// Parses `body`, fetched from `source` at `depth`
    fn parse(&self, source: &Url, body: &[u8], depth: u32) -> Result<Page, ParseError>;
}

/// scraper-backed [`Parser`] for HTML documents
#[derive(Debug, Clone, Default)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for HtmlParser {
    /// # Link Extraction Rules
    ///
    /// **Include:**
    /// - `<a href="...">` anywhere in the document, relative hrefs resolved
    ///   against `source`
    ///
    /// **Exclude (silently):**
    /// - `<a href="..." download>`
    /// - `javascript:`, `mailto:`, `tel:` links and data URIs
    /// - Fragment-only and empty hrefs
    /// - Anything that does not resolve to an http(s) URL
    fn parse(&self, source: &Url, body: &[u8], depth: u32) -> Result<Page, ParseError> {
        let html = std::str::from_utf8(body).map_err(|_| ParseError::Encoding {
            url: source.to_string(),
        })?;

        let document = Html::parse_document(html);

        Ok(Page {
            url: source.clone(),
            title: extract_title(&document),
            body: body.to_vec(),
            links: extract_links(&document, source),
            depth,
        })
    }
}

/// Extracts the trimmed text of the first `<title>`, or an empty string
fn extract_title(document: &Html) -> String {
    let Ok(title_selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Extracts all valid links from the HTML document, in document order
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel:, data: schemes
/// - Fragment-only or empty hrefs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}
