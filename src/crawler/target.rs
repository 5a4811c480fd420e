//! Units of work and their results

use url::Url;

/// A pending unit of crawl work
///
/// Targets are immutable once built. Seeds start at depth 1 and every
/// discovered link sits one level below the page it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// The normalized URL to fetch; its string form is the dedup key
    pub url: Url,

    /// The base/host context the link was discovered under
    pub origin: String,

    /// Traversal depth, starting at 1 for seeds
    pub depth: u32,
}

impl CrawlTarget {
    /// Creates a seed target at depth 1
    pub fn seed(url: Url, origin: impl Into<String>) -> Self {
        Self {
            url,
            origin: origin.into(),
            depth: 1,
        }
    }

    /// Creates a target for a link discovered on this target's page
    pub fn child(&self, url: Url) -> Self {
        Self {
            url,
            origin: self.origin.clone(),
            depth: self.depth + 1,
        }
    }
}

/// A fetched and parsed page
#[derive(Debug, Clone)]
pub struct Page {
    /// The URL the page was fetched from
    pub url: Url,

    /// First `<title>` text, trimmed; empty if none
    pub title: String,

    /// Raw page content, persisted verbatim
    pub body: Vec<u8>,

    /// Outbound links in document order, duplicates included
    pub links: Vec<String>,

    /// Depth at which the page was fetched
    pub depth: u32,
}
