//! URL handling module for Weir
//!
//! This module provides crawl-URL validation and normalization, plus origin
//! derivation for seed targets.

mod normalize;

use url::Url;

// Re-export main functions
pub use normalize::parse_crawl_url;

/// Returns the origin of a URL as `scheme://host[:port]`
///
/// Default ports are omitted, so `https://example.com:443/x` and
/// `https://example.com/y` share the origin `https://example.com`.
///
/// # Examples
///
/// ```
/// use weir::url::{origin_of, parse_crawl_url};
///
/// let url = parse_crawl_url("https://example.com:8443/docs/").unwrap();
/// assert_eq!(origin_of(&url), "https://example.com:8443");
/// ```
pub fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}
