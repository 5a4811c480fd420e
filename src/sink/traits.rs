//! Sink trait and error types
//!
//! This module defines the trait interface for page sinks and the naming
//! rule every backend uses to key pages.

use crate::crawler::Page;
use async_trait::async_trait;
use thiserror::Error;

/// Longest key derived from a page title
const MAX_KEY_LEN: usize = 128;

/// Errors that can occur while persisting a page
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Persists parsed pages under a name derived from their title
///
/// Persisting two pages with the same title keeps only the last one.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn persist(&self, page: &Page) -> SinkResult<()>;
}

/// Maps a page title to a stable, file-system-safe key
///
/// ASCII alphanumerics, `-` and `_` are kept; every other character becomes
/// `_`. The key is capped at 128 characters.
///
/// # Examples
///
/// ```
/// use weir::sink::page_key;
///
/// assert_eq!(page_key("Hello, World!"), "Hello__World_");
/// assert_eq!(page_key("a/b\\c"), "a_b_c");
/// ```
pub fn page_key(title: &str) -> String {
    title
        .chars()
        .take(MAX_KEY_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
