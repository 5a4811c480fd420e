//! Weir: a concurrent frontier-driven web crawler
//!
//! This crate implements a crawler engine built around a bounded, deduplicating
//! frontier queue and a pool of worker tasks that fetch, parse, persist and
//! expand pages until the frontier runs dry or a stop signal arrives.

pub mod config;
pub mod crawler;
pub mod sink;
pub mod url;

use thiserror::Error;

/// Main error type for Weir operations
///
/// Only setup can fail. Once a crawl is running, per-target failures are
/// logged and counted rather than returned.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Weir operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{
    run_crawl, Coordinator, CrawlPhase, CrawlSummary, CrawlTarget, Fetcher, Frontier,
    FrontierClosed, Page, Parser,
};
pub use sink::Sink;
pub use crate::url::{origin_of, parse_crawl_url};
