//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The shared frontier of pending targets
//! - HTTP fetching and HTML parsing
//! - The worker loop
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod stats;
mod target;
mod worker;

pub use coordinator::{run_crawl, Coordinator, CrawlPhase};
pub use fetcher::{build_http_client, FetchError, Fetcher, HttpFetcher};
pub use frontier::{Frontier, FrontierClosed, WorkerSlot};
pub use parser::{HtmlParser, ParseError, Parser};
pub use stats::{print_summary, CrawlStats, CrawlSummary};
pub use target::{CrawlTarget, Page};
