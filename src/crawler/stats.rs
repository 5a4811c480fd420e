//! Crawl statistics
//!
//! Workers bump lock-free counters as targets move through the pipeline.
//! When the crawl ends the coordinator snapshots them into a
//! [`CrawlSummary`].

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters shared by every worker of one crawl
#[derive(Debug, Default)]
pub struct CrawlStats {
    pub(crate) admitted: AtomicU64,
    pub(crate) duplicates: AtomicU64,
    pub(crate) fetched: AtomicU64,
    pub(crate) fetch_failed: AtomicU64,
    pub(crate) parse_failed: AtomicU64,
    pub(crate) persisted: AtomicU64,
    pub(crate) persist_failed: AtomicU64,
    pub(crate) too_deep: AtomicU64,
    pub(crate) untitled: AtomicU64,
    pub(crate) invalid_links: AtomicU64,
}

impl CrawlStats {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of every counter
    pub fn snapshot(&self, elapsed: Duration, stopped: bool) -> CrawlSummary {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);

        CrawlSummary {
            admitted: load(&self.admitted),
            duplicates: load(&self.duplicates),
            fetched: load(&self.fetched),
            fetch_failed: load(&self.fetch_failed),
            parse_failed: load(&self.parse_failed),
            persisted: load(&self.persisted),
            persist_failed: load(&self.persist_failed),
            discarded_too_deep: load(&self.too_deep),
            discarded_untitled: load(&self.untitled),
            invalid_links: load(&self.invalid_links),
            elapsed_ms: elapsed.as_millis() as u64,
            stopped,
        }
    }
}

/// Final report of a crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    /// Targets admitted to the frontier, seeds included
    pub admitted: u64,

    /// Admissions rejected because the URL was already visited
    pub duplicates: u64,

    /// Successful fetches
    pub fetched: u64,

    pub fetch_failed: u64,
    pub parse_failed: u64,

    /// Pages written by the sink
    pub persisted: u64,

    pub persist_failed: u64,

    /// Targets taken but beyond the depth limit
    pub discarded_too_deep: u64,

    /// Pages dropped because their title was empty
    pub discarded_untitled: u64,

    /// Discovered links that failed URL validation
    pub invalid_links: u64,

    pub elapsed_ms: u64,

    /// Whether the crawl ended because of a stop signal
    pub stopped: bool,
}

impl CrawlSummary {
    /// Total per-target failures of any kind
    pub fn failures(&self) -> u64 {
        self.fetch_failed + self.parse_failed + self.persist_failed
    }
}

/// Prints a summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!(
        "Finished in {:.1}s{}",
        summary.elapsed_ms as f64 / 1000.0,
        if summary.stopped {
            " (stopped by signal)"
        } else {
            ""
        }
    );
    println!();

    println!("Frontier:");
    println!("  Admitted: {}", summary.admitted);
    println!("  Duplicates rejected: {}", summary.duplicates);
    println!("  Invalid links skipped: {}", summary.invalid_links);
    println!();

    println!("Pages:");
    println!("  Fetched: {}", summary.fetched);
    println!("  Persisted: {}", summary.persisted);
    println!("  Discarded (too deep): {}", summary.discarded_too_deep);
    println!("  Discarded (empty title): {}", summary.discarded_untitled);
    println!();

    if summary.failures() > 0 {
        println!("Failures:");
        println!("  Fetch: {}", summary.fetch_failed);
        println!("  Parse: {}", summary.parse_failed);
        println!("  Persist: {}", summary.persist_failed);
        println!();
    }
}
