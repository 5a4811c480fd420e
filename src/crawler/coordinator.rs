//! Crawler coordinator - main crawl orchestration logic
//!
//! This module owns the lifecycle of one crawl:
//! - Seeding the frontier from configuration
//! - Running a fixed pool of worker tasks
//! - Broadcasting shutdown and joining every worker
//! - Producing the final summary

use crate::config::{Config, CrawlerConfig, SeedEntry};
use crate::crawler::stats::{CrawlStats, CrawlSummary};
use crate::crawler::worker::{run_worker, WorkerContext};
use crate::crawler::{
    CrawlTarget, Fetcher, Frontier, FrontierClosed, HtmlParser, HttpFetcher, Parser,
};
use crate::sink::{open_sink, Sink};
use crate::url::{origin_of, parse_crawl_url};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Lifecycle phase of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    /// Not started yet
    Idle,
    /// Admitting seed targets
    Seeding,
    /// Workers are draining the frontier
    Running,
    /// Stop requested; waiting for workers to exit
    Draining,
    /// Every worker has been joined
    Done,
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Seeding => "seeding",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    crawler: CrawlerConfig,
    seeds: Vec<SeedEntry>,
    frontier: Arc<Frontier>,
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn Parser>,
    sink: Arc<dyn Sink>,
    stats: Arc<CrawlStats>,
    shutdown: CancellationToken,
    phase: watch::Sender<CrawlPhase>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fetcher` - Retrieves page bytes
    /// * `parser` - Turns page bytes into pages
    /// * `sink` - Persists pages
    pub fn new(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        parser: Arc<dyn Parser>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        let frontier = Arc::new(Frontier::new(config.crawler.queue_capacity));
        let (phase, _) = watch::channel(CrawlPhase::Idle);

        Self {
            crawler: config.crawler,
            seeds: config.seeds,
            frontier,
            fetcher,
            parser,
            sink,
            stats: Arc::new(CrawlStats::default()),
            shutdown: CancellationToken::new(),
            phase,
        }
    }

    /// Token that stops the crawl when cancelled
    ///
    /// Cancelling it has the same effect as the stop future passed to
    /// [`run_until`](Self::run_until) resolving.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Subscribes to phase transitions
    pub fn phases(&self) -> watch::Receiver<CrawlPhase> {
        self.phase.subscribe()
    }

    /// Runs the crawl until the frontier is exhausted or Ctrl+C is pressed
    pub async fn run(self) -> CrawlSummary {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Runs the crawl until the frontier is exhausted or `stop` resolves
    ///
    /// Returns only after every worker has been joined, however the crawl
    /// ended.
    ///
    /// Workers are spawned before the seeds are admitted so that a seed list
    /// longer than the queue capacity backpressures instead of blocking
    /// forever. The frontier is held open while seeding.
    pub async fn run_until<F>(self, stop: F) -> CrawlSummary
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let worker_count = self.crawler.worker_count.max(1);

        self.set_phase(CrawlPhase::Seeding);
        self.frontier.hold_open();

        let context = Arc::new(WorkerContext {
            frontier: Arc::clone(&self.frontier),
            fetcher: Arc::clone(&self.fetcher),
            parser: Arc::clone(&self.parser),
            sink: Arc::clone(&self.sink),
            stats: Arc::clone(&self.stats),
            max_depth: self.crawler.max_depth,
        });

        let mut workers = JoinSet::new();
        for id in 1..=worker_count {
            let span = tracing::info_span!("worker", id);
            workers.spawn(
                run_worker(Arc::clone(&context), self.shutdown.child_token()).instrument(span),
            );
        }

        let shutdown = self.shutdown.clone();
        let stop = async move {
            tokio::select! {
                _ = stop => {}
                _ = shutdown.cancelled() => {}
            }
        };
        tokio::pin!(stop);
        let mut stopped = false;

        tokio::select! {
            biased;
            _ = &mut stop => stopped = true,
            _ = self.seed() => {}
        }
        self.frontier.complete();

        if stopped {
            self.begin_draining(workers.len());
        } else {
            self.set_phase(CrawlPhase::Running);
            tracing::info!(
                "Crawling with {} workers (max depth {}, queue capacity {})",
                worker_count,
                self.crawler.max_depth,
                self.frontier.capacity()
            );
        }

        loop {
            tokio::select! {
                _ = &mut stop, if !stopped => {
                    stopped = true;
                    self.begin_draining(workers.len());
                }
                joined = workers.join_next() => match joined {
                    Some(Ok(())) => {}
                    Some(Err(e)) => tracing::error!("Worker terminated abnormally: {}", e),
                    None => break,
                },
            }
        }

        self.set_phase(CrawlPhase::Done);
        let summary = self.stats.snapshot(started.elapsed(), stopped);
        tracing::info!(
            "Crawl finished: {} fetched, {} stored, {} failures in {:?}",
            summary.fetched,
            summary.persisted,
            summary.failures(),
            started.elapsed()
        );

        summary
    }

    /// Admits every valid seed at depth 1
    ///
    /// Malformed seed URLs are skipped with a warning.
    async fn seed(&self) -> usize {
        let mut admitted = 0;

        for seed in &self.seeds {
            let url = match parse_crawl_url(&seed.url) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("Skipping seed {}: {}", seed.url, e);
                    continue;
                }
            };

            let origin = match seed.origin.as_deref() {
                Some(origin) if !origin.is_empty() => origin.to_string(),
                _ => origin_of(&url),
            };

            match self.frontier.admit(CrawlTarget::seed(url, origin)).await {
                Ok(true) => {
                    admitted += 1;
                    CrawlStats::bump(&self.stats.admitted);
                }
                Ok(false) => {
                    tracing::debug!("Duplicate seed {}", seed.url);
                    CrawlStats::bump(&self.stats.duplicates);
                }
                Err(FrontierClosed) => break,
            }
        }

        if admitted == 0 {
            tracing::warn!("No valid seeds; nothing to crawl");
        } else {
            tracing::info!("Seeded frontier with {} targets", admitted);
        }

        admitted
    }

    fn begin_draining(&self, workers: usize) {
        tracing::info!("Stop requested, draining {} workers", workers);
        self.set_phase(CrawlPhase::Draining);
        self.shutdown.cancel();
        self.frontier.close();
    }

    fn set_phase(&self, phase: CrawlPhase) {
        tracing::debug!("Crawl phase: {}", phase);
        self.phase.send_replace(phase);
    }
}

/// Runs a complete crawl with the default collaborators
///
/// This function:
///
/// 1. Builds the HTTP fetcher from the user agent configuration
/// 2. Opens the configured sink (creating its location)
/// 3. Seeds the frontier and runs the worker pool
/// 4. Stops on frontier exhaustion or Ctrl+C
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl ran to completion or was stopped cleanly
/// * `Err(CrawlError)` - The fetcher or sink could not be set up
///
/// # Example
///
/// ```no_run
/// use weir::config::load_config;
/// use weir::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("weir.toml"))?;
/// let summary = run_crawl(config).await?;
/// println!("Stored {} pages", summary.persisted);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> crate::Result<CrawlSummary> {
    let fetcher = Arc::new(HttpFetcher::new(&config.user_agent)?);
    let sink = open_sink(&config.store)?;
    let coordinator = Coordinator::new(config, fetcher, Arc::new(HtmlParser::new()), sink);
    Ok(coordinator.run().await)
}
