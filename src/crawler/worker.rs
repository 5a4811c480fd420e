//! Worker loop
//!
//! Each worker repeatedly takes a target from the frontier and pushes it
//! through fetch → parse → persist → expand. Per-target failures are logged
//! and counted; nothing a single target does can stop the worker.

use crate::crawler::stats::CrawlStats;
use crate::crawler::{
    CrawlTarget, Fetcher, Frontier, FrontierClosed, Page, Parser, WorkerSlot,
};
use crate::sink::Sink;
use crate::url::parse_crawl_url;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything a worker needs, shared by the whole pool
pub(crate) struct WorkerContext {
    pub frontier: Arc<Frontier>,
    pub fetcher: Arc<dyn Fetcher>,
    pub parser: Arc<dyn Parser>,
    pub sink: Arc<dyn Sink>,
    pub stats: Arc<CrawlStats>,
    pub max_depth: u32,
}

/// Whether the worker should keep taking targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Completes a taken target when dropped, including during a panic
struct Completion<'a>(&'a Frontier);

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        self.0.complete();
    }
}

/// Runs one worker until shutdown or frontier exhaustion
///
/// Shutdown is checked before every take; a target already taken is always
/// processed to the end.
pub(crate) async fn run_worker(context: Arc<WorkerContext>, shutdown: CancellationToken) {
    tracing::debug!("Worker started");
    let slot = context.frontier.register_worker();
    let mut processed = 0u64;

    loop {
        let target = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                tracing::debug!("Shutdown observed");
                break;
            }
            next = context.frontier.take() => match next {
                Some(target) => target,
                None => {
                    tracing::debug!("Frontier closed");
                    break;
                }
            },
        };

        let _completion = Completion(&context.frontier);
        processed += 1;

        if context.process(&slot, &target, &shutdown).await == Flow::Stop {
            break;
        }
    }

    tracing::debug!("Worker stopped after {} targets", processed);
}

impl WorkerContext {
    async fn process(
        &self,
        slot: &WorkerSlot<'_>,
        target: &CrawlTarget,
        shutdown: &CancellationToken,
    ) -> Flow {
        if target.depth > self.max_depth {
            tracing::trace!(
                "Discarding {} (depth {} > {})",
                target.url,
                target.depth,
                self.max_depth
            );
            CrawlStats::bump(&self.stats.too_deep);
            return Flow::Continue;
        }

        tracing::debug!("Fetching {} (depth {})", target.url, target.depth);

        let body = match self.fetcher.fetch(&target.url).await {
            Ok(body) => {
                CrawlStats::bump(&self.stats.fetched);
                body
            }
            Err(e) => {
                tracing::warn!("Fetch failed: {}", e);
                CrawlStats::bump(&self.stats.fetch_failed);
                return Flow::Continue;
            }
        };

        let page = match self.parser.parse(&target.url, &body, target.depth) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Parse failed: {}", e);
                CrawlStats::bump(&self.stats.parse_failed);
                return Flow::Continue;
            }
        };

        // Untitled pages are neither stored nor expanded
        if page.title.is_empty() {
            tracing::debug!("Discarding {}: empty title", target.url);
            CrawlStats::bump(&self.stats.untitled);
            return Flow::Continue;
        }

        match self.sink.persist(&page).await {
            Ok(()) => {
                tracing::info!("Stored \"{}\" from {}", page.title, page.url);
                CrawlStats::bump(&self.stats.persisted);
            }
            Err(e) => {
                tracing::error!("Failed to persist {}: {}", page.url, e);
                CrawlStats::bump(&self.stats.persist_failed);
            }
        }

        self.expand(slot, target, &page, shutdown).await
    }

    /// Admits every valid link on `page` one level below `target`
    async fn expand(
        &self,
        slot: &WorkerSlot<'_>,
        target: &CrawlTarget,
        page: &Page,
        shutdown: &CancellationToken,
    ) -> Flow {
        for link in &page.links {
            let url = match parse_crawl_url(link) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Skipping link {}: {}", link, e);
                    CrawlStats::bump(&self.stats.invalid_links);
                    continue;
                }
            };

            // A full frontier must not keep a stopping worker alive
            let admission = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return Flow::Stop,
                admission = slot.admit(target.child(url)) => admission,
            };

            match admission {
                Ok(true) => CrawlStats::bump(&self.stats.admitted),
                Ok(false) => {
                    tracing::trace!("Already visited: {}", link);
                    CrawlStats::bump(&self.stats.duplicates);
                }
                Err(FrontierClosed) => {
                    tracing::debug!("Frontier closed while expanding {}", page.url);
                    return Flow::Stop;
                }
            }
        }

        Flow::Continue
    }
}
