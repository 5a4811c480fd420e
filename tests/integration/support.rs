//! Fakes shared by the integration tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use url::Url;
use weir::config::{Config, CrawlerConfig, SeedEntry, StoreBackend, StoreConfig, UserAgentConfig};
use weir::crawler::{FetchError, Fetcher, Page};
use weir::sink::{Sink, SinkError, SinkResult};

/// Creates a test configuration crawling `seeds`
pub fn create_test_config(seeds: &[&str], max_depth: u32, worker_count: usize) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_depth,
            worker_count,
            queue_capacity: 16,
        },
        user_agent: UserAgentConfig::default(),
        store: StoreConfig {
            location: "unused".to_string(),
            backend: StoreBackend::Files,
        },
        seeds: seeds
            .iter()
            .map(|url| SeedEntry {
                url: url.to_string(),
                origin: None,
            })
            .collect(),
    }
}

/// Builds an HTML document with a title and links
pub fn html(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|link| format!(r#"<a href="{}">link</a>"#, link))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, anchors
    )
}

/// In-memory web that counts fetches per URL
///
/// URLs without a page fail the way an unreachable host would.
#[derive(Default)]
pub struct FakeWeb {
    pages: HashMap<String, Vec<u8>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeWeb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, body: String) -> Self {
        self.raw_page(url, body.into_bytes())
    }

    pub fn raw_page(mut self, url: &str, body: Vec<u8>) -> Self {
        self.pages.insert(url.to_string(), body);
        self
    }

    /// Number of times `url` was fetched
    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    /// Every fetched URL with its fetch count
    pub fn all_calls(&self) -> HashMap<String, usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeWeb {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;

        // Let other workers interleave between fetches
        tokio::task::yield_now().await;

        match self.pages.get(url.as_str()) {
            Some(body) => Ok(body.clone()),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            }),
        }
    }
}

/// Fetcher that parks every fetch until released
pub struct GatedFetcher {
    inner: FakeWeb,
    pub started: Notify,
    pub release: Notify,
}

impl GatedFetcher {
    pub fn new(inner: FakeWeb) -> Self {
        Self {
            inner,
            started: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn calls(&self, url: &str) -> usize {
        self.inner.calls(url)
    }
}

#[async_trait]
impl Fetcher for GatedFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        self.started.notify_one();
        self.release.notified().await;
        self.inner.fetch(url).await
    }
}

/// Sink that keeps every persisted page in memory
#[derive(Default)]
pub struct RecordingSink {
    pages: Mutex<Vec<Page>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = self
            .pages
            .lock()
            .unwrap()
            .iter()
            .map(|page| page.title.clone())
            .collect();
        titles.sort();
        titles
    }
}

#[async_trait]
impl Sink for RecordingSink {
    async fn persist(&self, page: &Page) -> SinkResult<()> {
        self.pages.lock().unwrap().push(page.clone());
        Ok(())
    }
}

/// Sink whose every write fails
#[derive(Default)]
pub struct FailingSink {
    attempts: Mutex<Vec<String>>,
}

impl FailingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Titles of every page a write was attempted for
    pub fn attempts(&self) -> Vec<String> {
        let mut titles = self.attempts.lock().unwrap().clone();
        titles.sort();
        titles
    }
}

#[async_trait]
impl Sink for FailingSink {
    async fn persist(&self, page: &Page) -> SinkResult<()> {
        self.attempts.lock().unwrap().push(page.title.clone());
        Err(SinkError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }
}
