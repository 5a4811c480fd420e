//! File-per-page sink

use crate::crawler::Page;
use crate::sink::traits::{page_key, Sink, SinkResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Writes each page body to `<root>/<key>.html`
#[derive(Debug, Clone)]
pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    /// Opens a sink rooted at `root`, creating the directory if absent
    pub fn create(root: impl Into<PathBuf>) -> SinkResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The directory pages are written into
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a page with `title` is stored
    pub fn path_for(&self, title: &str) -> PathBuf {
        self.root.join(format!("{}.html", page_key(title)))
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn persist(&self, page: &Page) -> SinkResult<()> {
        let path = self.path_for(&page.title);
        tokio::fs::write(&path, &page.body).await?;
        tracing::trace!("Wrote {} bytes to {}", page.body.len(), path.display());
        Ok(())
    }
}
