//! Sink module for persisting crawled pages
//!
//! This module handles durable storage of pages, including:
//! - The [`Sink`] trait the crawler core writes through
//! - A file-per-page backend
//! - A SQLite backend
//!
//! Every backend keys pages by title, so re-persisting a title overwrites.

mod files;
mod schema;
mod sqlite;
mod traits;

pub use files::FileSink;
pub use sqlite::{SqliteSink, StoredPage, DATABASE_FILE};
pub use traits::{page_key, Sink, SinkError, SinkResult};

use crate::config::{StoreBackend, StoreConfig};
use std::path::Path;
use std::sync::Arc;

/// Opens the sink selected by the store configuration
///
/// The store location is created if it does not exist.
///
/// # Arguments
///
/// * `config` - The store configuration
///
/// # Returns
///
/// * `Ok(Arc<dyn Sink>)` - Ready-to-use sink
/// * `Err(SinkError)` - Failed to create the location or open the backend
pub fn open_sink(config: &StoreConfig) -> SinkResult<Arc<dyn Sink>> {
    let location = Path::new(&config.location);

    let sink: Arc<dyn Sink> = match config.backend {
        StoreBackend::Files => Arc::new(FileSink::create(location)?),
        StoreBackend::Sqlite => Arc::new(SqliteSink::create(location)?),
    };

    tracing::debug!(
        "Opened {:?} sink at {}",
        config.backend,
        location.display()
    );

    Ok(sink)
}
