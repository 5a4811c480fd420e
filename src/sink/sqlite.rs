//! SQLite sink implementation
//!
//! Stores every page as a row keyed by its title in `<location>/pages.db`.

use crate::crawler::Page;
use crate::sink::schema::initialize_schema;
use crate::sink::traits::{Sink, SinkResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// File name of the database inside the store location
pub const DATABASE_FILE: &str = "pages.db";

/// A page row as stored in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPage {
    pub title: String,
    pub url: String,
    pub depth: u32,
    pub body: Vec<u8>,
    pub stored_at: String,
}

/// SQLite-backed [`Sink`]
pub struct SqliteSink {
    conn: Mutex<Connection>,
}

impl SqliteSink {
    /// Opens (or creates) `<dir>/pages.db`, creating `dir` if absent
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Successfully opened/created database
    /// * `Err(SinkError)` - Failed to create the directory or open the database
    pub fn create(dir: &Path) -> SinkResult<Self> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join(DATABASE_FILE))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> SinkResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Writes a page, replacing any row with the same title
    pub fn store(&self, page: &Page) -> SinkResult<()> {
        let now = Utc::now().to_rfc3339();
        self.lock_conn().execute(
            "INSERT INTO pages (title, url, depth, body, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(title) DO UPDATE SET
                url = excluded.url,
                depth = excluded.depth,
                body = excluded.body,
                stored_at = excluded.stored_at",
            params![page.title, page.url.as_str(), page.depth, page.body, now],
        )?;
        Ok(())
    }

    /// Gets a stored page by title
    pub fn get(&self, title: &str) -> SinkResult<Option<StoredPage>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT title, url, depth, body, stored_at FROM pages WHERE title = ?1",
        )?;

        let page = stmt
            .query_row(params![title], |row| {
                Ok(StoredPage {
                    title: row.get(0)?,
                    url: row.get(1)?,
                    depth: row.get(2)?,
                    body: row.get(3)?,
                    stored_at: row.get(4)?,
                })
            })
            .optional()?;

        Ok(page)
    }

    /// Counts stored pages
    pub fn count(&self) -> SinkResult<u64> {
        let count: i64 = self
            .lock_conn()
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Sink for SqliteSink {
    async fn persist(&self, page: &Page) -> SinkResult<()> {
        self.store(page)
    }
}
