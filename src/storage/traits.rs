//! Storage traits and error types
//!
//! This module defines the page store contract shared by the crawl tree and
//! the error type of every persistence operation.

use crate::storage::Page;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Site not found: {0}")]
    SiteNotFound(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Deduplicating container for the pages discovered during one crawl
///
/// Pages are identified by `(site_id, path)`. Implementations are shared by
/// every task of a crawl tree, so all methods take `&self`.
pub trait PageStore: Send + Sync {
    /// Returns true if a page with the same identity has been added
    fn contains(&self, page: &Page) -> StorageResult<bool>;

    /// Adds a page
    ///
    /// Returns true iff the page was not present. Concurrent calls for the
    /// same identity return true at most once; the caller must not follow
    /// links of a page whose `add` returned false.
    fn add(&self, page: Page) -> StorageResult<bool>;

    /// Number of pages added so far
    fn size(&self) -> StorageResult<usize>;

    /// Removes a page
    fn remove(&self, page: &Page) -> StorageResult<()>;

    /// Replaces the stored copy of a page and refreshes the site heartbeat
    fn update(&self, page: &Page) -> StorageResult<()>;

    /// Flushes accumulated pages to the database and returns them with ids
    fn save(&self) -> StorageResult<Vec<Page>>;

    /// Current contents of the store
    fn snapshot(&self) -> StorageResult<HashSet<Page>>;
}
