//! Storage module for persisting crawl and index data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Site, page, lemma and index entry persistence
//! - Transactional index updates
//! - The two page store backends used while crawling

mod page_store;
mod schema;
mod sqlite;
mod traits;

pub use page_store::{build_page_store, DatabasePageStore, MemoryPageStore};
pub use sqlite::{Database, StoreTx};
pub use traits::{PageStore, StorageError, StorageResult};

use crate::state::SiteStatus;
use chrono::{DateTime, Utc};
use std::hash::{Hash, Hasher};

/// A page of a site, fetched or about to be fetched
///
/// Identity is `(site_id, path)`: two values with the same identity are
/// equal regardless of their content or database id.
#[derive(Debug, Clone)]
pub struct Page {
    /// Database id, set once the page has been persisted
    pub id: Option<i64>,
    pub site_id: i64,
    /// Normalized root URL of the owning site
    pub site_url: String,
    /// Site-relative path, always starting with '/'
    pub path: String,
    /// HTTP status code of the last fetch
    pub code: Option<u16>,
    /// Raw HTML of the last successful fetch
    pub content: Option<String>,
}

impl Page {
    /// Creates an unfetched page
    pub fn new(site_id: i64, site_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: None,
            site_id,
            site_url: site_url.into(),
            path: path.into(),
            code: None,
            content: None,
        }
    }

    /// Absolute URL of the page
    pub fn url(&self) -> String {
        format!("{}{}", self.site_url, self.path)
    }

    /// True if the page has content from a successful fetch
    pub fn is_indexable(&self) -> bool {
        self.content.is_some() && self.code.map_or(false, |code| code < 400)
    }
}

impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        self.site_id == other.site_id && self.path == other.path
    }
}

impl Eq for Page {}

impl Hash for Page {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.site_id.hash(state);
        self.path.hash(state);
    }
}

/// Represents a site in the database
#[derive(Debug, Clone)]
pub struct SiteRecord {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    /// Time of the last heartbeat or status change
    pub status_time: DateTime<Utc>,
    pub last_error: Option<String>,
}

/// Represents a lemma of one site
#[derive(Debug, Clone, PartialEq)]
pub struct LemmaRecord {
    pub id: i64,
    pub site_id: i64,
    pub lemma: String,
    /// Number of distinct pages of the site holding this lemma
    pub frequency: i64,
}

/// Represents an edge of the inverted index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntryRecord {
    pub id: i64,
    pub page_id: i64,
    pub lemma_id: i64,
    /// Occurrences of the lemma on the page
    pub rank: f64,
}
