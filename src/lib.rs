//! Lexicrawl: a crawl, index and search engine for a fixed set of sites
//!
//! This crate crawls configured web sites, reduces their text to root forms
//! ("lemmas") in English and Russian, maintains a per-site inverted index in
//! SQLite, and answers ranked full-text queries with highlighted snippets.

pub mod api;
pub mod config;
pub mod crawler;
pub mod indexer;
pub mod lemma;
pub mod output;
pub mod search;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Lexicrawl operations
#[derive(Debug, Error)]
pub enum LexiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("Indexing error: {0}")]
    Index(#[from] IndexError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Failure of a single page fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Unsupported content type '{content_type}' for {url}")]
    UnsupportedContentType {
        url: String,
        status: u16,
        content_type: String,
    },

    #[error("Connection failed for {url}: {source}")]
    Connection { url: String, source: reqwest::Error },

    #[error("Failed to read response from {url}: {source}")]
    Io { url: String, source: reqwest::Error },

    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),
}

impl FetchError {
    /// Status code the server answered with, if it answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } | Self::UnsupportedContentType { status, .. } => {
                Some(*status)
            }
            Self::Connection { source, .. } | Self::Io { source, .. } => {
                source.status().map(|status| status.as_u16())
            }
            Self::Client(_) => None,
        }
    }
}

/// Errors of crawl job start/stop requests
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Indexing is already running")]
    AlreadyRunning,

    #[error("Indexing is not running")]
    NotRunning,

    #[error("Site {url} cannot be crawled: {reason}")]
    InvalidSite { url: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),
}

/// Errors of on-demand page indexing
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Invalid page URL: {0}")]
    InvalidUrl(String),

    #[error("Page {0} is outside the configured sites")]
    SiteNotConfigured(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Indexing task failed: {0}")]
    Task(String),
}

/// Errors of search requests
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Empty search query")]
    EmptyQuery,

    #[error("Nothing found")]
    NoResults,

    #[error("Site {0} is not indexed")]
    UnknownSite(String),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),
}

/// Result type alias for Lexicrawl operations
pub type Result<T> = std::result::Result<T, LexiError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Result type alias for indexing operations
pub type IndexResult<T> = std::result::Result<T, IndexError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Fetcher, JobOrchestrator};
pub use indexer::Indexer;
pub use lemma::Lemmatizer;
pub use search::SearchEngine;
pub use state::{JobState, SiteStatus};
pub use storage::{Database, Page};
