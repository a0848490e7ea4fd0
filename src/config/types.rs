use serde::Deserialize;

/// Main configuration structure for Lexicrawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the API listens on
    #[serde(rename = "bind-address", default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header sent with every fetch
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Referer header sent with every fetch
    #[serde(default = "default_referrer")]
    pub referrer: String,

    /// Sleep a random 0..2000ms before each fetch
    #[serde(rename = "simulate-latency", default)]
    pub simulate_latency: bool,

    /// Persist pages whose fetch failed (with their status code and no content)
    #[serde(rename = "print-error", default)]
    pub print_error: bool,

    /// Maximum number of fetches in flight per site
    #[serde(rename = "max-concurrent-fetches", default = "default_concurrency")]
    pub max_concurrent_fetches: u32,

    /// Number of newly stored pages between two site heartbeats
    #[serde(rename = "heartbeat-page-count", default = "default_heartbeat")]
    pub heartbeat_page_count: u32,

    /// Whole-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Which page store backs a crawl
    #[serde(default)]
    pub storage: StorageKind,
}

/// Page store backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Pages accumulate in memory and are persisted when the crawl ends
    #[default]
    Memory,
    /// Pages are persisted and indexed as soon as they are fetched
    Database,
}

/// Search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Lemmas found on more pages than this are treated as noise
    #[serde(rename = "noise-frequency-ceiling", default = "default_ceiling")]
    pub noise_frequency_ceiling: u32,

    /// Characters of context kept on each side of a match
    #[serde(rename = "snippet-window-length", default = "default_window")]
    pub snippet_window_length: usize,

    /// Page size used when a request omits `limit`
    #[serde(rename = "default-limit", default = "default_limit")]
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            noise_frequency_ceiling: default_ceiling(),
            snippet_window_length: default_window(),
            default_limit: default_limit(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
}

/// A site to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    /// Root URL of the site (e.g., "https://example.com")
    pub url: String,

    /// Display name
    pub name: String,
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_referrer() -> String {
    "https://www.google.com".to_string()
}

fn default_concurrency() -> u32 {
    16
}

fn default_heartbeat() -> u32 {
    10
}

fn default_timeout() -> u64 {
    30
}

fn default_ceiling() -> u32 {
    200
}

fn default_window() -> usize {
    120
}

fn default_limit() -> usize {
    20
}
