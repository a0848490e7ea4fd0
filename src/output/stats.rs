//! Statistics of the index
//!
//! This module extracts site, page and lemma counts from the database and
//! displays them on the console or serializes them for the API.

use crate::state::SiteStatus;
use crate::storage::{Database, StorageResult};
use serde::Serialize;

/// Index statistics summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total: TotalStatistics,
    pub detailed: Vec<SiteStatistics>,
}

/// Totals across every site
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalStatistics {
    pub sites: i64,
    pub pages: i64,
    pub lemmas: i64,

    /// True while any crawl job is running
    pub indexing: bool,
}

/// Counts and crawl status of one site
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatistics {
    pub url: String,
    pub name: String,
    pub status: SiteStatus,

    /// Last status change, in milliseconds since the Unix epoch
    pub status_time: i64,

    /// Error of the last failed crawl, empty when there is none
    pub error: String,
    pub pages: i64,
    pub lemmas: i64,
}

/// Loads statistics from the database
///
/// # Arguments
///
/// * `db` - The database to query
/// * `indexing` - Whether a crawl is currently running
pub fn load_statistics(db: &Database, indexing: bool) -> StorageResult<Statistics> {
    let detailed = db
        .list_sites()?
        .into_iter()
        .map(|site| {
            Ok(SiteStatistics {
                pages: db.count_pages(Some(site.id))?,
                lemmas: db.count_lemmas(Some(site.id))?,
                status_time: site.status_time.timestamp_millis(),
                error: site.last_error.unwrap_or_default(),
                url: site.url,
                name: site.name,
                status: site.status,
            })
        })
        .collect::<StorageResult<Vec<_>>>()?;

    Ok(Statistics {
        total: TotalStatistics {
            sites: db.count_sites()?,
            pages: db.count_pages(None)?,
            lemmas: db.count_lemmas(None)?,
            indexing,
        },
        detailed,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &Statistics) {
    println!("=== Index Statistics ===\n");

    println!("Overview:");
    println!("  Sites: {}", stats.total.sites);
    println!("  Pages: {}", stats.total.pages);
    println!("  Lemmas: {}", stats.total.lemmas);
    println!(
        "  Indexing: {}",
        if stats.total.indexing { "running" } else { "idle" }
    );
    println!();

    if stats.detailed.is_empty() {
        println!("No sites have been crawled yet.");
        return;
    }

    println!("Sites:");
    for site in &stats.detailed {
        println!("  {} ({})", site.name, site.url);
        println!("    Status: {}", site.status);
        println!("    Pages: {}, lemmas: {}", site.pages, site.lemmas);
        if !site.error.is_empty() {
            println!("    Last error: {}", site.error);
        }
    }
}
