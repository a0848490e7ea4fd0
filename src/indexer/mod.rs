//! Inverted index maintenance
//!
//! Indexing a page replaces its index entries with the lemma counts of its
//! visible text and keeps every lemma's `frequency` equal to the number of
//! pages of the site that hold it. All changes for one page happen in one
//! transaction.

use crate::config::SiteEntry;
use crate::crawler::Fetcher;
use crate::lemma::Lemmatizer;
use crate::state::SiteStatus;
use crate::storage::{Database, Page, StorageError, StorageResult, StoreTx};
use crate::url::{locate_page, normalize_site_url};
use crate::{IndexError, IndexResult};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use url::Url;

/// Pages indexed concurrently on behalf of on-demand requests
const ON_DEMAND_POOL_SIZE: usize = 4;

/// Maintains the inverted index of pages, lemmas and index entries
pub struct Indexer {
    db: Arc<Database>,
    lemmatizer: Arc<Lemmatizer>,
    on_demand: Arc<Semaphore>,
}

impl Indexer {
    pub fn new(db: Arc<Database>, lemmatizer: Arc<Lemmatizer>) -> Self {
        Self {
            db,
            lemmatizer,
            on_demand: Arc::new(Semaphore::new(ON_DEMAND_POOL_SIZE)),
        }
    }

    /// Indexes one stored page
    ///
    /// Pages without content or with a status of 400 and above are skipped
    /// and `Ok(false)` is returned. Existing entries of the page are removed
    /// first, so indexing the same content twice gives the same result.
    pub fn index_page(&self, page: &Page) -> StorageResult<bool> {
        let Some(content) = page.content.as_deref().filter(|_| page.is_indexable()) else {
            tracing::debug!("Skipping {} (status {:?})", page.url(), page.code);
            return Ok(false);
        };

        let text = self.lemmatizer.html_to_text(content);
        let lemmas = self.lemmatizer.lemmas_of(&text);

        self.db.write(|tx| {
            let page_id = resolve_page_id(tx, page)?.ok_or_else(|| StorageError::PageNotFound(page.url()))?;
            deindex_in(tx, page_id)?;

            for (lemma, count) in &lemmas {
                let (record, created) = tx.insert_lemma_if_absent(page.site_id, lemma)?;
                if !created && !tx.has_index_entry(page_id, record.id)? {
                    tx.set_lemma_frequency(record.id, record.frequency + 1)?;
                }
                tx.upsert_index_entry(page_id, record.id, *count as f64)?;
            }
            Ok(())
        })?;

        tracing::debug!("Indexed {} ({} lemmas)", page.url(), lemmas.len());
        Ok(true)
    }

    /// Removes a page's index entries and releases its lemmas
    pub fn deindex_page(&self, page: &Page) -> StorageResult<()> {
        self.db.write(|tx| match resolve_page_id(tx, page)? {
            Some(page_id) => deindex_in(tx, page_id),
            None => Ok(()),
        })
    }

    /// De-indexes a page and deletes it
    pub fn remove_page(&self, page: &Page) -> StorageResult<()> {
        self.db.write(|tx| {
            if let Some(page_id) = resolve_page_id(tx, page)? {
                deindex_in(tx, page_id)?;
                tx.delete_page(page_id)?;
            }
            Ok(())
        })
    }

    /// Indexes a batch of stored pages in parallel
    ///
    /// Runs on a blocking pool bounded to `pages / 100 + 1` workers. Failures
    /// are logged and do not stop the batch. Returns the number of pages
    /// that were indexed.
    pub async fn index_pages(self: &Arc<Self>, pages: Vec<Page>) -> usize {
        let workers = Arc::new(Semaphore::new(pages.len() / 100 + 1));
        let mut tasks = JoinSet::new();

        for page in pages {
            let Ok(permit) = Arc::clone(&workers).acquire_owned().await else {
                break;
            };
            let indexer = Arc::clone(self);
            tasks.spawn_blocking(move || {
                let _permit = permit;
                indexer.index_page(&page).map_err(|e| (page.url(), e))
            });
        }

        let mut indexed = 0;
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(Ok(true)) => indexed += 1,
                Ok(Ok(false)) => {}
                Ok(Err((url, e))) => tracing::error!("Failed to index {}: {}", url, e),
                Err(e) => tracing::error!("Indexing task failed: {}", e),
            }
        }
        indexed
    }

    /// Fetches one page of a configured site and indexes it in the background
    ///
    /// The URL is validated, fetched and stored before this returns; the
    /// de-index and index work runs on a bounded pool. Failures of the
    /// background part are logged and also reported through the handle.
    pub async fn index_url(
        self: &Arc<Self>,
        fetcher: &Fetcher,
        sites: &[SiteEntry],
        url: &str,
    ) -> IndexResult<JoinHandle<IndexResult<()>>> {
        let parsed = Url::parse(url.trim()).map_err(|_| IndexError::InvalidUrl(url.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(IndexError::InvalidUrl(url.to_string()));
        }

        let roots: Vec<String> = sites
            .iter()
            .filter_map(|site| normalize_site_url(&site.url).ok())
            .collect();
        let (root, path) = locate_page(parsed.as_str(), &roots)
            .ok_or_else(|| IndexError::SiteNotConfigured(url.to_string()))?;
        let name = sites
            .iter()
            .find(|site| normalize_site_url(&site.url).ok().as_deref() == Some(root))
            .map_or(root, |site| site.name.as_str());

        let site = self.db.ensure_site(root, name, SiteStatus::Indexed)?;
        let mut page = Page::new(site.id, site.url.clone(), path);

        let fetched = fetcher.fetch(&page.url()).await?;
        page.code = Some(fetched.status);
        page.content = Some(fetched.body);
        page.id = Some(self.db.upsert_page(&page)?);
        tracing::info!("Queued {} for indexing", page.url());

        let indexer = Arc::clone(self);
        let pool = Arc::clone(&self.on_demand);
        Ok(tokio::spawn(async move {
            let _permit = pool
                .acquire_owned()
                .await
                .map_err(|e| IndexError::Task(e.to_string()))?;

            let url = page.url();
            let result = tokio::task::spawn_blocking(move || indexer.index_page(&page))
                .await
                .map_err(|e| IndexError::Task(e.to_string()))
                .and_then(|indexed| indexed.map_err(IndexError::from));

            match &result {
                Ok(_) => tracing::info!("Indexed {}", url),
                Err(e) => tracing::error!("Failed to index {}: {}", url, e),
            }
            result.map(|_| ())
        }))
    }
}

impl std::fmt::Debug for Indexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indexer").finish_non_exhaustive()
    }
}

fn resolve_page_id(tx: &StoreTx<'_>, page: &Page) -> StorageResult<Option<i64>> {
    match page.id {
        Some(id) => Ok(Some(id)),
        None => tx.page_id(page.site_id, &page.path),
    }
}

/// Decrements the lemmas of a page, deleting those that reach zero, then
/// drops the page's entries
fn deindex_in(tx: &StoreTx<'_>, page_id: i64) -> StorageResult<()> {
    for entry in tx.page_index_entries(page_id)? {
        let Some(lemma) = tx.get_lemma(entry.lemma_id)? else {
            continue;
        };
        if lemma.frequency <= 1 {
            tx.delete_lemma(lemma.id)?;
        } else {
            tx.set_lemma_frequency(lemma.id, lemma.frequency - 1)?;
        }
    }
    tx.delete_page_index_entries(page_id)
}
