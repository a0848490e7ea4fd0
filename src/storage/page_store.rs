//! Page store backends
//!
//! `MemoryPageStore` keeps the crawl in a concurrent map and writes it to the
//! database in one batch when the crawl ends. `DatabasePageStore` writes and
//! indexes every page as soon as it is added.

use crate::config::StorageKind;
use crate::indexer::Indexer;
use crate::storage::traits::{PageStore, StorageResult};
use crate::storage::{Database, Page};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds the page store selected in the configuration for one site
pub fn build_page_store(
    kind: StorageKind,
    db: Arc<Database>,
    indexer: Arc<Indexer>,
    site_id: i64,
    heartbeat_page_count: usize,
) -> Arc<dyn PageStore> {
    match kind {
        StorageKind::Memory => Arc::new(MemoryPageStore::new(db, site_id, heartbeat_page_count)),
        StorageKind::Database => Arc::new(DatabasePageStore::new(db, indexer, site_id)),
    }
}

/// In-process page set flushed to the database by `save`
pub struct MemoryPageStore {
    db: Arc<Database>,
    site_id: i64,
    heartbeat_page_count: usize,
    pages: DashMap<(i64, String), Page>,
    /// Store size at the last heartbeat
    last_heartbeat: AtomicUsize,
}

impl MemoryPageStore {
    pub fn new(db: Arc<Database>, site_id: i64, heartbeat_page_count: usize) -> Self {
        Self {
            db,
            site_id,
            heartbeat_page_count: heartbeat_page_count.max(1),
            pages: DashMap::new(),
            last_heartbeat: AtomicUsize::new(0),
        }
    }

    fn key(page: &Page) -> (i64, String) {
        (page.site_id, page.path.clone())
    }

    /// Touches the site once per `heartbeat_page_count` added pages
    fn heartbeat(&self) {
        let size = self.pages.len();
        let last = self.last_heartbeat.load(Ordering::SeqCst);

        if size < last + self.heartbeat_page_count {
            return;
        }

        if self
            .last_heartbeat
            .compare_exchange(last, size, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            debug!(site_id = self.site_id, pages = size, "Site heartbeat");
            if let Err(e) = self.db.touch_site(self.site_id) {
                warn!(site_id = self.site_id, "Failed to update site heartbeat: {}", e);
            }
        }
    }
}

impl PageStore for MemoryPageStore {
    fn contains(&self, page: &Page) -> StorageResult<bool> {
        Ok(self.pages.contains_key(&Self::key(page)))
    }

    fn add(&self, page: Page) -> StorageResult<bool> {
        let inserted = match self.pages.entry(Self::key(&page)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(page);
                true
            }
        };

        if inserted {
            self.heartbeat();
        }
        Ok(inserted)
    }

    fn size(&self) -> StorageResult<usize> {
        Ok(self.pages.len())
    }

    fn remove(&self, page: &Page) -> StorageResult<()> {
        self.pages.remove(&Self::key(page));
        Ok(())
    }

    fn update(&self, page: &Page) -> StorageResult<()> {
        if let Some(mut stored) = self.pages.get_mut(&Self::key(page)) {
            *stored = page.clone();
        }
        self.db.touch_site(self.site_id)
    }

    fn save(&self) -> StorageResult<Vec<Page>> {
        let pages: Vec<Page> = self.pages.iter().map(|entry| entry.value().clone()).collect();
        debug!(site_id = self.site_id, pages = pages.len(), "Flushing pages");
        self.db.save_pages(pages)
    }

    fn snapshot(&self) -> StorageResult<HashSet<Page>> {
        Ok(self.pages.iter().map(|entry| entry.value().clone()).collect())
    }
}

/// Page store backed directly by the database
///
/// Every newly added page is indexed immediately, so `save` has nothing to
/// flush.
pub struct DatabasePageStore {
    db: Arc<Database>,
    indexer: Arc<Indexer>,
    site_id: i64,
}

impl DatabasePageStore {
    pub fn new(db: Arc<Database>, indexer: Arc<Indexer>, site_id: i64) -> Self {
        Self {
            db,
            indexer,
            site_id,
        }
    }
}

impl PageStore for DatabasePageStore {
    fn contains(&self, page: &Page) -> StorageResult<bool> {
        self.db.page_exists(page.site_id, &page.path)
    }

    fn add(&self, mut page: Page) -> StorageResult<bool> {
        let Some(id) = self.db.insert_page(&page)? else {
            return Ok(false);
        };
        page.id = Some(id);

        if let Err(e) = self.indexer.index_page(&page) {
            warn!(url = %page.url(), "Failed to index page: {}", e);
        }
        if let Err(e) = self.db.touch_site(self.site_id) {
            warn!(site_id = self.site_id, "Failed to update site heartbeat: {}", e);
        }
        Ok(true)
    }

    fn size(&self) -> StorageResult<usize> {
        let count = self.db.count_pages(Some(self.site_id))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn remove(&self, page: &Page) -> StorageResult<()> {
        self.indexer.remove_page(page)
    }

    fn update(&self, page: &Page) -> StorageResult<()> {
        self.db.update_page(page)?;
        self.db.touch_site(self.site_id)
    }

    fn save(&self) -> StorageResult<Vec<Page>> {
        Ok(Vec::new())
    }

    fn snapshot(&self) -> StorageResult<HashSet<Page>> {
        Ok(self.db.list_pages(self.site_id)?.into_iter().collect())
    }
}
