//! Crawl job of a single site
//!
//! A job owns one crawl run at a time. `start` launches the crawl tree on a
//! supervisor task; the supervisor marks the run finished when the tree
//! completes, then flushes the page store and indexes what it returned.

use crate::config::{CrawlerConfig, SiteEntry};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::task::{crawl_page, CrawlContext};
use crate::indexer::Indexer;
use crate::state::{JobState, SiteStatus};
use crate::storage::{build_page_store, Database, Page, PageStore};
use crate::JobError;
use dashmap::DashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use url::Url;

/// Message recorded on a site whose crawl was stopped
pub const STOPPED_BY_USER: &str = "Indexing stopped by user";

/// Shared services a job needs
#[derive(Clone)]
pub struct JobDeps {
    pub db: Arc<Database>,
    pub indexer: Arc<Indexer>,
    pub fetcher: Arc<Fetcher>,
    pub crawler: CrawlerConfig,
}

/// Handles of one crawl run, shared with its supervisor
struct CrawlRun {
    site_id: i64,
    store: Arc<dyn PageStore>,
    permits: Arc<Semaphore>,
    cancelled: Arc<AtomicBool>,
    /// Set once the run's pages have been flushed
    saved: AtomicBool,
    /// Flips to true after the crawl tree completed and the flush ended
    done: watch::Sender<bool>,
}

struct JobInner {
    state: JobState,
    run: Option<Arc<CrawlRun>>,
    supervisor: Option<JoinHandle<()>>,
}

impl JobInner {
    /// True while the run is crawling or its pages are still being flushed
    fn is_busy(&self) -> bool {
        if self.state.is_running() {
            return true;
        }
        let flushing = self
            .run
            .as_ref()
            .is_some_and(|run| !*run.done.borrow());
        // a supervisor that died before flushing is handled by `save_result`
        let supervisor_alive = self
            .supervisor
            .as_ref()
            .map_or(true, |handle| !handle.is_finished());
        flushing && supervisor_alive
    }
}

/// Crawl job of one configured site
pub struct SiteCrawlJob {
    /// Normalized root URL
    url: String,
    name: String,
    deps: JobDeps,
    inner: Mutex<JobInner>,
}

impl SiteCrawlJob {
    pub fn new(url: impl Into<String>, name: impl Into<String>, deps: JobDeps) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            deps,
            inner: Mutex::new(JobInner {
                state: JobState::Idle,
                run: None,
                supervisor: None,
            }),
        }
    }

    /// Builds a job for a configured site entry
    pub fn for_site(site: &SiteEntry, deps: JobDeps) -> Self {
        let url = crate::url::normalize_site_url(&site.url)
            .unwrap_or_else(|_| site.url.trim_end_matches('/').to_string());
        Self::new(url, site.name.clone(), deps)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> JobState {
        self.lock().state
    }

    /// True until the current run has stopped crawling and flushed its pages
    pub fn is_running(&self) -> bool {
        self.lock().is_busy()
    }

    fn lock(&self) -> MutexGuard<'_, JobInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Starts a new crawl run
    ///
    /// Resets the site record to CRAWLING, creates a fresh page store and
    /// launches the crawl of "/" in the background.
    pub fn start(self: &Arc<Self>) -> Result<(), JobError> {
        let mut inner = self.lock();
        if inner.is_busy() {
            return Err(JobError::AlreadyRunning);
        }

        let root = Url::parse(&self.url).map_err(|e| JobError::InvalidSite {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        let site = self.deps.db.upsert_site_for_crawl(&self.url, &self.name)?;
        let run = Arc::new(CrawlRun {
            site_id: site.id,
            store: build_page_store(
                self.deps.crawler.storage,
                Arc::clone(&self.deps.db),
                Arc::clone(&self.deps.indexer),
                site.id,
                self.deps.crawler.heartbeat_page_count as usize,
            ),
            permits: Arc::new(Semaphore::new(
                self.deps.crawler.max_concurrent_fetches as usize,
            )),
            cancelled: Arc::new(AtomicBool::new(false)),
            saved: AtomicBool::new(false),
            done: watch::channel(false).0,
        });

        let ctx = Arc::new(CrawlContext {
            fetcher: Arc::clone(&self.deps.fetcher),
            store: Arc::clone(&run.store),
            claimed: Arc::new(DashSet::from_iter(["/".to_string()])),
            permits: Arc::clone(&run.permits),
            cancelled: Arc::clone(&run.cancelled),
            site_root: root,
            print_error: self.deps.crawler.print_error,
        });
        let root_page = Page::new(site.id, self.url.clone(), "/");

        let job = Arc::clone(self);
        let supervised = Arc::clone(&run);
        let supervisor = tokio::spawn(async move {
            crawl_page(ctx, root_page).await;
            job.complete(&supervised).await;
            supervised.done.send_replace(true);
        });

        inner.run = Some(run);
        inner.supervisor = Some(supervisor);
        inner.state = JobState::Running;

        tracing::info!("Started crawling {} ({})", self.name, self.url);
        Ok(())
    }

    /// Stops the current run
    ///
    /// Fails if the job was never started and does nothing if the run has
    /// already finished. Fetches in flight complete, but none of their
    /// links are followed.
    pub fn stop(&self) -> Result<(), JobError> {
        let site_id = {
            let mut inner = self.lock();
            match inner.state {
                JobState::Idle => return Err(JobError::NotRunning),
                JobState::FinishedOk | JobState::FinishedError => return Ok(()),
                JobState::Running => {}
            }

            inner.state = JobState::FinishedError;
            let Some(run) = inner.run.as_ref() else {
                return Ok(());
            };
            run.cancelled.store(true, Ordering::SeqCst);
            run.permits.close();
            run.site_id
        };

        tracing::info!("Stopped crawling {}", self.url);
        self.deps
            .db
            .finish_site(site_id, SiteStatus::Failed, Some(STOPPED_BY_USER))?;
        Ok(())
    }

    /// Waits until the current run's crawl tree has completed and its pages
    /// have been flushed
    ///
    /// Safe to call from several tasks at once. The caller that takes the
    /// supervisor handle also flushes if the supervisor panicked.
    pub async fn save_result(&self) {
        let (run, supervisor) = {
            let mut inner = self.lock();
            (inner.run.clone(), inner.supervisor.take())
        };
        let Some(run) = run else {
            return;
        };

        match supervisor {
            Some(handle) => {
                if let Err(e) = handle.await {
                    tracing::error!("Crawl supervisor for {} failed: {}", self.url, e);
                    self.flush(&run).await;
                    run.done.send_replace(true);
                }
            }
            None => {
                // `run` owns the sender, so the channel cannot close here
                let _ = run.done.subscribe().wait_for(|done| *done).await;
            }
        }
    }

    /// Called by the supervisor once the crawl tree of `run` has completed
    async fn complete(&self, run: &Arc<CrawlRun>) {
        run.permits.close();

        let finished = {
            let mut inner = self.lock();
            let current = inner
                .run
                .as_ref()
                .map_or(false, |active| Arc::ptr_eq(active, run));
            let finished = current && inner.state.is_running();
            if finished {
                inner.state = JobState::FinishedOk;
            }
            finished
        };

        if finished {
            tracing::info!("Finished crawling {}", self.url);
            if let Err(e) = self
                .deps
                .db
                .finish_site(run.site_id, SiteStatus::Indexed, None)
            {
                tracing::error!("Failed to mark {} as indexed: {}", self.url, e);
            }
        }

        self.flush(run).await;
    }

    /// Persists the run's pages and indexes them
    async fn flush(&self, run: &CrawlRun) {
        if run.saved.swap(true, Ordering::SeqCst) {
            return;
        }

        let pages = match run.store.save() {
            Ok(pages) => pages,
            Err(e) => {
                tracing::error!("Failed to save pages of {}: {}", self.url, e);
                return;
            }
        };

        let total = pages.len();
        let indexed = self.deps.indexer.index_pages(pages).await;
        tracing::info!("Saved {} pages of {}, indexed {}", total, self.url, indexed);
    }
}
