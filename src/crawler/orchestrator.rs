//! Orchestration of the crawl jobs of every configured site

use crate::config::SiteEntry;
use crate::crawler::job::{JobDeps, SiteCrawlJob};
use crate::JobError;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

/// Owns one [`SiteCrawlJob`] per configured site
///
/// Jobs are built on first use and reused by every later start/stop cycle.
pub struct JobOrchestrator {
    sites: Vec<SiteEntry>,
    deps: JobDeps,
    jobs: OnceLock<Vec<Arc<SiteCrawlJob>>>,
    /// Jobs started by the last `start_all` that may still be running
    active: Mutex<Vec<Arc<SiteCrawlJob>>>,
}

impl JobOrchestrator {
    pub fn new(sites: Vec<SiteEntry>, deps: JobDeps) -> Self {
        Self {
            sites,
            deps,
            jobs: OnceLock::new(),
            active: Mutex::new(Vec::new()),
        }
    }

    /// Every job, in configuration order
    pub fn jobs(&self) -> &[Arc<SiteCrawlJob>] {
        self.jobs.get_or_init(|| {
            self.sites
                .iter()
                .map(|site| Arc::new(SiteCrawlJob::for_site(site, self.deps.clone())))
                .collect()
        })
    }

    fn active(&self) -> MutexGuard<'_, Vec<Arc<SiteCrawlJob>>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// True if at least one job is crawling or flushing
    pub fn is_running(&self) -> bool {
        let mut active = self.active();
        active.retain(|job| job.is_running());
        !active.is_empty()
    }

    /// Wipes all indexed data and starts a crawl of every site
    ///
    /// Every job is started even if an earlier one fails; the first failure
    /// is returned.
    pub fn start_all(&self) -> Result<(), JobError> {
        if self.is_running() {
            return Err(JobError::AlreadyRunning);
        }

        self.deps.db.clear_all()?;
        tracing::info!("Starting indexing of {} sites", self.jobs().len());

        let mut first_error = None;
        for job in self.jobs() {
            match job.start() {
                Ok(()) => self.active().push(Arc::clone(job)),
                Err(e) => {
                    tracing::error!("Failed to start crawling {}: {}", job.url(), e);
                    first_error.get_or_insert(e);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Stops every job and flushes what each has gathered
    ///
    /// Flushing runs in the background; the call returns once every job has
    /// been told to stop.
    pub fn stop_all(&self) -> Result<(), JobError> {
        if !self.is_running() {
            return Err(JobError::NotRunning);
        }

        let mut first_error = None;
        for job in self.jobs() {
            if let Err(e) = job.stop() {
                if !matches!(e, JobError::NotRunning) {
                    tracing::error!("Failed to stop crawling {}: {}", job.url(), e);
                    first_error.get_or_insert(e);
                }
            }
        }

        for job in self.jobs() {
            let job = Arc::clone(job);
            tokio::spawn(async move { job.save_result().await });
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Waits until no job is crawling and every run has been flushed
    pub async fn wait_until_finished(&self) {
        for job in self.jobs() {
            job.save_result().await;
        }
    }
}
