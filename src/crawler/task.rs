//! Recursive crawl task
//!
//! One task fetches one page, records it in the page store and, if the page
//! was new, spawns a task for every in-site link no other task has claimed.
//! A task completes only after all of its children complete, so awaiting the
//! root task awaits the whole crawl tree.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::parse_html;
use crate::storage::{Page, PageStore};
use crate::url::site_path;
use dashmap::DashSet;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

pub(crate) type CrawlFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Everything the tasks of one crawl tree share
pub(crate) struct CrawlContext {
    pub fetcher: Arc<Fetcher>,
    pub store: Arc<dyn PageStore>,
    /// Paths some task of this tree has already taken on
    pub claimed: Arc<DashSet<String>>,
    /// Bounds the number of fetches in flight; closed when the crawl stops
    pub permits: Arc<Semaphore>,
    pub cancelled: Arc<AtomicBool>,
    /// Root URL of the site, used to keep links in-site
    pub site_root: Url,
    /// Record pages whose fetch failed
    pub print_error: bool,
}

impl CrawlContext {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Crawls `page` and everything reachable from it
pub(crate) fn crawl_page(ctx: Arc<CrawlContext>, mut page: Page) -> CrawlFuture {
    Box::pin(async move {
        if ctx.is_cancelled() {
            return;
        }

        let url = page.url();
        let fetched = {
            let Ok(_permit) = ctx.permits.acquire().await else {
                return;
            };
            if ctx.is_cancelled() {
                return;
            }
            tracing::debug!("Fetching {}", url);
            ctx.fetcher.fetch(&url).await
        };

        let fetched = match fetched {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                if ctx.print_error {
                    page.code = e.status_code();
                    page.content = None;
                    if let Err(e) = ctx.store.add(page) {
                        tracing::error!("Failed to store {}: {}", url, e);
                    }
                }
                return;
            }
        };

        let child_paths = match Url::parse(&fetched.final_url) {
            Ok(base) => in_site_links(&fetched.body, &base, &ctx.site_root, &page.path),
            Err(_) => Vec::new(),
        };

        page.code = Some(fetched.status);
        page.content = Some(fetched.body);
        let site_id = page.site_id;
        let site_url = page.site_url.clone();

        match ctx.store.add(page) {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                tracing::error!("Failed to store {}: {}", url, e);
                return;
            }
        }

        let mut children = JoinSet::new();
        for path in child_paths {
            if !ctx.claimed.insert(path.clone()) {
                continue;
            }
            let child = Page::new(site_id, site_url.clone(), path);
            match ctx.store.contains(&child) {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("Failed to check {}: {}", child.url(), e);
                    continue;
                }
            }
            children.spawn(crawl_page(Arc::clone(&ctx), child));
        }

        while let Some(result) = children.join_next().await {
            if let Err(e) = result {
                tracing::error!("Crawl task under {} failed: {}", url, e);
            }
        }
    })
}

/// Distinct in-site paths linked from a page, excluding the page itself
fn in_site_links(html: &str, base: &Url, site_root: &Url, own_path: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    parse_html(html, base)
        .links
        .iter()
        .filter_map(|link| site_path(link, site_root))
        .filter(|path| path != own_path && seen.insert(path.clone()))
        .collect()
}
