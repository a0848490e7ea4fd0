//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl-then-index cycle end-to-end.

use lexicrawl::config::{CrawlerConfig, SiteEntry, StorageKind};
use lexicrawl::crawler::{Fetcher, JobDeps, JobOrchestrator, STOPPED_BY_USER};
use lexicrawl::indexer::Indexer;
use lexicrawl::lemma::Lemmatizer;
use lexicrawl::storage::Database;
use lexicrawl::{IndexError, JobError, SiteStatus};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn crawler_config(storage: StorageKind, print_error: bool) -> CrawlerConfig {
    CrawlerConfig {
        user_agent: "TestBot/1.0".to_string(),
        referrer: "https://referrer.test".to_string(),
        simulate_latency: false,
        print_error,
        max_concurrent_fetches: 4,
        heartbeat_page_count: 1,
        request_timeout_secs: 5,
        storage,
    }
}

fn deps(crawler: CrawlerConfig) -> JobDeps {
    let db = Arc::new(Database::open_in_memory().unwrap());
    JobDeps {
        indexer: Arc::new(Indexer::new(db.clone(), Arc::new(Lemmatizer::new()))),
        fetcher: Arc::new(Fetcher::new(&crawler).unwrap()),
        db,
        crawler,
    }
}

fn site(server: &MockServer) -> SiteEntry {
    SiteEntry {
        url: server.uri(),
        name: "Mock".to_string(),
    }
}

async fn mount_html(server: &MockServer, page: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .expect(1)
        .mount(server)
        .await;
}

/// A three-page site with an external link, a binary resource and a dead link
async fn mount_site(server: &MockServer) {
    mount_html(
        server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <a href="/animals">Animals</a>
            <a href="/plants">Plants</a>
            <a href="/logo.png">Logo</a>
            <a href="/missing">Missing</a>
            <a href="https://elsewhere.test/page">Elsewhere</a>
        </body></html>"#
            .to_string(),
    )
    .await;

    mount_html(
        server,
        "/animals",
        r#"<html><head><title>Animals</title></head><body>
            <p>Elephants and cats live here.</p>
            <a href="/">Home</a> <a href="/plants">Plants</a>
        </body></html>"#
            .to_string(),
    )
    .await;

    mount_html(
        server,
        "/plants",
        r#"<html><head><title>Plants</title></head><body>
            <p>Trees grow slowly.</p>
            <a href="/animals?sort=asc">Animals</a>
        </body></html>"#
            .to_string(),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8, 1, 2, 3], "image/png"))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(server)
        .await;
}

async fn crawl_site(storage: StorageKind) {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let deps = deps(crawler_config(storage, false));
    let db = deps.db.clone();
    let orchestrator = JobOrchestrator::new(vec![site(&server)], deps);

    orchestrator.start_all().unwrap();
    orchestrator.wait_until_finished().await;
    assert!(!orchestrator.is_running());

    let record = db.get_site_by_url(&server.uri()).unwrap().unwrap();
    assert_eq!(record.status, SiteStatus::Indexed);
    assert_eq!(record.last_error, None);

    let mut paths: Vec<String> = db
        .list_pages(record.id)
        .unwrap()
        .into_iter()
        .map(|page| page.path)
        .collect();
    paths.sort();
    assert_eq!(paths, vec!["/", "/animals", "/plants"]);

    let elephant = Lemmatizer::new().normalize("elephants").unwrap();
    let lemmas = db.find_lemmas(record.id, &[elephant]).unwrap();
    assert_eq!(lemmas.len(), 1);
    assert_eq!(lemmas[0].frequency, 1);
}

#[tokio::test]
async fn test_crawl_with_memory_store() {
    crawl_site(StorageKind::Memory).await;
}

#[tokio::test]
async fn test_crawl_with_database_store() {
    crawl_site(StorageKind::Database).await;
}

/// Every page links to every other page, so sibling tasks race for the
/// same links; each page must still be fetched exactly once
async fn crawl_densely_linked_site(storage: StorageKind) {
    let server = MockServer::start().await;
    let routes: Vec<String> = (0..12).map(|i| format!("/topic{i}")).collect();
    let links: String = std::iter::once("/".to_string())
        .chain(routes.iter().cloned())
        .map(|route| format!(r#"<a href="{route}">{route}</a>"#))
        .collect();

    mount_html(&server, "/", format!("<p>index</p>{links}")).await;
    for route in &routes {
        mount_html(&server, route, format!("<p>topic</p>{links}")).await;
    }

    let deps = deps(crawler_config(storage, false));
    let db = deps.db.clone();
    let orchestrator = JobOrchestrator::new(vec![site(&server)], deps);

    orchestrator.start_all().unwrap();
    orchestrator.wait_until_finished().await;

    let record = db.get_site_by_url(&server.uri()).unwrap().unwrap();
    assert_eq!(db.count_pages(Some(record.id)).unwrap(), 13);

    let topic = Lemmatizer::new().normalize("topic").unwrap();
    assert_eq!(db.find_lemmas(record.id, &[topic]).unwrap()[0].frequency, 12);

    // the `expect(1)` on every mock is checked here
    server.verify().await;
}

#[tokio::test]
async fn test_each_page_fetched_once_with_memory_store() {
    crawl_densely_linked_site(StorageKind::Memory).await;
}

#[tokio::test]
async fn test_each_page_fetched_once_with_database_store() {
    crawl_densely_linked_site(StorageKind::Database).await;
}

#[tokio::test]
async fn test_failed_fetches_are_recorded_when_enabled() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let deps = deps(crawler_config(StorageKind::Memory, true));
    let db = deps.db.clone();
    let orchestrator = JobOrchestrator::new(vec![site(&server)], deps);

    orchestrator.start_all().unwrap();
    orchestrator.wait_until_finished().await;

    let record = db.get_site_by_url(&server.uri()).unwrap().unwrap();
    let missing = db.get_page(record.id, "/missing").unwrap().unwrap();
    assert_eq!(missing.code, Some(404));
    assert_eq!(missing.content, None);

    let logo = db.get_page(record.id, "/logo.png").unwrap().unwrap();
    assert_eq!(logo.code, Some(200));
    assert_eq!(logo.content, None);
}

/// Stops a crawl while the root fetch is in flight
///
/// The fetch still completes, and its page is saved and indexed before the
/// job counts as finished.
async fn start_twice_then_stop(storage: StorageKind) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<p>slow</p>", "text/html")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let deps = deps(crawler_config(storage, false));
    let db = deps.db.clone();
    let orchestrator = JobOrchestrator::new(vec![site(&server)], deps);

    orchestrator.start_all().unwrap();
    assert!(orchestrator.is_running());
    assert!(matches!(orchestrator.start_all(), Err(JobError::AlreadyRunning)));

    orchestrator.stop_all().unwrap();

    // the in-flight fetch has not been flushed yet
    assert!(orchestrator.is_running());
    assert!(matches!(orchestrator.start_all(), Err(JobError::AlreadyRunning)));

    orchestrator.wait_until_finished().await;
    assert!(!orchestrator.is_running());
    assert!(matches!(orchestrator.stop_all(), Err(JobError::NotRunning)));

    let record = db.get_site_by_url(&server.uri()).unwrap().unwrap();
    assert_eq!(record.status, SiteStatus::Failed);
    assert_eq!(record.last_error.as_deref(), Some(STOPPED_BY_USER));

    assert_eq!(db.count_pages(Some(record.id)).unwrap(), 1);
    let slow = Lemmatizer::new().normalize("slow").unwrap();
    let lemmas = db.find_lemmas(record.id, &[slow]).unwrap();
    assert_eq!(lemmas.len(), 1);
    assert_eq!(lemmas[0].frequency, 1);
}

#[tokio::test]
async fn test_start_twice_fails_then_stop_with_memory_store() {
    start_twice_then_stop(StorageKind::Memory).await;
}

#[tokio::test]
async fn test_start_twice_fails_then_stop_with_database_store() {
    start_twice_then_stop(StorageKind::Database).await;
}

#[tokio::test]
async fn test_stop_when_idle_fails() {
    let server = MockServer::start().await;
    let orchestrator = JobOrchestrator::new(
        vec![site(&server)],
        deps(crawler_config(StorageKind::Memory, false)),
    );

    assert!(matches!(orchestrator.stop_all(), Err(JobError::NotRunning)));
}

#[tokio::test]
async fn test_restart_wipes_previous_index() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>giraffes</p>", "text/html"))
        .expect(2)
        .mount(&server)
        .await;

    let deps = deps(crawler_config(StorageKind::Database, false));
    let db = deps.db.clone();
    let orchestrator = JobOrchestrator::new(vec![site(&server)], deps);

    for _ in 0..2 {
        orchestrator.start_all().unwrap();
        orchestrator.wait_until_finished().await;
    }

    assert_eq!(db.count_sites().unwrap(), 1);
    assert_eq!(db.count_pages(None).unwrap(), 1);
    let giraffe = Lemmatizer::new().normalize("giraffes").unwrap();
    let record = db.get_site_by_url(&server.uri()).unwrap().unwrap();
    assert_eq!(db.find_lemmas(record.id, &[giraffe]).unwrap()[0].frequency, 1);
}

#[tokio::test]
async fn test_index_single_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<p>Penguins swim fast</p>", "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let deps = deps(crawler_config(StorageKind::Memory, false));
    let sites = vec![site(&server)];

    let handle = deps
        .indexer
        .index_url(&deps.fetcher, &sites, &format!("{}/news", server.uri()))
        .await
        .unwrap();
    handle.await.unwrap().unwrap();

    let record = deps.db.get_site_by_url(&server.uri()).unwrap().unwrap();
    assert_eq!(record.status, SiteStatus::Indexed);
    assert_eq!(record.name, "Mock");

    let penguin = Lemmatizer::new().normalize("penguins").unwrap();
    assert_eq!(deps.db.find_lemmas(record.id, &[penguin]).unwrap().len(), 1);

    let outside = deps
        .indexer
        .index_url(&deps.fetcher, &sites, "https://elsewhere.test/news")
        .await;
    assert!(matches!(outside, Err(IndexError::SiteNotConfigured(_))));

    let invalid = deps.indexer.index_url(&deps.fetcher, &sites, "not a url").await;
    assert!(matches!(invalid, Err(IndexError::InvalidUrl(_))));

    let gone = deps
        .indexer
        .index_url(&deps.fetcher, &sites, &format!("{}/gone", server.uri()))
        .await;
    assert!(matches!(gone, Err(IndexError::Fetch(_))));
}
