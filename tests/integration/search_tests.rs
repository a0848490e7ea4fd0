//! Integration tests for search over a crawled site
//!
//! A mock site is crawled end-to-end, then queried through the search
//! engine exactly as the API does.

use lexicrawl::config::{CrawlerConfig, SearchConfig, SiteEntry, StorageKind};
use lexicrawl::crawler::{Fetcher, JobDeps, JobOrchestrator};
use lexicrawl::indexer::Indexer;
use lexicrawl::lemma::Lemmatizer;
use lexicrawl::search::{SearchEngine, SearchQuery};
use lexicrawl::storage::Database;
use lexicrawl::SearchError;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Crawled {
    server: MockServer,
    engine: SearchEngine,
}

async fn page(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html.to_string(), "text/html"))
        .mount(server)
        .await;
}

async fn crawl(search: SearchConfig) -> Crawled {
    let server = MockServer::start().await;
    page(
        &server,
        "/",
        r#"<html><head><title>Zoo</title></head><body>
            <h1>Welcome to the zoo</h1>
            <a href="/dogs">Dogs</a> <a href="/cats">Cats</a> <a href="/ru">Ru</a>
        </body></html>"#,
    )
    .await;
    page(
        &server,
        "/dogs",
        "<html><head><title>Dogs</title></head><body><p>Dogs bark. A dog runs. Dogs sleep.</p></body></html>",
    )
    .await;
    page(
        &server,
        "/cats",
        "<html><head><title>Cats</title></head><body><p>The cat sat on the mat near a dog.</p></body></html>",
    )
    .await;
    page(
        &server,
        "/ru",
        "<html><head><title>Кошки</title></head><body><p>Кошка спит на ковре.</p></body></html>",
    )
    .await;

    let crawler = CrawlerConfig {
        user_agent: "TestBot/1.0".to_string(),
        referrer: "https://referrer.test".to_string(),
        simulate_latency: false,
        print_error: false,
        max_concurrent_fetches: 4,
        heartbeat_page_count: 10,
        request_timeout_secs: 5,
        storage: StorageKind::Memory,
    };
    let db = Arc::new(Database::open_in_memory().unwrap());
    let lemmatizer = Arc::new(Lemmatizer::new());
    let deps = JobDeps {
        indexer: Arc::new(Indexer::new(db.clone(), lemmatizer.clone())),
        fetcher: Arc::new(Fetcher::new(&crawler).unwrap()),
        db: db.clone(),
        crawler,
    };
    let sites = vec![SiteEntry {
        url: server.uri(),
        name: "Zoo".to_string(),
    }];

    let orchestrator = JobOrchestrator::new(sites, deps);
    orchestrator.start_all().unwrap();
    orchestrator.wait_until_finished().await;

    Crawled {
        server,
        engine: SearchEngine::new(db, lemmatizer, &search),
    }
}

fn query(text: &str) -> SearchQuery {
    SearchQuery {
        query: text.to_string(),
        site: None,
        offset: 0,
        limit: 10,
    }
}

#[tokio::test]
async fn test_search_ranks_by_occurrences() {
    let crawled = crawl(SearchConfig::default()).await;

    let response = crawled.engine.search(&query("dogs")).unwrap();
    assert_eq!(response.count, 3);

    let best = &response.data[0];
    assert_eq!(best.uri, "/dogs");
    assert_eq!(best.title, "Dogs");
    assert_eq!(best.site, crawled.server.uri());
    assert_eq!(best.site_name, "Zoo");
    assert_eq!(best.relevance, 1.0);
    assert!(best.snippet.contains("<b>Dogs</b>"));

    assert!(response
        .data
        .iter()
        .skip(1)
        .all(|hit| hit.relevance < 1.0 && hit.relevance > 0.0));
}

#[tokio::test]
async fn test_search_with_site_filter() {
    let crawled = crawl(SearchConfig::default()).await;

    let mut request = query("cat");
    request.site = Some(crawled.server.uri());
    let response = crawled.engine.search(&request).unwrap();

    assert!(response.data.iter().any(|hit| hit.uri == "/cats"));
    let cats = response.data.iter().find(|hit| hit.uri == "/cats").unwrap();
    assert_eq!(cats.snippet, "The <b>cat</b> sat on the mat near a dog.");
}

#[tokio::test]
async fn test_search_cyrillic() {
    let crawled = crawl(SearchConfig::default()).await;

    let response = crawled.engine.search(&query("кошки")).unwrap();
    assert_eq!(response.count, 1);
    assert_eq!(response.data[0].uri, "/ru");
    assert_eq!(response.data[0].title, "Кошки");
    assert!(response.data[0].snippet.contains("<b>Кошка</b>"));
}

#[tokio::test]
async fn test_noise_ceiling_excludes_common_lemma() {
    let search = SearchConfig {
        noise_frequency_ceiling: 2,
        ..SearchConfig::default()
    };
    let crawled = crawl(search).await;

    // "dog" is on three pages, above the ceiling
    assert!(matches!(
        crawled.engine.search(&query("dog")),
        Err(SearchError::NoResults)
    ));

    let response = crawled.engine.search(&query("dog mat")).unwrap();
    assert_eq!(response.count, 1);
    assert_eq!(response.data[0].uri, "/cats");
}

#[tokio::test]
async fn test_search_errors() {
    let crawled = crawl(SearchConfig::default()).await;

    assert!(matches!(crawled.engine.search(&query("  ")), Err(SearchError::EmptyQuery)));
    assert!(matches!(
        crawled.engine.search(&query("unicorns")),
        Err(SearchError::NoResults)
    ));

    let mut request = query("dog");
    request.site = Some("https://unknown.test".to_string());
    assert!(matches!(
        crawled.engine.search(&request),
        Err(SearchError::UnknownSite(_))
    ));
}
