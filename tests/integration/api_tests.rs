//! Integration tests for the HTTP API
//!
//! Requests go straight to the axum router with `tower::ServiceExt::oneshot`;
//! the crawled site is a wiremock server.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use lexicrawl::api::{router, AppState};
use lexicrawl::config::Config;
use lexicrawl::storage::Database;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(site_url: &str) -> Config {
    let content = format!(
        r#"
[crawler]
user-agent = "TestBot/1.0"
simulate-latency = false
max-concurrent-fetches = 4
request-timeout-secs = 5

[search]
default-limit = 10

[database]
path = ":memory:"

[[sites]]
url = "{site_url}"
name = "Mock"
"#
    );
    toml::from_str(&content).unwrap()
}

fn app(server: &MockServer) -> (Router, AppState) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let state = AppState::build(&config(&server.uri()), db).unwrap();
    (router(state.clone()), state)
}

async fn mount_site(server: &MockServer) {
    for (route, html) in [
        ("/", r#"<html><head><title>Home</title></head><body><a href="/dogs">Dogs</a></body></html>"#),
        ("/dogs", "<html><head><title>Dogs</title></head><body><p>Dogs bark loudly. A dog runs.</p></body></html>"),
        ("/birds", "<html><head><title>Birds</title></head><body><p>Parrots talk.</p></body></html>"),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
            .mount(server)
            .await;
    }
}

async fn call(app: &Router, http_method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(http_method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_statistics_before_crawl() {
    let server = MockServer::start().await;
    let (app, _) = app(&server);

    let (status, body) = call(&app, "GET", "/api/statistics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], true);
    assert_eq!(body["statistics"]["total"]["sites"], 0);
    assert_eq!(body["statistics"]["total"]["indexing"], false);
    assert!(body["statistics"]["detailed"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_stop_when_idle_is_bad_request() {
    let server = MockServer::start().await;
    let (app, _) = app(&server);

    let (status, body) = call(&app, "GET", "/api/stopIndexing").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["result"], false);
    assert_eq!(body["error"], "Indexing is not running");
}

#[tokio::test]
async fn test_start_twice_is_bad_request() {
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
    let (app, state) = app(&server);

    let (status, body) = call(&app, "GET", "/api/startIndexing").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], true);

    let (status, body) = call(&app, "GET", "/api/startIndexing").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Indexing is already running");

    let (_, body) = call(&app, "GET", "/api/statistics").await;
    assert_eq!(body["statistics"]["total"]["indexing"], true);

    let (status, _) = call(&app, "GET", "/api/stopIndexing").await;
    assert_eq!(status, StatusCode::OK);
    state.orchestrator.wait_until_finished().await;

    let (_, body) = call(&app, "GET", "/api/statistics").await;
    let site = &body["statistics"]["detailed"][0];
    assert_eq!(site["status"], "FAILED");
    assert_eq!(site["error"], "Indexing stopped by user");
}

#[tokio::test]
async fn test_crawl_then_search() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let (app, state) = app(&server);

    let (status, _) = call(&app, "GET", "/api/startIndexing").await;
    assert_eq!(status, StatusCode::OK);
    state.orchestrator.wait_until_finished().await;

    let (status, body) = call(&app, "GET", "/api/search?query=dog").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], true);
    assert_eq!(body["count"], 2);

    let best = &body["data"][0];
    assert_eq!(best["uri"], "/dogs");
    assert_eq!(best["title"], "Dogs");
    assert_eq!(best["siteName"], "Mock");
    assert_eq!(best["site"], server.uri());
    assert_eq!(best["relevance"], 1.0);
    assert_eq!(best["snippet"], "<b>Dogs</b> bark loudly. A <b>dog</b> runs.");

    let (_, body) = call(&app, "GET", "/api/search?query=dog&offset=1&limit=1").await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = call(&app, "GET", "/api/statistics").await;
    assert_eq!(body["statistics"]["total"]["sites"], 1);
    assert_eq!(body["statistics"]["total"]["pages"], 2);
    assert_eq!(body["statistics"]["detailed"][0]["status"], "INDEXED");
}

#[tokio::test]
async fn test_search_errors() {
    let server = MockServer::start().await;
    let (app, _) = app(&server);

    let (status, body) = call(&app, "GET", "/api/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Empty search query");

    let (status, body) = call(&app, "GET", "/api/search?query=parrots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Nothing found");

    let (status, _) = call(&app, "GET", "/api/search?query=parrots&site=https://unknown.test").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_index_page() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let (app, _) = app(&server);

    let uri = format!("/api/indexPage?url={}/birds", server.uri());
    let (status, body) = call(&app, "POST", &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], true);

    // indexing runs in the background
    let mut found = None;
    for _ in 0..50 {
        let (status, body) = call(&app, "GET", "/api/search?query=parrots").await;
        if status == StatusCode::OK {
            found = Some(body);
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let body = found.expect("page was never indexed");
    assert_eq!(body["data"][0]["uri"], "/birds");

    let (status, body) = call(&app, "POST", "/api/indexPage?url=https://elsewhere.test/x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["result"], false);

    let (status, _) = call(&app, "POST", "/api/indexPage").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
