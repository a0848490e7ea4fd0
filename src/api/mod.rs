//! HTTP API
//!
//! Five endpoints under `/api`:
//! - `GET /statistics` - index statistics
//! - `GET /startIndexing` - wipe the index and crawl every configured site
//! - `GET /stopIndexing` - stop every running crawl
//! - `POST /indexPage?url=` - re-index a single page
//! - `GET /search?query=&site=&offset=&limit=` - ranked search

mod handlers;
mod responses;

pub use responses::{Ack, ApiError, SearchBody, StatisticsBody};

use crate::config::{Config, SiteEntry};
use crate::crawler::{Fetcher, JobDeps, JobOrchestrator};
use crate::indexer::Indexer;
use crate::lemma::Lemmatizer;
use crate::search::SearchEngine;
use crate::storage::Database;
use crate::FetchError;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Services shared by every request
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub indexer: Arc<Indexer>,
    pub fetcher: Arc<Fetcher>,
    pub orchestrator: Arc<JobOrchestrator>,
    pub search: Arc<SearchEngine>,
    pub sites: Arc<Vec<SiteEntry>>,
    pub default_limit: usize,
}

impl AppState {
    /// Wires every service from the configuration around an open database
    ///
    /// One lemmatizer is built here and shared by the indexer and the
    /// search engine.
    pub fn build(config: &Config, db: Arc<Database>) -> Result<Self, FetchError> {
        let lemmatizer = Arc::new(Lemmatizer::new());
        let indexer = Arc::new(Indexer::new(db.clone(), lemmatizer.clone()));
        let fetcher = Arc::new(Fetcher::new(&config.crawler)?);

        let deps = JobDeps {
            db: db.clone(),
            indexer: indexer.clone(),
            fetcher: fetcher.clone(),
            crawler: config.crawler.clone(),
        };
        let orchestrator = Arc::new(JobOrchestrator::new(config.sites.clone(), deps));
        let search = Arc::new(SearchEngine::new(db.clone(), lemmatizer, &config.search));

        Ok(Self {
            db,
            indexer,
            fetcher,
            orchestrator,
            search,
            sites: Arc::new(config.sites.clone()),
            default_limit: config.search.default_limit,
        })
    }
}

/// Builds the API router
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/statistics", get(handlers::statistics))
        .route("/startIndexing", get(handlers::start_indexing))
        .route("/stopIndexing", get(handlers::stop_indexing))
        .route("/indexPage", post(handlers::index_page))
        .route("/search", get(handlers::search));

    Router::new().nest("/api", api).with_state(state)
}

/// Serves the API until the listener fails
pub async fn serve(state: AppState, bind_address: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    tracing::info!("HTTP API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}
