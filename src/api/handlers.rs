use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::responses::{Ack, ApiError, SearchBody, StatisticsBody};
use crate::api::AppState;
use crate::output::load_statistics;
use crate::search::SearchQuery;
use crate::IndexError;

#[derive(Debug, Deserialize)]
pub struct IndexPageParams {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub site: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

pub async fn statistics(State(state): State<AppState>) -> Result<Json<StatisticsBody>, ApiError> {
    let statistics = load_statistics(&state.db, state.orchestrator.is_running())?;
    Ok(Json(StatisticsBody {
        result: true,
        statistics,
    }))
}

pub async fn start_indexing(State(state): State<AppState>) -> Result<Json<Ack>, ApiError> {
    state.orchestrator.start_all()?;
    Ok(Ack::ok())
}

pub async fn stop_indexing(State(state): State<AppState>) -> Result<Json<Ack>, ApiError> {
    state.orchestrator.stop_all()?;
    Ok(Ack::ok())
}

/// Fetches and stores the page, then indexes it in the background
pub async fn index_page(
    State(state): State<AppState>,
    Query(params): Query<IndexPageParams>,
) -> Result<Json<Ack>, ApiError> {
    let url = params.url.unwrap_or_default();
    if url.trim().is_empty() {
        return Err(IndexError::InvalidUrl(url).into());
    }

    // The handle is dropped: background failures are only logged.
    state
        .indexer
        .index_url(&state.fetcher, &state.sites, &url)
        .await?;
    Ok(Ack::ok())
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchBody>, ApiError> {
    let query = SearchQuery {
        query: params.query.unwrap_or_default(),
        site: params.site.filter(|site| !site.trim().is_empty()),
        offset: params.offset.unwrap_or(0),
        limit: params.limit.unwrap_or(state.default_limit),
    };

    let engine = state.search.clone();
    let response = tokio::task::spawn_blocking(move || engine.search(&query))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(response.into()))
}
