use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::crawler::{html_to_text, page_title};
use crate::lemma::Lemmatizer;
use crate::search::SnippetExtractor;
use crate::storage::{Database, SiteRecord};
use crate::url::normalize_site_url;
use crate::SearchError;

/// A search request
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    /// Root URL of the site to search, or every indexed site when `None`
    pub site: Option<String>,
    pub offset: usize,
    pub limit: usize,
}

/// One (page, snippet) pair of a search response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub site: String,
    #[serde(rename = "siteName")]
    pub site_name: String,
    pub uri: String,
    pub title: String,
    pub snippet: String,
    pub relevance: f64,
}

/// A page of ranked hits plus the total number of hits before slicing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub count: usize,
    pub data: Vec<SearchHit>,
}

/// A hit with the position of its snippet within the page, for ordering
struct RankedHit {
    hit: SearchHit,
    position: usize,
}

/// Ranks indexed pages against a query
pub struct SearchEngine {
    db: Arc<Database>,
    lemmatizer: Arc<Lemmatizer>,
    snippets: SnippetExtractor,
    noise_ceiling: i64,
}

impl SearchEngine {
    pub fn new(db: Arc<Database>, lemmatizer: Arc<Lemmatizer>, config: &SearchConfig) -> Self {
        let snippets = SnippetExtractor::new(lemmatizer.clone(), config.snippet_window_length);
        Self {
            db,
            lemmatizer,
            snippets,
            noise_ceiling: i64::from(config.noise_frequency_ceiling),
        }
    }

    /// Runs a query against one site or all of them
    ///
    /// Relevance is normalized per site, so the best page of every searched
    /// site scores 1.0. Hits are ordered by relevance, then site, path and
    /// snippet position, before `offset` and `limit` are applied.
    pub fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        if query.query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let lemmas: Vec<String> = self.lemmatizer.lemmas_of(&query.query).into_keys().collect();
        if lemmas.is_empty() {
            return Err(SearchError::NoResults);
        }

        let mut hits = match &query.site {
            Some(url) => {
                let site = self.site_by_url(url)?;
                self.search_site(&site, &lemmas)?
                    .ok_or(SearchError::NoResults)?
            }
            None => self.search_all(&lemmas)?,
        };

        hits.sort_by(compare_hits);
        let count = hits.len();
        let data = hits
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .map(|ranked| ranked.hit)
            .collect();

        debug!("Query '{}' matched {} hits", query.query, count);
        Ok(SearchResponse { count, data })
    }

    fn site_by_url(&self, url: &str) -> Result<SiteRecord, SearchError> {
        let normalized =
            normalize_site_url(url).map_err(|_| SearchError::UnknownSite(url.to_string()))?;
        self.db
            .get_site_by_url(&normalized)?
            .ok_or_else(|| SearchError::UnknownSite(url.to_string()))
    }

    fn search_all(&self, lemmas: &[String]) -> Result<Vec<RankedHit>, SearchError> {
        let mut hits = Vec::new();
        let mut matched_any = false;

        for site in self.db.list_sites()? {
            match self.search_site(&site, lemmas) {
                Ok(Some(site_hits)) => {
                    matched_any = true;
                    hits.extend(site_hits);
                }
                Ok(None) => {}
                Err(e) => warn!("Search in {} failed: {}", site.url, e),
            }
        }

        if matched_any {
            Ok(hits)
        } else {
            Err(SearchError::NoResults)
        }
    }

    /// Hits of one site, or `None` when no query lemma survives the noise
    /// filter there.
    fn search_site(
        &self,
        site: &SiteRecord,
        lemmas: &[String],
    ) -> Result<Option<Vec<RankedHit>>, SearchError> {
        let mut records: Vec<_> = self
            .db
            .find_lemmas(site.id, lemmas)?
            .into_iter()
            .filter(|record| record.frequency <= self.noise_ceiling)
            .collect();
        if records.is_empty() {
            return Ok(None);
        }
        records.sort_by_key(|record| record.frequency);

        let lemma_ids: Vec<i64> = records.iter().map(|record| record.id).collect();
        let mut scores: HashMap<i64, f64> = HashMap::new();
        for entry in self.db.index_entries_for_lemmas(&lemma_ids)? {
            *scores.entry(entry.page_id).or_insert(0.0) += entry.rank;
        }

        let max_score = scores.values().copied().fold(0.0_f64, f64::max);
        let max_score = if max_score > 0.0 { max_score } else { 1.0 };

        let surviving: HashSet<String> = records.into_iter().map(|record| record.lemma).collect();
        let page_ids: Vec<i64> = scores.keys().copied().collect();

        let mut hits = Vec::new();
        for page in self.db.get_pages_by_ids(&page_ids)? {
            let Some(page_id) = page.id else { continue };
            let relevance = scores.get(&page_id).copied().unwrap_or(0.0) / max_score;
            let html = page.content.as_deref().unwrap_or_default();
            let title = page_title(html).unwrap_or_default();

            let mut snippets = self.snippets.snippets(&html_to_text(html), &surviving);
            if snippets.is_empty() {
                snippets.push(String::new());
            }

            for (position, snippet) in snippets.into_iter().enumerate() {
                hits.push(RankedHit {
                    hit: SearchHit {
                        site: site.url.clone(),
                        site_name: site.name.clone(),
                        uri: page.path.clone(),
                        title: title.clone(),
                        snippet,
                        relevance,
                    },
                    position,
                });
            }
        }

        Ok(Some(hits))
    }
}

fn compare_hits(a: &RankedHit, b: &RankedHit) -> Ordering {
    b.hit
        .relevance
        .total_cmp(&a.hit.relevance)
        .then_with(|| a.hit.site.cmp(&b.hit.site))
        .then_with(|| a.hit.uri.cmp(&b.hit.uri))
        .then_with(|| a.position.cmp(&b.position))
}
