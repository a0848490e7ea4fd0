//! Ranked full-text search over the index
//!
//! A query is reduced to lemmas with the same [`Lemmatizer`](crate::Lemmatizer)
//! the indexer uses. Every page holding one of those lemmas scores the sum of
//! its ranks for them, and each hit carries a highlighted excerpt of the page.

mod engine;
mod snippet;

pub use engine::{SearchEngine, SearchHit, SearchQuery, SearchResponse};
pub use snippet::SnippetExtractor;
