//! Crawler module for discovering and fetching site pages
//!
//! This module contains the crawling logic, including:
//! - HTTP fetching with error classification
//! - HTML parsing for links, titles and visible text
//! - The recursive crawl task tree of one site
//! - Site crawl jobs and their orchestration

mod fetcher;
mod job;
mod orchestrator;
mod parser;
mod task;

pub use fetcher::{FetchedPage, Fetcher};
pub use job::{JobDeps, SiteCrawlJob, STOPPED_BY_USER};
pub use orchestrator::JobOrchestrator;
pub use parser::{html_to_text, page_title, parse_html, ParsedPage};
