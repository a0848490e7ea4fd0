//! HTTP fetcher implementation
//!
//! This module performs the single GET behind every crawled page:
//! - Building the HTTP client with the configured user agent and timeout
//! - Sending the configured referrer
//! - Optional random latency before each request
//! - Error classification into [`FetchError`]

use crate::config::CrawlerConfig;
use crate::FetchError;
use rand::Rng;
use reqwest::header::{CONTENT_TYPE, REFERER};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Upper bound of the simulated latency, in milliseconds
const MAX_SIMULATED_LATENCY_MS: u64 = 2000;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code
    pub status: u16,

    /// Final URL after redirects
    pub final_url: String,

    /// Response body
    pub body: String,
}

/// Fetches pages with one shared HTTP client
pub struct Fetcher {
    client: Client,
    referrer: String,
    simulate_latency: bool,
}

impl Fetcher {
    /// Builds a fetcher from the crawler configuration
    ///
    /// # Example
    ///
    /// ```no_run
    /// use lexicrawl::config::load_config;
    /// use lexicrawl::crawler::Fetcher;
    /// use std::path::Path;
    ///
    /// let config = load_config(Path::new("lexicrawl.toml")).unwrap();
    /// let fetcher = Fetcher::new(&config.crawler).unwrap();
    /// ```
    pub fn new(config: &CrawlerConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.request_timeout_secs.min(10)))
            .redirect(Policy::limited(10))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            referrer: config.referrer.clone(),
            simulate_latency: config.simulate_latency,
        })
    }

    /// Fetches one URL
    ///
    /// # Error classification
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | Status 400 and above | `Http` with the status |
    /// | Content-Type neither `text/*` nor XML | `UnsupportedContentType` |
    /// | Request could not be sent or timed out | `Connection` |
    /// | Body could not be read | `Io` |
    ///
    /// A response without a Content-Type header is accepted.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        if self.simulate_latency {
            let delay = rand::thread_rng().gen_range(0..MAX_SIMULATED_LATENCY_MS);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let response = self
            .client
            .get(url)
            .header(REFERER, &self.referrer)
            .send()
            .await
            .map_err(|source| FetchError::Connection {
                url: url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(FetchError::Http {
                url: url.to_string(),
                status,
            });
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
        {
            if !is_supported_content_type(content_type) {
                return Err(FetchError::UnsupportedContentType {
                    url: url.to_string(),
                    status,
                    content_type: content_type.to_string(),
                });
            }
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|source| FetchError::Io {
            url: url.to_string(),
            source,
        })?;

        Ok(FetchedPage {
            status,
            final_url,
            body,
        })
    }
}

fn is_supported_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime.starts_with("text/") || mime.contains("xml")
}
