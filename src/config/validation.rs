use crate::config::types::{Config, CrawlerConfig, DatabaseConfig, SearchConfig, SiteEntry};
use crate::url::normalize_site_url;
use crate::ConfigError;
use std::collections::HashSet;
use std::net::SocketAddr;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_bind_address(&config.server.bind_address)?;
    validate_crawler_config(&config.crawler)?;
    validate_search_config(&config.search)?;
    validate_database_config(&config.database)?;
    validate_sites(&config.sites)?;
    Ok(())
}

fn validate_bind_address(address: &str) -> Result<(), ConfigError> {
    address.parse::<SocketAddr>().map_err(|e| {
        ConfigError::Validation(format!("bind-address '{}' is invalid: {}", address, e))
    })?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 256 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-fetches must be between 1 and 256, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.heartbeat_page_count < 1 {
        return Err(ConfigError::Validation(format!(
            "heartbeat-page-count must be >= 1, got {}",
            config.heartbeat_page_count
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.noise_frequency_ceiling < 1 {
        return Err(ConfigError::Validation(format!(
            "noise-frequency-ceiling must be >= 1, got {}",
            config.noise_frequency_ceiling
        )));
    }

    if config.snippet_window_length < 10 {
        return Err(ConfigError::Validation(format!(
            "snippet-window-length must be >= 10, got {}",
            config.snippet_window_length
        )));
    }

    if config.default_limit < 1 {
        return Err(ConfigError::Validation(
            "default-limit must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_database_config(config: &DatabaseConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "database path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates the site list: non-empty, parseable, unique after normalization
fn validate_sites(sites: &[SiteEntry]) -> Result<(), ConfigError> {
    if sites.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[sites]] entry is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for site in sites {
        if site.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}' must have a name",
                site.url
            )));
        }

        let normalized = normalize_site_url(&site.url)
            .map_err(|e| ConfigError::InvalidUrl(format!("site '{}': {}", site.url, e)))?;

        if !seen.insert(normalized.clone()) {
            return Err(ConfigError::Validation(format!(
                "site '{}' is listed more than once",
                normalized
            )));
        }
    }

    Ok(())
}
