//! Lexicrawl main entry point
//!
//! This is the command-line interface for the Lexicrawl search engine.

use anyhow::Context;
use clap::Parser;
use lexicrawl::api::{self, AppState};
use lexicrawl::config::{load_config_with_hash, Config};
use lexicrawl::storage::Database;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Lexicrawl: a crawl, index and search engine for a fixed set of sites
///
/// By default Lexicrawl serves its HTTP API. Crawls are started and stopped
/// through the API, or run once from the command line with --crawl.
#[derive(Parser, Debug)]
#[command(name = "lexicrawl")]
#[command(version = "1.0.0")]
#[command(about = "Crawl, index and search a fixed set of sites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "crawl"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "crawl"])]
    stats: bool,

    /// Crawl and index every site once, then exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    crawl: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.crawl {
        handle_crawl(&config).await?;
    } else {
        handle_serve(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lexicrawl=info,warn"),
            1 => EnvFilter::new("lexicrawl=debug,info"),
            2 => EnvFilter::new("lexicrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_database(config: &Config) -> anyhow::Result<Arc<Database>> {
    let db = Database::open(Path::new(&config.database.path))
        .with_context(|| format!("failed to open database {}", config.database.path))?;
    Ok(Arc::new(db))
}

/// Handles the --dry-run mode: shows the parsed configuration
fn handle_dry_run(config: &Config) {
    println!("=== Lexicrawl Dry Run ===\n");

    println!("Server:");
    println!("  Bind address: {}", config.server.bind_address);

    println!("\nCrawler:");
    println!("  User agent: {}", config.crawler.user_agent);
    println!("  Referrer: {}", config.crawler.referrer);
    println!("  Simulate latency: {}", config.crawler.simulate_latency);
    println!("  Record failed pages: {}", config.crawler.print_error);
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!(
        "  Heartbeat every {} pages",
        config.crawler.heartbeat_page_count
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Page store: {:?}", config.crawler.storage);

    println!("\nSearch:");
    println!(
        "  Noise frequency ceiling: {}",
        config.search.noise_frequency_ceiling
    );
    println!(
        "  Snippet window: {} chars",
        config.search.snippet_window_length
    );
    println!("  Default limit: {}", config.search.default_limit);

    println!("\nDatabase: {}", config.database.path);

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        println!("  - {} ({})", site.name, site.url);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use lexicrawl::output::{load_statistics, print_statistics};

    println!("Database: {}\n", config.database.path);

    let db = open_database(config)?;
    let stats = load_statistics(&db, false)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --crawl mode: one full crawl, stopped early on Ctrl-C
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    let db = open_database(config)?;
    let state = AppState::build(config, db)?;
    let orchestrator = state.orchestrator.clone();

    tracing::info!("Crawling {} sites", config.sites.len());
    orchestrator.start_all()?;

    tokio::select! {
        _ = orchestrator.wait_until_finished() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, stopping crawl");
            if let Err(e) = orchestrator.stop_all() {
                tracing::warn!("Failed to stop crawl: {}", e);
            }
            orchestrator.wait_until_finished().await;
        }
    }

    tracing::info!("Crawl completed");
    Ok(())
}

/// Handles the default mode: serves the HTTP API
async fn handle_serve(config: &Config) -> anyhow::Result<()> {
    let db = open_database(config)?;
    let state = AppState::build(config, db)?;

    tracing::info!("Serving {} configured sites", config.sites.len());
    api::serve(state, &config.server.bind_address)
        .await
        .with_context(|| format!("failed to serve on {}", config.server.bind_address))
}
