//! # Nature Crawl
//!
//! Crawls Nature's article listings, extracts per-article bibliographic
//! metadata (title, authors with ORCID iDs, dates, DOI, article type) and
//! stores it in normalized `articles` / `authors` / `articles_authors` tables.
//!
//! ## Usage
//!
//! ```sh
//! nature_crawl
//! nature_crawl --start-page 41 --max-pages 20 --db-config data/db_login.json
//! ```
//!
//! ## Architecture
//!
//! The run is a single sequential pipeline:
//! 1. **Indexing**: fetch one listing page and read its article cards
//! 2. **Fetching**: fetch the detail page of every card whose DOI is not stored
//! 3. **Persisting**: write each article, its authors and links in one transaction
//!
//! Pages are processed one at a time until the page cap or an empty page.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod crawl;
mod error;
mod extract;
mod fetch;
mod models;
mod scrapers;
mod store;
mod utils;

use cli::Cli;
use config::{Config, Credentials};
use crawl::Crawler;
use fetch::HttpFetcher;
use store::ArticleStore;

#[tokio::main(flavor = "current_thread")]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("nature_crawl starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Startup: anything failing here ends the run ----
    let config = Config::resolve(&args).inspect_err(|e| error!(error = %e, "Invalid configuration"))?;
    let credentials = Credentials::load(&args.db_config)
        .inspect_err(|e| error!(error = %e, "Cannot load database credentials"))?;
    let mut store = ArticleStore::open(&config.database.path)
        .inspect_err(|e| error!(error = %e, "Cannot open database"))?;
    info!(user = %credentials.user, "Database session ready");
    let fetcher = HttpFetcher::new(&config.crawl.user_agent, config.crawl.request_timeout())?;

    // ---- Crawl ----
    let stats = Crawler::new(&fetcher, &mut store, &config.crawl).run().await;

    let totals = store.counts()?;
    drop(store);

    let elapsed = start_time.elapsed();
    info!(
        pages = stats.pages_attempted,
        pages_failed = stats.pages_failed,
        saved = stats.articles_saved,
        skipped_known = stats.skipped_known,
        duplicates = stats.duplicates,
        doi_missing = stats.doi_missing,
        article_failures = stats.article_failures,
        persist_failures = stats.persist_failures,
        total_articles = totals.articles,
        total_authors = totals.authors,
        secs = elapsed.as_secs(),
        "Crawl complete"
    );

    Ok(())
}
