//! Command-line interface definitions for the crawler.
//!
//! No argument is required: a bare `nature_crawl` crawls 50 listing pages
//! using `data/db_login.json` for credentials and `data/nature.sqlite` for
//! storage. Every flag overrides the matching value from `--config`.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the crawler.
///
/// # Examples
///
/// ```sh
/// # Defaults
/// nature_crawl
///
/// # Resume a search crawl from page 41, stopping after 20 pages
/// nature_crawl --query "breast cancer" --start-page 41 --max-pages 20
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the JSON file with database credentials
    #[arg(long, env = "NATURE_CRAWL_DB_CONFIG", default_value = "data/db_login.json")]
    pub db_config: PathBuf,

    /// SQLite database file
    #[arg(short, long)]
    pub database: Option<PathBuf>,

    /// Page number to start crawling from
    #[arg(short, long)]
    pub start_page: Option<u32>,

    /// Maximum number of index pages to fetch
    #[arg(short = 'n', long)]
    pub max_pages: Option<u32>,

    /// Search terms, substituted into an index URL template containing {query}
    #[arg(short, long)]
    pub query: Option<String>,
}
