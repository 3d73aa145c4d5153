//! Run configuration: YAML settings plus a JSON credentials file.
//!
//! Both files are optional except for the credentials, which must exist and
//! name a user. Command-line values from [`crate::cli::Cli`] override the
//! YAML values.
//!
//! ```yaml
//! crawl:
//!   index_url: "https://www.nature.com/search?q={query}&order=relevance&page={page}"
//!   query: "breast cancer"
//!   start_page: 1
//!   max_pages: 50
//!   doi_prefix: "10.1038"
//!   request_timeout_secs: 30
//! database:
//!   path: data/nature.sqlite
//! ```

use crate::cli::Cli;
use crate::error::{CrawlError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

pub const DEFAULT_MAX_PAGES: u32 = 50;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_INDEX_URL: &str =
    "https://www.nature.com/nature/research-articles?searchType=journalSearch&sort=PubDate&page={page}";
pub const DEFAULT_BASE_URL: &str = "https://www.nature.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub database: DatabaseConfig,
}

/// Where to crawl and how far.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CrawlConfig {
    /// Listing URL template. `{page}` is required, `{query}` is optional.
    pub index_url: String,
    /// Search terms substituted (URL-encoded) for `{query}`.
    pub query: Option<String>,
    /// Base for resolving relative article links.
    pub base_url: String,
    pub user_agent: String,
    /// Upper bound on one request, connect through body.
    pub request_timeout_secs: u64,
    pub start_page: u32,
    /// Number of index pages to attempt, counted from `start_page`.
    pub max_pages: u32,
    /// Registrant prefix used to derive a DOI from an article link.
    pub doi_prefix: Option<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            query: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            start_page: 1,
            max_pages: DEFAULT_MAX_PAGES,
            doi_prefix: Some("10.1038".to_string()),
        }
    }
}

impl CrawlConfig {
    /// Listing URL for one page number.
    pub fn index_url_for(&self, page: u32) -> String {
        let query = self
            .query
            .as_deref()
            .map(|q| urlencoding::encode(q).into_owned())
            .unwrap_or_default();
        self.index_url
            .replace("{query}", &query)
            .replace("{page}", &page.to_string())
    }

    fn validate(&self) -> Result<()> {
        if !self.index_url.contains("{page}") {
            return Err(CrawlError::Config(format!(
                "index_url must contain {{page}}: {}",
                self.index_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(CrawlError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        url::Url::parse(&self.base_url)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/nature.sqlite"),
        }
    }
}

/// Database login, read from a `db_login.json` style file.
#[derive(Clone, Deserialize, PartialEq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            CrawlError::Config(format!("cannot read credentials {}: {e}", path.display()))
        })?;
        let creds: Credentials = serde_json::from_str(&raw)?;
        if creds.user.trim().is_empty() {
            return Err(CrawlError::Config("credentials have an empty user".to_string()));
        }
        info!(user = %creds.user, "Loaded database credentials");
        Ok(creds)
    }
}

impl Config {
    /// Parse a YAML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Load the YAML file named on the command line (or defaults) and apply
    /// the command-line overrides.
    #[instrument(level = "info", skip_all)]
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(start_page) = cli.start_page {
            config.crawl.start_page = start_page;
        }
        if let Some(max_pages) = cli.max_pages {
            config.crawl.max_pages = max_pages;
        }
        if let Some(query) = &cli.query {
            config.crawl.query = Some(query.clone());
        }
        if let Some(database) = &cli.database {
            config.database.path = database.clone();
        }
        config.crawl.validate()?;
        info!(
            start_page = config.crawl.start_page,
            max_pages = config.crawl.max_pages,
            database = %config.database.path.display(),
            "Resolved configuration"
        );
        Ok(config)
    }
}
