//! Error taxonomy for the crawler.
//!
//! Only configuration and startup failures are fatal. Everything else is
//! caught by the crawl driver, logged, and turned into a skipped page or a
//! skipped article:
//!
//! | Variant | Raised by | Effect on the run |
//! |---------|-----------|-------------------|
//! | [`CrawlError::Fetch`], [`CrawlError::Status`] | [`crate::fetch`] | page or article skipped |
//! | [`CrawlError::Persistence`] | [`crate::store`] | article transaction rolled back |
//! | [`CrawlError::Config`], `Io`, `Yaml`, `Json` | [`crate::config`] | startup aborted |
//!
//! A missing field is not an error at all (`None`), and a missing DOI is the
//! [`crate::models::ArticleOutcome::Absent`] variant.

use thiserror::Error;

/// A specialized Result type for crawler operations.
pub type Result<T> = std::result::Result<T, CrawlError>;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("database error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl CrawlError {
    /// True for the network/status failures that skip a page or an article.
    pub fn is_fetch(&self) -> bool {
        matches!(self, CrawlError::Fetch { .. } | CrawlError::Status { .. })
    }
}
