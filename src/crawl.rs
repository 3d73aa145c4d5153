//! The crawl driver.
//!
//! Walks listing pages from `start_page`, visiting at most `max_pages` of
//! them, and routes every new article into the store:
//!
//! ```text
//! Paginating(page) --page cap reached / empty page--> DoneFetch --> Terminal
//! ```
//!
//! Failures are contained at the smallest unit they affect. A page that
//! cannot be fetched is skipped and pagination continues. An article that
//! cannot be fetched, has no DOI, or fails to persist is skipped and the
//! rest of its page proceeds.

use crate::config::CrawlConfig;
use crate::fetch::Fetch;
use crate::models::{ArticleOutcome, PreviewRecord};
use crate::scrapers::{nature, nature_article};
use crate::store::{ArticleStore, SaveOutcome};
use crate::utils::truncate_for_log;
use tracing::{debug, error, info, instrument, warn};

/// Where the crawl loop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Paginating(u32),
    DoneFetch,
    Terminal,
}

/// Tallies for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrawlStats {
    /// Index pages requested, including failed ones.
    pub pages_attempted: u32,
    pub pages_failed: u32,
    pub previews_seen: usize,
    /// Previews skipped because their DOI was already stored.
    pub skipped_known: usize,
    pub articles_saved: usize,
    /// Detail pages whose DOI turned out to be stored already.
    pub duplicates: usize,
    pub doi_missing: usize,
    pub article_failures: usize,
    pub persist_failures: usize,
}

/// Drives one crawl over a fetcher and a store.
pub struct Crawler<'a, F: Fetch> {
    fetcher: &'a F,
    store: &'a mut ArticleStore,
    config: &'a CrawlConfig,
    stats: CrawlStats,
}

impl<'a, F: Fetch> Crawler<'a, F> {
    pub fn new(fetcher: &'a F, store: &'a mut ArticleStore, config: &'a CrawlConfig) -> Self {
        Self {
            fetcher,
            store,
            config,
            stats: CrawlStats::default(),
        }
    }

    /// Run until the page cap or an empty page.
    #[instrument(level = "info", skip_all, fields(start_page = self.config.start_page, max_pages = self.config.max_pages))]
    pub async fn run(mut self) -> CrawlStats {
        let mut state = self.first_state();
        loop {
            state = match state {
                CrawlState::Paginating(page) => self.crawl_page(page).await,
                CrawlState::DoneFetch => {
                    info!(stats = ?self.stats, "Crawl finished");
                    CrawlState::Terminal
                }
                CrawlState::Terminal => return self.stats,
            };
        }
    }

    fn first_state(&self) -> CrawlState {
        if self.config.max_pages == 0 {
            CrawlState::DoneFetch
        } else {
            CrawlState::Paginating(self.config.start_page)
        }
    }

    /// State after `page`, given whether it produced any previews.
    fn next_state(&self, page: u32, had_previews: bool) -> CrawlState {
        let last_page = self
            .config
            .start_page
            .saturating_add(self.config.max_pages.saturating_sub(1));
        if !had_previews {
            CrawlState::DoneFetch
        } else if page >= last_page {
            info!(page, max_pages = self.config.max_pages, "Reached page cap");
            CrawlState::DoneFetch
        } else {
            CrawlState::Paginating(page + 1)
        }
    }

    async fn crawl_page(&mut self, page: u32) -> CrawlState {
        self.stats.pages_attempted += 1;
        info!(page, "Reading index page");

        let previews: Vec<PreviewRecord> =
            match nature::read_page(self.fetcher, self.config, page).await {
                Ok(index) => index.previews().collect(),
                Err(e) => {
                    self.stats.pages_failed += 1;
                    error!(page, fetch = e.is_fetch(), error = %e, "Index page failed; skipping page");
                    // A failed page says nothing about whether later pages exist.
                    return self.next_state(page, true);
                }
            };

        if previews.is_empty() {
            info!(page, "Index page has no articles; stopping");
            return self.next_state(page, false);
        }

        info!(page, count = previews.len(), "Found article previews");
        for (i, preview) in previews.iter().enumerate() {
            debug!(page, article = i, link = %preview.link, "Processing preview");
            self.process_preview(preview).await;
        }
        self.next_state(page, true)
    }

    async fn process_preview(&mut self, preview: &PreviewRecord) {
        self.stats.previews_seen += 1;

        if let Some(doi) = &preview.doi {
            match self.store.contains_doi(doi) {
                Ok(true) => {
                    self.stats.skipped_known += 1;
                    debug!(%doi, "Already stored; skipping detail fetch");
                    return;
                }
                Ok(false) => {}
                Err(e) => warn!(%doi, error = %e, "DOI lookup failed; fetching anyway"),
            }
        }

        let record = match nature_article::read_article(self.fetcher, preview).await {
            Ok(ArticleOutcome::Full(record)) => record,
            Ok(ArticleOutcome::Absent { link }) => {
                self.stats.doi_missing += 1;
                warn!(%link, "No DOI found; article dropped");
                return;
            }
            Err(e) => {
                self.stats.article_failures += 1;
                error!(link = %preview.link, error = %e, "Article fetch failed; skipping article");
                return;
            }
        };

        match self.store.save_article(&record) {
            Ok(SaveOutcome::Inserted { links }) => {
                self.stats.articles_saved += 1;
                info!(
                    doi = %record.doi,
                    title = %truncate_for_log(record.title.as_deref().unwrap_or(""), 80),
                    links,
                    "Saved article"
                );
            }
            Ok(SaveOutcome::Duplicate) => {
                self.stats.duplicates += 1;
                info!(doi = %record.doi, "Already seen");
            }
            Err(e) => {
                self.stats.persist_failures += 1;
                error!(doi = %record.doi, error = %e, "Persisting article failed; rolled back");
            }
        }
    }
}
