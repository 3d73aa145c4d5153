//! Data models for scraped article metadata.
//!
//! This module defines the records that flow through the crawl:
//! - [`PreviewRecord`]: partial metadata harvested from one card on a listing page
//! - [`FullRecord`]: complete metadata harvested from an article's own page
//! - [`AuthorEntry`]: one position in an article's author list
//! - [`ArticleOutcome`]: what the article reader produced for one link
//!
//! Every field the HTML may omit is an `Option`. Absence is data, not an error.

use chrono::NaiveDate;

/// One author as listed on an article page, in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorEntry {
    /// Display name, whitespace-trimmed.
    pub name: String,
    /// ORCID iD without the `https://orcid.org/` prefix.
    pub orcid: Option<String>,
}

impl AuthorEntry {
    pub fn new(name: impl Into<String>, orcid: Option<String>) -> Self {
        Self {
            name: name.into(),
            orcid,
        }
    }
}

/// Partial metadata for one article card on an index page.
///
/// Only `link` is guaranteed. `doi` is present when the card carries one or
/// when it can be derived from the link; it lets the driver skip articles
/// that are already stored without fetching their detail page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreviewRecord {
    /// Absolute URL of the article's detail page.
    pub link: String,
    pub title: Option<String>,
    pub doi: Option<String>,
    pub article_type: Option<String>,
    pub publication_date: Option<NaiveDate>,
    /// Author names from the card. No ORCID is available at this level.
    pub authors: Vec<String>,
}

/// Article-level counters from the metrics bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArticleMetrics {
    pub accesses: Option<i64>,
    pub citations: Option<i64>,
    pub altmetric: Option<i64>,
}

/// Complete metadata for one article, ready to persist.
///
/// Construction requires a DOI; an article without one is reported as
/// [`ArticleOutcome::Absent`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct FullRecord {
    pub doi: String,
    pub title: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub article_type: Option<String>,
    pub journal: Option<String>,
    pub title_link: Option<String>,
    pub received: Option<NaiveDate>,
    pub accepted: Option<NaiveDate>,
    pub metrics: ArticleMetrics,
    /// Authors in list order; the index is the stored ordinal.
    pub authors: Vec<AuthorEntry>,
}

impl FullRecord {
    /// A record with only the DOI set.
    #[cfg(test)]
    pub fn new(doi: impl Into<String>) -> Self {
        Self {
            doi: doi.into(),
            title: None,
            publication_date: None,
            article_type: None,
            journal: None,
            title_link: None,
            received: None,
            accepted: None,
            metrics: ArticleMetrics::default(),
            authors: Vec::new(),
        }
    }
}

/// Everything the field extractor found on an article page.
///
/// Unlike [`FullRecord`] the DOI may be missing here.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartialRecord {
    pub doi: Option<String>,
    pub title: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub article_type: Option<String>,
    pub journal: Option<String>,
    pub received: Option<NaiveDate>,
    pub accepted: Option<NaiveDate>,
    pub metrics: ArticleMetrics,
    pub authors: Vec<AuthorEntry>,
}

impl PartialRecord {
    /// Fill the gaps of a detail-page extraction from the listing card.
    ///
    /// Detail-page values win. Card authors are used only when the page
    /// listed none, and they carry no ORCID.
    pub fn merge_preview(mut self, preview: &PreviewRecord) -> Self {
        if self.title.is_none() {
            self.title = preview.title.clone();
        }
        if self.publication_date.is_none() {
            self.publication_date = preview.publication_date;
        }
        if self.article_type.is_none() {
            self.article_type = preview.article_type.clone();
        }
        if self.authors.is_empty() {
            self.authors = preview
                .authors
                .iter()
                .map(|name| AuthorEntry::new(name.clone(), None))
                .collect();
        }
        self
    }

    /// Promote to a [`FullRecord`]. Returns `None` without a DOI.
    pub fn into_full(self, title_link: Option<String>) -> Option<FullRecord> {
        let doi = self.doi?;
        Some(FullRecord {
            doi,
            title: self.title,
            publication_date: self.publication_date,
            article_type: self.article_type,
            journal: self.journal,
            title_link,
            received: self.received,
            accepted: self.accepted,
            metrics: self.metrics,
            authors: self.authors,
        })
    }
}

/// Result of reading one article detail page.
#[derive(Debug, Clone, PartialEq)]
pub enum ArticleOutcome {
    Full(FullRecord),
    /// The page was fetched but no DOI could be determined, so the article
    /// cannot be deduplicated and must not be stored.
    Absent { link: String },
}
