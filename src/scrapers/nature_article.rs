//! Nature article-page reader.
//!
//! Maps a parsed article page to a [`PartialRecord`] with a pure function,
//! then promotes it to a [`FullRecord`] when a DOI was found. Each field has
//! a primary selector on the rendered page and, where Nature provides one,
//! a fallback `<meta>` tag.

use crate::error::Result;
use crate::extract::{
    all_texts, clean_text, doi_from_text, element_text, first_attr, first_text, orcid_from_href,
    parse_count, parse_date, selector,
};
use crate::fetch::Fetch;
use crate::models::{ArticleMetrics, ArticleOutcome, AuthorEntry, PartialRecord, PreviewRecord};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};

static TITLE: Lazy<Selector> = Lazy::new(|| selector("h1.c-article-title"));
static META_TITLE: Lazy<Selector> = Lazy::new(|| selector(r#"meta[name="dc.title"]"#));

static BIB_VALUE: Lazy<Selector> =
    Lazy::new(|| selector(".c-bibliographic-information__value"));
static BIB_ITEM: Lazy<Selector> =
    Lazy::new(|| selector("li.c-bibliographic-information__list-item"));
static META_DOI: Lazy<Selector> = Lazy::new(|| selector(r#"meta[name="citation_doi"]"#));
static META_DC_ID: Lazy<Selector> = Lazy::new(|| selector(r#"meta[name="dc.identifier"]"#));

static AUTHOR_ITEM: Lazy<Selector> = Lazy::new(|| selector(".c-article-author-list__item"));
static AUTHOR_NAME: Lazy<Selector> = Lazy::new(|| selector(r#"a[data-test="author-name"]"#));
static AUTHOR_ORCID: Lazy<Selector> = Lazy::new(|| selector("a.js-orcid"));
static META_AUTHOR: Lazy<Selector> = Lazy::new(|| selector(r#"meta[name="citation_author"]"#));

static ARTICLE_TYPE: Lazy<Selector> =
    Lazy::new(|| selector(r#"li.c-article-identifiers__item[data-test="article-category"]"#));
static JOURNAL: Lazy<Selector> =
    Lazy::new(|| selector(r#".c-article-info-details a[data-test="journal-link"]"#));
static META_JOURNAL: Lazy<Selector> =
    Lazy::new(|| selector(r#"meta[name="citation_journal_title"]"#));
static META_PUBLISHED: Lazy<Selector> =
    Lazy::new(|| selector(r#"meta[name="citation_publication_date"]"#));
static TIME: Lazy<Selector> = Lazy::new(|| selector("time"));
static METRIC_COUNT: Lazy<Selector> =
    Lazy::new(|| selector(".c-article-metrics-bar__wrapper .c-article-metrics-bar__count"));

/// Extract every field the page offers. Never fails.
pub fn extract(document: &Html) -> PartialRecord {
    let root = document.root_element();
    let dates = bibliographic_dates(root);
    let published = dates
        .iter()
        .find(|(label, _)| label == "published")
        .map(|(_, d)| *d)
        .or_else(|| first_attr(root, &META_PUBLISHED, "content").and_then(|d| parse_date(&d)));
    let date_for = |wanted: &str| {
        dates
            .iter()
            .find(|(label, _)| label == wanted)
            .map(|(_, d)| *d)
    };

    PartialRecord {
        doi: doi(root),
        title: first_text(root, &TITLE).or_else(|| first_attr(root, &META_TITLE, "content")),
        publication_date: published,
        article_type: first_text(root, &ARTICLE_TYPE),
        journal: first_text(root, &JOURNAL).or_else(|| first_attr(root, &META_JOURNAL, "content")),
        received: date_for("received"),
        accepted: date_for("accepted"),
        metrics: metrics(root),
        authors: authors(root),
    }
}

fn doi(root: ElementRef<'_>) -> Option<String> {
    root.select(&BIB_VALUE)
        .filter_map(element_text)
        .filter(|text| text.contains("doi.org/"))
        .find_map(|text| doi_from_text(&text))
        .or_else(|| first_attr(root, &META_DOI, "content").and_then(|d| doi_from_text(&d)))
        .or_else(|| {
            first_attr(root, &META_DC_ID, "content")
                .filter(|id| id.starts_with("doi:"))
                .and_then(|id| doi_from_text(&id))
        })
}

/// Authors in list order. Falls back to `citation_author` meta tags, which
/// carry no ORCID.
fn authors(root: ElementRef<'_>) -> Vec<AuthorEntry> {
    let listed: Vec<AuthorEntry> = root
        .select(&AUTHOR_ITEM)
        .filter_map(|item| {
            let name = first_text(item, &AUTHOR_NAME)?;
            let orcid = first_attr(item, &AUTHOR_ORCID, "href").and_then(|h| orcid_from_href(&h));
            Some(AuthorEntry::new(name, orcid))
        })
        .collect();
    if !listed.is_empty() {
        return listed;
    }
    root.select(&META_AUTHOR)
        .filter_map(|meta| meta.value().attr("content").and_then(clean_text))
        .map(|name| AuthorEntry::new(name, None))
        .collect()
}

/// `(lowercased label, date)` for items like `Received: 05 January 2025`.
fn bibliographic_dates(root: ElementRef<'_>) -> Vec<(String, chrono::NaiveDate)> {
    root.select(&BIB_ITEM)
        .filter_map(|item| {
            let text = element_text(item)?;
            let (label, rest) = text.split_once(':')?;
            let date = first_attr(item, &TIME, "datetime")
                .and_then(|d| parse_date(&d))
                .or_else(|| parse_date(rest))?;
            Some((label.trim().to_lowercase(), date))
        })
        .collect()
}

/// Counters such as `12k Accesses`, `3 Citations`, `41 Altmetric`.
fn metrics(root: ElementRef<'_>) -> ArticleMetrics {
    let mut metrics = ArticleMetrics::default();
    for text in all_texts(root, &METRIC_COUNT) {
        let mut parts = text.split_whitespace();
        let (Some(count), Some(label)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Some(count) = parse_count(count) else {
            continue;
        };
        match label.to_lowercase().as_str() {
            "accesses" => metrics.accesses = Some(count),
            "citations" | "citation" => metrics.citations = Some(count),
            "altmetric" => metrics.altmetric = Some(count),
            other => debug!(label = other, "Ignoring unknown metric"),
        }
    }
    metrics
}

/// Fetch the detail page for `preview` and build its record.
///
/// Returns [`ArticleOutcome::Absent`] when the page has no DOI.
#[instrument(level = "info", skip_all, fields(link = %preview.link))]
pub async fn read_article<F: Fetch>(fetcher: &F, preview: &PreviewRecord) -> Result<ArticleOutcome> {
    let markup = fetcher.fetch(&preview.link).await?;
    let partial = extract(&Html::parse_document(&markup)).merge_preview(preview);

    match partial.into_full(Some(preview.link.clone())) {
        Some(record) => {
            debug!(doi = %record.doi, authors = record.authors.len(), "Extracted article");
            Ok(ArticleOutcome::Full(record))
        }
        None => {
            warn!("No DOI on article page");
            Ok(ArticleOutcome::Absent {
                link: preview.link.clone(),
            })
        }
    }
}
