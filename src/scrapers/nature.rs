//! Nature listing-page reader.
//!
//! Listing pages (`/nature/research-articles?page=N` or `/search?q=...&page=N`)
//! render one `.app-article-list-row__item` card per article. A card links
//! to the detail page and carries best-effort title, type, date and author
//! names.

use crate::config::CrawlConfig;
use crate::error::Result;
use crate::extract::{all_texts, clean_text, first_attr, first_text, parse_date, selector};
use crate::fetch::Fetch;
use crate::models::PreviewRecord;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

/// Upper bound on cards read from a single page.
pub const MAX_PREVIEWS_PER_PAGE: usize = 1000;

static CARD: Lazy<Selector> = Lazy::new(|| selector(".app-article-list-row__item"));
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| selector(".c-card__link"));
static AUTHOR_NAME: Lazy<Selector> =
    Lazy::new(|| selector(r#".app-author-list span[itemprop="name"]"#));
static ARTICLE_TYPE: Lazy<Selector> = Lazy::new(|| selector(".c-meta__type"));
static TIME: Lazy<Selector> = Lazy::new(|| selector("time"));
static DOI_ATTR: Lazy<Selector> = Lazy::new(|| selector("[data-doi]"));

/// One parsed listing page.
pub struct IndexPage {
    document: Html,
    base: Url,
    doi_prefix: Option<String>,
}

impl IndexPage {
    pub fn parse(markup: &str, base: Url, doi_prefix: Option<String>) -> Self {
        Self {
            document: Html::parse_document(markup),
            base,
            doi_prefix,
        }
    }

    /// Lazily extract previews in page order.
    ///
    /// Cards without a resolvable link are skipped; every yielded record
    /// has a `link`.
    pub fn previews(&self) -> impl Iterator<Item = PreviewRecord> + '_ {
        self.document
            .select(&CARD)
            .take(MAX_PREVIEWS_PER_PAGE)
            .filter_map(move |card| self.preview(card))
    }

    fn preview(&self, card: ElementRef<'_>) -> Option<PreviewRecord> {
        let href = first_attr(card, &TITLE_LINK, "href")?;
        let link = self.base.join(&href).ok()?;

        let doi = card
            .value()
            .attr("data-doi")
            .and_then(clean_text)
            .or_else(|| first_attr(card, &DOI_ATTR, "data-doi"))
            .or_else(|| derive_doi(&link, self.doi_prefix.as_deref()));

        Some(PreviewRecord {
            title: first_text(card, &TITLE_LINK),
            doi,
            article_type: first_text(card, &ARTICLE_TYPE),
            publication_date: first_attr(card, &TIME, "datetime").and_then(|d| parse_date(&d)),
            authors: all_texts(card, &AUTHOR_NAME),
            link: link.into(),
        })
    }
}

/// `https://www.nature.com/articles/s41586-025-01234-5` with prefix
/// `10.1038` gives `10.1038/s41586-025-01234-5`.
fn derive_doi(link: &Url, prefix: Option<&str>) -> Option<String> {
    let prefix = prefix?;
    let mut segments = link.path_segments()?;
    if segments.next()? != "articles" {
        return None;
    }
    let id = segments.next().filter(|s| !s.is_empty())?;
    Some(format!("{prefix}/{id}"))
}

/// Fetch and parse listing page `page`.
#[instrument(level = "info", skip(fetcher, config))]
pub async fn read_page<F: Fetch>(fetcher: &F, config: &CrawlConfig, page: u32) -> Result<IndexPage> {
    let url = config.index_url_for(page);
    let base = Url::parse(&config.base_url)?;
    let markup = fetcher.fetch(&url).await?;
    debug!(%url, bytes = markup.len(), "Fetched index page");
    Ok(IndexPage::parse(&markup, base, config.doi_prefix.clone()))
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Listing page markup with one card per `(href, title)` pair.
    pub fn listing(cards: &[(&str, &str)]) -> String {
        let items: String = cards
            .iter()
            .map(|(href, title)| {
                format!(
                    r#"<li class="app-article-list-row__item">
                         <article class="c-card">
                           <h3><a class="c-card__link" href="{href}">{title}</a></h3>
                           <ul class="app-author-list"><li><span itemprop="name">Smith, J.</span></li></ul>
                           <span class="c-meta__type">Article</span>
                           <time datetime="2025-06-12">12 Jun 2025</time>
                         </article>
                       </li>"#
                )
            })
            .collect();
        format!("<html><body><ul>{items}</ul></body></html>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::ScriptedFetcher;
    use chrono::NaiveDate;

    const CARD_HTML: &str = r#"
        <html><body><ul>
          <li class="app-article-list-row__item">
            <article class="c-card">
              <h3 class="c-card__title">
                <a class="c-card__link" href="/articles/s41586-025-09001-x">Deep   sea vents</a>
              </h3>
              <ul class="app-author-list">
                <li><span itemprop="name">Ada Lovelace</span></li>
                <li><span itemprop="name">Alan Turing</span></li>
              </ul>
              <div class="c-card__section c-meta">
                <span class="c-meta__type">Article</span>
                <time datetime="2025-06-12">12 Jun 2025</time>
              </div>
            </article>
          </li>
          <li class="app-article-list-row__item" data-doi="10.9999/explicit">
            <a class="c-card__link" href="https://www.nature.com/articles/other">Second</a>
          </li>
          <li class="app-article-list-row__item"><p>No link here</p></li>
        </ul></body></html>"#;

    fn base() -> Url {
        Url::parse("https://www.nature.com").unwrap()
    }

    #[test]
    fn test_previews_extract_card_fields() {
        let page = IndexPage::parse(CARD_HTML, base(), Some("10.1038".to_string()));
        let previews: Vec<_> = page.previews().collect();

        assert_eq!(previews.len(), 2);
        let first = &previews[0];
        assert_eq!(first.link, "https://www.nature.com/articles/s41586-025-09001-x");
        assert_eq!(first.title.as_deref(), Some("Deep sea vents"));
        assert_eq!(first.doi.as_deref(), Some("10.1038/s41586-025-09001-x"));
        assert_eq!(first.article_type.as_deref(), Some("Article"));
        assert_eq!(first.publication_date, NaiveDate::from_ymd_opt(2025, 6, 12));
        assert_eq!(first.authors, vec!["Ada Lovelace", "Alan Turing"]);
    }

    #[test]
    fn test_card_doi_attribute_wins_over_derived() {
        let page = IndexPage::parse(CARD_HTML, base(), Some("10.1038".to_string()));
        let second = page.previews().nth(1).unwrap();
        assert_eq!(second.doi.as_deref(), Some("10.9999/explicit"));
        assert!(second.authors.is_empty());
        assert_eq!(second.publication_date, None);
    }

    #[test]
    fn test_no_prefix_means_no_derived_doi() {
        let page = IndexPage::parse(CARD_HTML, base(), None);
        assert_eq!(page.previews().next().unwrap().doi, None);
    }

    #[test]
    fn test_derive_doi_requires_article_path() {
        let link = Url::parse("https://www.nature.com/collections/abc").unwrap();
        assert_eq!(derive_doi(&link, Some("10.1038")), None);
    }

    #[test]
    fn test_empty_page_has_no_previews() {
        let page = IndexPage::parse("<html><body></body></html>", base(), None);
        assert_eq!(page.previews().count(), 0);
    }

    #[tokio::test]
    async fn test_read_page_uses_page_url() {
        let config = CrawlConfig {
            index_url: "https://www.nature.com/list?page={page}".to_string(),
            ..Default::default()
        };
        let fetcher = ScriptedFetcher::default().page(
            "https://www.nature.com/list?page=2",
            &fixtures::listing(&[("/articles/a", "A")]),
        );

        let page = read_page(&fetcher, &config, 2).await.unwrap();
        assert_eq!(page.previews().count(), 1);
        assert!(fetcher.requested("https://www.nature.com/list?page=2"));
    }

    #[tokio::test]
    async fn test_read_page_fetch_failure() {
        let config = CrawlConfig::default();
        let fetcher = ScriptedFetcher::default();
        let err = read_page(&fetcher, &config, 1).await.err().unwrap();
        assert!(err.is_fetch());
    }
}
