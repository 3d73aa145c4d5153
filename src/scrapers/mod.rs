//! Page readers for the publisher's site.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Indexing**: [`nature::read_page`] fetches one listing page and yields
//!    a [`crate::models::PreviewRecord`] per article card
//! 2. **Fetching**: [`nature_article::read_article`] fetches an article's own
//!    page and extracts its [`crate::models::FullRecord`]
//!
//! | Module | Page | Selector root |
//! |--------|------|---------------|
//! | [`nature`] | `/nature/research-articles?page=N`, `/search?q=..&page=N` | `.app-article-list-row__item` |
//! | [`nature_article`] | `/articles/<id>` | `.c-article-title`, `.c-bibliographic-information` |
//!
//! Field lookups go through [`crate::extract`], so a missing element is an
//! absent field rather than an error.

pub mod nature;
pub mod nature_article;
