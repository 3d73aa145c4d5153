//! Relational persistence for articles, authors and their links.
//!
//! Tables:
//!
//! | Table | Key | Notes |
//! |-------|-----|-------|
//! | `articles` | `doi` | written once per DOI, never updated |
//! | `authors` | `id` | `orcid_id` unique when present |
//! | `articles_authors` | `(article_doi, author_id)` | `ordinal` is list position |
//! | `title_words` | `word` | occurrence counts over stored titles |
//!
//! [`ArticleStore::save_article`] runs the whole article in one transaction:
//! the conditional article insert decides whether authors and links are
//! written at all, and any failure rolls everything back.

use crate::error::Result;
use crate::models::FullRecord;
use crate::utils::title_words;
use itertools::Itertools;
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS articles (
        doi              TEXT PRIMARY KEY,
        title            TEXT,
        publication_date TEXT,
        article_type     TEXT,
        journal          TEXT,
        title_link       TEXT,
        received         TEXT,
        accepted         TEXT,
        accesses         INTEGER,
        citations        INTEGER,
        altmetric        INTEGER,
        created_at       TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS authors (
        id       INTEGER PRIMARY KEY,
        name     TEXT NOT NULL,
        orcid_id TEXT
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_authors_orcid ON authors(orcid_id)
        WHERE orcid_id IS NOT NULL;
    CREATE INDEX IF NOT EXISTS idx_authors_name ON authors(name);

    CREATE TABLE IF NOT EXISTS articles_authors (
        article_doi TEXT NOT NULL REFERENCES articles(doi),
        author_id   INTEGER NOT NULL REFERENCES authors(id),
        ordinal     INTEGER NOT NULL,
        PRIMARY KEY (article_doi, author_id)
    );
    CREATE INDEX IF NOT EXISTS idx_links_author ON articles_authors(author_id);

    CREATE TABLE IF NOT EXISTS title_words (
        word  TEXT PRIMARY KEY,
        count INTEGER NOT NULL DEFAULT 0
    );
";

/// What [`ArticleStore::save_article`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted { links: usize },
    /// The DOI was already stored; nothing was written.
    Duplicate,
}

/// Row counts, for run summaries and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreCounts {
    pub articles: i64,
    pub authors: i64,
    pub links: i64,
}

/// Owns the single database connection for the run.
pub struct ArticleStore {
    conn: Connection,
}

impl ArticleStore {
    /// Open (creating if needed) the database file and its schema.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let store = Self::with_connection(Connection::open(path)?)?;
        info!("Opened article store");
        Ok(store)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// True when an article with this DOI is already stored.
    pub fn contains_doi(&self, doi: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM articles WHERE doi = ?1", [doi], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// Store one article with its authors and links, atomically.
    ///
    /// A DOI that is already present is a no-op returning
    /// [`SaveOutcome::Duplicate`]. On error nothing from this record remains.
    #[instrument(level = "debug", skip_all, fields(doi = %record.doi))]
    pub fn save_article(&mut self, record: &FullRecord) -> Result<SaveOutcome> {
        let tx = self.conn.transaction()?;

        if !upsert_article(&tx, record)? {
            debug!("DOI already stored");
            return Ok(SaveOutcome::Duplicate);
        }

        let mut author_ids = Vec::with_capacity(record.authors.len());
        for author in &record.authors {
            let name = author.name.trim();
            if name.is_empty() {
                continue;
            }
            author_ids.push(upsert_author(&tx, name, author.orcid.as_deref())?);
        }
        let links = link_article_authors(&tx, &record.doi, &author_ids)?;
        if let Some(title) = &record.title {
            count_title_words(&tx, title)?;
        }

        tx.commit()?;
        debug!(links, "Article committed");
        Ok(SaveOutcome::Inserted { links })
    }

    pub fn counts(&self) -> Result<StoreCounts> {
        let count = |table: &str| -> Result<i64> {
            Ok(self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?)
        };
        Ok(StoreCounts {
            articles: count("articles")?,
            authors: count("authors")?,
            links: count("articles_authors")?,
        })
    }
}

/// Insert the article row unless its DOI exists. Returns whether it was new.
pub fn upsert_article(conn: &Connection, record: &FullRecord) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO articles (
             doi, title, publication_date, article_type, journal, title_link,
             received, accepted, accesses, citations, altmetric
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            record.doi,
            record.title,
            record.publication_date.map(|d| d.to_string()),
            record.article_type,
            record.journal,
            record.title_link,
            record.received.map(|d| d.to_string()),
            record.accepted.map(|d| d.to_string()),
            record.metrics.accesses,
            record.metrics.citations,
            record.metrics.altmetric,
        ],
    )?;
    Ok(inserted == 1)
}

/// Find or create an author and return its id.
///
/// With an ORCID the match is by ORCID only, so a namesake with a different
/// ORCID gets its own row. Without one the match is by exact name, taking the
/// oldest row if several share it.
pub fn upsert_author(conn: &Connection, name: &str, orcid: Option<&str>) -> Result<i64> {
    let existing: Option<i64> = match orcid {
        Some(orcid) => conn
            .query_row("SELECT id FROM authors WHERE orcid_id = ?1", [orcid], |row| {
                row.get(0)
            })
            .optional()?,
        None => conn
            .query_row(
                "SELECT id FROM authors WHERE name = ?1 ORDER BY id LIMIT 1",
                [name],
                |row| row.get(0),
            )
            .optional()?,
    };
    if let Some(id) = existing {
        return Ok(id);
    }

    conn.execute(
        "INSERT INTO authors (name, orcid_id) VALUES (?1, ?2)",
        params![name, orcid],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Link authors to an article with ordinals `0..n` in slice order.
///
/// An author appearing twice keeps only its first position, and later
/// authors close the gap. Returns the number of link rows written.
pub fn link_article_authors(conn: &Connection, doi: &str, author_ids: &[i64]) -> Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO articles_authors (article_doi, author_id, ordinal)
         VALUES (?1, ?2, ?3)",
    )?;
    let mut written = 0;
    for (ordinal, author_id) in author_ids.iter().unique().enumerate() {
        written += stmt.execute(params![doi, author_id, ordinal as i64])?;
    }
    Ok(written)
}

/// Add a title's words to the running word counts.
pub fn count_title_words(conn: &Connection, title: &str) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO title_words (word, count) VALUES (?1, ?2)
         ON CONFLICT(word) DO UPDATE SET count = count + excluded.count",
    )?;
    for (word, n) in title_words(title).into_iter().counts() {
        stmt.execute(params![word, n as i64])?;
    }
    Ok(())
}
