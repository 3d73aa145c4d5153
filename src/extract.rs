//! Selector-based field lookups shared by the page readers.
//!
//! Every helper returns `Option`: a selector that matches nothing, an empty
//! text node, or a value that does not parse all come back as `None` so the
//! caller can apply its own defaulting. Nothing in here fails.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static DOI_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^10\.\d{1,9}/\S+$").unwrap());

/// Compile a selector known at build time.
///
/// Panics on invalid CSS, so only call it with literals.
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}

/// Collapse runs of whitespace and trim. Empty input gives `None`.
pub fn clean_text(raw: &str) -> Option<String> {
    let cleaned = WHITESPACE.replace_all(raw.trim(), " ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.into_owned())
    }
}

/// Whitespace-normalized text of an element.
pub fn element_text(el: ElementRef<'_>) -> Option<String> {
    clean_text(&el.text().collect::<String>())
}

/// Text of the first descendant matching `sel`.
pub fn first_text(el: ElementRef<'_>, sel: &Selector) -> Option<String> {
    el.select(sel).next().and_then(element_text)
}

/// Attribute of the first descendant matching `sel`.
pub fn first_attr(el: ElementRef<'_>, sel: &Selector, attr: &str) -> Option<String> {
    el.select(sel)
        .next()
        .and_then(|node| node.value().attr(attr))
        .and_then(clean_text)
}

/// Non-empty texts of every descendant matching `sel`, in document order.
pub fn all_texts(el: ElementRef<'_>, sel: &Selector) -> Vec<String> {
    el.select(sel).filter_map(element_text).collect()
}

/// Normalize a date to a calendar day.
///
/// Accepts `2025-06-12`, RFC 3339 timestamps such as `2025-06-12T09:00:00Z`,
/// `2025/06/12` from citation meta tags, and the long form `12 June 2025`
/// used in bibliographic sections.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y/%m/%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    NaiveDate::parse_from_str(raw, "%d %B %Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d %b %Y"))
        .ok()
}

/// Parse a metrics counter such as `312`, `1,204` or `12k`.
pub fn parse_count(raw: &str) -> Option<i64> {
    let raw = raw.trim().replace(',', "");
    if let Some(thousands) = raw.strip_suffix(['k', 'K']) {
        let value: f64 = thousands.parse().ok()?;
        return Some((value * 1000.0).round() as i64);
    }
    if let Some(millions) = raw.strip_suffix(['m', 'M']) {
        let value: f64 = millions.parse().ok()?;
        return Some((value * 1_000_000.0).round() as i64);
    }
    raw.parse().ok()
}

/// Pull a bare DOI out of `https://doi.org/10.x/y`, `doi:10.x/y` or `10.x/y`.
pub fn doi_from_text(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let tail = match raw.rsplit_once("doi.org/") {
        Some((_, tail)) => tail,
        None => raw.strip_prefix("doi:").unwrap_or(raw),
    };
    let doi = tail.trim().trim_end_matches('/');
    DOI_PATTERN.is_match(doi).then(|| doi.to_string())
}

/// ORCID iD from an `https://orcid.org/0000-...` link.
pub fn orcid_from_href(href: &str) -> Option<String> {
    let (_, tail) = href.rsplit_once("orcid.org/")?;
    clean_text(tail.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 6, 12);
        assert_eq!(parse_date("2025-06-12"), expected);
        assert_eq!(parse_date("2025-06-12T09:30:00Z"), expected);
        assert_eq!(parse_date("2025/06/12"), expected);
        assert_eq!(parse_date(" 12 June 2025 "), expected);
        assert_eq!(parse_date("12 Jun 2025"), expected);
    }

    #[test]
    fn test_parse_date_unparseable_is_absent() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("sometime in June"), None);
        assert_eq!(parse_date("2025-13-40"), None);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("312"), Some(312));
        assert_eq!(parse_count("1,204"), Some(1204));
        assert_eq!(parse_count("12k"), Some(12_000));
        assert_eq!(parse_count("1.5k"), Some(1_500));
        assert_eq!(parse_count("2M"), Some(2_000_000));
        assert_eq!(parse_count("n/a"), None);
    }

    #[test]
    fn test_doi_from_text() {
        assert_eq!(
            doi_from_text("https://doi.org/10.1038/s41586-025-09000-1").as_deref(),
            Some("10.1038/s41586-025-09000-1")
        );
        assert_eq!(doi_from_text("doi:10.1/a").as_deref(), Some("10.1/a"));
        assert_eq!(doi_from_text("10.1/b").as_deref(), Some("10.1/b"));
        assert_eq!(doi_from_text("Nature"), None);
        assert_eq!(doi_from_text("https://doi.org/"), None);
    }

    #[test]
    fn test_orcid_from_href() {
        assert_eq!(
            orcid_from_href("http://orcid.org/0000-0001-2345-6789").as_deref(),
            Some("0000-0001-2345-6789")
        );
        assert_eq!(orcid_from_href("https://example.org/profile"), None);
    }

    #[test]
    fn test_lookups_are_tolerant_of_missing_structure() {
        let html = Html::parse_fragment(r#"<div><p class="a">  two   words </p><p class="a"></p></div>"#);
        let root = html.root_element();

        assert_eq!(first_text(root, &selector("p.a")).as_deref(), Some("two words"));
        assert_eq!(first_text(root, &selector("p.missing")), None);
        assert_eq!(first_attr(root, &selector("p.a"), "href"), None);
        assert_eq!(all_texts(root, &selector("p.a")), vec!["two words".to_string()]);
    }
}
