//! Small string helpers used by logging and the title word index.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").unwrap());

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes on a character boundary,
/// with an ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Lowercased ASCII alphanumeric words of a title, in order, repeats kept.
///
/// ```ignore
/// assert_eq!(title_words("CRISPR-Cas9 in vivo"), vec!["crispr", "cas9", "in", "vivo"]);
/// ```
pub fn title_words(title: &str) -> Vec<String> {
    NON_ALNUM
        .split(title)
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}
