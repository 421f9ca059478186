//! Comment text normalization
//!
//! Applied in order: lowercase, strip URL-like tokens, replace every
//! character that is not a letter, number, underscore or whitespace with a
//! space, collapse whitespace and trim. Combining marks count as
//! punctuation, so decomposed accents are dropped.

use regex::Regex;
use std::sync::LazyLock;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S+").expect("URL pattern is valid"));

static NON_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}_\s]").expect("non-word pattern is valid"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Normalize raw comment text.
///
/// Total and idempotent. Blank input yields an empty string.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let without_urls = URL_RE.replace_all(&lowered, " ");
    let word_chars = NON_WORD_RE.replace_all(&without_urls, " ");
    WHITESPACE_RE
        .replace_all(&word_chars, " ")
        .trim()
        .to_string()
}
