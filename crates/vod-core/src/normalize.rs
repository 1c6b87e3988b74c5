//! Text normalization shared by indexing and querying
//!
//! Indexed line text and search phrases both go through [`normalize`], so the
//! full-text index and the phrase matchers always compare like with like.

use once_cell::sync::Lazy;
use regex::Regex;

/// Any character in a Unicode punctuation category (Pc, Pd, Ps, Pe, Pi, Pf, Po)
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{P}").expect("valid punctuation class"));

/// Check whether a character is Unicode punctuation
pub fn is_punctuation(c: char) -> bool {
    let mut buf = [0u8; 4];
    PUNCTUATION.is_match(c.encode_utf8(&mut buf))
}

/// Normalize text for indexing and matching.
///
/// Punctuation becomes a space, everything else is lower-cased, then runs of
/// whitespace collapse to a single ASCII space and the ends are trimmed.
pub fn normalize(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for c in text.chars() {
        if is_punctuation(c) {
            cleaned.push(' ');
        } else {
            cleaned.extend(c.to_lowercase());
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build the FTS5 phrase query for a search phrase.
///
/// Returns `None` when nothing searchable is left after normalization.
pub fn fts_phrase(phrase: &str) -> Option<String> {
    let clean = normalize(phrase);
    if clean.is_empty() {
        None
    } else {
        // normalize() strips '"' so the phrase cannot break out of the quotes
        Some(format!("\"{}\"", clean))
    }
}
