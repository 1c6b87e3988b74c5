//! Excerpt extraction around a phrase match
//!
//! The phrase is located in the normalized words of a line and the same word
//! positions are cut out of the original text. Normalization is assumed to keep
//! the word count: a token like `hello,world` splits into two normalized words
//! and shifts the window by one.

use crate::normalize::normalize;

/// Marker placed where words were cut off
pub const ELLIPSIS: &str = "___";

/// Produce a readable window of `original` around the first match of `phrase`.
///
/// `normalized` must be `normalize(original)`. `word_buffer` is the number of
/// words kept on each side of the match; a negative value keeps only the match.
pub fn excerpt(original: &str, normalized: &str, phrase: &str, word_buffer: i32) -> String {
    let original_words: Vec<&str> = original.split_whitespace().collect();
    let clean_words: Vec<&str> = normalized.split_whitespace().collect();
    let clean_phrase = normalize(phrase);
    let phrase_words: Vec<&str> = clean_phrase.split_whitespace().collect();

    if phrase_words.is_empty() || original_words.is_empty() {
        return original.to_string();
    }

    let match_index = match find_phrase(&clean_words, &phrase_words) {
        Some(index) => index as i64,
        None => return truncated(original, &original_words, word_buffer),
    };
    let match_len = phrase_words.len() as i64;
    let word_count = original_words.len() as i64;
    let buffer = i64::from(word_buffer);

    let mut start = (match_index - buffer).max(0);
    let mut end = (match_index + match_len + buffer).min(word_count);

    if start >= end {
        start = match_index.max(0);
        end = (match_index + match_len).min(word_count);
        if start >= end {
            return original.to_string();
        }
    }

    let window = original_words[start as usize..end as usize].join(" ");

    let mut result = String::with_capacity(window.len() + 2 * (ELLIPSIS.len() + 1));
    if start > 0 {
        result.push_str(ELLIPSIS);
        result.push(' ');
    }
    result.push_str(&window);
    if end < word_count {
        result.push(' ');
        result.push_str(ELLIPSIS);
    }
    result
}

/// Index of the first contiguous occurrence of `needle` in `words`
fn find_phrase(words: &[&str], needle: &[&str]) -> Option<usize> {
    if needle.len() > words.len() {
        return None;
    }
    words.windows(needle.len()).position(|window| window == needle)
}

/// Fallback when the phrase is not found: keep the first `4 * word_buffer` words
fn truncated(original: &str, original_words: &[&str], word_buffer: i32) -> String {
    let limit = usize::try_from(word_buffer.saturating_mul(4)).unwrap_or(0);
    if original_words.len() > limit {
        format!("{}{}", original_words[..limit].join(" "), ELLIPSIS)
    } else {
        original.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGINAL: &str = "This is a test of the emergency broadcast system.";

    fn snip(phrase: &str, buffer: i32) -> String {
        excerpt(ORIGINAL, &normalize(ORIGINAL), phrase, buffer)
    }

    #[test]
    fn test_match_in_middle() {
        assert_eq!(snip("emergency", 1), "___ the emergency broadcast ___");
    }

    #[test]
    fn test_match_at_start() {
        assert_eq!(snip("This is", 2), "This is a test ___");
    }

    #[test]
    fn test_match_at_end_keeps_original_punctuation() {
        assert_eq!(snip("system", 2), "___ emergency broadcast system.");
    }

    #[test]
    fn test_buffer_larger_than_text() {
        assert_eq!(snip("test", 100), ORIGINAL);
    }

    #[test]
    fn test_no_match_truncates_long_text() {
        assert_eq!(snip("potato", 2), "This is a test of the emergency broadcast___");
    }

    #[test]
    fn test_no_match_short_text_is_unchanged() {
        assert_eq!(snip("xyz", 10), ORIGINAL);
    }

    #[test]
    fn test_empty_phrase_returns_original() {
        assert_eq!(snip("", 5), ORIGINAL);
        assert_eq!(snip("?!", 5), ORIGINAL);
    }

    #[test]
    fn test_negative_buffer_keeps_match_only() {
        assert_eq!(snip("test", -5), "___ test ___");
    }

    #[test]
    fn test_multi_word_phrase_with_punctuation() {
        assert_eq!(snip("Emergency, broadcast!", 0), "___ emergency broadcast ___");
    }

    #[test]
    fn test_token_split_misalignment_is_preserved() {
        // "hello,world" is one original word but two normalized words
        assert_eq!(excerpt("hello,world", "hello world", "world", 1), "hello,world");
        assert_eq!(excerpt("hello,world", "hello world", "world", 0), "hello,world");
    }
}
