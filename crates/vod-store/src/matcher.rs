//! Compiled phrase matchers, cached per (form, whole-word, phrase)
//!
//! Normalized matchers run against `clean_text`; literal matchers escape the
//! phrase as typed and run against original line text. Either way the cache
//! only builds literal-phrase matchers. Entries are never evicted.

use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use tracing::debug;
use vod_core::normalize;

#[derive(Error, Debug, Clone)]
#[error("Failed to compile matcher for {phrase:?}: {source}")]
pub struct MatcherError {
    pub phrase: String,
    #[source]
    pub source: regex::Error,
}

/// Which text a matcher is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Form {
    /// Normalized phrase, matched against normalized text
    Clean,
    /// Phrase as typed, matched against original text
    Literal,
}

#[derive(Debug, Default)]
pub struct MatcherCache {
    entries: RwLock<HashMap<(Form, bool, String), Regex>>,
}

impl MatcherCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the normalized matcher for `phrase`, compiling it on first use.
    ///
    /// Matching is case-insensitive; use it on normalized text.
    pub fn get(&self, phrase: &str, whole_word: bool) -> Result<Regex, MatcherError> {
        self.lookup(Form::Clean, phrase, whole_word)
    }

    /// Get the matcher for `phrase` as typed, for use on original text.
    ///
    /// Only surrounding whitespace is trimmed, so `don't` matches `I don't know`.
    pub fn literal(&self, phrase: &str, whole_word: bool) -> Result<Regex, MatcherError> {
        self.lookup(Form::Literal, phrase.trim(), whole_word)
    }

    fn lookup(&self, form: Form, phrase: &str, whole_word: bool) -> Result<Regex, MatcherError> {
        let key = (form, whole_word, phrase.to_string());
        if let Some(regex) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(regex.clone());
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(regex) = entries.get(&key) {
            return Ok(regex.clone());
        }

        let source = match form {
            Form::Clean => normalize(phrase),
            Form::Literal => phrase.to_string(),
        };
        let regex = compile(phrase, &source, whole_word)?;
        debug!(phrase, whole_word, pattern = regex.as_str(), "compiled phrase matcher");
        entries.insert(key, regex.clone());
        Ok(regex)
    }

    /// Count non-overlapping occurrences of `phrase` in `text`
    pub fn count(&self, phrase: &str, whole_word: bool, text: &str) -> Result<usize, MatcherError> {
        Ok(self.get(phrase, whole_word)?.find_iter(text).count())
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn compile(phrase: &str, source: &str, whole_word: bool) -> Result<Regex, MatcherError> {
    let escaped = regex::escape(source);
    let pattern = if whole_word {
        format!(r"\b{}\b", escaped)
    } else {
        escaped
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| MatcherError {
            phrase: phrase.to_string(),
            source,
        })
}
