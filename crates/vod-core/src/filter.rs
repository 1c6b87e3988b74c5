//! Transcript filtering options

use crate::normalize::normalize;
use crate::types::{Access, TranscriptMetadata};

/// Filter options for transcript queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptFilter {
    /// Exact streamer name
    pub streamer: Option<String>,
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Inclusive lower date bound (`YYYY-MM-DD`)
    pub from_date: Option<String>,
    /// Inclusive upper date bound (`YYYY-MM-DD`)
    pub to_date: Option<String>,
    /// Allowed stream types; empty means any
    pub stream_types: Vec<String>,
    /// Visibility of restricted transcripts
    pub access: Access,
}

impl TranscriptFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_streamer(mut self, streamer: impl Into<String>) -> Self {
        self.streamer = Some(streamer.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_date_range(mut self, from: Option<String>, to: Option<String>) -> Self {
        self.from_date = from;
        self.to_date = to;
        self
    }

    pub fn with_stream_types(mut self, types: Vec<String>) -> Self {
        self.stream_types = types;
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// In-memory equivalent of the SQL filter
    pub fn matches(&self, metadata: &TranscriptMetadata, restricted_type: &str) -> bool {
        if let Some(streamer) = non_empty(&self.streamer) {
            if metadata.streamer != streamer {
                return false;
            }
        }
        if let Some(title) = non_empty(&self.title) {
            if !metadata
                .title
                .to_ascii_lowercase()
                .contains(&title.to_ascii_lowercase())
            {
                return false;
            }
        }
        if let Some(from) = non_empty(&self.from_date) {
            if metadata.date.as_str() < from {
                return false;
            }
        }
        if let Some(to) = non_empty(&self.to_date) {
            if metadata.date.as_str() > to {
                return false;
            }
        }
        if !self.stream_types.is_empty() && !self.stream_types.contains(&metadata.stream_type) {
            return false;
        }
        self.access.can_view(metadata, restricted_type)
    }
}

/// Empty strings are treated as an absent filter
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Document search request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Phrase to search for; blank means browse without a phrase
    pub phrase: Option<String>,
    /// Only keep lines where the phrase occurs on word boundaries
    pub whole_word: bool,
    pub filter: TranscriptFilter,
}

impl SearchQuery {
    pub fn new(filter: TranscriptFilter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn with_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.phrase = Some(phrase.into());
        self
    }

    pub fn whole_word(mut self, whole_word: bool) -> Self {
        self.whole_word = whole_word;
        self
    }

    /// The normalized phrase, or `None` when nothing searchable is left
    pub fn normalized_phrase(&self) -> Option<String> {
        let clean = normalize(self.phrase.as_deref()?);
        if clean.is_empty() {
            None
        } else {
            Some(clean)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(streamer: &str, date: &str, stream_type: &str, title: &str) -> TranscriptMetadata {
        TranscriptMetadata {
            id: format!("{}-{}", streamer, date),
            streamer: streamer.to_string(),
            date: date.to_string(),
            stream_type: stream_type.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = TranscriptFilter::new();
        assert!(filter.matches(&meta("a", "2023-01-01", "Stream", "x"), "Members"));
        assert!(filter.matches(&meta("a", "2023-01-01", "Members", "x"), "Members"));

        let public = TranscriptFilter::new().with_access(Access::Public);
        assert!(!public.matches(&meta("a", "2023-01-01", "Members", "x"), "Members"));
    }

    #[test]
    fn test_streamer_and_title() {
        let filter = TranscriptFilter::new()
            .with_streamer("StreamerA")
            .with_title("MARIO");
        assert!(filter.matches(&meta("StreamerA", "2023-01-01", "Stream", "Super Mario run"), "Members"));
        assert!(!filter.matches(&meta("StreamerB", "2023-01-01", "Stream", "Super Mario run"), "Members"));
        assert!(!filter.matches(&meta("StreamerA", "2023-01-01", "Stream", "Zelda"), "Members"));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let filter = TranscriptFilter::new()
            .with_date_range(Some("2023-01-01".to_string()), Some("2023-01-31".to_string()));
        assert!(filter.matches(&meta("a", "2023-01-01", "Stream", ""), "Members"));
        assert!(filter.matches(&meta("a", "2023-01-31", "Stream", ""), "Members"));
        assert!(!filter.matches(&meta("a", "2023-02-01", "Stream", ""), "Members"));
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let filter = TranscriptFilter::new().with_streamer("").with_title("");
        assert!(filter.matches(&meta("a", "2023-01-01", "Stream", ""), "Members"));
    }

    #[test]
    fn test_stream_types_and_member_access() {
        let filter = TranscriptFilter::new()
            .with_stream_types(vec!["Members".to_string()])
            .with_access(Access::Member("a".to_string()));
        assert!(filter.matches(&meta("a", "2023-01-01", "Members", ""), "Members"));
        assert!(!filter.matches(&meta("b", "2023-01-01", "Members", ""), "Members"));
        assert!(!filter.matches(&meta("a", "2023-01-01", "Stream", ""), "Members"));
    }

    #[test]
    fn test_normalized_phrase() {
        let query = SearchQuery::default().with_phrase("  Hello, World ");
        assert_eq!(query.normalized_phrase().as_deref(), Some("hello world"));
        assert_eq!(SearchQuery::default().with_phrase("?!").normalized_phrase(), None);
        assert_eq!(SearchQuery::default().normalized_phrase(), None);
    }
}
