//! Core type definitions for archived transcripts

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Date format used for transcript dates and date-range filters
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Ingestion payload for one transcript
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptInput {
    pub id: String,
    pub streamer: String,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub stream_type: String,
    #[serde(default)]
    pub stream_title: String,
    /// Raw SRT document
    #[serde(default)]
    pub srt: String,
}

impl TranscriptInput {
    /// Check required fields and the date format
    pub fn validate(&self) -> Result<(), InputError> {
        if self.id.trim().is_empty() {
            return Err(InputError::MissingField("id"));
        }
        if self.streamer.trim().is_empty() {
            return Err(InputError::MissingField("streamer"));
        }
        if self.date.trim().is_empty() {
            return Err(InputError::MissingField("date"));
        }
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
            .map_err(|_| InputError::InvalidDate(self.date.clone()))?;
        Ok(())
    }

    /// Metadata portion of the payload
    pub fn metadata(&self) -> TranscriptMetadata {
        TranscriptMetadata {
            id: self.id.clone(),
            streamer: self.streamer.clone(),
            date: self.date.clone(),
            stream_type: self.stream_type.clone(),
            title: self.stream_title.clone(),
        }
    }
}

/// Stored transcript metadata (no line content)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptMetadata {
    pub id: String,
    pub streamer: String,
    pub date: String,
    pub stream_type: String,
    #[serde(rename = "streamTitle")]
    pub title: String,
}

/// A single timestamped line of a stored transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptLine {
    /// Position in start-time order, as a string
    pub id: String,
    /// `hh:mm:ss`
    pub start: String,
    pub text: String,
}

/// A transcript with its lines ordered by start time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    #[serde(flatten)]
    pub metadata: TranscriptMetadata,
    pub transcript_lines: Vec<TranscriptLine>,
}

/// A line attached to a search hit because it matched the phrase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchContext {
    pub start_time: String,
    pub line: String,
}

impl SearchContext {
    /// Excerpt of the line around the first occurrence of `phrase`
    pub fn excerpt(&self, phrase: &str, word_buffer: i32) -> String {
        let normalized = crate::normalize::normalize(&self.line);
        crate::snippet::excerpt(&self.line, &normalized, phrase, word_buffer)
    }
}

/// One transcript in a search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSearch {
    #[serde(flatten)]
    pub metadata: TranscriptMetadata,
    /// Matching lines in start-time order, at most the context limit
    pub contexts: Vec<SearchContext>,
}

/// One point of a time series: `x` is `hh:mm:ss` or `YYYY-MM-DD`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub x: String,
    pub y: u64,
}

impl SeriesPoint {
    pub fn new(x: impl Into<String>, y: u64) -> Self {
        Self { x: x.into(), y }
    }
}

/// Visibility granted by the authorization gate
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Access {
    /// No scope: nothing is hidden
    #[default]
    Unrestricted,
    /// Restricted transcripts of this streamer are visible
    Member(String),
    /// Explicitly public view: restricted transcripts are hidden
    Public,
}

impl Access {
    /// Build from an optional authorized channel; no scope means no carve-out
    pub fn from_scope(scope: Option<String>) -> Self {
        match scope {
            Some(owner) => Access::Member(owner),
            None => Access::Unrestricted,
        }
    }

    /// Whether a transcript with this metadata is visible
    pub fn can_view(&self, metadata: &TranscriptMetadata, restricted_type: &str) -> bool {
        if metadata.stream_type != restricted_type {
            return true;
        }
        match self {
            Access::Public => false,
            Access::Member(owner) => *owner == metadata.streamer,
            Access::Unrestricted => true,
        }
    }
}
