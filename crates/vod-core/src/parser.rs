//! SRT parsing for transcript documents
//!
//! A document is a sequence of blocks separated by a blank line:
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:04,000
//! first caption line
//! optional second line
//! ```
//!
//! Malformed blocks are dropped; a bad block never fails the document.

use serde::{Deserialize, Serialize};

/// Width of an `hh:mm:ss` timestamp
pub const START_TIME_LEN: usize = 8;

/// One caption block reduced to its start time and text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedLine {
    /// Start time truncated to `hh:mm:ss`
    pub start: String,
    /// Caption text with inner newlines joined by single spaces
    pub text: String,
}

impl TimedLine {
    pub fn new(start: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            text: text.into(),
        }
    }
}

/// Parse raw SRT content into timed lines, in document order
pub fn parse_srt(document: &str) -> Vec<TimedLine> {
    let document = document.replace("\r\n", "\n").replace('\r', "\n");
    let document = document.trim();
    if document.is_empty() {
        return Vec::new();
    }

    let blocks: Vec<&str> = document.split("\n\n").collect();
    let mut lines = Vec::with_capacity(blocks.len());

    for block in blocks {
        if let Some(line) = parse_block(block.trim_matches('\n')) {
            lines.push(line);
        }
    }

    lines
}

/// Parse a single block: index line, timestamp line, then text
fn parse_block(block: &str) -> Option<TimedLine> {
    let mut parts = block.splitn(3, '\n');
    let _index = parts.next()?;
    let timing = parts.next()?;
    let text = parts.next()?;

    let start = start_time(timing)?;

    let text = text.replace('\n', " ");
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    Some(TimedLine::new(start, text))
}

/// Extract `hh:mm:ss` from `hh:mm:ss,mmm --> hh:mm:ss,mmm`
fn start_time(timing: &str) -> Option<&str> {
    let leading = timing.split("-->").next()?.trim();
    if leading.len() < START_TIME_LEN {
        return None;
    }
    leading.get(..START_TIME_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_blocks() {
        let srt = "1\n00:00:01,000 --> 00:00:04,000\nHello there\n\n2\n00:00:05,500 --> 00:00:07,000\nGeneral Kenobi\n";
        let lines = parse_srt(srt);
        assert_eq!(
            lines,
            vec![
                TimedLine::new("00:00:01", "Hello there"),
                TimedLine::new("00:00:05", "General Kenobi"),
            ]
        );
    }

    #[test]
    fn test_parse_windows_line_endings() {
        let srt = "1\r\n00:00:01,000 --> 00:00:02,000\r\nfirst\r\n\r\n2\r\n00:00:03,000 --> 00:00:04,000\r\nsecond\r\n";
        let lines = parse_srt(srt);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text, "second");
    }

    #[test]
    fn test_multiline_text_is_joined() {
        let srt = "1\n00:01:00,000 --> 00:01:02,000\nline one\nline two\n  line three  ";
        let lines = parse_srt(srt);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "line one line two   line three");
    }

    #[test]
    fn test_malformed_blocks_are_dropped() {
        let srt = "\
1
00:00:01,000 --> 00:00:02,000
kept

2
only two lines

3
0:0:1 --> 0:0:2
short timestamp

4
00:00:09,000 --> 00:00:10,000


5
00:00:11,000 --> 00:00:12,000
also kept";
        let lines = parse_srt(srt);
        assert_eq!(
            lines,
            vec![
                TimedLine::new("00:00:01", "kept"),
                TimedLine::new("00:00:11", "also kept"),
            ]
        );
    }

    #[test]
    fn test_document_order_is_preserved() {
        let srt = "1\n00:00:09,000 --> 00:00:10,000\nlater\n\n2\n00:00:01,000 --> 00:00:02,000\nearlier";
        let lines = parse_srt(srt);
        assert_eq!(lines[0].start, "00:00:09");
        assert_eq!(lines[1].start, "00:00:01");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_srt("").is_empty());
        assert!(parse_srt("   \n\n \r\n ").is_empty());
    }

    #[test]
    fn test_extra_blank_lines_between_blocks() {
        let srt = "1\n00:00:01,000 --> 00:00:02,000\na\n\n\n\n2\n00:00:03,000 --> 00:00:04,000\nb";
        let lines = parse_srt(srt);
        assert_eq!(lines.len(), 2);
    }
}
