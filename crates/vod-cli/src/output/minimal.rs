//! Minimal text output formatting

use vod_core::{SeriesPoint, TranscriptLine, TranscriptMetadata};

/// Format a transcript line as minimal text (content only)
pub fn format_line(line: &TranscriptLine) -> String {
    line.text.clone()
}

/// Format transcript metadata as its id
pub fn format_metadata(meta: &TranscriptMetadata) -> String {
    meta.id.clone()
}

/// Format a series point as tab-separated `x` and `y`
pub fn format_point(point: &SeriesPoint) -> String {
    format!("{}\t{}", point.x, point.y)
}
