//! Human-readable output formatting

use super::colors::*;
use vod_core::{SearchContext, SeriesPoint, TranscriptLine, TranscriptMetadata};
use vod_store::StoreStats;

/// Widest bar drawn by [`format_series`]
const BAR_WIDTH: u64 = 40;

/// Format transcript metadata as one list row
pub fn format_metadata(meta: &TranscriptMetadata, restricted_type: &str) -> String {
    let title = if meta.title.is_empty() {
        String::new()
    } else {
        format!("  {}", meta.title)
    };
    format!(
        "{}  {}  [{}]{}  {}",
        colored_date(&meta.date),
        colored_streamer(&meta.streamer),
        colored_type(&meta.stream_type, restricted_type),
        title,
        label(&format!("({})", meta.id))
    )
}

/// Format transcript metadata detail view
pub fn format_metadata_detail(meta: &TranscriptMetadata, restricted_type: &str) -> String {
    let mut lines = Vec::new();
    lines.push(format!("{}: {}", label("ID"), value(&meta.id)));
    lines.push(format!("{}: {}", label("Streamer"), colored_streamer(&meta.streamer)));
    lines.push(format!("{}: {}", label("Date"), colored_date(&meta.date)));
    lines.push(format!(
        "{}: {}",
        label("Type"),
        colored_type(&meta.stream_type, restricted_type)
    ));
    if !meta.title.is_empty() {
        lines.push(format!("{}: {}", label("Title"), value(&meta.title)));
    }
    lines.join("\n")
}

/// Format a transcript line with its position and start time
pub fn format_line(line: &TranscriptLine) -> String {
    format!(
        "{} {}  {}",
        colored_position(&line.id),
        colored_time(&line.start),
        line.text
    )
}

/// Format a search context line, highlighting `spans` (byte ranges into `text`)
pub fn format_context(context: &SearchContext, text: &str, spans: &[(usize, usize)]) -> String {
    format!(
        "  {}  {}",
        colored_time(&context.start_time),
        highlight_spans(text, spans)
    )
}

/// Wrap the given byte ranges of `text` in highlight colors
pub fn highlight_spans(text: &str, spans: &[(usize, usize)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for &(start, end) in spans {
        if start < cursor || end > text.len() || start >= end {
            continue;
        }
        let (Some(before), Some(matched)) = (text.get(cursor..start), text.get(start..end)) else {
            continue;
        };
        out.push_str(before);
        out.push_str(&highlight(matched));
        cursor = end;
    }
    out.push_str(text.get(cursor..).unwrap_or_default());
    out
}

/// Format a series as a horizontal bar chart
pub fn format_series(points: &[SeriesPoint]) -> String {
    let max = points.iter().map(|p| p.y).max().unwrap_or(0).max(1);
    points
        .iter()
        .map(|point| {
            let width = (point.y * BAR_WIDTH).div_ceil(max) as usize;
            format!(
                "{}  {} {}",
                colored_time(&point.x),
                "█".repeat(width),
                value(&format_count(point.y))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format archive statistics
pub fn format_stats(stats: &StoreStats) -> String {
    let mut lines = Vec::new();
    let path = stats
        .db_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ":memory:".to_string());
    lines.push(format!("{}: {}", label("Database"), value(&path)));
    lines.push(format!("{}: {}", label("Size"), value(&stats.format_size())));
    lines.push(format!("{}: v{}", label("Schema"), stats.version));
    lines.push(format!(
        "{}: {}",
        label("Transcripts"),
        value(&format_count(stats.transcript_count))
    ));
    lines.push(format!("{}: {}", label("Lines"), value(&format_count(stats.line_count))));
    lines.push(format!(
        "{}: {}",
        label("Streamers"),
        value(&format_count(stats.streamer_count))
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_highlight_spans() {
        plain();
        assert_eq!(highlight_spans("a test here", &[(2, 6)]), "a test here");
        // Overlapping and out-of-range spans are skipped
        assert_eq!(highlight_spans("abc", &[(0, 2), (1, 3), (2, 9)]), "abc");
        assert_eq!(highlight_spans("", &[]), "");
    }

    #[test]
    fn test_format_series_scales_bars() {
        plain();
        let chart = format_series(&[SeriesPoint::new("00:00:01", 1), SeriesPoint::new("00:00:02", 4)]);
        let rows: Vec<&str> = chart.lines().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], format!("00:00:01  {} 1", "█".repeat(10)));
        assert_eq!(rows[1], format!("00:00:02  {} 4", "█".repeat(40)));
        assert_eq!(format_series(&[]), "");
    }

    #[test]
    fn test_format_metadata_row() {
        plain();
        let meta = TranscriptMetadata {
            id: "v1".into(),
            streamer: "StreamerA".into(),
            date: "2023-01-01".into(),
            stream_type: "Stream".into(),
            title: "First".into(),
        };
        assert_eq!(
            format_metadata(&meta, "Members"),
            "2023-01-01  StreamerA  [Stream]  First  (v1)"
        );
    }
}
