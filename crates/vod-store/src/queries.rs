//! Transcript retrieval and archive statistics

use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::PathBuf;
use vod_core::{Access, Transcript, TranscriptLine, TranscriptMetadata};

use crate::clause::WhereClause;
use crate::connection::StoreError;
use crate::schema;

/// Column list matching [`row_to_metadata`]
pub(crate) const METADATA_COLUMNS: &str = "t.id, t.streamer, t.date, t.title, t.stream_type";

/// Metadata of one transcript, if it exists and `access` may see it
pub fn retrieve_metadata(
    conn: &Connection,
    id: &str,
    access: &Access,
    restricted_type: &str,
) -> Result<TranscriptMetadata, StoreError> {
    let mut clause = WhereClause::new();
    clause.push(" AND t.id = ?", [id.to_string()]);
    let clause = clause.access(access, restricted_type);

    let sql = format!("SELECT {} FROM transcripts t{}", METADATA_COLUMNS, clause.sql());
    conn.query_row(&sql, clause.params().as_slice(), row_to_metadata)
        .optional()?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))
}

/// A transcript with its lines ordered by start time.
///
/// Line ids are the positions in that order.
pub fn retrieve_transcript(
    conn: &Connection,
    id: &str,
    access: &Access,
    restricted_type: &str,
) -> Result<Transcript, StoreError> {
    let tx = conn.unchecked_transaction()?;
    let metadata = retrieve_metadata(&tx, id, access, restricted_type)?;

    let mut stmt = tx.prepare(
        "SELECT start_time, text FROM transcript_lines
         WHERE transcript_id = ?
         ORDER BY start_time ASC, rowid ASC",
    )?;
    let rows = stmt.query_map([id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

    let mut lines = Vec::new();
    for (position, row) in rows.enumerate() {
        let (start, text) = row?;
        lines.push(TranscriptLine {
            id: position.to_string(),
            start,
            text,
        });
    }
    drop(stmt);
    tx.commit()?;

    Ok(Transcript {
        metadata,
        transcript_lines: lines,
    })
}

/// Metadata of every visible transcript, newest first
pub fn all_metadata(
    conn: &Connection,
    access: &Access,
    restricted_type: &str,
) -> Result<Vec<TranscriptMetadata>, StoreError> {
    let clause = WhereClause::new().access(access, restricted_type);
    let sql = format!(
        "SELECT {} FROM transcripts t{} ORDER BY t.date DESC, t.id ASC",
        METADATA_COLUMNS,
        clause.sql()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(clause.params().as_slice(), row_to_metadata)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Number of stored transcripts
pub fn transcript_count(conn: &Connection) -> Result<u64, StoreError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM transcripts", [], |row| row.get(0))?;
    Ok(count.max(0) as u64)
}

/// Number of stored lines of one transcript
pub fn line_count(conn: &Connection, id: &str) -> Result<u64, StoreError> {
    let count: Option<i64> = conn
        .query_row(
            "SELECT (SELECT COUNT(*) FROM transcript_lines WHERE transcript_id = t.id)
             FROM transcripts t WHERE t.id = ?",
            [id],
            |row| row.get(0),
        )
        .optional()?;
    count
        .map(|c| c.max(0) as u64)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))
}

/// Liveness check
pub fn ping(conn: &Connection) -> Result<(), StoreError> {
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    Ok(())
}

/// Archive statistics
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub version: i32,
    pub transcript_count: u64,
    pub line_count: u64,
    pub streamer_count: u64,
    pub db_path: Option<PathBuf>,
    pub db_size_bytes: u64,
}

impl StoreStats {
    /// Format database size as human-readable string
    pub fn format_size(&self) -> String {
        let bytes = self.db_size_bytes as f64;
        if bytes < 1024.0 {
            format!("{} B", bytes)
        } else if bytes < 1024.0 * 1024.0 {
            format!("{:.1} KB", bytes / 1024.0)
        } else if bytes < 1024.0 * 1024.0 * 1024.0 {
            format!("{:.1} MB", bytes / (1024.0 * 1024.0))
        } else {
            format!("{:.1} GB", bytes / (1024.0 * 1024.0 * 1024.0))
        }
    }
}

/// Collect archive statistics
pub fn stats(conn: &Connection, db_path: Option<PathBuf>) -> Result<StoreStats, StoreError> {
    let version = schema::schema_version(conn)?;
    let (transcripts, streamers): (i64, i64) = conn.query_row(
        "SELECT COUNT(*), COUNT(DISTINCT streamer) FROM transcripts",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let lines: i64 = conn.query_row("SELECT COUNT(*) FROM transcript_lines", [], |row| row.get(0))?;

    let db_size_bytes = match db_path.as_ref().and_then(|p| std::fs::metadata(p).ok()) {
        Some(meta) => meta.len(),
        None => {
            let pages: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
            let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;
            (pages * page_size).max(0) as u64
        }
    };

    Ok(StoreStats {
        version,
        transcript_count: transcripts.max(0) as u64,
        line_count: lines.max(0) as u64,
        streamer_count: streamers.max(0) as u64,
        db_path,
        db_size_bytes,
    })
}

/// Convert a row selected with [`METADATA_COLUMNS`]
pub(crate) fn row_to_metadata(row: &Row) -> rusqlite::Result<TranscriptMetadata> {
    Ok(TranscriptMetadata {
        id: row.get(0)?,
        streamer: row.get(1)?,
        date: row.get(2)?,
        title: row.get(3)?,
        stream_type: row.get(4)?,
    })
}
