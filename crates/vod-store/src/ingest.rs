//! Transcript ingestion and line edits

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};
use vod_core::{normalize, parse_srt, TimedLine, TranscriptInput, TranscriptMetadata};

use crate::connection::StoreError;

/// Validate, parse and store an ingestion payload; returns the stored line count
pub fn ingest(conn: &mut Connection, input: &TranscriptInput) -> Result<usize, StoreError> {
    input.validate()?;
    let lines = parse_srt(&input.srt);
    upsert_transcript(conn, &input.metadata(), &lines)
}

/// Replace a transcript and all of its lines in one transaction.
///
/// Lines are stored in the given order; retrieval sorts them by start time.
pub fn upsert_transcript(
    conn: &mut Connection,
    metadata: &TranscriptMetadata,
    lines: &[TimedLine],
) -> Result<usize, StoreError> {
    let tx = conn.transaction()?;

    let replaced = tx.execute(
        "DELETE FROM transcript_lines WHERE transcript_id = ?",
        [&metadata.id],
    )?;
    tx.execute("DELETE FROM transcripts WHERE id = ?", [&metadata.id])?;

    tx.execute(
        "INSERT INTO transcripts (id, streamer, date, title, stream_type) VALUES (?, ?, ?, ?, ?)",
        params![
            metadata.id,
            metadata.streamer,
            metadata.date,
            metadata.title,
            metadata.stream_type
        ],
    )?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO transcript_lines (transcript_id, start_time, text, clean_text) VALUES (?, ?, ?, ?)",
        )?;
        for line in lines {
            stmt.execute(params![metadata.id, line.start, line.text, normalize(&line.text)])?;
        }
    }

    tx.commit()?;

    info!(
        id = %metadata.id,
        streamer = %metadata.streamer,
        lines = lines.len(),
        replaced,
        "stored transcript"
    );
    Ok(lines.len())
}

/// Replace the text of the line at `position` (start-time order).
///
/// The normalized text and the index entry change in the same transaction.
pub fn update_line(
    conn: &mut Connection,
    id: &str,
    position: usize,
    text: &str,
) -> Result<(), StoreError> {
    let tx = conn.transaction()?;

    let exists: Option<i64> = tx
        .query_row("SELECT 1 FROM transcripts WHERE id = ?", [id], |row| row.get(0))
        .optional()?;
    if exists.is_none() {
        return Err(StoreError::NotFound(id.to_string()));
    }

    let offset = i64::try_from(position).unwrap_or(i64::MAX);
    let rowid: Option<i64> = tx
        .query_row(
            "SELECT rowid FROM transcript_lines WHERE transcript_id = ?
             ORDER BY start_time ASC, rowid ASC LIMIT 1 OFFSET ?",
            params![id, offset],
            |row| row.get(0),
        )
        .optional()?;
    let Some(rowid) = rowid else {
        return Err(StoreError::LineNotFound {
            id: id.to_string(),
            position,
        });
    };

    tx.execute(
        "UPDATE transcript_lines SET text = ?, clean_text = ? WHERE rowid = ?",
        params![text, normalize(text), rowid],
    )?;
    tx.commit()?;

    debug!(id, position, rowid, "updated transcript line");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{retrieve_transcript, transcript_count};
    use crate::testutil::{input, memory_db};
    use vod_core::{Access, InputError};

    fn line_count(conn: &Connection, id: &str) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM transcript_lines WHERE transcript_id = ?",
            [id],
            |row| row.get(0),
        )
        .unwrap()
    }

    fn index_hits(conn: &Connection, phrase: &str) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM transcript_search WHERE transcript_search MATCH ?",
            [phrase],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_ingest_stores_lines_and_index() {
        let db = memory_db();
        let stored = db
            .write(None, |conn| {
                ingest(conn, &input("v1", "StreamerA", "2023-01-01", "Stream", &[
                    ("00:00:01", "Hello, world!"),
                    ("00:00:02", "Second line"),
                ]))
            })
            .unwrap();
        assert_eq!(stored, 2);

        db.read(None, |conn| {
            assert_eq!(line_count(conn, "v1"), 2);
            assert_eq!(index_hits(conn, "\"hello world\""), 1);
            let clean: String = conn.query_row(
                "SELECT clean_text FROM transcript_lines WHERE start_time = '00:00:01'",
                [],
                |row| row.get(0),
            )?;
            assert_eq!(clean, "hello world");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_reingest_replaces_lines() {
        let db = memory_db();
        let three = [("00:00:01", "one"), ("00:00:02", "two"), ("00:00:03", "three")];
        let two = [("00:00:05", "alpha"), ("00:00:06", "beta")];

        db.write(None, |conn| ingest(conn, &input("v1", "a", "2023-01-01", "Stream", &three)))
            .unwrap();
        db.write(None, |conn| ingest(conn, &input("v1", "a", "2023-01-02", "Stream", &two)))
            .unwrap();

        db.read(None, |conn| {
            assert_eq!(line_count(conn, "v1"), 2);
            assert_eq!(index_hits(conn, "three"), 0);
            assert_eq!(index_hits(conn, "alpha"), 1);
            let date: String =
                conn.query_row("SELECT date FROM transcripts WHERE id = 'v1'", [], |row| row.get(0))?;
            assert_eq!(date, "2023-01-02");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_repeated_ingest_is_idempotent() {
        let lines = [("00:00:02", "Same again"), ("00:00:01", "Hello, world!")];
        let payload = input("v1", "StreamerA", "2023-01-01", "Stream", &lines);

        let once = memory_db();
        once.write(None, |conn| ingest(conn, &payload)).unwrap();
        let expected = once
            .read(None, |conn| retrieve_transcript(conn, "v1", &Access::Unrestricted, "Members"))
            .unwrap();

        let repeated = memory_db();
        for _ in 0..3 {
            let stored = repeated.write(None, |conn| ingest(conn, &payload)).unwrap();
            assert_eq!(stored, 2);
        }

        repeated
            .read(None, |conn| {
                assert_eq!(line_count(conn, "v1"), 2);
                assert_eq!(transcript_count(conn)?, 1);
                assert_eq!(index_hits(conn, "\"hello world\""), 1);
                assert_eq!(index_hits(conn, "\"same again\""), 1);
                let transcript = retrieve_transcript(conn, "v1", &Access::Unrestricted, "Members")?;
                assert_eq!(transcript, expected);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_ingest_without_lines_keeps_metadata() {
        let db = memory_db();
        let mut empty = input("v1", "a", "2023-01-01", "Stream", &[]);
        empty.srt = "garbage\n\nmore garbage".to_string();
        let stored = db.write(None, |conn| ingest(conn, &empty)).unwrap();
        assert_eq!(stored, 0);

        let count: i64 = db
            .read(None, |conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM transcripts", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_invalid_payload_is_rejected() {
        let db = memory_db();
        let mut bad = input("v1", "a", "2023-13-45", "Stream", &[("00:00:01", "x")]);
        let err = db.write(None, |conn| ingest(conn, &bad)).unwrap_err();
        assert!(matches!(err, StoreError::Input(InputError::InvalidDate(_))));

        bad.date = "2023-01-01".to_string();
        bad.id.clear();
        let err = db.write(None, |conn| ingest(conn, &bad)).unwrap_err();
        assert!(matches!(err, StoreError::Input(InputError::MissingField("id"))));
    }

    #[test]
    fn test_failed_upsert_rolls_back() {
        let db = memory_db();
        db.write(None, |conn| {
            ingest(conn, &input("v1", "a", "2023-01-01", "Stream", &[("00:00:01", "kept")]))
        })
        .unwrap();

        // Break line inserts so the replacement fails midway
        db.write(None, |conn| {
            conn.execute_batch(
                "CREATE TRIGGER reject_lines BEFORE INSERT ON transcript_lines
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )?;
            Ok(())
        })
        .unwrap();
        let result = db.write(None, |conn| {
            ingest(conn, &input("v1", "b", "2024-01-01", "Stream", &[("00:00:09", "new")]))
        });
        assert!(matches!(result, Err(StoreError::Sqlite(_))));

        db.read(None, |conn| {
            let streamer: String =
                conn.query_row("SELECT streamer FROM transcripts WHERE id = 'v1'", [], |row| row.get(0))?;
            assert_eq!(streamer, "a");
            assert_eq!(line_count(conn, "v1"), 1);
            assert_eq!(index_hits(conn, "kept"), 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_update_line_reindexes() {
        let db = memory_db();
        db.write(None, |conn| {
            ingest(conn, &input("v1", "a", "2023-01-01", "Stream", &[
                ("00:00:05", "later line"),
                ("00:00:01", "first line"),
            ]))
        })
        .unwrap();

        // Position 0 is the earliest start time
        db.write(None, |conn| update_line(conn, "v1", 0, "Brand NEW words!"))
            .unwrap();

        db.read(None, |conn| {
            assert_eq!(index_hits(conn, "first"), 0);
            assert_eq!(index_hits(conn, "\"brand new words\""), 1);
            let (text, clean): (String, String) = conn.query_row(
                "SELECT text, clean_text FROM transcript_lines WHERE start_time = '00:00:01'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            assert_eq!(text, "Brand NEW words!");
            assert_eq!(clean, "brand new words");
            Ok(())
        })
        .unwrap();

        let missing_line = db.write(None, |conn| update_line(conn, "v1", 2, "x")).unwrap_err();
        assert!(matches!(missing_line, StoreError::LineNotFound { position: 2, .. }));
        let missing_doc = db.write(None, |conn| update_line(conn, "nope", 0, "x")).unwrap_err();
        assert!(missing_doc.is_not_found());
    }
}
