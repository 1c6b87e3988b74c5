//! Database schema creation
//!
//! `transcript_search` is an external-content FTS5 table over
//! `transcript_lines.clean_text`; triggers keep it in step with every insert,
//! update and delete inside the same transaction.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::connection::StoreError;

/// Current database schema version
pub const DB_VERSION: i32 = 1;

/// Initialize the database schema (create tables, check version)
pub fn init_schema(conn: &mut Connection) -> Result<(), StoreError> {
    let tx = conn.transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value TEXT
        )",
    )?;

    let found: Option<i32> = tx
        .query_row(
            "SELECT CAST(value AS INTEGER) FROM metadata WHERE key = 'version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(found) = found {
        if found > DB_VERSION {
            return Err(StoreError::VersionMismatch {
                expected: DB_VERSION,
                found,
            });
        }
    }

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS transcripts (
            id TEXT PRIMARY KEY,
            streamer TEXT NOT NULL,
            date TEXT NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            stream_type TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS transcript_lines (
            rowid INTEGER PRIMARY KEY,
            transcript_id TEXT NOT NULL REFERENCES transcripts(id) ON DELETE CASCADE,
            start_time TEXT NOT NULL,
            text TEXT NOT NULL,
            clean_text TEXT NOT NULL
        );",
    )?;

    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_transcripts_date ON transcripts(date);
         CREATE INDEX IF NOT EXISTS idx_transcripts_streamer ON transcripts(streamer);
         CREATE INDEX IF NOT EXISTS idx_lines_transcript_time ON transcript_lines(transcript_id, start_time);",
    )?;

    create_search_index(&tx)?;

    tx.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('version', ?)",
        [DB_VERSION.to_string()],
    )?;

    tx.commit()?;

    if found.is_none() {
        info!(version = DB_VERSION, "initialized archive schema");
    }
    Ok(())
}

/// Create the FTS table and the triggers that keep it in sync
pub(crate) fn create_search_index(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS transcript_search USING fts5(
            clean_text,
            content='transcript_lines',
            content_rowid='rowid',
            tokenize='porter unicode61 remove_diacritics 2'
        )",
    )?;

    conn.execute_batch(
        "CREATE TRIGGER IF NOT EXISTS transcript_lines_ai AFTER INSERT ON transcript_lines BEGIN
            INSERT INTO transcript_search(rowid, clean_text) VALUES (new.rowid, new.clean_text);
        END;

        CREATE TRIGGER IF NOT EXISTS transcript_lines_ad AFTER DELETE ON transcript_lines BEGIN
            INSERT INTO transcript_search(transcript_search, rowid, clean_text)
            VALUES ('delete', old.rowid, old.clean_text);
        END;

        CREATE TRIGGER IF NOT EXISTS transcript_lines_au AFTER UPDATE ON transcript_lines BEGIN
            INSERT INTO transcript_search(transcript_search, rowid, clean_text)
            VALUES ('delete', old.rowid, old.clean_text);
            INSERT INTO transcript_search(rowid, clean_text) VALUES (new.rowid, new.clean_text);
        END;",
    )?;

    Ok(())
}

/// Drop the FTS table and its triggers
pub(crate) fn drop_search_index(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "DROP TRIGGER IF EXISTS transcript_lines_ai;
         DROP TRIGGER IF EXISTS transcript_lines_ad;
         DROP TRIGGER IF EXISTS transcript_lines_au;
         DROP TABLE IF EXISTS transcript_search;",
    )?;
    Ok(())
}

/// Read the stored schema version
pub fn schema_version(conn: &Connection) -> Result<i32, StoreError> {
    let version: Option<i32> = conn
        .query_row(
            "SELECT CAST(value AS INTEGER) FROM metadata WHERE key = 'version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(version.unwrap_or(0))
}
