//! Search index maintenance
//!
//! The FTS table can be recreated from `transcript_lines` at any time; the
//! line store is the source of truth.

use rusqlite::{Connection, ErrorCode};
use tracing::{info, warn};

use crate::connection::StoreError;
use crate::schema;

/// Drop the search index and repopulate it from the stored lines.
///
/// Returns the number of indexed lines.
pub fn rebuild_search_index(conn: &mut Connection) -> Result<u64, StoreError> {
    let tx = conn.transaction()?;

    schema::drop_search_index(&tx)?;
    schema::create_search_index(&tx)?;
    tx.execute_batch("INSERT INTO transcript_search(transcript_search) VALUES ('rebuild')")?;

    let lines: i64 = tx.query_row("SELECT COUNT(*) FROM transcript_lines", [], |row| row.get(0))?;
    tx.commit()?;

    info!(lines, "rebuilt search index");
    Ok(lines.max(0) as u64)
}

/// Check the search index against the line store.
///
/// Returns `false` when the index is out of step with the stored lines. The
/// check is issued as an FTS command, so it needs a writable connection.
pub fn check_search_index(conn: &Connection) -> Result<bool, StoreError> {
    match conn.execute_batch(
        "INSERT INTO transcript_search(transcript_search, rank) VALUES ('integrity-check', 1)",
    ) {
        Ok(()) => Ok(true),
        Err(err) if err.sqlite_error_code() == Some(ErrorCode::DatabaseCorrupt) => {
            warn!(error = %err, "search index integrity check failed");
            Ok(false)
        }
        Err(err) => Err(err.into()),
    }
}
