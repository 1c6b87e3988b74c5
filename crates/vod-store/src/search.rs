//! Document search
//!
//! Two queries inside one read transaction:
//!
//! 1. Transcripts passing the filter (and, with a phrase, having at least one
//!    line whose normalized text matches it in the FTS index), newest first.
//! 2. With a phrase, the matching lines of all those transcripts at once,
//!    ranked by start time per transcript and cut at [`MAX_CONTEXTS`]. When a
//!    whole-word search is requested, lines whose original text fails the
//!    whole-word matcher are removed before the cut.

use rusqlite::{Connection, ToSql};
use std::collections::HashMap;
use tracing::debug;
use vod_core::{fts_phrase, SearchContext, SearchQuery, TranscriptSearch};

use crate::clause::WhereClause;
use crate::connection::{StoreError, WHOLE_WORD_FN};
use crate::queries::{row_to_metadata, METADATA_COLUMNS};

/// Maximum context lines attached to one transcript
pub const MAX_CONTEXTS: usize = 20;

/// Transcript ids per context query
const ID_CHUNK: usize = 500;

/// Search transcripts by filter and optional phrase
pub fn search_documents(
    conn: &Connection,
    query: &SearchQuery,
    restricted_type: &str,
) -> Result<Vec<TranscriptSearch>, StoreError> {
    let phrase = query.phrase.as_deref().and_then(|p| fts_phrase(p).map(|fts| (p, fts)));

    let tx = conn.unchecked_transaction()?;

    let mut clause = WhereClause::for_filter(&query.filter, restricted_type);
    let mut sql = format!("SELECT {} FROM transcripts t", METADATA_COLUMNS);
    if let Some((_, fts)) = &phrase {
        sql.push_str(
            " JOIN transcript_lines tl ON tl.transcript_id = t.id
              JOIN transcript_search ts ON ts.rowid = tl.rowid",
        );
        clause.push(" AND ts.clean_text MATCH ?", [fts.clone()]);
    }
    sql.push_str(clause.sql());
    if phrase.is_some() {
        sql.push_str(" GROUP BY t.id");
    }
    sql.push_str(" ORDER BY t.date DESC, t.id ASC");

    let mut results = Vec::new();
    {
        let mut stmt = tx.prepare(&sql)?;
        let rows = stmt.query_map(clause.params().as_slice(), row_to_metadata)?;
        for row in rows {
            results.push(TranscriptSearch {
                metadata: row?,
                contexts: Vec::new(),
            });
        }
    }

    debug!(
        documents = results.len(),
        phrase = phrase.as_ref().map(|(_, fts)| fts.as_str()),
        whole_word = query.whole_word,
        "document search"
    );

    let Some((raw_phrase, fts)) = phrase else {
        tx.commit()?;
        return Ok(results);
    };
    if results.is_empty() {
        tx.commit()?;
        return Ok(results);
    }

    attach_contexts(&tx, &mut results, raw_phrase, &fts, query.whole_word)?;
    tx.commit()?;

    if query.whole_word {
        results.retain(|r| !r.contexts.is_empty());
    }
    Ok(results)
}

/// Fetch ranked context lines for every result, a chunk of ids at a time
fn attach_contexts(
    conn: &Connection,
    results: &mut [TranscriptSearch],
    raw_phrase: &str,
    fts: &str,
    whole_word: bool,
) -> Result<(), StoreError> {
    let positions: HashMap<String, usize> = results
        .iter()
        .enumerate()
        .map(|(i, r)| (r.metadata.id.clone(), i))
        .collect();
    let ids: Vec<String> = results.iter().map(|r| r.metadata.id.clone()).collect();

    for chunk in ids.chunks(ID_CHUNK) {
        let placeholders: Vec<_> = chunk.iter().map(|_| "?").collect();
        let whole_word_filter = if whole_word {
            format!(" AND {}(?, tl.text)", WHOLE_WORD_FN)
        } else {
            String::new()
        };
        let sql = format!(
            "WITH ranked AS (
                SELECT tl.transcript_id, tl.start_time, tl.text,
                       ROW_NUMBER() OVER (
                           PARTITION BY tl.transcript_id
                           ORDER BY tl.start_time ASC, tl.rowid ASC
                       ) AS rn
                FROM transcript_lines tl
                JOIN transcript_search ts ON ts.rowid = tl.rowid
                WHERE ts.clean_text MATCH ?
                  AND tl.transcript_id IN ({}){}
            )
            SELECT transcript_id, start_time, text
            FROM ranked
            WHERE rn <= ?
            ORDER BY transcript_id, rn",
            placeholders.join(","),
            whole_word_filter
        );

        let limit = MAX_CONTEXTS as i64;
        let mut params: Vec<&dyn ToSql> = Vec::with_capacity(chunk.len() + 3);
        params.push(&fts);
        for id in chunk {
            params.push(id);
        }
        if whole_word {
            params.push(&raw_phrase);
        }
        params.push(&limit);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params.as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                SearchContext {
                    start_time: row.get(1)?,
                    line: row.get(2)?,
                },
            ))
        })?;

        for row in rows {
            let (transcript_id, context) = row?;
            if let Some(&index) = positions.get(&transcript_id) {
                results[index].contexts.push(context);
            }
        }
    }

    Ok(())
}
