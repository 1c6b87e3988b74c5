//! Phrase frequency series
//!
//! The FTS index narrows the candidate lines; the phrase matcher then counts
//! occurrences in each line's normalized text. Lines that the index matched
//! only through stemming count zero and add no point.

use rusqlite::Connection;
use std::collections::BTreeMap;
use tracing::debug;
use vod_core::{fts_phrase, Access, SearchQuery, SeriesPoint};

use crate::clause::WhereClause;
use crate::connection::StoreError;
use crate::matcher::MatcherCache;

/// Occurrences of `phrase` per line start time within one transcript
pub fn document_series(
    conn: &Connection,
    matchers: &MatcherCache,
    id: &str,
    phrase: &str,
    whole_word: bool,
    access: &Access,
    restricted_type: &str,
) -> Result<Vec<SeriesPoint>, StoreError> {
    let Some(fts) = fts_phrase(phrase) else {
        return Ok(Vec::new());
    };
    let matcher = matchers.get(phrase, whole_word)?;

    let mut clause = WhereClause::new();
    clause.push(" AND tl.transcript_id = ? AND ts.clean_text MATCH ?", [id.to_string(), fts]);
    let clause = clause.access(access, restricted_type);

    let sql = format!(
        "SELECT tl.start_time, tl.clean_text
         FROM transcript_lines tl
         JOIN transcripts t ON t.id = tl.transcript_id
         JOIN transcript_search ts ON ts.rowid = tl.rowid{}
         ORDER BY tl.start_time ASC, tl.rowid ASC",
        clause.sql()
    );

    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(clause.params().as_slice())?;
    while let Some(row) = rows.next()? {
        let start: String = row.get(0)?;
        let clean: String = row.get(1)?;
        let found = matcher.find_iter(&clean).count() as u64;
        if found > 0 {
            *counts.entry(start).or_insert(0) += found;
        }
    }

    debug!(id, phrase, whole_word, points = counts.len(), "document series");
    Ok(to_points(counts))
}

/// Occurrences of the query phrase per transcript date across the filtered corpus
pub fn corpus_series(
    conn: &Connection,
    matchers: &MatcherCache,
    query: &SearchQuery,
    restricted_type: &str,
) -> Result<Vec<SeriesPoint>, StoreError> {
    let Some(phrase) = query.phrase.as_deref() else {
        return Ok(Vec::new());
    };
    let Some(fts) = fts_phrase(phrase) else {
        return Ok(Vec::new());
    };
    let matcher = matchers.get(phrase, query.whole_word)?;

    let mut clause = WhereClause::for_filter(&query.filter, restricted_type);
    clause.push(" AND ts.clean_text MATCH ?", [fts]);

    let sql = format!(
        "SELECT t.date, tl.clean_text
         FROM transcripts t
         JOIN transcript_lines tl ON tl.transcript_id = t.id
         JOIN transcript_search ts ON ts.rowid = tl.rowid{}",
        clause.sql()
    );

    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(clause.params().as_slice())?;
    while let Some(row) = rows.next()? {
        let date: String = row.get(0)?;
        let clean: String = row.get(1)?;
        let found = matcher.find_iter(&clean).count() as u64;
        if found > 0 {
            *counts.entry(date).or_insert(0) += found;
        }
    }

    debug!(phrase, whole_word = query.whole_word, points = counts.len(), "corpus series");
    Ok(to_points(counts))
}

fn to_points(counts: BTreeMap<String, u64>) -> Vec<SeriesPoint> {
    counts.into_iter().map(|(x, y)| SeriesPoint { x, y }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ingest;
    use crate::testutil::{input, memory_db};
    use crate::ArchiveDb;
    use vod_core::TranscriptFilter;

    const RESTRICTED: &str = "Members";

    fn doc_series(db: &ArchiveDb, id: &str, phrase: &str, whole_word: bool, access: Access) -> Vec<SeriesPoint> {
        db.read(None, |conn| {
            document_series(conn, db.matchers(), id, phrase, whole_word, &access, RESTRICTED)
        })
        .unwrap()
    }

    fn corpus(db: &ArchiveDb, query: &SearchQuery) -> Vec<SeriesPoint> {
        db.read(None, |conn| corpus_series(conn, db.matchers(), query, RESTRICTED))
            .unwrap()
    }

    #[test]
    fn test_document_series_counts_per_timestamp() {
        let db = memory_db();
        db.write(None, |conn| {
            ingest(conn, &input("v1", "a", "2023-01-01", "Stream", &[
                ("00:00:10", "Hello hello"),
                ("00:00:05", "hello"),
                ("00:00:07", "goodbye"),
            ]))
        })
        .unwrap();

        assert_eq!(
            doc_series(&db, "v1", "hello", false, Access::Public),
            vec![SeriesPoint::new("00:00:05", 1), SeriesPoint::new("00:00:10", 2)]
        );
    }

    #[test]
    fn test_shared_timestamps_sum() {
        let db = memory_db();
        db.write(None, |conn| {
            ingest(conn, &input("v1", "a", "2023-01-01", "Stream", &[
                ("00:00:01", "word"),
                ("00:00:01", "word word"),
            ]))
        })
        .unwrap();
        assert_eq!(
            doc_series(&db, "v1", "word", true, Access::Public),
            vec![SeriesPoint::new("00:00:01", 3)]
        );
    }

    #[test]
    fn test_whole_word_series_skips_stemmed_matches() {
        let db = memory_db();
        db.write(None, |conn| {
            ingest(conn, &input("v1", "a", "2023-01-01", "Stream", &[
                ("00:00:01", "testing"),
                ("00:00:02", "a test"),
            ]))
        })
        .unwrap();
        assert_eq!(
            doc_series(&db, "v1", "test", true, Access::Public),
            vec![SeriesPoint::new("00:00:02", 1)]
        );
        assert_eq!(doc_series(&db, "v1", "test", false, Access::Public).len(), 2);
    }

    #[test]
    fn test_hidden_or_missing_document_is_empty() {
        let db = memory_db();
        db.write(None, |conn| {
            ingest(conn, &input("m", "a", "2023-01-01", "Members", &[("00:00:01", "hello")]))
        })
        .unwrap();
        assert!(doc_series(&db, "m", "hello", false, Access::Public).is_empty());
        assert_eq!(doc_series(&db, "m", "hello", false, Access::Member("a".into())).len(), 1);
        assert!(doc_series(&db, "missing", "hello", false, Access::Unrestricted).is_empty());
        assert!(doc_series(&db, "m", "...", false, Access::Unrestricted).is_empty());
    }

    #[test]
    fn test_corpus_series_by_date() {
        let db = memory_db();
        db.write(None, |conn| {
            ingest(conn, &input("v2", "a", "2023-02-01", "Stream", &[("00:00:01", "go go go")]))?;
            ingest(conn, &input("v1", "a", "2023-01-01", "Stream", &[("00:00:01", "go"), ("00:00:02", "go")]))?;
            ingest(conn, &input("v3", "b", "2023-01-01", "Stream", &[("00:00:01", "Go!")]))?;
            ingest(conn, &input("m", "a", "2023-03-01", "Members", &[("00:00:01", "go")]))?;
            Ok(())
        })
        .unwrap();

        let public = corpus(
            &db,
            &SearchQuery::new(TranscriptFilter::new().with_access(Access::Public)).with_phrase("go"),
        );
        assert_eq!(
            public,
            vec![SeriesPoint::new("2023-01-01", 3), SeriesPoint::new("2023-02-01", 3)]
        );

        // No scope hides nothing
        let all = corpus(&db, &SearchQuery::default().with_phrase("go"));
        assert_eq!(all.len(), 3);
        assert_eq!(all[2], SeriesPoint::new("2023-03-01", 1));

        let only_a = corpus(
            &db,
            &SearchQuery::new(
                TranscriptFilter::new()
                    .with_streamer("a")
                    .with_access(Access::Member("a".into())),
            )
            .with_phrase("go"),
        );
        assert_eq!(
            only_a,
            vec![
                SeriesPoint::new("2023-01-01", 2),
                SeriesPoint::new("2023-02-01", 3),
                SeriesPoint::new("2023-03-01", 1),
            ]
        );

        assert!(corpus(&db, &SearchQuery::default()).is_empty());
    }
}
