//! WHERE clause construction from optional filters
//!
//! Values never enter the SQL text; every fragment binds through `?`
//! placeholders collected in order next to it.

use rusqlite::ToSql;
use vod_core::{non_empty, Access, TranscriptFilter};

/// SQL predicate fragments over `transcripts t` plus their bound values
pub struct WhereClause {
    sql: String,
    params: Vec<Box<dyn ToSql>>,
}

impl Default for WhereClause {
    fn default() -> Self {
        Self::new()
    }
}

impl WhereClause {
    pub fn new() -> Self {
        Self {
            sql: String::from(" WHERE 1=1"),
            params: Vec::new(),
        }
    }

    /// Clause for every field of a transcript filter
    pub fn for_filter(filter: &TranscriptFilter, restricted_type: &str) -> Self {
        let mut clause = Self::new();

        if let Some(streamer) = non_empty(&filter.streamer) {
            clause.push(" AND t.streamer = ?", [streamer.to_string()]);
        }

        if let Some(title) = non_empty(&filter.title) {
            clause.push(
                " AND t.title LIKE ? ESCAPE '\\'",
                [format!("%{}%", escape_like(title))],
            );
        }

        if let Some(from) = non_empty(&filter.from_date) {
            clause.push(" AND t.date >= ?", [from.to_string()]);
        }

        if let Some(to) = non_empty(&filter.to_date) {
            clause.push(" AND t.date <= ?", [to.to_string()]);
        }

        if !filter.stream_types.is_empty() {
            let placeholders: Vec<_> = filter.stream_types.iter().map(|_| "?").collect();
            clause.push(
                &format!(" AND t.stream_type IN ({})", placeholders.join(",")),
                filter.stream_types.iter().cloned(),
            );
        }

        clause.access(&filter.access, restricted_type)
    }

    /// Add the restricted-type carve-out for `access`
    pub fn access(mut self, access: &Access, restricted_type: &str) -> Self {
        match access {
            Access::Public => {
                self.push(" AND t.stream_type <> ?", [restricted_type.to_string()]);
            }
            Access::Member(owner) => {
                self.push(
                    " AND (t.stream_type <> ? OR t.streamer = ?)",
                    [restricted_type.to_string(), owner.clone()],
                );
            }
            Access::Unrestricted => {}
        }
        self
    }

    /// Append a fragment (starting with ` AND`) and its values
    pub fn push<I, V>(&mut self, fragment: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: ToSql + 'static,
    {
        self.sql.push_str(fragment);
        for value in values {
            self.params.push(Box::new(value));
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound values in placeholder order
    pub fn params(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

/// Escape LIKE wildcards so the title filter is a plain substring
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_only_hides_restricted() {
        let clause = WhereClause::for_filter(&TranscriptFilter::new(), "Members");
        assert_eq!(clause.sql(), " WHERE 1=1 AND t.stream_type <> ?");
        assert_eq!(clause.params().len(), 1);
    }

    #[test]
    fn test_full_filter_order() {
        let filter = TranscriptFilter::new()
            .with_streamer("StreamerA")
            .with_title("mario")
            .with_date_range(Some("2023-01-01".into()), Some("2023-12-31".into()))
            .with_stream_types(vec!["Stream".into(), "Members".into()])
            .with_access(Access::Member("StreamerA".into()));
        let clause = WhereClause::for_filter(&filter, "Members");
        assert_eq!(
            clause.sql(),
            " WHERE 1=1 AND t.streamer = ? AND t.title LIKE ? ESCAPE '\\' AND t.date >= ? AND t.date <= ? \
             AND t.stream_type IN (?,?) AND (t.stream_type <> ? OR t.streamer = ?)"
        );
        assert_eq!(clause.params().len(), 8);
    }

    #[test]
    fn test_unrestricted_adds_nothing() {
        let clause = WhereClause::new().access(&Access::Unrestricted, "Members");
        assert_eq!(clause.sql(), " WHERE 1=1");
        assert!(clause.params().is_empty());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_sure\\"), "100\\%\\_sure\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
