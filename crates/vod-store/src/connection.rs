//! Database connection management
//!
//! One writer connection serializes every mutation. File-backed stores also
//! open a small pool of read-only connections; with WAL enabled they read
//! committed snapshots in parallel with the writer. In-memory stores route
//! reads through the writer, since each in-memory connection is its own
//! database.

use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, ErrorCode, OpenFlags};
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use vod_core::{
    Access, InputError, SearchQuery, SeriesPoint, TimedLine, Transcript, TranscriptInput,
    TranscriptMetadata, TranscriptSearch,
};

use crate::cancel::OpSlot;
use crate::matcher::{MatcherCache, MatcherError};
use crate::queries::StoreStats;
use crate::{ingest, queries, rebuild, schema, search, series};

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Transcript not found: {0}")]
    NotFound(String),

    #[error("Line {position} not found in transcript {id}")]
    LineNotFound { id: String, position: usize },

    #[error("Database error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] MatcherError),

    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out")]
    TimedOut,

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Database version mismatch: expected at most {expected}, found {found}")]
    VersionMismatch { expected: i32, found: i32 },
}

impl StoreError {
    /// Whether the error means the requested resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_) | StoreError::LineNotFound { .. })
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if err.sqlite_error_code() == Some(ErrorCode::OperationInterrupted) {
            StoreError::Cancelled
        } else {
            StoreError::Sqlite(err)
        }
    }
}

/// Default database path
pub fn default_db_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
    PathBuf::from(home)
        .join(".vod-archive")
        .join("transcripts.db")
}

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Read-only connections opened next to the writer (file-backed stores only)
    pub reader_connections: usize,
    /// Stream type whose transcripts are only visible to members
    pub restricted_type: String,
    pub busy_timeout: Duration,
    /// Deadline applied to each call made through the async service
    pub operation_timeout: Option<Duration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            reader_connections: 4,
            restricted_type: "Members".to_string(),
            busy_timeout: Duration::from_secs(5),
            operation_timeout: None,
        }
    }
}

/// Name of the SQL function that applies the whole-word matcher
pub const WHOLE_WORD_FN: &str = "whole_word";

/// Transcript archive database
pub struct ArchiveDb {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    next_reader: AtomicUsize,
    matchers: Arc<MatcherCache>,
    config: StoreConfig,
    path: Option<PathBuf>,
}

impl ArchiveDb {
    /// Open or create the database at the default path
    pub fn open_or_create_default(config: StoreConfig) -> Result<Self, StoreError> {
        Self::open_or_create(&default_db_path(), config)
    }

    /// Open or create the database at a specific path
    pub fn open_or_create(path: &Path, config: StoreConfig) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let matchers = Arc::new(MatcherCache::new());

        let mut writer = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        writer.busy_timeout(config.busy_timeout)?;
        writer.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;
        register_functions(&writer, &matchers)?;
        schema::init_schema(&mut writer)?;

        let mut readers = Vec::with_capacity(config.reader_connections);
        for _ in 0..config.reader_connections {
            let reader = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            reader.busy_timeout(config.busy_timeout)?;
            register_functions(&reader, &matchers)?;
            readers.push(Mutex::new(reader));
        }

        debug!(path = %path.display(), readers = readers.len(), "opened archive database");

        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            next_reader: AtomicUsize::new(0),
            matchers,
            config,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory(config: StoreConfig) -> Result<Self, StoreError> {
        let matchers = Arc::new(MatcherCache::new());
        let mut writer = Connection::open_in_memory()?;
        writer.execute_batch("PRAGMA foreign_keys = ON;")?;
        register_functions(&writer, &matchers)?;
        schema::init_schema(&mut writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers: Vec::new(),
            next_reader: AtomicUsize::new(0),
            matchers,
            config,
            path: None,
        })
    }

    /// Get the database path (`None` for in-memory stores)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn restricted_type(&self) -> &str {
        &self.config.restricted_type
    }

    /// The matcher cache shared by every connection of this store
    pub fn matchers(&self) -> &MatcherCache {
        &self.matchers
    }

    /// Run a read-only closure on a pooled connection.
    ///
    /// When `op` is given, the statement running on that connection can be
    /// interrupted through it until the closure returns.
    pub fn read<T, F>(&self, op: Option<&OpSlot>, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.reader();
        guarded(&conn, op, || f(&conn))
    }

    /// Run a closure on the writer connection
    pub fn write<T, F>(&self, op: Option<&OpSlot>, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let mut conn = lock(&self.writer);
        if let Some(op) = op {
            op.begin(conn.get_interrupt_handle())?;
        }
        let result = f(&mut conn);
        finish(op, result)
    }

    fn reader(&self) -> MutexGuard<'_, Connection> {
        if self.readers.is_empty() {
            return lock(&self.writer);
        }

        let count = self.readers.len();
        let start = self.next_reader.fetch_add(1, Ordering::Relaxed) % count;
        for offset in 0..count {
            match self.readers[(start + offset) % count].try_lock() {
                Ok(guard) => return guard,
                Err(TryLockError::Poisoned(poisoned)) => return poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => continue,
            }
        }
        lock(&self.readers[start])
    }
}

/// Blocking operations, each on its own pooled connection
impl ArchiveDb {
    pub fn ingest(&self, input: &TranscriptInput) -> Result<usize, StoreError> {
        self.write(None, |conn| ingest::ingest(conn, input))
    }

    pub fn upsert_transcript(
        &self,
        metadata: &TranscriptMetadata,
        lines: &[TimedLine],
    ) -> Result<usize, StoreError> {
        self.write(None, |conn| ingest::upsert_transcript(conn, metadata, lines))
    }

    pub fn update_line(&self, id: &str, position: usize, text: &str) -> Result<(), StoreError> {
        self.write(None, |conn| ingest::update_line(conn, id, position, text))
    }

    pub fn retrieve_transcript(&self, id: &str, access: &Access) -> Result<Transcript, StoreError> {
        self.read(None, |conn| {
            queries::retrieve_transcript(conn, id, access, self.restricted_type())
        })
    }

    pub fn retrieve_metadata(&self, id: &str, access: &Access) -> Result<TranscriptMetadata, StoreError> {
        self.read(None, |conn| {
            queries::retrieve_metadata(conn, id, access, self.restricted_type())
        })
    }

    pub fn all_metadata(&self, access: &Access) -> Result<Vec<TranscriptMetadata>, StoreError> {
        self.read(None, |conn| queries::all_metadata(conn, access, self.restricted_type()))
    }

    pub fn search(&self, query: &SearchQuery) -> Result<Vec<TranscriptSearch>, StoreError> {
        self.read(None, |conn| search::search_documents(conn, query, self.restricted_type()))
    }

    pub fn document_series(
        &self,
        id: &str,
        phrase: &str,
        whole_word: bool,
        access: &Access,
    ) -> Result<Vec<SeriesPoint>, StoreError> {
        self.read(None, |conn| {
            series::document_series(conn, self.matchers(), id, phrase, whole_word, access, self.restricted_type())
        })
    }

    pub fn corpus_series(&self, query: &SearchQuery) -> Result<Vec<SeriesPoint>, StoreError> {
        self.read(None, |conn| {
            series::corpus_series(conn, self.matchers(), query, self.restricted_type())
        })
    }

    pub fn transcript_count(&self) -> Result<u64, StoreError> {
        self.read(None, queries::transcript_count)
    }

    pub fn line_count(&self, id: &str) -> Result<u64, StoreError> {
        self.read(None, |conn| queries::line_count(conn, id))
    }

    pub fn ping(&self) -> Result<(), StoreError> {
        self.read(None, queries::ping)
    }

    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        self.read(None, |conn| queries::stats(conn, self.path.clone()))
    }

    pub fn rebuild_search_index(&self) -> Result<u64, StoreError> {
        self.write(None, |conn| rebuild::rebuild_search_index(conn))
    }

    pub fn check_search_index(&self) -> Result<bool, StoreError> {
        self.write(None, |conn| rebuild::check_search_index(conn))
    }
}

fn lock(mutex: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    // A panic inside a closure leaves no open transaction behind, so the
    // connection stays usable.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn guarded<T>(
    conn: &Connection,
    op: Option<&OpSlot>,
    f: impl FnOnce() -> Result<T, StoreError>,
) -> Result<T, StoreError> {
    if let Some(op) = op {
        op.begin(conn.get_interrupt_handle())?;
    }
    let result = f();
    finish(op, result)
}

fn finish<T>(op: Option<&OpSlot>, result: Result<T, StoreError>) -> Result<T, StoreError> {
    if let Some(op) = op {
        // Must run before the connection guard is released
        op.finish();
    }
    result
}

/// Register the `whole_word(phrase, text)` SQL function on a connection
fn register_functions(conn: &Connection, matchers: &Arc<MatcherCache>) -> Result<(), StoreError> {
    let cache = AssertUnwindSafe(Arc::clone(matchers));
    conn.create_scalar_function(
        WHOLE_WORD_FN,
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        move |ctx| {
            let cache = &cache;
            let phrase: String = ctx.get(0)?;
            let text: Option<String> = ctx.get(1)?;
            let Some(text) = text else {
                return Ok(false);
            };
            let matcher = cache
                .literal(&phrase, true)
                .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?;
            Ok(matcher.is_match(&text))
        },
    )?;
    Ok(())
}
