//! Async facade over [`ArchiveDb`]
//!
//! Every call runs its SQLite work on the blocking pool. Cancelling the
//! caller's token (or hitting the configured deadline) interrupts the
//! statement running for that call; a write in progress rolls back.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use vod_core::{
    Access, SearchQuery, SeriesPoint, Transcript, TranscriptInput, TranscriptMetadata, TranscriptSearch,
};

use crate::cancel::OpSlot;
use crate::connection::{ArchiveDb, StoreError};
use crate::queries::StoreStats;
use crate::{ingest, queries, rebuild, search, series};

#[derive(Clone)]
pub struct ArchiveService {
    db: Arc<ArchiveDb>,
    timeout: Option<Duration>,
}

impl ArchiveService {
    pub fn new(db: ArchiveDb) -> Self {
        Self::from_shared(Arc::new(db))
    }

    pub fn from_shared(db: Arc<ArchiveDb>) -> Self {
        let timeout = db.config().operation_timeout;
        Self { db, timeout }
    }

    pub fn db(&self) -> &Arc<ArchiveDb> {
        &self.db
    }

    pub async fn ingest(&self, input: TranscriptInput, cancel: &CancellationToken) -> Result<usize, StoreError> {
        self.run(cancel, move |db, op| db.write(Some(op), |conn| ingest::ingest(conn, &input)))
            .await
    }

    pub async fn update_line(
        &self,
        id: String,
        position: usize,
        text: String,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        self.run(cancel, move |db, op| {
            db.write(Some(op), |conn| ingest::update_line(conn, &id, position, &text))
        })
        .await
    }

    pub async fn retrieve_transcript(
        &self,
        id: String,
        access: Access,
        cancel: &CancellationToken,
    ) -> Result<Transcript, StoreError> {
        self.run(cancel, move |db, op| {
            db.read(Some(op), |conn| {
                queries::retrieve_transcript(conn, &id, &access, db.restricted_type())
            })
        })
        .await
    }

    pub async fn retrieve_metadata(
        &self,
        id: String,
        access: Access,
        cancel: &CancellationToken,
    ) -> Result<TranscriptMetadata, StoreError> {
        self.run(cancel, move |db, op| {
            db.read(Some(op), |conn| {
                queries::retrieve_metadata(conn, &id, &access, db.restricted_type())
            })
        })
        .await
    }

    pub async fn all_metadata(
        &self,
        access: Access,
        cancel: &CancellationToken,
    ) -> Result<Vec<TranscriptMetadata>, StoreError> {
        self.run(cancel, move |db, op| {
            db.read(Some(op), |conn| queries::all_metadata(conn, &access, db.restricted_type()))
        })
        .await
    }

    pub async fn search(
        &self,
        query: SearchQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<TranscriptSearch>, StoreError> {
        self.run(cancel, move |db, op| {
            db.read(Some(op), |conn| search::search_documents(conn, &query, db.restricted_type()))
        })
        .await
    }

    pub async fn document_series(
        &self,
        id: String,
        phrase: String,
        whole_word: bool,
        access: Access,
        cancel: &CancellationToken,
    ) -> Result<Vec<SeriesPoint>, StoreError> {
        self.run(cancel, move |db, op| {
            db.read(Some(op), |conn| {
                series::document_series(
                    conn,
                    db.matchers(),
                    &id,
                    &phrase,
                    whole_word,
                    &access,
                    db.restricted_type(),
                )
            })
        })
        .await
    }

    pub async fn corpus_series(
        &self,
        query: SearchQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<SeriesPoint>, StoreError> {
        self.run(cancel, move |db, op| {
            db.read(Some(op), |conn| {
                series::corpus_series(conn, db.matchers(), &query, db.restricted_type())
            })
        })
        .await
    }

    pub async fn transcript_count(&self, cancel: &CancellationToken) -> Result<u64, StoreError> {
        self.run(cancel, |db, op| db.read(Some(op), queries::transcript_count))
            .await
    }

    pub async fn line_count(&self, id: String, cancel: &CancellationToken) -> Result<u64, StoreError> {
        self.run(cancel, move |db, op| db.read(Some(op), |conn| queries::line_count(conn, &id)))
            .await
    }

    pub async fn ping(&self, cancel: &CancellationToken) -> Result<(), StoreError> {
        self.run(cancel, |db, op| db.read(Some(op), queries::ping)).await
    }

    pub async fn stats(&self, cancel: &CancellationToken) -> Result<StoreStats, StoreError> {
        self.run(cancel, |db, op| {
            let path = db.path().map(|p| p.to_path_buf());
            db.read(Some(op), |conn| queries::stats(conn, path))
        })
        .await
    }

    pub async fn rebuild_search_index(&self, cancel: &CancellationToken) -> Result<u64, StoreError> {
        self.run(cancel, |db, op| {
            db.write(Some(op), |conn| rebuild::rebuild_search_index(conn))
        })
        .await
    }

    pub async fn check_search_index(&self, cancel: &CancellationToken) -> Result<bool, StoreError> {
        self.run(cancel, |db, op| {
            db.write(Some(op), |conn| rebuild::check_search_index(conn))
        })
        .await
    }

    /// Run `f` on the blocking pool, interrupting it on cancel or timeout.
    ///
    /// After an interrupt the blocking task is still awaited, so the
    /// connection is back in the pool before this returns.
    async fn run<T, F>(&self, cancel: &CancellationToken, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&ArchiveDb, &OpSlot) -> Result<T, StoreError> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let slot = Arc::new(OpSlot::new());
        let db = Arc::clone(&self.db);
        let worker_slot = Arc::clone(&slot);
        let mut task = tokio::task::spawn_blocking(move || f(&db, &worker_slot));

        let timeout = self.timeout;
        let deadline = async move {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        let reason = tokio::select! {
            joined = &mut task => return joined?,
            _ = cancel.cancelled() => StoreError::Cancelled,
            _ = deadline => StoreError::TimedOut,
        };

        warn!(reason = %reason, "interrupting store operation");
        slot.cancel();
        match task.await? {
            // Finished before the interrupt landed
            Ok(value) => Ok(value),
            Err(StoreError::Cancelled) => Err(reason),
            Err(err) => Err(err),
        }
    }
}
