//! vod-store - SQLite storage and query layer for the VOD transcript archive
//!
//! Transcripts and their lines live in SQLite; an FTS5 table over the
//! normalized line text is kept in sync by triggers. Query functions take a
//! plain `&Connection` so they can run on any pooled connection, either
//! through [`ArchiveDb`] directly or through the async [`ArchiveService`].

pub mod cancel;
pub mod clause;
pub mod connection;
pub mod ingest;
pub mod matcher;
pub mod queries;
pub mod rebuild;
pub mod schema;
pub mod search;
pub mod series;
pub mod service;

pub use cancel::OpSlot;
pub use connection::*;
pub use matcher::{MatcherCache, MatcherError};
pub use queries::StoreStats;
pub use service::ArchiveService;
