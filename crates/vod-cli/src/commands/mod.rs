//! CLI command implementations

pub mod doctor;
pub mod edit_line;
pub mod get;
pub mod graph;
pub mod ingest;
pub mod list;
pub mod reindex;
pub mod search;
pub mod status;
