//! Error types for the core crate

use thiserror::Error;

/// Ingestion payload validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid date format: expected YYYY-MM-DD, got {0}")]
    InvalidDate(String),
}
