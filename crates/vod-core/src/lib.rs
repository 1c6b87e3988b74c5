//! vod-core - Core types and text handling for the VOD transcript archive
//!
//! This crate holds everything that does not touch the database: the transcript
//! and query types, the text normalizer shared by indexing and querying, the SRT
//! parser, and the excerpt extractor used to render search hits.

pub mod error;
pub mod filter;
pub mod normalize;
pub mod parser;
pub mod snippet;
pub mod types;

pub use error::*;
pub use filter::*;
pub use normalize::*;
pub use parser::*;
pub use snippet::*;
pub use types::*;
