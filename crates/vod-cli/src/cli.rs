//! CLI argument definitions

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use vod_core::{Access, SearchQuery, TranscriptFilter, DATE_FORMAT};
use vod_store::{default_db_path, StoreConfig};

/// Ingest, search and chart timestamped stream transcripts
#[derive(Parser, Debug)]
#[command(name = "vod")]
#[command(author = "VOD Archive contributors")]
#[command(version)]
#[command(about = "Ingest, search and chart timestamped stream transcripts")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Custom database path
    #[arg(long, global = true, env = "VOD_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Pretty-print JSON output (implies --format json)
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Stream type only visible to members
    #[arg(long, global = true, env = "VOD_RESTRICTED_TYPE", default_value = "Members")]
    pub restricted_type: String,

    /// Read-only connections kept open next to the writer
    #[arg(long, global = true, env = "VOD_READERS", default_value = "4")]
    pub readers: usize,

    /// Abort store operations that run longer than this
    #[arg(long, global = true, env = "VOD_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Log filter (e.g. info, debug, vod_store=trace)
    #[arg(long, global = true, env = "VOD_LOG", default_value = "info")]
    pub log_level: String,

    /// Read as a member of this streamer's channel
    #[arg(long, global = true, conflicts_with = "public")]
    pub member: Option<String>,

    /// Hide member-only transcripts
    #[arg(long, global = true)]
    pub public: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Output format, with `--pretty` forcing JSON
    pub fn effective_format(&self) -> OutputFormat {
        if self.pretty {
            OutputFormat::Json
        } else {
            self.format
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(default_db_path)
    }

    pub fn access(&self) -> Access {
        if self.public {
            Access::Public
        } else {
            Access::from_scope(self.member.clone())
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            reader_connections: self.readers,
            restricted_type: self.restricted_type.clone(),
            operation_timeout: self.timeout_secs.map(Duration::from_secs),
            ..StoreConfig::default()
        }
    }
}

/// Output format for commands
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output
    Json,
    /// Minimal text output (content only)
    Minimal,
}

/// Transcript filters shared by search and graph-all
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Exact streamer name
    #[arg(long)]
    pub streamer: Option<String>,

    /// Title substring (case-insensitive)
    #[arg(long)]
    pub title: Option<String>,

    /// Earliest date (YYYY-MM-DD, inclusive)
    #[arg(long, value_parser = parse_date)]
    pub from: Option<String>,

    /// Latest date (YYYY-MM-DD, inclusive)
    #[arg(long, value_parser = parse_date)]
    pub to: Option<String>,

    /// Stream type; repeat to allow several
    #[arg(long = "type", short = 't')]
    pub types: Vec<String>,
}

impl FilterArgs {
    pub fn to_filter(&self, access: Access) -> TranscriptFilter {
        let mut filter = TranscriptFilter::new()
            .with_date_range(self.from.clone(), self.to.clone())
            .with_stream_types(self.types.clone())
            .with_access(access);
        if let Some(streamer) = &self.streamer {
            filter = filter.with_streamer(streamer.clone());
        }
        if let Some(title) = &self.title {
            filter = filter.with_title(title.clone());
        }
        filter
    }

    pub fn to_query(&self, access: Access, phrase: Option<&str>, whole_word: bool) -> SearchQuery {
        let query = SearchQuery::new(self.to_filter(access)).whole_word(whole_word);
        match phrase {
            Some(phrase) => query.with_phrase(phrase),
            None => query,
        }
    }
}

fn parse_date(value: &str) -> Result<String, String> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(|_| value.to_string())
        .map_err(|_| format!("expected YYYY-MM-DD, got {}", value))
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store a transcript, replacing any transcript with the same id
    Ingest {
        /// SRT file, or a JSON payload with --json
        file: PathBuf,

        /// Treat the file as a JSON ingestion payload
        #[arg(long)]
        json: bool,

        /// Transcript id
        #[arg(long)]
        id: Option<String>,

        /// Streamer name
        #[arg(long)]
        streamer: Option<String>,

        /// Stream date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Stream type
        #[arg(long = "type", default_value = "Stream")]
        stream_type: String,

        /// Stream title
        #[arg(long, default_value = "")]
        title: String,
    },

    /// Show a transcript with its lines
    Get {
        /// Transcript id
        id: String,

        /// Only show metadata
        #[arg(long)]
        meta: bool,
    },

    /// List transcripts, newest first
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Number of transcripts to show
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },

    /// Search transcripts by phrase and filters
    Search {
        /// Phrase to search for; omit to browse by filters
        phrase: Option<String>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Only match the phrase as whole words
        #[arg(short = 'w', long)]
        whole_word: bool,

        /// Show excerpts with this many words around the match
        #[arg(long, allow_negative_numbers = true)]
        words: Option<i32>,
    },

    /// Phrase occurrences over time within one transcript
    Graph {
        /// Transcript id
        id: String,

        /// Phrase to count
        phrase: String,

        #[arg(short = 'w', long)]
        whole_word: bool,
    },

    /// Phrase occurrences per stream date across the archive
    GraphAll {
        /// Phrase to count
        phrase: String,

        #[command(flatten)]
        filter: FilterArgs,

        #[arg(short = 'w', long)]
        whole_word: bool,
    },

    /// Replace the text of one transcript line
    EditLine {
        /// Transcript id
        id: String,

        /// Line position as shown by `get`
        position: usize,

        /// New line text
        text: String,
    },

    /// Show archive statistics
    Status,

    /// Diagnose the archive database
    Doctor,

    /// Rebuild the full-text index from stored lines
    Reindex,
}
