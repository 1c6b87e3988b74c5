//! Ingest command - store an SRT file or JSON payload

use anyhow::{Context, Result};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::info;
use vod_core::TranscriptInput;
use vod_store::ArchiveService;

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, json};

/// Metadata given on the command line for a raw SRT file
pub struct IngestArgs<'a> {
    pub file: &'a Path,
    pub json: bool,
    pub id: Option<&'a str>,
    pub streamer: Option<&'a str>,
    pub date: Option<&'a str>,
    pub stream_type: &'a str,
    pub title: &'a str,
}

pub async fn run(
    cli: &Cli,
    service: &ArchiveService,
    cancel: &CancellationToken,
    args: IngestArgs<'_>,
) -> Result<()> {
    let input = load_input(&args)?;
    let id = input.id.clone();

    let lines = service
        .ingest(input, cancel)
        .await
        .with_context(|| format!("Failed to ingest {}", args.file.display()))?;
    info!(id = %id, lines, "ingested transcript");

    match cli.effective_format() {
        OutputFormat::Human => {
            println!(
                "{}",
                colors::success(&format!(
                    "Stored {} lines for {}",
                    colors::format_count(lines as u64),
                    id
                ))
            );
        }
        OutputFormat::Json => {
            json::print(&serde_json::json!({ "id": id, "lines": lines }), cli.pretty)?;
        }
        OutputFormat::Minimal => println!("{}", lines),
    }

    Ok(())
}

/// Build the ingestion payload from the file and flags.
///
/// Without `--json` the file is raw SRT and the id defaults to the file stem.
fn load_input(args: &IngestArgs<'_>) -> Result<TranscriptInput> {
    let contents = std::fs::read_to_string(args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    if args.json {
        let mut input: TranscriptInput = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid ingestion payload in {}", args.file.display()))?;
        if let Some(id) = args.id {
            input.id = id.to_string();
        }
        return Ok(input);
    }

    let id = args
        .id
        .map(str::to_string)
        .or_else(|| {
            args.file
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_default();

    Ok(TranscriptInput {
        id,
        streamer: args.streamer.unwrap_or_default().to_string(),
        date: args.date.unwrap_or_default().to_string(),
        stream_type: args.stream_type.to_string(),
        stream_title: args.title.to_string(),
        srt: contents,
    })
}
