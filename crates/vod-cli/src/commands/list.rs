//! List command - show archived transcripts, newest first

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use vod_core::{TranscriptFilter, TranscriptMetadata};
use vod_store::ArchiveService;

use crate::cli::{Cli, FilterArgs, OutputFormat};
use crate::output::{colors, human, json, minimal};

pub async fn run(
    cli: &Cli,
    service: &ArchiveService,
    cancel: &CancellationToken,
    filter: &FilterArgs,
    limit: usize,
) -> Result<()> {
    let restricted = service.db().restricted_type();
    let transcripts = select(
        service.all_metadata(cli.access(), cancel).await?,
        &filter.to_filter(cli.access()),
        restricted,
        limit,
    );

    match cli.effective_format() {
        OutputFormat::Human => {
            if transcripts.is_empty() {
                println!("No transcripts found");
            } else {
                println!(
                    "{}",
                    colors::header(&format!("Transcripts ({})", transcripts.len()))
                );
                println!();
                for meta in &transcripts {
                    println!("{}", human::format_metadata(meta, restricted));
                }
            }
        }
        OutputFormat::Json => json::print(&transcripts, cli.pretty)?,
        OutputFormat::Minimal => {
            for meta in &transcripts {
                println!("{}", minimal::format_metadata(meta));
            }
        }
    }

    Ok(())
}

/// Keep the first `limit` transcripts that pass `filter`
fn select(
    transcripts: Vec<TranscriptMetadata>,
    filter: &TranscriptFilter,
    restricted_type: &str,
    limit: usize,
) -> Vec<TranscriptMetadata> {
    transcripts
        .into_iter()
        .filter(|meta| filter.matches(meta, restricted_type))
        .take(limit)
        .collect()
}
