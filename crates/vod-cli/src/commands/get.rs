//! Get command - show one transcript

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use vod_store::ArchiveService;

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, human, json, minimal};

pub async fn run(
    cli: &Cli,
    service: &ArchiveService,
    cancel: &CancellationToken,
    id: &str,
    meta_only: bool,
) -> Result<()> {
    let restricted = service.db().restricted_type().to_string();

    if meta_only {
        let meta = service
            .retrieve_metadata(id.to_string(), cli.access(), cancel)
            .await?;
        match cli.effective_format() {
            OutputFormat::Human => println!("{}", human::format_metadata_detail(&meta, &restricted)),
            OutputFormat::Json => json::print(&meta, cli.pretty)?,
            OutputFormat::Minimal => println!("{}", minimal::format_metadata(&meta)),
        }
        return Ok(());
    }

    let transcript = service
        .retrieve_transcript(id.to_string(), cli.access(), cancel)
        .await?;

    match cli.effective_format() {
        OutputFormat::Human => {
            println!("{}", human::format_metadata_detail(&transcript.metadata, &restricted));
            println!(
                "{}: {}",
                colors::label("Lines"),
                colors::value(&colors::format_count(transcript.transcript_lines.len() as u64))
            );
            println!();
            for line in &transcript.transcript_lines {
                println!("{}", human::format_line(line));
            }
        }
        OutputFormat::Json => json::print(&transcript, cli.pretty)?,
        OutputFormat::Minimal => {
            for line in &transcript.transcript_lines {
                println!("{}", minimal::format_line(line));
            }
        }
    }

    Ok(())
}
