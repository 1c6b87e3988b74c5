//! Status command - archive statistics

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use vod_store::ArchiveService;

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, human, json};

pub async fn run(cli: &Cli, service: &ArchiveService, cancel: &CancellationToken) -> Result<()> {
    let stats = service.stats(cancel).await?;

    match cli.effective_format() {
        OutputFormat::Human => {
            println!("{}", colors::header("Archive Status"));
            println!();
            println!("{}", human::format_stats(&stats));
        }
        OutputFormat::Json => json::print(&stats, cli.pretty)?,
        OutputFormat::Minimal => {
            println!("{}\t{}", stats.transcript_count, stats.line_count);
        }
    }

    Ok(())
}
