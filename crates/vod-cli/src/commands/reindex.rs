//! Reindex command - rebuild the full-text index

use anyhow::Result;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;
use vod_store::ArchiveService;

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, json};

pub async fn run(cli: &Cli, service: &ArchiveService, cancel: &CancellationToken) -> Result<()> {
    let started = Instant::now();
    let lines = service.rebuild_search_index(cancel).await?;
    let elapsed = started.elapsed();
    info!(lines, elapsed_ms = elapsed.as_millis() as u64, "search index rebuilt");

    match cli.effective_format() {
        OutputFormat::Human => {
            println!(
                "{}",
                colors::success(&format!(
                    "Reindexed {} lines in {:.1}s",
                    colors::format_count(lines),
                    elapsed.as_secs_f64()
                ))
            );
        }
        OutputFormat::Json => json::print(
            &serde_json::json!({ "lines": lines, "elapsed_ms": elapsed.as_millis() as u64 }),
            cli.pretty,
        )?,
        OutputFormat::Minimal => println!("{}", lines),
    }

    Ok(())
}
