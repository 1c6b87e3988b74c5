//! Graph commands - phrase occurrence series

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use vod_core::SeriesPoint;
use vod_store::ArchiveService;

use crate::cli::{Cli, FilterArgs, OutputFormat};
use crate::output::{colors, human, json, minimal};

/// Occurrences per line start time within one transcript
pub async fn document(
    cli: &Cli,
    service: &ArchiveService,
    cancel: &CancellationToken,
    id: &str,
    phrase: &str,
    whole_word: bool,
) -> Result<()> {
    let points = service
        .document_series(id.to_string(), phrase.to_string(), whole_word, cli.access(), cancel)
        .await?;
    print_series(cli, &format!("'{}' in {}", phrase, id), &points)
}

/// Occurrences per stream date across matching transcripts
pub async fn corpus(
    cli: &Cli,
    service: &ArchiveService,
    cancel: &CancellationToken,
    phrase: &str,
    filter: &FilterArgs,
    whole_word: bool,
) -> Result<()> {
    let query = filter.to_query(cli.access(), Some(phrase), whole_word);
    let points = service.corpus_series(query, cancel).await?;
    print_series(cli, &format!("'{}' by date", phrase), &points)
}

fn print_series(cli: &Cli, title: &str, points: &[SeriesPoint]) -> Result<()> {
    match cli.effective_format() {
        OutputFormat::Human => {
            if points.is_empty() {
                println!("No occurrences of {}", title);
            } else {
                let total: u64 = points.iter().map(|p| p.y).sum();
                println!(
                    "{}",
                    colors::header(&format!("{} ({} total)", title, colors::format_count(total)))
                );
                println!();
                println!("{}", human::format_series(points));
            }
        }
        OutputFormat::Json => json::print(points, cli.pretty)?,
        OutputFormat::Minimal => {
            for point in points {
                println!("{}", minimal::format_point(point));
            }
        }
    }
    Ok(())
}
