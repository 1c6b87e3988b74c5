//! Edit-line command - correct the text of one transcript line

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use vod_store::ArchiveService;

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, json};

pub async fn run(
    cli: &Cli,
    service: &ArchiveService,
    cancel: &CancellationToken,
    id: &str,
    position: usize,
    text: &str,
) -> Result<()> {
    service
        .update_line(id.to_string(), position, text.to_string(), cancel)
        .await?;

    match cli.effective_format() {
        OutputFormat::Human => {
            println!(
                "{}",
                colors::success(&format!("Updated line {} of {}", position, id))
            );
        }
        OutputFormat::Json => json::print(
            &serde_json::json!({ "id": id, "position": position, "text": text }),
            cli.pretty,
        )?,
        OutputFormat::Minimal => println!("ok"),
    }

    Ok(())
}
