//! vod - CLI for the VOD transcript archive

mod cli;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use vod_store::{ArchiveDb, ArchiveService};

use cli::{Cli, Command};
use commands::ingest::IngestArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();
    output::colors::init();

    // Ctrl-C interrupts the running store operation
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling");
                cancel.cancel();
            }
        });
    }

    // Doctor inspects the database itself and must not create one
    let service = match &cli.command {
        Command::Doctor => return commands::doctor::run(&cli, &cancel).await,
        _ => open_service(&cli)?,
    };

    match &cli.command {
        Command::Ingest {
            file,
            json,
            id,
            streamer,
            date,
            stream_type,
            title,
        } => {
            let args = IngestArgs {
                file,
                json: *json,
                id: id.as_deref(),
                streamer: streamer.as_deref(),
                date: date.as_deref(),
                stream_type,
                title,
            };
            commands::ingest::run(&cli, &service, &cancel, args).await
        }

        Command::Get { id, meta } => commands::get::run(&cli, &service, &cancel, id, *meta).await,

        Command::List { filter, limit } => {
            commands::list::run(&cli, &service, &cancel, filter, *limit).await
        }

        Command::Search {
            phrase,
            filter,
            whole_word,
            words,
        } => {
            commands::search::run(
                &cli,
                &service,
                &cancel,
                phrase.as_deref(),
                filter,
                *whole_word,
                *words,
            )
            .await
        }

        Command::Graph {
            id,
            phrase,
            whole_word,
        } => commands::graph::document(&cli, &service, &cancel, id, phrase, *whole_word).await,

        Command::GraphAll {
            phrase,
            filter,
            whole_word,
        } => commands::graph::corpus(&cli, &service, &cancel, phrase, filter, *whole_word).await,

        Command::EditLine { id, position, text } => {
            commands::edit_line::run(&cli, &service, &cancel, id, *position, text).await
        }

        Command::Status => commands::status::run(&cli, &service, &cancel).await,

        Command::Reindex => commands::reindex::run(&cli, &service, &cancel).await,

        Command::Doctor => commands::doctor::run(&cli, &cancel).await,
    }
}

fn open_service(cli: &Cli) -> Result<ArchiveService> {
    let db_path = cli.db_path();
    let db = ArchiveDb::open_or_create(&db_path, cli.store_config())
        .with_context(|| format!("Failed to open archive at {}", db_path.display()))?;
    debug!(path = %db_path.display(), "opened archive");
    Ok(ArchiveService::new(db))
}
