//! Doctor command - diagnose the archive database

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use vod_store::schema::DB_VERSION;
use vod_store::{ArchiveDb, ArchiveService};

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, json};

pub async fn run(cli: &Cli, cancel: &CancellationToken) -> Result<()> {
    let mut checks: Vec<Check> = Vec::new();

    // Check 1: Database file exists
    let db_path = cli.db_path();
    let db_exists = db_path.exists();
    checks.push(Check::new(
        "Database file",
        db_exists,
        if db_exists {
            format!("Found at {}", db_path.display())
        } else {
            format!("Not found at {}", db_path.display())
        },
    ));

    // Check 2: Database can be opened (never create one here)
    let service = if db_exists {
        match ArchiveDb::open_or_create(&db_path, cli.store_config()) {
            Ok(db) => {
                checks.push(Check::new("Database opens", true, "Successfully opened"));
                Some(ArchiveService::new(db))
            }
            Err(e) => {
                checks.push(Check::new("Database opens", false, format!("Failed to open: {}", e)));
                None
            }
        }
    } else {
        None
    };

    if let Some(service) = &service {
        // Check 3: Schema version
        match service.stats(cancel).await {
            Ok(stats) => checks.push(Check::new(
                "Schema version",
                stats.version == DB_VERSION,
                format!("v{} (expected v{})", stats.version, DB_VERSION),
            )),
            Err(e) => checks.push(Check::new("Schema version", false, format!("Query failed: {}", e))),
        }

        // Check 4: Full-text index matches stored lines
        match service.check_search_index(cancel).await {
            Ok(true) => checks.push(Check::new("Search index", true, "Consistent with stored lines")),
            Ok(false) => checks.push(Check::new(
                "Search index",
                false,
                "Out of sync with stored lines",
            )),
            Err(e) => checks.push(Check::new("Search index", false, format!("Check failed: {}", e))),
        }

        // Check 5: Has transcripts
        match service.transcript_count(cancel).await {
            Ok(count) => checks.push(Check::new(
                "Has data",
                count > 0,
                if count > 0 {
                    format!("{} transcripts", colors::format_count(count))
                } else {
                    "No transcripts ingested".to_string()
                },
            )),
            Err(e) => checks.push(Check::new("Has data", false, format!("Query failed: {}", e))),
        }
    }

    let all_passed = checks.iter().all(|c| c.passed);

    match cli.effective_format() {
        OutputFormat::Human => {
            println!("{}", colors::header("Archive Doctor"));
            println!();

            for check in &checks {
                let status = if check.passed {
                    colors::success(&check.name)
                } else {
                    colors::error(&check.name)
                };
                println!("  {} - {}", status, check.details);
            }

            println!();
            if all_passed {
                println!("{}", colors::success("All checks passed"));
            } else {
                println!("{}", colors::error("Some checks failed"));
                println!();
                println!("To fix:");
                if !db_exists {
                    println!("  1. Run: vod ingest <file> --streamer <name> --date <YYYY-MM-DD>");
                } else if service.is_none() {
                    println!("  1. Check the path or move the incompatible database aside");
                } else if failed(&checks, "Search index") {
                    println!("  1. Run: vod reindex");
                }
            }
        }

        OutputFormat::Json => {
            let output = serde_json::json!({
                "checks": checks.iter().map(|c| serde_json::json!({
                    "name": c.name,
                    "passed": c.passed,
                    "details": c.details
                })).collect::<Vec<_>>(),
                "all_passed": all_passed
            });
            json::print(&output, cli.pretty)?;
        }

        OutputFormat::Minimal => {
            let failed: Vec<_> = checks.iter().filter(|c| !c.passed).collect();
            if failed.is_empty() {
                println!("ok");
            } else {
                for c in failed {
                    println!("FAIL: {}", c.name);
                }
            }
        }
    }

    Ok(())
}

struct Check {
    name: String,
    passed: bool,
    details: String,
}

impl Check {
    fn new(name: &str, passed: bool, details: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed,
            details: details.into(),
        }
    }
}

fn failed(checks: &[Check], name: &str) -> bool {
    checks.iter().any(|c| c.name == name && !c.passed)
}
