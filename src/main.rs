//! Application entry point for the `accidents-ingest` batch job.
//!
//! This binary orchestrates a single ingestion run:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Running the pipeline (read, clean, schema, partitions, load, view)
//! - Mapping any fatal error to exit code 1 with a category-specific message
//!
//! # Environment Variables
//! - `CSV_PATH`, `DATABASE_URL` / `POSTGRES_*`, `VIEW_SQL_PATH`,
//!   `INSERT_BATCH_SIZE`, `ON_CONFLICT`, `ALLOW_TABLE_RESET` – see `config`
//! - `INGEST_LOG_LEVEL` (optional) – log verbosity (default: `info`)
//! - `INGEST_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! Following the Explicit Module Boundary Pattern (EMBP), everything except
//! logging setup and exit handling lives behind the library gateway.
use std::{env, process::ExitCode};

use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing::Level;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use accidents_ingest::{load_from_env, parse_flag, run, PipelineError};

// ---

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // ---
    dotenv().ok();
    init_tracing();

    match try_main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("FATAL ERROR - {}: {:#}", e.category(), e);
            if let Some(source) = std::error::Error::source(&e) {
                tracing::debug!("Caused by: {:?}", source);
            }
            ExitCode::from(1)
        }
    }
}

async fn try_main() -> Result<(), PipelineError> {
    // ---
    let cfg = load_from_env()?;
    cfg.log_config();

    let summary = run(&cfg).await?;

    tracing::info!(
        "Run complete: {} read, {} kept, {} inserted, {} skipped, {} new partition(s), view from {}",
        summary.report.total,
        summary.report.kept,
        summary.rows.inserted,
        summary.rows.skipped,
        summary.partitions_created.len(),
        summary.view_source
    );
    Ok(())
}

// ---

/// Install the global `tracing` subscriber.
///
/// - Filter: `RUST_LOG` when set, else `INGEST_LOG_LEVEL` (default `info`),
///   always with `sqlx::query=warn`
/// - Colour: `FORCE_COLOR` as a yes/no flag, else stdout TTY detection
/// - Span events: `INGEST_SPAN_EVENTS=full|enter_exit`, else close only
///
/// Runs after `.env` is loaded and before the configuration is parsed, so
/// configuration errors are logged too.
fn init_tracing() {
    // ---
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_ansi(use_color())
        .with_span_events(span_events())
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .init();
}

fn log_filter() -> EnvFilter {
    // ---
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = env::var("INGEST_LOG_LEVEL")
            .ok()
            .and_then(|v| v.trim().parse::<Level>().ok())
            .unwrap_or(Level::INFO);
        EnvFilter::new(format!("{},sqlx::query=warn", level.as_str().to_ascii_lowercase()))
    })
}

fn use_color() -> bool {
    env::var("FORCE_COLOR")
        .ok()
        .and_then(|v| parse_flag(&v))
        .unwrap_or_else(|| std::io::stdout().is_terminal())
}

fn span_events() -> FmtSpan {
    match env::var("INGEST_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    }
}
