//! End-to-end ingestion run.
//!
//! Stages run strictly in sequence over one database connection:
//! read CSV, clean, ensure schema, provision partitions, load, publish view.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::cleaner::{clean_records, CleanReport};
use crate::config::{mask_db_url, Config};
use crate::error::PipelineError;
use crate::loader::{insert_records, InsertOutcome};
use crate::models::CleanRecord;
use crate::partitions::{partitions_for, provision_partitions};
use crate::reader::read_raw_records;
use crate::schema::ensure_table;
use crate::view::{publish_view, ViewSource};

/// What a successful run did.
#[derive(Debug, Clone)]
pub struct LoadSummary {
    // ---
    pub report: CleanReport,
    pub partitions_created: Vec<String>,
    pub rows: InsertOutcome,
    pub view_source: ViewSource,
}

// ---

/// Open the single connection used for the whole run.
pub async fn connect(cfg: &Config) -> Result<PgPool, PipelineError> {
    // ---
    tracing::info!("Attempting to connect to database: {}", mask_db_url(&cfg.db_url));

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&cfg.db_url)
        .await
        .map_err(PipelineError::Connect)?;

    tracing::info!("Successfully connected to database");
    Ok(pool)
}

/// Run every stage against the database configured in `cfg`.
pub async fn run(cfg: &Config) -> Result<LoadSummary, PipelineError> {
    // ---
    let raw = read_raw_records(&cfg.csv_path)?;
    let (records, report) = clean_records(raw);

    let pool = connect(cfg).await?;
    let summary = load(&pool, cfg, &records, report).await;
    pool.close().await;

    let summary = summary?;
    tracing::info!("Rows inserted: {}", summary.rows.inserted);
    Ok(summary)
}

/// Database stages on an already open pool.
pub async fn load(
    pool: &PgPool,
    cfg: &Config,
    records: &[CleanRecord],
    report: CleanReport,
) -> Result<LoadSummary, PipelineError> {
    // ---
    ensure_table(pool, cfg.allow_table_reset).await?;

    let partitions = partitions_for(records);
    let partitions_created = provision_partitions(pool, &partitions).await?;

    let rows = insert_records(pool, records, cfg.batch_size, cfg.on_conflict).await?;

    let view_source = publish_view(pool, &cfg.view_sql_path).await?;

    Ok(LoadSummary {
        report,
        partitions_created,
        rows,
        view_source,
    })
}
