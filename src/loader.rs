//! Bulk loader for `accidents_clean`.
//!
//! Rows are written with multi-row `INSERT ... VALUES` statements of at most
//! `batch_size` rows. All batches share one transaction, so a failing batch
//! leaves nothing from this run behind.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::CleanRecord;

/// Bind parameters per inserted row.
pub const PARAMS_PER_ROW: usize = 9;

/// Largest batch that stays under PostgreSQL's 65535 bind parameters per statement.
pub const MAX_BATCH_SIZE: usize = u16::MAX as usize / PARAMS_PER_ROW;

const INSERT_HEAD: &str = "INSERT INTO accidents_clean (\
    submission_id, date_accident, heure_accident, region, type_accident, alcool, year, month, hour\
    ) ";

/// Behaviour when `(submission_id, year)` is already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Skip rows that already exist (`ON CONFLICT DO NOTHING`).
    #[default]
    Ignore,
    /// Abort the load on the first duplicate.
    Fail,
}

impl FromStr for ConflictPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        // ---
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(ConflictPolicy::Ignore),
            "fail" => Ok(ConflictPolicy::Fail),
            other => Err(anyhow!("Invalid ON_CONFLICT: {other} (expected 'ignore' or 'fail')")),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPolicy::Ignore => f.write_str("ignore"),
            ConflictPolicy::Fail => f.write_str("fail"),
        }
    }
}

/// Rows written versus rows skipped as already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    pub inserted: u64,
    pub skipped: u64,
}

// ---

/// Build one multi-row INSERT for `batch`.
pub fn build_insert<'a>(batch: &'a [CleanRecord], policy: ConflictPolicy) -> QueryBuilder<'a, Postgres> {
    // ---
    let mut qb = QueryBuilder::new(INSERT_HEAD);

    qb.push_values(batch, |mut row, r| {
        row.push_bind(r.submission_id)
            .push_bind(r.date)
            .push_bind(r.time)
            .push_bind(r.region.as_deref())
            .push_bind(r.accident_type.as_deref())
            .push_bind(r.alcohol_status.as_db_value())
            .push_bind(r.year)
            .push_bind(r.month)
            .push_bind(r.hour);
    });

    if policy == ConflictPolicy::Ignore {
        qb.push(" ON CONFLICT (submission_id, year) DO NOTHING");
    }
    qb
}

/// Insert all records in batches of `batch_size` inside a single transaction.
///
/// `batch_size` is clamped to `1..=MAX_BATCH_SIZE`.
pub async fn insert_records(
    pool: &PgPool,
    records: &[CleanRecord],
    batch_size: usize,
    policy: ConflictPolicy,
) -> Result<InsertOutcome> {
    // ---
    if records.is_empty() {
        tracing::info!("No rows to insert");
        return Ok(InsertOutcome::default());
    }

    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for (i, batch) in records.chunks(batch_size.clamp(1, MAX_BATCH_SIZE)).enumerate() {
        let result = build_insert(batch, policy)
            .build()
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Insert batch {} ({} rows) failed", i + 1, batch.len()))?;

        tracing::debug!("Batch {}: {} rows written", i + 1, result.rows_affected());
        inserted += result.rows_affected();
    }

    tx.commit().await?;

    let outcome = InsertOutcome {
        inserted,
        skipped: records.len() as u64 - inserted,
    };
    if outcome.skipped > 0 {
        tracing::info!("Rows skipped (already loaded): {}", outcome.skipped);
    }
    Ok(outcome)
}
