//! Database schema management for `accidents-ingest`.
//!
//! Ensures the partitioned `accidents_clean` table and its unique index exist
//! before any partition or row is written. Applied once per run from the
//! pipeline (EMBP: single gateway call).

use anyhow::{bail, Result};
use sqlx::PgPool;

pub const TABLE_NAME: &str = "accidents_clean";

/// Shape of the existing `accidents_clean` relation, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    Missing,
    Partitioned,
    /// Plain heap table left by an older version of the loader.
    Legacy,
}

// ---

/// Create or update the database schema (idempotent).
///
/// A legacy, non-partitioned table is only dropped when `allow_reset` is
/// set; otherwise the run stops before touching it. The drop and the
/// recreation share one transaction, so a failed create keeps the old table.
///
/// Errors are propagated if any SQL execution fails.
pub async fn ensure_table(pool: &PgPool, allow_reset: bool) -> Result<()> {
    // ---
    let state = table_state(pool).await?;
    match state {
        TableState::Legacy if allow_reset => {
            tracing::warn!("!!! Existing non-partitioned table {} found !!!", TABLE_NAME);
            tracing::warn!(
                "!!! ALLOW_TABLE_RESET is set: dropping {} and every row in it to recreate it partitioned !!!",
                TABLE_NAME
            );
        }
        TableState::Legacy => bail!(
            "Table {TABLE_NAME} exists but is not partitioned. \
             Set ALLOW_TABLE_RESET=true to drop and recreate it (ALL ROWS WILL BE LOST)"
        ),
        TableState::Partitioned => tracing::debug!("Table {} already partitioned", TABLE_NAME),
        TableState::Missing => tracing::info!("Creating table {}", TABLE_NAME),
    }

    let mut tx = pool.begin().await?;

    if state == TableState::Legacy {
        sqlx::query("DROP TABLE IF EXISTS accidents_clean CASCADE")
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accidents_clean (
            submission_id  INTEGER NOT NULL,
            date_accident  DATE    NOT NULL,
            heure_accident TIME    NULL,
            region         TEXT    NULL,
            type_accident  TEXT    NULL,
            alcool         TEXT    NULL CHECK (alcool IN ('Positif', 'Negatif') OR alcool IS NULL),
            year           INTEGER NOT NULL,
            month          INTEGER NOT NULL,
            hour           INTEGER NULL
        ) PARTITION BY RANGE (year);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Partition key must be part of the unique index; also backs ON CONFLICT
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS accidents_clean_unique_idx
            ON accidents_clean (submission_id, year);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    if state == TableState::Legacy {
        tracing::warn!("Legacy table {} replaced by a partitioned table", TABLE_NAME);
    }
    Ok(())
}

/// Inspect the catalog for the current shape of `accidents_clean`.
pub async fn table_state(pool: &PgPool) -> Result<TableState> {
    // ---
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM information_schema.tables
            WHERE table_schema = current_schema()
              AND table_name = $1
        )
        "#,
    )
    .bind(TABLE_NAME)
    .fetch_one(pool)
    .await?;

    if !exists {
        return Ok(TableState::Missing);
    }

    let partitioned: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM pg_partitioned_table
            WHERE partrelid = to_regclass($1)::oid
        )
        "#,
    )
    .bind(TABLE_NAME)
    .fetch_one(pool)
    .await?;

    Ok(if partitioned {
        TableState::Partitioned
    } else {
        TableState::Legacy
    })
}
