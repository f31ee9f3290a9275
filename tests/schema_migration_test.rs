use std::str::FromStr;

use anyhow::Result;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use accidents_ingest::{ensure_table, table_state, TableState};

/// Scratch schema so the legacy table never collides with other tests.
const SCHEMA: &str = "accidents_migration_test";

async fn scratch_pool() -> Result<Option<PgPool>> {
    // ---
    let Ok(db_url) = std::env::var("TEST_DATABASE_URL") else {
        return Ok(None);
    };

    let admin = PgPoolOptions::new().max_connections(1).connect(&db_url).await?;
    sqlx::raw_sql(&format!("DROP SCHEMA IF EXISTS {SCHEMA} CASCADE; CREATE SCHEMA {SCHEMA};"))
        .execute(&admin)
        .await?;
    admin.close().await;

    let options = PgConnectOptions::from_str(&db_url)?.options([("search_path", SCHEMA)]);
    let pool = PgPoolOptions::new().max_connections(1).connect_with(options).await?;
    Ok(Some(pool))
}

async fn row_count(pool: &PgPool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM accidents_clean").fetch_one(pool).await?)
}

#[tokio::test]
async fn legacy_table_is_only_replaced_when_allowed() -> Result<()> {
    // ---
    let Some(pool) = scratch_pool().await? else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return Ok(());
    };

    assert_eq!(table_state(&pool).await?, TableState::Missing);

    // Plain table as left by the old loader
    sqlx::raw_sql(
        r#"
        CREATE TABLE accidents_clean (submission_id INTEGER, date_accident DATE);
        INSERT INTO accidents_clean VALUES (1, '2020-01-01');
        "#,
    )
    .execute(&pool)
    .await?;
    assert_eq!(table_state(&pool).await?, TableState::Legacy);

    // Refused without the opt-in; data untouched
    let err = ensure_table(&pool, false).await.unwrap_err().to_string();
    assert!(err.contains("ALLOW_TABLE_RESET"), "{err}");
    assert_eq!(table_state(&pool).await?, TableState::Legacy);
    assert_eq!(row_count(&pool).await?, 1);

    // Opt-in drops and recreates it partitioned
    ensure_table(&pool, true).await?;
    assert_eq!(table_state(&pool).await?, TableState::Partitioned);
    assert_eq!(row_count(&pool).await?, 0);

    let has_index: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM pg_indexes WHERE schemaname = $1 AND indexname = 'accidents_clean_unique_idx')",
    )
    .bind(SCHEMA)
    .fetch_one(&pool)
    .await?;
    assert!(has_index);

    // Steady state: nothing left to migrate
    ensure_table(&pool, false).await?;
    assert_eq!(table_state(&pool).await?, TableState::Partitioned);

    sqlx::raw_sql(&format!("DROP SCHEMA {SCHEMA} CASCADE"))
        .execute(&pool)
        .await?;
    pool.close().await;
    Ok(())
}
