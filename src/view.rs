//! Publisher for the `accidents_monthly_stats` view.
//!
//! The view definition comes from an external SQL file when one is present,
//! so its shape can change without a rebuild; otherwise the built-in
//! definition below is used. Both are create-or-replace.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sqlx::PgPool;

pub const VIEW_NAME: &str = "accidents_monthly_stats";

pub const DEFAULT_VIEW_SQL: &str = r#"
CREATE OR REPLACE VIEW accidents_monthly_stats AS
SELECT
    EXTRACT(YEAR FROM date_accident)::int  AS year,
    EXTRACT(MONTH FROM date_accident)::int AS month,
    COUNT(*)                               AS total_accidents,
    ROUND(AVG(CASE WHEN alcool = 'Positif' THEN 1.0 ELSE 0.0 END)::numeric, 4) AS taux_alcool_positif
FROM accidents_clean
GROUP BY 1, 2
ORDER BY 1, 2;
"#;

/// Where the executed view definition came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewSource {
    File(PathBuf),
    BuiltIn,
}

impl fmt::Display for ViewSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewSource::File(p) => write!(f, "{}", p.display()),
            ViewSource::BuiltIn => f.write_str("built-in definition"),
        }
    }
}

// ---

/// Pick the SQL to run: the override file verbatim if it exists, else the default.
pub fn resolve_view_sql(override_path: &Path) -> Result<(String, ViewSource)> {
    // ---
    if override_path.is_file() {
        let sql = std::fs::read_to_string(override_path)
            .with_context(|| format!("Failed to read view SQL {}", override_path.display()))?;
        return Ok((sql, ViewSource::File(override_path.to_path_buf())));
    }

    tracing::debug!(
        "No view override at {}, using built-in definition",
        override_path.display()
    );
    Ok((DEFAULT_VIEW_SQL.to_string(), ViewSource::BuiltIn))
}

/// Create or replace the monthly statistics view.
pub async fn publish_view(pool: &PgPool, override_path: &Path) -> Result<ViewSource> {
    // ---
    let (sql, source) = resolve_view_sql(override_path)?;

    // The override file may hold several statements
    let mut tx = pool.begin().await?;
    sqlx::raw_sql(&sql)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to create view {VIEW_NAME} from {source}"))?;
    tx.commit().await?;

    tracing::info!("View {} created/updated ({})", VIEW_NAME, source);
    Ok(source)
}
