//! Configuration loader for the `accidents-ingest` batch job.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). The resulting [`Config`] is built once at startup
//! and handed to every stage of the pipeline explicitly.
use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};

use crate::loader::{ConflictPolicy, MAX_BATCH_SIZE};

/// Parse an optional environment variable with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Read an optional string environment variable, falling back to a default.
macro_rules! env_or {
    ($var_name:expr, $default:expr) => {
        env::var($var_name).unwrap_or_else(|_| $default.to_string())
    };
}

pub const DEFAULT_CSV_PATH: &str = "/data/accidents_raw.csv";
pub const DEFAULT_VIEW_SQL_PATH: &str = "sql/create_view.sql";
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the run.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Input CSV file.
    pub csv_path: PathBuf,

    /// PostgreSQL connection string.
    pub db_url: String,

    /// Optional SQL file overriding the built-in view definition.
    pub view_sql_path: PathBuf,

    /// Maximum number of rows per multi-row INSERT.
    pub batch_size: usize,

    /// What to do when a row already exists for `(submission_id, year)`.
    pub on_conflict: ConflictPolicy,

    /// Permit dropping a legacy, non-partitioned `accidents_clean` table.
    pub allow_table_reset: bool,
}

impl Default for Config {
    fn default() -> Self {
        // ---
        Config {
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            db_url: compose_database_url("app", "app", "postgres", 5432, "data_lab"),
            view_sql_path: PathBuf::from(DEFAULT_VIEW_SQL_PATH),
            batch_size: DEFAULT_BATCH_SIZE,
            on_conflict: ConflictPolicy::default(),
            allow_table_reset: false,
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `CSV_PATH` – input file (default: `/data/accidents_raw.csv`)
/// - `DATABASE_URL` – full connection string; when unset it is composed from
///   `POSTGRES_USER`, `POSTGRES_PASSWORD`, `POSTGRES_HOST`, `POSTGRES_PORT`
///   and `POSTGRES_DB` (defaults: `app`, `app`, `postgres`, `5432`, `data_lab`)
/// - `VIEW_SQL_PATH` – view override file (default: `sql/create_view.sql`)
/// - `INSERT_BATCH_SIZE` – rows per INSERT statement (default: 1000)
/// - `ON_CONFLICT` – `ignore` or `fail` (default: `ignore`)
/// - `ALLOW_TABLE_RESET` – allow the destructive legacy-table fixup (default: false)
///
/// Returns an error if any variable is present but invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let csv_path = PathBuf::from(env_or!("CSV_PATH", DEFAULT_CSV_PATH));

    let db_url = match env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => compose_database_url(
            &env_or!("POSTGRES_USER", "app"),
            &env_or!("POSTGRES_PASSWORD", "app"),
            &env_or!("POSTGRES_HOST", "postgres"),
            parse_env!("POSTGRES_PORT", u16, 5432),
            &env_or!("POSTGRES_DB", "data_lab"),
        ),
    };

    let view_sql_path = PathBuf::from(env_or!("VIEW_SQL_PATH", DEFAULT_VIEW_SQL_PATH));

    let batch_size = validate_batch_size(parse_env!("INSERT_BATCH_SIZE", usize, DEFAULT_BATCH_SIZE))?;

    let on_conflict = match env::var("ON_CONFLICT") {
        Ok(v) => v.parse::<ConflictPolicy>()?,
        Err(_) => ConflictPolicy::default(),
    };

    let allow_table_reset = match env::var("ALLOW_TABLE_RESET") {
        Ok(v) => parse_flag(&v).ok_or_else(|| anyhow!("Invalid ALLOW_TABLE_RESET: {v}"))?,
        Err(_) => false,
    };

    Ok(Config {
        csv_path,
        db_url,
        view_sql_path,
        batch_size,
        on_conflict,
        allow_table_reset,
    })
}

/// Batch sizes must be positive and fit the bind-parameter limit of one statement.
pub fn validate_batch_size(batch_size: usize) -> Result<usize> {
    // ---
    if batch_size == 0 {
        bail!("Invalid INSERT_BATCH_SIZE: must be greater than zero");
    }
    if batch_size > MAX_BATCH_SIZE {
        bail!("Invalid INSERT_BATCH_SIZE: {batch_size} exceeds the maximum of {MAX_BATCH_SIZE} rows per statement");
    }
    Ok(batch_size)
}

/// Read a yes/no style flag (`1|true|yes`, `0|false|no`).
pub fn parse_flag(value: &str) -> Option<bool> {
    // ---
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Build a `postgresql://` URL from its individual parts.
pub fn compose_database_url(user: &str, password: &str, host: &str, port: u16, db: &str) -> String {
    format!("postgresql://{user}:{password}@{host}:{port}/{db}")
}

/// Replace the password portion of a connection URL with `****`.
///
/// The password runs from the first `:` of the user info to the last `@`,
/// so passwords containing `:` or `@` stay hidden.
pub fn mask_db_url(db_url: &str) -> String {
    // ---
    let start = db_url.find("://").map_or(0, |i| i + 3);
    let Some(at_pos) = db_url[start..].rfind('@').map(|i| start + i) else {
        return db_url.to_string();
    };
    match db_url[start..at_pos].find(':') {
        Some(i) => format!("{}:****{}", &db_url[..start + i], &db_url[at_pos..]),
        None => db_url.to_string(),
    }
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the database password while showing all other values.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  CSV_PATH          : {}", self.csv_path.display());
        tracing::info!("  DATABASE_URL      : {}", mask_db_url(&self.db_url));
        tracing::info!("  VIEW_SQL_PATH     : {}", self.view_sql_path.display());
        tracing::info!("  INSERT_BATCH_SIZE : {}", self.batch_size);
        tracing::info!("  ON_CONFLICT       : {}", self.on_conflict);
        tracing::info!("  ALLOW_TABLE_RESET : {}", self.allow_table_reset);
    }
}
