//! `accidents-ingest`: clean a CSV of traffic-accident records and load it
//! into a year-partitioned PostgreSQL table with a monthly statistics view.
//!
//! This crate follows the Explicit Module Boundary Pattern (EMBP): modules are
//! private and this gateway re-exports what the binary and tests need.
//!
//! - `normalize` / `cleaner` – pure field parsing and batch cleaning
//! - `reader` – CSV input
//! - `schema` / `partitions` – table shape and yearly partitions
//! - `loader` – batched inserts
//! - `view` – `accidents_monthly_stats`
//! - `pipeline` – the ordered run over one connection

mod cleaner;
mod config;
mod error;
mod loader;
mod models;
mod normalize;
mod partitions;
mod pipeline;
mod reader;
mod schema;
mod view;

pub use cleaner::{clean_records, coerce_submission_id, CleanReport};
pub use config::{
    compose_database_url, load_from_env, mask_db_url, parse_flag, validate_batch_size, Config,
};
pub use error::PipelineError;
pub use loader::{build_insert, insert_records, ConflictPolicy, InsertOutcome, MAX_BATCH_SIZE};
pub use models::{AlcoholStatus, CleanRecord, RawRecord};
pub use normalize::{normalize_alcohol, parse_date, parse_time};
pub use partitions::{partitions_for, provision_partitions, YearPartition};
pub use pipeline::{connect, load, run, LoadSummary};
pub use reader::{parse_raw_records, read_raw_records, REQUIRED_COLUMNS};
pub use schema::{ensure_table, table_state, TableState};
pub use view::{publish_view, resolve_view_sql, ViewSource, DEFAULT_VIEW_SQL};
