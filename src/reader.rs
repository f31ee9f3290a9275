//! CSV input reader.
//!
//! Loads the whole file into memory as [`RawRecord`]s. Column order does not
//! matter and extra columns are ignored, but every required column must be
//! present in the header.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use csv::ReaderBuilder;

use crate::error::PipelineError;
use crate::models::RawRecord;

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "submission_id",
    "date_accident",
    "heure_accident",
    "region",
    "type_accident",
    "alcool",
];

// ---

/// Read every row of the CSV at `path`.
///
/// A missing file yields [`PipelineError::InputMissing`]; malformed content
/// or a missing column yields [`PipelineError::Other`].
pub fn read_raw_records(path: &Path) -> Result<Vec<RawRecord>, PipelineError> {
    // ---
    tracing::info!("Reading CSV: {}", path.display());

    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::InputMissing(path.to_path_buf()));
        }
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to open {}", path.display()))
                .into())
        }
    };

    let records = parse_raw_records(file)
        .with_context(|| format!("Failed to parse CSV {}", path.display()))?;

    tracing::debug!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}

/// Parse CSV content from any reader.
pub fn parse_raw_records<R: Read>(input: R) -> anyhow::Result<Vec<RawRecord>> {
    // ---
    // Short rows keep their leading fields; the missing trailing ones become `None`
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(input);

    let headers = rdr.headers().context("Failed to read CSV header")?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        bail!("CSV is missing required column(s): {}", missing.join(", "));
    }

    rdr.deserialize::<RawRecord>()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("Malformed CSV row {}", i + 1)))
        .collect()
}
