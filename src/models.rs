//! Data models for the accident ingestion pipeline.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

// ---

/// One CSV row, untyped. Empty cells deserialize to `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    // ---
    pub submission_id: Option<String>,
    pub date_accident: Option<String>,
    pub heure_accident: Option<String>,
    pub region: Option<String>,
    pub type_accident: Option<String>,
    pub alcool: Option<String>,
}

/// Normalized alcohol test outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlcoholStatus {
    Positive,
    Negative,
    Unknown,
}

impl AlcoholStatus {
    /// Value stored in the `alcool` column; `Unknown` maps to NULL.
    pub fn as_db_value(self) -> Option<&'static str> {
        // ---
        match self {
            AlcoholStatus::Positive => Some("Positif"),
            AlcoholStatus::Negative => Some("Negatif"),
            AlcoholStatus::Unknown => None,
        }
    }
}

/// A validated record ready to be written to `accidents_clean`.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    // ---
    pub submission_id: i32,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub region: Option<String>,
    pub accident_type: Option<String>,
    pub alcohol_status: AlcoholStatus,
    pub year: i32,
    pub month: i32,
    pub hour: Option<i32>,
}
