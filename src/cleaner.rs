//! Record cleaner.
//!
//! Turns the raw CSV batch into [`CleanRecord`]s in a few whole-batch passes:
//! normalize every field, drop rows without a usable date, derive the
//! partition keys, then drop rows whose submission id is non-numeric or
//! already seen. Counters for each stage are returned in a [`CleanReport`].

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

use crate::models::{AlcoholStatus, CleanRecord, RawRecord};
use crate::normalize::{normalize_alcohol, parse_date, parse_time};

/// Row counts produced by [`clean_records`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    // ---
    pub total: usize,
    pub removed_invalid_date: usize,
    pub removed_invalid_or_duplicate_id: usize,
    pub missing_time: usize,
    pub unknown_alcohol: usize,
    pub kept: usize,
}

/// Fields after the normalization pass, before the id filter.
struct Normalized {
    submission_id: Option<String>,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    region: Option<String>,
    accident_type: Option<String>,
    alcohol_status: AlcoholStatus,
}

// ---

/// Clean a full batch of raw records.
///
/// Surviving records keep their input order; for duplicated ids the first
/// occurrence wins.
pub fn clean_records(raw: Vec<RawRecord>) -> (Vec<CleanRecord>, CleanReport) {
    // ---
    let total = raw.len();

    // Pass 1: normalize every field independently
    let normalized: Vec<Normalized> = raw.into_iter().map(normalize_record).collect();

    // Pass 2: records without a date cannot be partitioned
    let dated: Vec<(NaiveDate, Normalized)> = normalized
        .into_iter()
        .filter_map(|n| n.date.map(|d| (d, n)))
        .collect();
    let removed_invalid_date = total - dated.len();

    // Pass 3 + 4: derive keys, coerce ids and keep first occurrences
    let before_dedup = dated.len();
    let mut seen: HashSet<i32> = HashSet::with_capacity(before_dedup);
    let records: Vec<CleanRecord> = dated
        .into_iter()
        .filter_map(|(date, n)| {
            let id = n.submission_id.as_deref().and_then(coerce_submission_id)?;
            seen.insert(id).then(|| build_record(id, date, n))
        })
        .collect();
    let removed_invalid_or_duplicate_id = before_dedup - records.len();

    let report = CleanReport {
        total,
        removed_invalid_date,
        removed_invalid_or_duplicate_id,
        missing_time: records.iter().filter(|r| r.time.is_none()).count(),
        unknown_alcohol: records
            .iter()
            .filter(|r| r.alcohol_status == AlcoholStatus::Unknown)
            .count(),
        kept: records.len(),
    };

    tracing::info!("Lines read: {}", report.total);
    tracing::info!("Lines removed (invalid/missing date): {}", report.removed_invalid_date);
    tracing::info!(
        "Lines removed (duplicates or invalid submission_id): {}",
        report.removed_invalid_or_duplicate_id
    );
    tracing::debug!(
        "Kept {} lines ({} without time, {} with unknown alcohol status)",
        report.kept,
        report.missing_time,
        report.unknown_alcohol
    );

    (records, report)
}

fn normalize_record(raw: RawRecord) -> Normalized {
    // ---
    Normalized {
        date: parse_date(raw.date_accident.as_deref()),
        time: parse_time(raw.heure_accident.as_deref()),
        alcohol_status: normalize_alcohol(raw.alcool.as_deref()),
        submission_id: raw.submission_id,
        region: non_blank(raw.region),
        accident_type: non_blank(raw.type_accident),
    }
}

fn build_record(submission_id: i32, date: NaiveDate, n: Normalized) -> CleanRecord {
    // ---
    CleanRecord {
        submission_id,
        date,
        time: n.time,
        region: n.region,
        accident_type: n.accident_type,
        alcohol_status: n.alcohol_status,
        year: date.year(),
        month: date.month() as i32,
        hour: n.time.map(|t| t.hour() as i32),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Coerce a submission id to an `INTEGER`-sized value.
///
/// Accepts integers and integral floats (`"12.0"` is 12). Fractional,
/// non-finite and out-of-range values are rejected.
pub fn coerce_submission_id(value: &str) -> Option<i32> {
    // ---
    let v = value.trim();
    if let Ok(id) = v.parse::<i64>() {
        return i32::try_from(id).ok();
    }

    let f = v.parse::<f64>().ok()?;
    if !f.is_finite() || f.fract() != 0.0 || f < i32::MIN as f64 || f > i32::MAX as f64 {
        return None;
    }
    Some(f as i32)
}
