//! Field normalizers.
//!
//! Pure functions turning raw CSV text into typed values. Bad input is never
//! an error here: it resolves to `None` (or [`AlcoholStatus::Unknown`]) and the
//! cleaner decides whether the record survives.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::AlcoholStatus;

/// Formats tried first, in order.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// Permissive fallback for dates that match neither primary format.
const FALLBACK_DATE_FORMATS: [&str; 11] = [
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
];

/// Timestamp layouts whose date part is accepted by the fallback.
const FALLBACK_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

const TIME_FORMAT: &str = "%H:%M";

const AFFIRMATIVE: [&str; 4] = ["oui", "o", "true", "1"];
const NEGATIVE: [&str; 4] = ["non", "n", "false", "0"];

// ---

/// Trim and treat blank cells as missing.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse an accident date.
///
/// Tries `YYYY-MM-DD` then `DD/MM/YYYY`; when both fail, falls back to
/// [`parse_date_generic`]. Returns `None` if nothing matches.
pub fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    // ---
    let v = present(value)?;

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(v, fmt).ok())
        .or_else(|| parse_date_generic(v))
}

/// Best-effort date parsing for less common layouts and full timestamps.
pub fn parse_date_generic(v: &str) -> Option<NaiveDate> {
    // ---
    if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
        return Some(dt.date_naive());
    }

    FALLBACK_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(v, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            FALLBACK_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(v, fmt).ok())
        })
}

/// Parse an accident time in `HH:MM`. No fallback.
pub fn parse_time(value: Option<&str>) -> Option<NaiveTime> {
    // ---
    let v = present(value)?;
    NaiveTime::parse_from_str(v, TIME_FORMAT).ok()
}

/// Map the free-text alcohol flag onto [`AlcoholStatus`].
pub fn normalize_alcohol(value: Option<&str>) -> AlcoholStatus {
    // ---
    let Some(v) = present(value) else {
        return AlcoholStatus::Unknown;
    };
    let v = v.to_lowercase();

    if AFFIRMATIVE.contains(&v.as_str()) {
        AlcoholStatus::Positive
    } else if NEGATIVE.contains(&v.as_str()) {
        AlcoholStatus::Negative
    } else {
        AlcoholStatus::Unknown
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_primary_formats() {
        // ---
        assert_eq!(parse_date(Some("2021-03-15")), Some(ymd(2021, 3, 15)));
        assert_eq!(parse_date(Some("15/03/2021")), Some(ymd(2021, 3, 15)));
        assert_eq!(parse_date(Some("  2020-12-31 ")), Some(ymd(2020, 12, 31)));
    }

    #[test]
    fn test_parse_date_day_first_wins() {
        // ---
        // Ambiguous slashes are read as DD/MM/YYYY
        assert_eq!(parse_date(Some("03/04/2021")), Some(ymd(2021, 4, 3)));
        // Month-first only when day-first is impossible
        assert_eq!(parse_date(Some("04/25/2021")), Some(ymd(2021, 4, 25)));
    }

    #[test]
    fn test_parse_date_generic_fallback() {
        // ---
        assert_eq!(parse_date(Some("2021/03/15")), Some(ymd(2021, 3, 15)));
        assert_eq!(parse_date(Some("20210315")), Some(ymd(2021, 3, 15)));
        assert_eq!(parse_date(Some("15-03-2021")), Some(ymd(2021, 3, 15)));
        assert_eq!(parse_date(Some("15 March 2021")), Some(ymd(2021, 3, 15)));
        assert_eq!(parse_date(Some("Mar 15, 2021")), Some(ymd(2021, 3, 15)));
        assert_eq!(parse_date(Some("2021-03-15 08:30:00")), Some(ymd(2021, 3, 15)));
        assert_eq!(parse_date(Some("2021-03-15T08:30:00+01:00")), Some(ymd(2021, 3, 15)));
    }

    #[test]
    fn test_parse_date_missing_or_invalid() {
        // ---
        assert_eq!(parse_date(None), None);
        assert_eq!(parse_date(Some("")), None);
        assert_eq!(parse_date(Some("   ")), None);
        assert_eq!(parse_date(Some("not a date")), None);
        assert_eq!(parse_date(Some("2021-02-30")), None);
        assert_eq!(parse_date(Some("32/01/2021")), None);
    }

    #[test]
    fn test_parse_time() {
        // ---
        assert_eq!(parse_time(Some("14:30")), NaiveTime::from_hms_opt(14, 30, 0));
        assert_eq!(parse_time(Some("07:05")), NaiveTime::from_hms_opt(7, 5, 0));
        assert_eq!(parse_time(Some("25:00")), None);
        assert_eq!(parse_time(Some("14h30")), None);
        assert_eq!(parse_time(Some("14:30:00")), None);
        assert_eq!(parse_time(Some("")), None);
        assert_eq!(parse_time(None), None);
    }

    #[test]
    fn test_normalize_alcohol() {
        // ---
        assert_eq!(normalize_alcohol(Some("OUI")), AlcoholStatus::Positive);
        assert_eq!(normalize_alcohol(Some("Non")), AlcoholStatus::Negative);
        assert_eq!(normalize_alcohol(Some("maybe")), AlcoholStatus::Unknown);
        assert_eq!(normalize_alcohol(None), AlcoholStatus::Unknown);
    }

    #[test]
    fn test_normalize_alcohol_all_tokens() {
        // ---
        for token in ["oui", "O", " true ", "1"] {
            assert_eq!(normalize_alcohol(Some(token)), AlcoholStatus::Positive, "{token}");
        }
        for token in ["non", "N", "FALSE", "0 "] {
            assert_eq!(normalize_alcohol(Some(token)), AlcoholStatus::Negative, "{token}");
        }
        assert_eq!(normalize_alcohol(Some("")), AlcoholStatus::Unknown);
        assert_eq!(normalize_alcohol(Some("yes")), AlcoholStatus::Unknown);
    }
}
