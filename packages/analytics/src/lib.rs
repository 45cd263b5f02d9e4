#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregate statistics and exports over road-damage reports.
//!
//! Everything here works on an in-memory slice of
//! [`ReportRecord`](baches_report_models::ReportRecord)s handed over by
//! whatever holds the reports (the store, a JSON dump, ...). The same
//! functions back the `/api/stats*` endpoints and the CLI.

pub mod export;
pub mod stats;

pub use export::to_geojson;
pub use stats::{apply_filter, summary, weekly_summary, zone_stats};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A query parameter could not be interpreted.
    #[error("Query error: {message}")]
    Query {
        /// Description of what went wrong.
        message: String,
    },
}

/// Parses `"2025-03-01"`, `"2025-03-01T08:30:00"` or an RFC 3339 timestamp
/// into a UTC instant. Date-only input means midnight UTC.
///
/// # Errors
///
/// Returns [`AnalyticsError::Query`] if the string matches none of the
/// accepted formats.
pub fn parse_date(s: &str) -> Result<DateTime<Utc>, AnalyticsError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
        .map_err(|e| AnalyticsError::Query {
            message: format!("Invalid date '{s}': {e}. Expected format: YYYY-MM-DD"),
        })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    #[test]
    fn parses_date_only_as_midnight_utc() {
        assert_eq!(
            parse_date("2025-03-01").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn parses_naive_and_rfc3339() {
        assert_eq!(
            parse_date("2025-03-01T08:30:00").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap()
        );
        assert_eq!(
            parse_date("2025-03-01T08:30:00-06:00").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 1, 14, 30, 0).unwrap()
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_date("last week"),
            Err(AnalyticsError::Query { .. })
        ));
    }
}
