#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result and filter types for report analytics.
//!
//! These are what the stats endpoints and the CLI serialize. They are kept
//! apart from the computation so the API contract can be shared without
//! pulling in `geojson`.

use std::collections::BTreeMap;

use baches_report_models::{ReportRecord, ReportStatus, Severity, Zone};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Report counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityCounts {
    /// High-severity reports.
    pub high: u64,
    /// Medium-severity reports.
    pub medium: u64,
    /// Low-severity reports.
    pub low: u64,
}

impl SeverityCounts {
    /// Counts one more report of `severity`.
    pub const fn add(&mut self, severity: Severity) {
        match severity {
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    /// Sum over all severities.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.high + self.medium + self.low
    }
}

/// Totals for one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneStats {
    /// The zone.
    pub zone: Zone,
    /// Reports in the zone.
    pub total: u64,
    /// Breakdown by severity.
    pub by_severity: SeverityCounts,
}

/// Count of reports in one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneCount {
    /// The zone.
    pub zone: Zone,
    /// Number of reports.
    pub count: u64,
}

/// Overall statistics across all reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Total number of reports.
    pub total: u64,
    /// Breakdown by severity.
    pub by_severity: SeverityCounts,
    /// Breakdown by zone; every zone is present.
    pub by_zone: BTreeMap<Zone, u64>,
    /// Breakdown by status; every status is present.
    pub by_status: BTreeMap<ReportStatus, u64>,
    /// When the summary was computed.
    pub generated_at: DateTime<Utc>,
}

/// Summary of the reports submitted in the last seven days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    /// Inclusive start of the window.
    pub period_start: DateTime<Utc>,
    /// End of the window (the time the summary was computed).
    pub period_end: DateTime<Utc>,
    /// Reports in the window.
    pub total: u64,
    /// Breakdown by severity.
    pub by_severity: SeverityCounts,
    /// Zones with at least one report, most reports first.
    pub most_affected_zones: Vec<ZoneCount>,
}

/// Criteria for selecting reports. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilter {
    /// Only reports in this zone.
    pub zone: Option<Zone>,
    /// Only reports of this severity.
    pub severity: Option<Severity>,
    /// Only reports in this status.
    pub status: Option<ReportStatus>,
    /// Only reports created at or after this time.
    pub from: Option<DateTime<Utc>>,
    /// Only reports created before this time.
    pub to: Option<DateTime<Utc>>,
}

impl ReportFilter {
    /// Whether `report` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, report: &ReportRecord) -> bool {
        self.zone.is_none_or(|zone| report.zone == zone)
            && self.severity.is_none_or(|severity| report.severity == severity)
            && self.status.is_none_or(|status| report.status == status)
            && self.from.is_none_or(|from| report.created_at >= from)
            && self.to.is_none_or(|to| report.created_at < to)
    }
}
