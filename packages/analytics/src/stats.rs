//! Counting reports by zone, severity and status.

use std::collections::BTreeMap;

use baches_analytics_models::{
    ReportFilter, SeverityCounts, Summary, WeeklySummary, ZoneCount, ZoneStats,
};
use baches_report_models::{ReportRecord, ReportStatus, Zone};
use chrono::{DateTime, Duration, Utc};

/// Length of the window covered by [`weekly_summary`].
pub const WEEKLY_WINDOW_DAYS: i64 = 7;

/// Per-zone totals with a severity breakdown, one entry per zone in
/// [`Zone::all`] order (empty zones included).
#[must_use]
pub fn zone_stats(reports: &[ReportRecord]) -> Vec<ZoneStats> {
    let mut by_zone: BTreeMap<Zone, SeverityCounts> = BTreeMap::new();
    for report in reports {
        by_zone.entry(report.zone).or_default().add(report.severity);
    }

    Zone::all()
        .iter()
        .map(|zone| {
            let by_severity = by_zone.get(zone).copied().unwrap_or_default();
            ZoneStats {
                zone: *zone,
                total: by_severity.total(),
                by_severity,
            }
        })
        .collect()
}

/// Overall counts by severity, zone and status.
#[must_use]
pub fn summary(reports: &[ReportRecord], now: DateTime<Utc>) -> Summary {
    let mut by_severity = SeverityCounts::default();
    let mut by_zone: BTreeMap<Zone, u64> = Zone::all().iter().map(|z| (*z, 0)).collect();
    let mut by_status: BTreeMap<ReportStatus, u64> =
        ReportStatus::all().iter().map(|s| (*s, 0)).collect();

    for report in reports {
        by_severity.add(report.severity);
        *by_zone.entry(report.zone).or_default() += 1;
        *by_status.entry(report.status).or_default() += 1;
    }

    log::debug!("Computed summary over {} report(s)", reports.len());

    Summary {
        total: reports.len() as u64,
        by_severity,
        by_zone,
        by_status,
        generated_at: now,
    }
}

/// Summary of reports created in the [`WEEKLY_WINDOW_DAYS`] before `now`.
#[must_use]
pub fn weekly_summary(reports: &[ReportRecord], now: DateTime<Utc>) -> WeeklySummary {
    let period_start = now - Duration::days(WEEKLY_WINDOW_DAYS);
    let window = ReportFilter {
        from: Some(period_start),
        ..ReportFilter::default()
    };

    let mut by_severity = SeverityCounts::default();
    let mut by_zone: BTreeMap<Zone, u64> = BTreeMap::new();
    let mut total = 0;

    for report in reports.iter().filter(|r| window.matches(r)) {
        total += 1;
        by_severity.add(report.severity);
        *by_zone.entry(report.zone).or_default() += 1;
    }

    let mut most_affected_zones: Vec<ZoneCount> = by_zone
        .into_iter()
        .map(|(zone, count)| ZoneCount { zone, count })
        .collect();
    // Stable sort keeps ties in `Zone` order.
    most_affected_zones.sort_by(|a, b| b.count.cmp(&a.count));

    WeeklySummary {
        period_start,
        period_end: now,
        total,
        by_severity,
        most_affected_zones,
    }
}

/// Reports matching `filter`, newest first.
#[must_use]
pub fn apply_filter(reports: &[ReportRecord], filter: &ReportFilter) -> Vec<ReportRecord> {
    let mut matching: Vec<ReportRecord> = reports
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    matching
}

#[cfg(test)]
pub(crate) mod tests {
    use baches_report_models::{Coordinate, Severity};
    use chrono::TimeZone as _;
    use uuid::Uuid;

    use super::*;

    pub fn report(zone: Zone, severity: Severity, created_at: DateTime<Utc>) -> ReportRecord {
        ReportRecord {
            id: Uuid::new_v4(),
            location: Coordinate::new(16.3219, -96.5958),
            zone,
            street: "Calle Independencia".to_string(),
            description: String::new(),
            severity,
            photo_url: None,
            detection_confidence: None,
            created_at,
            updated_at: None,
            updated_by: None,
            status: ReportStatus::Pending,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn sample() -> Vec<ReportRecord> {
        let now = now();
        let mut resolved = report(Zone::South, Severity::Low, now - Duration::days(30));
        resolved.status = ReportStatus::Resolved;
        vec![
            report(Zone::North, Severity::High, now - Duration::days(1)),
            report(Zone::North, Severity::Medium, now - Duration::days(2)),
            report(Zone::Center, Severity::High, now - Duration::days(3)),
            report(Zone::East, Severity::High, now - Duration::days(6)),
            resolved,
        ]
    }

    #[test]
    fn zone_stats_cover_every_zone() {
        let stats = zone_stats(&sample());

        assert_eq!(stats.len(), Zone::all().len());
        assert_eq!(stats[0].zone, Zone::Center);

        let north = stats.iter().find(|s| s.zone == Zone::North).unwrap();
        assert_eq!(north.total, 2);
        assert_eq!(north.by_severity.high, 1);
        assert_eq!(north.by_severity.medium, 1);

        let west = stats.iter().find(|s| s.zone == Zone::West).unwrap();
        assert_eq!(west.total, 0);
    }

    #[test]
    fn summary_counts_everything() {
        let summary = summary(&sample(), now());

        assert_eq!(summary.total, 5);
        assert_eq!(summary.by_severity.high, 3);
        assert_eq!(summary.by_severity.low, 1);
        assert_eq!(summary.by_zone[&Zone::North], 2);
        assert_eq!(summary.by_zone[&Zone::Periphery], 0);
        assert_eq!(summary.by_status[&ReportStatus::Pending], 4);
        assert_eq!(summary.by_status[&ReportStatus::Resolved], 1);
        assert_eq!(summary.by_status[&ReportStatus::UnderReview], 0);
        assert_eq!(summary.generated_at, now());
    }

    #[test]
    fn weekly_summary_uses_last_seven_days() {
        let weekly = weekly_summary(&sample(), now());

        assert_eq!(weekly.total, 4);
        assert_eq!(weekly.period_start, now() - Duration::days(7));
        assert_eq!(weekly.period_end, now());
        assert_eq!(weekly.by_severity.low, 0);
        assert_eq!(
            weekly.most_affected_zones,
            vec![
                ZoneCount {
                    zone: Zone::North,
                    count: 2
                },
                ZoneCount {
                    zone: Zone::Center,
                    count: 1
                },
                ZoneCount {
                    zone: Zone::East,
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn filter_combines_criteria_newest_first() {
        let reports = sample();

        let high = apply_filter(
            &reports,
            &ReportFilter {
                severity: Some(Severity::High),
                ..ReportFilter::default()
            },
        );
        assert_eq!(high.len(), 3);
        assert!(high.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        let north_high = apply_filter(
            &reports,
            &ReportFilter {
                zone: Some(Zone::North),
                severity: Some(Severity::High),
                ..ReportFilter::default()
            },
        );
        assert_eq!(north_high.len(), 1);

        let resolved = apply_filter(
            &reports,
            &ReportFilter {
                status: Some(ReportStatus::Resolved),
                to: Some(now() - Duration::days(7)),
                ..ReportFilter::default()
            },
        );
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].zone, Zone::South);
    }

    #[test]
    fn empty_input_is_all_zeros() {
        let summary = summary(&[], now());
        assert_eq!(summary.total, 0);
        assert!(summary.by_zone.values().all(|c| *c == 0));
        assert!(weekly_summary(&[], now()).most_affected_zones.is_empty());
    }
}
