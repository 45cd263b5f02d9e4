//! The report entity and the submission payload it is built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Coordinate, ReportError, ReportStatus, Severity, Zone};

/// A report as submitted by a citizen, before it is zoned and stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    /// Street name or landmark typed by the reporter.
    #[serde(default)]
    pub street: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Captured or typed coordinate.
    pub location: Option<Coordinate>,
    /// Reported severity.
    #[serde(default)]
    pub severity: Severity,
    /// URL of the uploaded photo, if any.
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl NewReport {
    /// Checks that the report can be persisted and returns its coordinate.
    ///
    /// # Errors
    ///
    /// * [`ReportError::MissingStreet`] if the street text is blank
    /// * [`ReportError::MissingLocation`] if no coordinate was captured
    /// * [`ReportError::InvalidCoordinate`] if the coordinate is out of range
    pub fn validate(&self) -> Result<Coordinate, ReportError> {
        if self.street.trim().is_empty() {
            return Err(ReportError::MissingStreet);
        }
        self.location
            .ok_or(ReportError::MissingLocation)?
            .validated()
    }
}

/// A stored road-damage report.
///
/// `zone` is always the classification of `location` against the
/// municipality reference point at creation time. `detection_confidence`
/// is `Some` exactly when the report came from photo inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    /// Unique report identifier.
    pub id: Uuid,
    /// Where the damage is.
    pub location: Coordinate,
    /// Zone derived from `location`.
    pub zone: Zone,
    /// Street name or landmark.
    pub street: String,
    /// Free-text description.
    pub description: String,
    /// Severity of the damage.
    pub severity: Severity,
    /// URL of the uploaded photo, if any.
    pub photo_url: Option<String>,
    /// Inference confidence for auto-detected reports.
    pub detection_confidence: Option<f64>,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: Option<DateTime<Utc>>,
    /// Who made the last status change.
    pub updated_by: Option<String>,
    /// Moderation status.
    pub status: ReportStatus,
}

impl ReportRecord {
    /// Whether the report was proposed by photo inference.
    #[must_use]
    pub const fn auto_detected(&self) -> bool {
        self.detection_confidence.is_some()
    }

    /// Moves the report to `status`, recording who did it and when.
    ///
    /// Returns the previous status.
    pub fn set_status(
        &mut self,
        status: ReportStatus,
        actor: Option<&str>,
        now: DateTime<Utc>,
    ) -> ReportStatus {
        let previous = self.status;
        self.status = status;
        self.updated_at = Some(now);
        self.updated_by = actor.map(ToString::to_string);
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ReportRecord {
        ReportRecord {
            id: Uuid::nil(),
            location: Coordinate::new(16.3219, -96.5958),
            zone: Zone::Center,
            street: "Av. Reforma".to_string(),
            description: String::new(),
            severity: Severity::High,
            photo_url: None,
            detection_confidence: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: None,
            updated_by: None,
            status: ReportStatus::Pending,
        }
    }

    #[test]
    fn validate_requires_street_and_location() {
        let mut report = NewReport {
            street: "  ".to_string(),
            location: Some(Coordinate::new(16.32, -96.59)),
            ..NewReport::default()
        };
        assert_eq!(report.validate(), Err(ReportError::MissingStreet));

        report.street = "Calle 5 de Mayo".to_string();
        report.location = None;
        assert_eq!(report.validate(), Err(ReportError::MissingLocation));

        report.location = Some(Coordinate::new(120.0, 0.0));
        assert!(matches!(
            report.validate(),
            Err(ReportError::InvalidCoordinate { .. })
        ));

        report.location = Some(Coordinate::new(16.32, -96.59));
        assert_eq!(report.validate(), Ok(Coordinate::new(16.32, -96.59)));
    }

    #[test]
    fn set_status_records_audit_fields() {
        let mut report = record();
        let now = DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::hours(3);

        let previous = report.set_status(ReportStatus::Resolved, Some("municipal_system"), now);

        assert_eq!(previous, ReportStatus::Pending);
        assert_eq!(report.status, ReportStatus::Resolved);
        assert_eq!(report.updated_at, Some(now));
        assert_eq!(report.updated_by.as_deref(), Some("municipal_system"));
    }

    #[test]
    fn auto_detected_follows_confidence() {
        let mut report = record();
        assert!(!report.auto_detected());
        report.detection_confidence = Some(0.8);
        assert!(report.auto_detected());
    }

    #[test]
    fn new_report_defaults_to_medium_severity() {
        let report: NewReport =
            serde_json::from_str(r#"{"street":"Juárez","location":{"lat":16.3,"lng":-96.6}}"#)
                .unwrap();
        assert_eq!(report.severity, Severity::Medium);
        assert!(report.photo_url.is_none());
    }
}
