//! Bounding-box zone classification relative to a reference point.

use baches_report_models::{Coordinate, NewReport, ReportError, ReportRecord, ReportStatus, Zone};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::MIAHUATLAN_CENTER;

/// Half-width in degrees of the square around the reference point that is
/// classified as [`Zone::Center`].
pub const CENTER_HALF_WIDTH_DEG: f64 = 0.005;

/// Offset in degrees past which a point falls into a directional zone.
pub const BAND_HALF_WIDTH_DEG: f64 = 0.01;

/// Classifies `point` into a [`Zone`] relative to `reference`.
///
/// Rules are evaluated in order and the first match wins:
///
/// 1. both offsets strictly inside [`CENTER_HALF_WIDTH_DEG`] → Center
/// 2. latitude offset above [`BAND_HALF_WIDTH_DEG`] → North
/// 3. latitude offset below `-BAND_HALF_WIDTH_DEG` → South
/// 4. longitude offset above [`BAND_HALF_WIDTH_DEG`] → East
/// 5. longitude offset below `-BAND_HALF_WIDTH_DEG` → West
/// 6. otherwise → Periphery
///
/// A point that is both far north and far east is North. NaN offsets fail
/// every comparison and land in Periphery.
#[must_use]
pub fn classify(point: Coordinate, reference: Coordinate) -> Zone {
    let d_lat = point.lat - reference.lat;
    let d_lng = point.lng - reference.lng;

    if d_lat.abs() < CENTER_HALF_WIDTH_DEG && d_lng.abs() < CENTER_HALF_WIDTH_DEG {
        Zone::Center
    } else if d_lat > BAND_HALF_WIDTH_DEG {
        Zone::North
    } else if d_lat < -BAND_HALF_WIDTH_DEG {
        Zone::South
    } else if d_lng > BAND_HALF_WIDTH_DEG {
        Zone::East
    } else if d_lng < -BAND_HALF_WIDTH_DEG {
        Zone::West
    } else {
        Zone::Periphery
    }
}

/// A [`classify`] bound to one municipality's reference point.
///
/// This is also the only place [`ReportRecord`]s are built, so a record's
/// zone always matches its location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneClassifier {
    reference: Coordinate,
}

impl Default for ZoneClassifier {
    fn default() -> Self {
        Self::new(MIAHUATLAN_CENTER)
    }
}

impl ZoneClassifier {
    /// Creates a classifier around `reference`.
    #[must_use]
    pub const fn new(reference: Coordinate) -> Self {
        Self { reference }
    }

    /// The reference point zones are relative to.
    #[must_use]
    pub const fn reference(&self) -> Coordinate {
        self.reference
    }

    /// Classifies `point` against this classifier's reference point.
    #[must_use]
    pub fn classify(&self, point: Coordinate) -> Zone {
        let zone = classify(point, self.reference);
        log::trace!("classified {point} as {zone}");
        zone
    }

    /// Validates a submission and turns it into a pending [`ReportRecord`].
    ///
    /// # Errors
    ///
    /// Returns the [`NewReport::validate`] error if the street text or the
    /// coordinate is missing or invalid.
    pub fn create_record(
        &self,
        report: NewReport,
        now: DateTime<Utc>,
    ) -> Result<ReportRecord, ReportError> {
        let location = report.validate()?;

        Ok(ReportRecord {
            id: Uuid::new_v4(),
            location,
            zone: self.classify(location),
            street: report.street.trim().to_string(),
            description: report.description,
            severity: report.severity,
            photo_url: report.photo_url,
            detection_confidence: None,
            created_at: now,
            updated_at: None,
            updated_by: None,
            status: ReportStatus::Pending,
        })
    }

    /// Whether `record.zone` equals a fresh classification of its location.
    #[must_use]
    pub fn is_consistent(&self, record: &ReportRecord) -> bool {
        self.classify(record.location) == record.zone
    }

    /// Checks a record that was built elsewhere, such as one read back from
    /// a JSON dump.
    ///
    /// A record whose zone disagrees with its location is re-zoned.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidCoordinate`] if the location is not a
    /// valid coordinate.
    pub fn reconcile(&self, mut record: ReportRecord) -> Result<ReportRecord, ReportError> {
        let location = record.location.validated()?;
        let zone = self.classify(location);
        if zone != record.zone {
            log::warn!(
                "Report {} was stored as {} but lies in {zone}, re-zoning",
                record.id,
                record.zone
            );
            record.zone = zone;
        }
        Ok(record)
    }
}
