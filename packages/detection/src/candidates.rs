//! Propose-then-confirm handling of detections.

use baches_geography::{estimate::try_estimate, zone::ZoneClassifier};
use baches_report_models::{Coordinate, Detection, NewReport, ReportRecord, Zone};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::DetectionError;

/// The reporter's verdict on one candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Not looked at yet.
    #[default]
    Undecided,
    /// Confirmed as a real pothole.
    Accepted,
    /// Rejected as a false positive.
    Discarded,
}

/// One detection placed on the map, waiting for confirmation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// What the inference service reported.
    pub detection: Detection,
    /// Estimated coordinate of the pothole.
    pub location: Coordinate,
    /// Zone of the estimated coordinate.
    pub zone: Zone,
    /// The reporter's verdict.
    pub decision: Decision,
}

/// All candidates proposed for one photo.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSet {
    base: Coordinate,
    heading_deg: f64,
    candidates: Vec<Candidate>,
    #[serde(skip)]
    classifier: ZoneClassifier,
}

/// Places every detection relative to `base` and zones it.
///
/// Each detection is estimated from the same `base`; offsets are never
/// chained from one detection to the next. All candidates start
/// [`Decision::Undecided`].
///
/// # Errors
///
/// * [`DetectionError::Report`] if `base` is not a valid coordinate
/// * [`DetectionError::Estimate`] if `base` or `heading_deg` is not usable
///   by the estimator
pub fn propose(
    base: Coordinate,
    heading_deg: f64,
    detections: Vec<Detection>,
    classifier: &ZoneClassifier,
) -> Result<CandidateSet, DetectionError> {
    let base = base.validated()?;
    let candidates = detections
        .into_iter()
        .map(|detection| -> Result<Candidate, DetectionError> {
            let location =
                try_estimate(base, detection.position, detection.distance, heading_deg)?;
            let zone = classifier.classify(location);
            log::debug!(
                "{} {} detection placed at {location} ({zone})",
                detection.position,
                detection.distance
            );
            Ok(Candidate {
                detection,
                location,
                zone,
                decision: Decision::Undecided,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CandidateSet {
        base,
        heading_deg,
        candidates,
        classifier: *classifier,
    })
}

impl CandidateSet {
    /// Where the photo was taken.
    #[must_use]
    pub const fn base(&self) -> Coordinate {
        self.base
    }

    /// Camera heading used for the estimates.
    #[must_use]
    pub const fn heading_deg(&self) -> f64 {
        self.heading_deg
    }

    /// All candidates in inference order.
    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether inference found nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Number of candidates still waiting for a verdict.
    #[must_use]
    pub fn undecided_count(&self) -> usize {
        self.candidates
            .iter()
            .filter(|c| c.decision == Decision::Undecided)
            .count()
    }

    /// Records `decision` for the candidate at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DetectionError::NoSuchCandidate`] if `index` is out of range.
    pub fn decide(&mut self, index: usize, decision: Decision) -> Result<(), DetectionError> {
        let len = self.candidates.len();
        let candidate = self
            .candidates
            .get_mut(index)
            .ok_or(DetectionError::NoSuchCandidate { index, len })?;
        candidate.decision = decision;
        Ok(())
    }

    /// Accepts the candidate at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DetectionError::NoSuchCandidate`] if `index` is out of range.
    pub fn accept(&mut self, index: usize) -> Result<(), DetectionError> {
        self.decide(index, Decision::Accepted)
    }

    /// Discards the candidate at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DetectionError::NoSuchCandidate`] if `index` is out of range.
    pub fn discard(&mut self, index: usize) -> Result<(), DetectionError> {
        self.decide(index, Decision::Discarded)
    }

    /// Builds reports for the accepted candidates only.
    ///
    /// Undecided candidates are dropped along with discarded ones. Every
    /// report carries its detection's confidence, clamped to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`DetectionError::Report`] if `street` is blank.
    pub fn commit(
        self,
        street: &str,
        photo_url: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReportRecord>, DetectionError> {
        let classifier = self.classifier;
        let mut records = Vec::new();

        for candidate in self.candidates {
            if candidate.decision != Decision::Accepted {
                continue;
            }

            let confidence = candidate.detection.clamped_confidence();
            let mut record = classifier.create_record(
                NewReport {
                    street: street.to_string(),
                    description: candidate.detection.description,
                    location: Some(candidate.location),
                    severity: candidate.detection.severity,
                    photo_url: photo_url.map(ToString::to_string),
                },
                now,
            )?;
            record.detection_confidence = Some(confidence);
            records.push(record);
        }

        log::info!("Committed {} confirmed detection(s)", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use baches_report_models::{QualitativeDistance, QualitativePosition, Severity};

    use super::*;

    const BASE: Coordinate = Coordinate::new(16.3219, -96.5958);

    fn detection(position: QualitativePosition, distance: QualitativeDistance) -> Detection {
        Detection {
            severity: Severity::High,
            position,
            distance,
            confidence: 0.75,
            description: format!("{position} {distance}"),
        }
    }

    fn three_candidates() -> CandidateSet {
        propose(
            BASE,
            0.0,
            vec![
                detection(QualitativePosition::Left, QualitativeDistance::Near),
                detection(QualitativePosition::Right, QualitativeDistance::Far),
                detection(QualitativePosition::Down, QualitativeDistance::Medium),
            ],
            &ZoneClassifier::default(),
        )
        .unwrap()
    }

    #[test]
    fn detections_are_estimated_from_the_same_base() {
        let set = three_candidates();
        for candidate in set.candidates() {
            let expected = baches_geography::estimate(
                BASE,
                candidate.detection.position,
                candidate.detection.distance,
                0.0,
            );
            assert_eq!(candidate.location, expected);
            assert_eq!(candidate.zone, Zone::Center);
            assert_eq!(candidate.decision, Decision::Undecided);
        }
    }

    #[test]
    fn nothing_is_committed_without_confirmation() {
        let records = three_candidates()
            .commit("Calle Guerrero", None, Utc::now())
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn only_accepted_candidates_become_reports() {
        let mut set = three_candidates();
        set.accept(0).unwrap();
        set.discard(1).unwrap();
        set.accept(2).unwrap();
        assert_eq!(set.undecided_count(), 0);

        let expected_locations = [set.candidates()[0].location, set.candidates()[2].location];
        let records = set
            .commit("Calle Guerrero", Some("https://example.invalid/1.jpg"), Utc::now())
            .unwrap();

        assert_eq!(records.len(), 2);
        for (record, location) in records.iter().zip(expected_locations) {
            assert_eq!(record.location, location);
            assert!(record.auto_detected());
            assert_eq!(record.detection_confidence, Some(0.75));
            assert_eq!(record.severity, Severity::High);
            assert_eq!(
                record.photo_url.as_deref(),
                Some("https://example.invalid/1.jpg")
            );
            assert!(ZoneClassifier::default().is_consistent(record));
        }
    }

    #[test]
    fn later_decisions_override_earlier_ones() {
        let mut set = three_candidates();
        set.accept(1).unwrap();
        set.discard(1).unwrap();
        assert!(set.commit("Calle Guerrero", None, Utc::now()).unwrap().is_empty());
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let mut set = three_candidates();
        assert!(matches!(
            set.accept(3),
            Err(DetectionError::NoSuchCandidate { index: 3, len: 3 })
        ));
    }

    #[test]
    fn blank_street_fails_commit() {
        let mut set = three_candidates();
        set.accept(0).unwrap();
        assert!(matches!(
            set.commit(" ", None, Utc::now()),
            Err(DetectionError::Report(_))
        ));
    }

    #[test]
    fn polar_base_is_rejected() {
        let result = propose(
            Coordinate::new(-90.0, 0.0),
            0.0,
            vec![detection(
                QualitativePosition::Center,
                QualitativeDistance::Near,
            )],
            &ZoneClassifier::default(),
        );
        assert!(matches!(result, Err(DetectionError::Estimate(_))));
    }

    #[test]
    fn empty_inference_yields_empty_set() {
        let set = propose(BASE, 0.0, Vec::new(), &ZoneClassifier::default()).unwrap();
        assert!(set.is_empty());
    }
}
