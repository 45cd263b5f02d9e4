#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Road-damage report types shared across the baches workspace.
//!
//! Defines the closed vocabularies (zones, severities, statuses and the
//! qualitative position/distance labels produced by photo inference) plus
//! the [`ReportRecord`] entity that the classifier, the detection pipeline,
//! the analytics and the API all operate over.
//!
//! Every vocabulary serializes as `SCREAMING_SNAKE_CASE`. The `from_label`
//! constructors additionally accept the lowercase Spanish labels that
//! historical reports were stored with (`"alta"`, `"Norte"`,
//! `"en_revision"`, ...).

mod record;

pub use record::{NewReport, ReportRecord};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Errors raised while building or validating report data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReportError {
    /// The street/location text was empty.
    #[error("Report is missing the street or location description")]
    MissingStreet,

    /// No coordinate was captured for the report.
    #[error("Report is missing a coordinate")]
    MissingLocation,

    /// The coordinate is outside the WGS84 range or not finite.
    #[error("Invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate {
        /// Latitude that was provided.
        lat: f64,
        /// Longitude that was provided.
        lng: f64,
    },

    /// A label did not match any variant of a closed vocabulary.
    #[error("Unknown {kind} label: {label:?}")]
    UnknownLabel {
        /// Which vocabulary was being parsed (e.g. "zone").
        kind: &'static str,
        /// The label as received.
        label: String,
    },
}

/// A geographic position in decimal degrees (WGS84, no altitude).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lng: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are finite and inside the WGS84 range.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat.abs() <= 90.0
            && self.lng.abs() <= 180.0
    }

    /// Returns this coordinate, or [`ReportError::InvalidCoordinate`] if
    /// [`Self::is_valid`] is false.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate is not finite or out of range.
    pub fn validated(self) -> Result<Self, ReportError> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(ReportError::InvalidCoordinate {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(value: Coordinate) -> Self {
        Self::new(value.lng, value.lat)
    }
}

impl From<geo::Point<f64>> for Coordinate {
    fn from(value: geo::Point<f64>) -> Self {
        Self::new(value.y(), value.x())
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// Named region of the municipality, relative to its reference point.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    /// Inside the small box around the reference point.
    Center,
    /// More than the band width north of the reference point.
    North,
    /// More than the band width south of the reference point.
    South,
    /// More than the band width east of the reference point.
    East,
    /// More than the band width west of the reference point.
    West,
    /// Everything between the center box and the directional bands.
    Periphery,
}

impl Zone {
    /// Returns all variants in display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Center,
            Self::North,
            Self::South,
            Self::East,
            Self::West,
            Self::Periphery,
        ]
    }

    /// Spanish label shown in the citizen app and stored on historical reports.
    #[must_use]
    pub const fn legacy_label(self) -> &'static str {
        match self {
            Self::Center => "Centro",
            Self::North => "Norte",
            Self::South => "Sur",
            Self::East => "Este",
            Self::West => "Oeste",
            Self::Periphery => "Periferia",
        }
    }

    /// Parses a zone from its canonical or legacy label, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::UnknownLabel`] if the label names no zone.
    pub fn from_label(label: &str) -> Result<Self, ReportError> {
        let normalized = normalize_label(label);
        Self::all()
            .iter()
            .copied()
            .find(|zone| {
                normalized == normalize_label(zone.as_ref())
                    || normalized == normalize_label(zone.legacy_label())
            })
            .ok_or_else(|| ReportError::UnknownLabel {
                kind: "zone",
                label: label.to_string(),
            })
    }
}

/// How urgent a pothole is to repair.
///
/// Ordered by increasing urgency, so `Severity::High > Severity::Low`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Cosmetic damage.
    Low,
    /// Noticeable damage; default for new reports.
    #[default]
    Medium,
    /// Dangerous damage that needs immediate attention.
    High,
}

impl Severity {
    /// Returns all variants, least urgent first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High]
    }

    /// Parses a severity from English or Spanish labels, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::UnknownLabel`] if the label names no severity.
    pub fn from_label(label: &str) -> Result<Self, ReportError> {
        match normalize_label(label).as_str() {
            "low" | "baja" | "bajo" | "leve" => Ok(Self::Low),
            "medium" | "media" | "medio" | "moderate" | "moderada" => Ok(Self::Medium),
            "high" | "alta" | "alto" | "grave" | "severe" => Ok(Self::High),
            _ => Err(ReportError::UnknownLabel {
                kind: "severity",
                label: label.to_string(),
            }),
        }
    }
}

/// Moderation state of a report. The only field mutated after creation.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    /// Submitted, not yet looked at.
    #[default]
    Pending,
    /// Picked up by the municipality.
    UnderReview,
    /// Repaired or otherwise closed.
    Resolved,
}

impl ReportStatus {
    /// Returns all variants in workflow order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Pending, Self::UnderReview, Self::Resolved]
    }

    /// Parses a status from English or Spanish labels, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::UnknownLabel`] if the label names no status.
    pub fn from_label(label: &str) -> Result<Self, ReportError> {
        match normalize_label(label).as_str() {
            "pending" | "pendiente" => Ok(Self::Pending),
            "under_review" | "en_revision" | "review" => Ok(Self::UnderReview),
            "resolved" | "resuelto" => Ok(Self::Resolved),
            _ => Err(ReportError::UnknownLabel {
                kind: "status",
                label: label.to_string(),
            }),
        }
    }
}

/// Where in the photo a detected pothole sits, relative to the camera.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum QualitativePosition {
    /// Straight ahead. Fallback for unrecognized labels.
    #[default]
    Center,
    /// Ahead and to the left.
    Left,
    /// Ahead and to the right.
    Right,
    /// Top of the frame. Maps to the same bearing as [`Self::Center`].
    Up,
    /// Bottom of the frame, read as behind the camera.
    Down,
}

impl QualitativePosition {
    /// Returns all variants.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Center, Self::Left, Self::Right, Self::Up, Self::Down]
    }

    /// Parses an English or Spanish position label.
    ///
    /// Unrecognized labels fall back to [`Self::Center`] with a warning.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "center" | "centre" | "centro" => Self::Center,
            "left" | "izquierda" => Self::Left,
            "right" | "derecha" => Self::Right,
            "up" | "top" | "arriba" => Self::Up,
            "down" | "bottom" | "abajo" => Self::Down,
            _ => {
                log::warn!("Unrecognized position label {label:?}, using CENTER");
                Self::Center
            }
        }
    }
}

/// Rough distance between the camera and a detected pothole.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum QualitativeDistance {
    /// A few meters away. Fallback for unrecognized labels.
    #[default]
    Near,
    /// Around ten meters away.
    Medium,
    /// Around twenty meters away.
    Far,
}

impl QualitativeDistance {
    /// Returns all variants, nearest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Near, Self::Medium, Self::Far]
    }

    /// Parses an English or Spanish distance label.
    ///
    /// Unrecognized labels fall back to [`Self::Near`] with a warning.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "near" | "close" | "cerca" | "cercano" => Self::Near,
            "medium" | "mid" | "medio" | "media" | "intermedio" => Self::Medium,
            "far" | "lejos" | "lejano" => Self::Far,
            _ => {
                log::warn!("Unrecognized distance label {label:?}, using NEAR");
                Self::Near
            }
        }
    }
}

/// One pothole proposed by the image-inference service for a photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    /// Estimated severity.
    pub severity: Severity,
    /// Position in the frame relative to the camera.
    pub position: QualitativePosition,
    /// Distance from the camera.
    pub distance: QualitativeDistance,
    /// Model confidence in `[0, 1]`.
    pub confidence: f64,
    /// Free-text description from the model.
    #[serde(default)]
    pub description: String,
}

impl Detection {
    /// Confidence clamped into `[0, 1]`. Non-finite values become `0`.
    #[must_use]
    pub fn clamped_confidence(&self) -> f64 {
        if self.confidence.is_finite() {
            self.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Lowercases, trims, and folds separators and Spanish accents so that
/// `"En revisión"`, `"en-revision"` and `"EN_REVISION"` compare equal.
fn normalize_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            'á' | 'Á' => 'a',
            'é' | 'É' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'Ó' => 'o',
            'ú' | 'Ú' => 'u',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}
