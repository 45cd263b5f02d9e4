#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Photo detections to candidate reports.
//!
//! An image-inference service looks at one photo and proposes zero or more
//! potholes, each described qualitatively ("left, far, high severity").
//! [`candidates::propose`] places every detection on the map relative to
//! the coordinate where the photo was taken and zones it. The result is a
//! [`CandidateSet`] the reporter walks through item by item; only
//! candidates explicitly accepted there ever become [`ReportRecord`]s.
//!
//! The inference service itself sits behind [`DetectionProvider`].
//! [`parse::parse_inference_response`] converts the model's JSON answer
//! into [`Detection`]s for providers that talk to a multimodal LLM.
//!
//! [`ReportRecord`]: baches_report_models::ReportRecord

pub mod candidates;
pub mod parse;

pub use candidates::{Candidate, CandidateSet, Decision, propose};
pub use parse::parse_inference_response;

use baches_geography::zone::ZoneClassifier;
use baches_report_models::{Coordinate, Detection};
use thiserror::Error;

/// Errors that can occur in the detection pipeline.
#[derive(Debug, Error)]
pub enum DetectionError {
    /// The inference response was not valid JSON of a known shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A candidate index was out of range.
    #[error("No candidate at index {index} (set has {len})")]
    NoSuchCandidate {
        /// The requested index.
        index: usize,
        /// Number of candidates in the set.
        len: usize,
    },

    /// The photo's base coordinate could not be used for estimation.
    #[error("Estimation error: {0}")]
    Estimate(#[from] baches_geography::EstimateError),

    /// An accepted candidate could not be turned into a report.
    #[error("Report error: {0}")]
    Report(#[from] baches_report_models::ReportError),

    /// The inference provider failed.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },
}

/// An image-inference backend that finds potholes in a photo.
#[async_trait::async_trait]
pub trait DetectionProvider: Send + Sync {
    /// Returns the potholes visible in `photo` (encoded image bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DetectionError`] if the request or response parsing fails.
    async fn detect(&self, photo: &[u8]) -> Result<Vec<Detection>, DetectionError>;
}

/// Runs `provider` on `photo` and proposes the detections as candidates
/// around `base`.
///
/// # Errors
///
/// Returns an error if inference fails or `base` is unusable for
/// estimation.
pub async fn detect_and_propose(
    provider: &dyn DetectionProvider,
    photo: &[u8],
    base: Coordinate,
    heading_deg: f64,
    classifier: &ZoneClassifier,
) -> Result<CandidateSet, DetectionError> {
    let detections = provider.detect(photo).await?;
    log::info!(
        "Inference returned {} detection(s) for a {}-byte photo",
        detections.len(),
        photo.len()
    );
    propose(base, heading_deg, detections, classifier)
}
