//! Parsing of multimodal-model answers into [`Detection`]s.
//!
//! The model is prompted to answer with JSON, but in practice it may wrap
//! the payload in a Markdown code fence, answer in Spanish field names,
//! return a bare array instead of an object, or use labels outside the
//! closed vocabularies. Unknown labels map to the documented defaults
//! (`CENTER` position, `NEAR` distance, `MEDIUM` severity).

use baches_report_models::{Detection, QualitativeDistance, QualitativePosition, Severity};
use serde::Deserialize;

use crate::DetectionError;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawResponse {
    Wrapped {
        #[serde(alias = "detecciones", alias = "potholes", alias = "baches")]
        detections: Vec<RawDetection>,
    },
    Bare(Vec<RawDetection>),
}

#[derive(Deserialize)]
struct RawDetection {
    #[serde(default, alias = "severidad")]
    severity: Option<String>,
    #[serde(default, alias = "posicion", alias = "posición")]
    position: Option<String>,
    #[serde(default, alias = "distancia")]
    distance: Option<String>,
    #[serde(default, alias = "confianza")]
    confidence: Option<f64>,
    #[serde(default, alias = "descripcion", alias = "descripción")]
    description: Option<String>,
}

impl From<RawDetection> for Detection {
    fn from(raw: RawDetection) -> Self {
        let severity = raw.severity.as_deref().map_or(Severity::Medium, |label| {
            Severity::from_label(label).unwrap_or_else(|e| {
                log::warn!("{e}, using MEDIUM");
                Severity::Medium
            })
        });

        Self {
            severity,
            position: raw
                .position
                .as_deref()
                .map_or(QualitativePosition::Center, QualitativePosition::from_label),
            distance: raw
                .distance
                .as_deref()
                .map_or(QualitativeDistance::Near, QualitativeDistance::from_label),
            confidence: raw
                .confidence
                .filter(|c| c.is_finite())
                .map_or(0.0, |c| c.clamp(0.0, 1.0)),
            description: raw.description.unwrap_or_default().trim().to_string(),
        }
    }
}

/// Parses a model answer into detections.
///
/// Accepts `{"detections": [...]}` or a bare `[...]`, optionally inside a
/// Markdown code fence. Confidence is clamped into `[0, 1]`; a missing
/// confidence is `0`.
///
/// # Errors
///
/// Returns [`DetectionError::Json`] if the payload is not JSON of either
/// shape.
pub fn parse_inference_response(text: &str) -> Result<Vec<Detection>, DetectionError> {
    let payload = strip_code_fence(text);
    let raw: RawResponse = serde_json::from_str(payload)?;

    let raw = match raw {
        RawResponse::Wrapped { detections } | RawResponse::Bare(detections) => detections,
    };

    Ok(raw.into_iter().map(Detection::from).collect())
}

/// Returns the body of a ```` ``` ```` / ```` ```json ```` fence, or the
/// trimmed input if it is not fenced.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") up to the end of the opening line.
    let body = rest
        .split_once('\n')
        .map_or_else(|| rest.trim_start_matches("json"), |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
