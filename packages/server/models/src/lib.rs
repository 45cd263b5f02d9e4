#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the baches report server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the report model so the API contract can evolve independently.
//! List and lookup responses keep the `{success, count, data}` envelope
//! that existing clients of the municipal API expect.

use baches_report_models::{Coordinate, Detection, ReportRecord, Zone};
use serde::{Deserialize, Serialize};

/// A report as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReport {
    /// The stored report.
    #[serde(flatten)]
    pub report: ReportRecord,
    /// Whether the report came from photo inference.
    pub auto_detected: bool,
}

impl From<ReportRecord> for ApiReport {
    fn from(report: ReportRecord) -> Self {
        Self {
            auto_detected: report.auto_detected(),
            report,
        }
    }
}

/// Envelope for list responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiList<T> {
    /// Always `true` for successful responses.
    pub success: bool,
    /// Number of items in `data`.
    pub count: usize,
    /// The items.
    pub data: Vec<T>,
}

impl<T> ApiList<T> {
    /// Wraps `data` in a successful envelope.
    #[must_use]
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

/// Envelope for the reports-in-zone response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiZoneList {
    /// Always `true` for successful responses.
    pub success: bool,
    /// The requested zone.
    pub zone: Zone,
    /// Number of reports.
    pub count: usize,
    /// Reports in the zone, newest first.
    pub data: Vec<ApiReport>,
}

/// Envelope for single-object responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiData<T> {
    /// Always `true` for successful responses.
    pub success: bool,
    /// The payload.
    pub data: T,
}

impl<T> ApiData<T> {
    /// Wraps `data` in a successful envelope.
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Error or acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMessage {
    /// Whether the request succeeded.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
}

impl ApiMessage {
    /// A failure message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Name of the configured municipality.
    pub municipality: String,
}

/// Query parameters for the report list endpoint.
///
/// Labels are matched leniently (`"Norte"`, `"north"` and `"NORTH"` all
/// select the same zone).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQueryParams {
    /// Zone label.
    #[serde(alias = "zona")]
    pub zone: Option<String>,
    /// Severity label.
    #[serde(alias = "severidad")]
    pub severity: Option<String>,
    /// Status label.
    #[serde(alias = "estado")]
    pub status: Option<String>,
    /// Start date (ISO 8601).
    pub from: Option<String>,
    /// End date (ISO 8601).
    pub to: Option<String>,
}

/// Body of the classify endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassifyRequest {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// Response of the classify endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyResponse {
    /// The zone.
    pub zone: Zone,
    /// Spanish zone label shown in the app.
    pub legacy_label: String,
}

/// Detections for one photo, either already structured or as the raw
/// model answer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionInput {
    /// Structured detections.
    #[serde(default)]
    pub detections: Option<Vec<Detection>>,
    /// Raw multimodal-model answer to parse.
    #[serde(default)]
    pub inference_response: Option<String>,
}

/// Body of the propose endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeRequest {
    /// Where the photo was taken.
    pub base: Coordinate,
    /// Camera heading in degrees clockwise from north.
    #[serde(default)]
    pub heading: Option<f64>,
    /// The detections.
    #[serde(flatten)]
    pub input: DetectionInput,
}

/// Body of the confirm endpoint: the same photo input as
/// [`ProposeRequest`] plus the reporter's per-item verdicts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    /// Where the photo was taken.
    pub base: Coordinate,
    /// Camera heading in degrees clockwise from north.
    #[serde(default)]
    pub heading: Option<f64>,
    /// The detections.
    #[serde(flatten)]
    pub input: DetectionInput,
    /// Indices of the candidates the reporter accepted.
    pub accepted: Vec<usize>,
    /// Street or landmark for the resulting reports.
    pub street: String,
    /// URL of the uploaded photo, if any.
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// Body of the municipal status webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusWebhookRequest {
    /// Report id.
    #[serde(alias = "reporteId")]
    pub report_id: Option<String>,
    /// New status label.
    #[serde(alias = "nuevoEstado")]
    pub new_status: Option<String>,
}

/// Response of the municipal status webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusWebhookResponse {
    /// Always `true` for successful responses.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
    /// Report id.
    pub report_id: String,
    /// The status that was applied.
    pub new_status: String,
}
