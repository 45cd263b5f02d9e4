//! `GeoJSON` export of reports for map layers and open-data consumers.

use baches_report_models::ReportRecord;
use geojson::{Feature, FeatureCollection, Geometry, feature::Id};
use serde_json::Value;

/// Builds a `FeatureCollection` with one `Point` feature per report.
///
/// Coordinates are `[lng, lat]` per RFC 7946. Feature properties mirror the
/// report fields in camelCase; `photoUrl` and `detectionConfidence` are
/// `null` when absent.
#[must_use]
pub fn to_geojson(reports: &[ReportRecord]) -> FeatureCollection {
    let features = reports.iter().map(report_feature).collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn report_feature(report: &ReportRecord) -> Feature {
    let point = geo::Point::from(report.location);

    let mut feature = Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(&point))),
        id: Some(Id::String(report.id.to_string())),
        properties: None,
        foreign_members: None,
    };

    feature.set_property("id", report.id.to_string());
    feature.set_property("street", report.street.clone());
    feature.set_property("description", report.description.clone());
    feature.set_property("severity", report.severity.to_string());
    feature.set_property("zone", report.zone.to_string());
    feature.set_property("createdAt", report.created_at.to_rfc3339());
    feature.set_property("status", report.status.to_string());
    feature.set_property(
        "photoUrl",
        report
            .photo_url
            .as_ref()
            .map_or(Value::Null, |url| Value::String(url.clone())),
    );
    feature.set_property("autoDetected", report.auto_detected());
    feature.set_property(
        "detectionConfidence",
        report.detection_confidence.map_or(Value::Null, Value::from),
    );

    feature
}
