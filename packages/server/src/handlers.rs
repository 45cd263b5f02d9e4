//! HTTP handler functions for the report API.

use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, web};
use baches_analytics::{parse_date, summary, to_geojson, weekly_summary};
use baches_analytics_models::ReportFilter;
use baches_detection::{
    CandidateSet, DetectionError, parse_inference_response, propose as propose_candidates,
};
use baches_report_models::{
    Coordinate, Detection, NewReport, ReportRecord, ReportStatus, Severity, Zone,
};
use baches_server_models::{
    ApiData, ApiHealth, ApiList, ApiMessage, ApiReport, ApiZoneList, ClassifyRequest,
    ClassifyResponse, ConfirmRequest, DetectionInput, ProposeRequest, ReportQueryParams,
    StatusWebhookRequest, StatusWebhookResponse,
};
use baches_store::StoreError;
use chrono::Utc;
use uuid::Uuid;

use crate::{API_KEY_HEADER, AppState, MUNICIPAL_ACTOR};

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        municipality: state.municipality.name.clone(),
    })
}

/// `GET /api/reports`
///
/// Lists reports filtered by zone, severity, status and creation date,
/// newest first.
pub async fn list_reports(
    state: web::Data<AppState>,
    params: web::Query<ReportQueryParams>,
) -> HttpResponse {
    let filter = match parse_filter(&params) {
        Ok(filter) => filter,
        Err(message) => return bad_request(message),
    };

    match state.store.list(&filter).await {
        Ok(reports) => HttpResponse::Ok().json(ApiList::new(api_reports(reports))),
        Err(e) => store_error(&e),
    }
}

/// `POST /api/reports`
///
/// Validates and zones a submitted report, then stores it.
pub async fn create_report(
    state: web::Data<AppState>,
    body: web::Json<NewReport>,
) -> HttpResponse {
    let record = match state
        .classifier
        .create_record(body.into_inner(), Utc::now())
    {
        Ok(record) => record,
        Err(e) => {
            log::warn!("Rejected report submission: {e}");
            return bad_request(e.to_string());
        }
    };

    match state.store.insert(record).await {
        Ok(record) => HttpResponse::Created().json(ApiData::new(ApiReport::from(record))),
        Err(e) => store_error(&e),
    }
}

/// `GET /api/reports/{id}`
pub async fn get_report(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let Ok(id) = Uuid::parse_str(&path) else {
        return bad_request(format!("Invalid report id '{path}'"));
    };

    match state.store.get(id).await {
        Ok(record) => HttpResponse::Ok().json(ApiData::new(ApiReport::from(record))),
        Err(e) => store_error(&e),
    }
}

/// `GET /api/stats`
///
/// Totals by severity, zone and status.
pub async fn stats(state: web::Data<AppState>) -> HttpResponse {
    match state.store.all().await {
        Ok(reports) => HttpResponse::Ok().json(ApiData::new(summary(&reports, Utc::now()))),
        Err(e) => store_error(&e),
    }
}

/// `GET /api/stats/zones`
pub async fn zone_stats(state: web::Data<AppState>) -> HttpResponse {
    match state.store.all().await {
        Ok(reports) => {
            HttpResponse::Ok().json(ApiData::new(baches_analytics::zone_stats(&reports)))
        }
        Err(e) => store_error(&e),
    }
}

/// `GET /api/stats/weekly`
///
/// Summary of the reports created in the last seven days.
pub async fn weekly_stats(state: web::Data<AppState>) -> HttpResponse {
    match state.store.all().await {
        Ok(reports) => {
            HttpResponse::Ok().json(ApiData::new(weekly_summary(&reports, Utc::now())))
        }
        Err(e) => store_error(&e),
    }
}

/// `GET /api/geojson`
///
/// Every report as a `GeoJSON` `FeatureCollection` for the map layer.
pub async fn geojson(state: web::Data<AppState>) -> HttpResponse {
    let reports = match state.store.all().await {
        Ok(reports) => reports,
        Err(e) => return store_error(&e),
    };

    match serde_json::to_string(&to_geojson(&reports)) {
        Ok(body) => HttpResponse::Ok()
            .content_type("application/geo+json")
            .body(body),
        Err(e) => {
            log::error!("Failed to serialize GeoJSON: {e}");
            internal_error()
        }
    }
}

/// `GET /api/zones/{zone}`
pub async fn zone_reports(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let zone = match Zone::from_label(&path) {
        Ok(zone) => zone,
        Err(e) => return bad_request(e.to_string()),
    };

    let filter = ReportFilter {
        zone: Some(zone),
        ..ReportFilter::default()
    };

    match state.store.list(&filter).await {
        Ok(reports) => {
            let data = api_reports(reports);
            HttpResponse::Ok().json(ApiZoneList {
                success: true,
                zone,
                count: data.len(),
                data,
            })
        }
        Err(e) => store_error(&e),
    }
}

/// `POST /api/classify`
pub async fn classify(
    state: web::Data<AppState>,
    body: web::Json<ClassifyRequest>,
) -> HttpResponse {
    let point = match Coordinate::new(body.lat, body.lng).validated() {
        Ok(point) => point,
        Err(e) => return bad_request(e.to_string()),
    };

    let zone = state.classifier.classify(point);
    HttpResponse::Ok().json(ApiData::new(ClassifyResponse {
        zone,
        legacy_label: zone.legacy_label().to_string(),
    }))
}

/// `POST /api/detections/propose`
///
/// Places the detections for one photo on the map. Nothing is stored.
pub async fn propose(
    state: web::Data<AppState>,
    body: web::Json<ProposeRequest>,
) -> HttpResponse {
    let body = body.into_inner();
    match candidates(&state, body.base, body.heading, body.input) {
        Ok(set) => HttpResponse::Ok().json(ApiData::new(set)),
        Err(e) => detection_error(&e),
    }
}

/// `POST /api/detections/confirm`
///
/// Stores the candidates the reporter accepted. The candidate set is
/// rebuilt from the same input as the proposal, so indices refer to the
/// order the candidates were proposed in.
pub async fn confirm(
    state: web::Data<AppState>,
    body: web::Json<ConfirmRequest>,
) -> HttpResponse {
    let body = body.into_inner();

    let mut set = match candidates(&state, body.base, body.heading, body.input) {
        Ok(set) => set,
        Err(e) => return detection_error(&e),
    };
    for index in &body.accepted {
        if let Err(e) = set.accept(*index) {
            return detection_error(&e);
        }
    }

    let records = match set.commit(&body.street, body.photo_url.as_deref(), Utc::now()) {
        Ok(records) => records,
        Err(e) => return detection_error(&e),
    };

    let mut stored = Vec::with_capacity(records.len());
    for record in records {
        match state.store.insert(record).await {
            Ok(record) => stored.push(ApiReport::from(record)),
            Err(e) => return store_error(&e),
        }
    }

    HttpResponse::Created().json(ApiList::new(stored))
}

/// `POST /api/webhook/status`
///
/// Called by the municipal system to move a report through its repair
/// workflow. When an API key is configured, the `x-api-key` header must
/// match it.
pub async fn status_webhook(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<StatusWebhookRequest>,
) -> HttpResponse {
    if let Some(expected) = &state.api_key {
        let provided = req
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            log::warn!("Rejected status webhook call with a missing or wrong API key");
            return HttpResponse::Unauthorized().json(ApiMessage::error("Unauthorized"));
        }
    }

    let (Some(report_id), Some(new_status)) =
        (body.report_id.as_deref(), body.new_status.as_deref())
    else {
        return bad_request("reportId and newStatus are required");
    };

    let Ok(id) = Uuid::parse_str(report_id) else {
        return bad_request(format!("Invalid report id '{report_id}'"));
    };
    let status = match ReportStatus::from_label(new_status) {
        Ok(status) => status,
        Err(e) => return bad_request(e.to_string()),
    };

    match state
        .store
        .update_status(id, status, Some(MUNICIPAL_ACTOR))
        .await
    {
        Ok(record) => HttpResponse::Ok().json(StatusWebhookResponse {
            success: true,
            message: "Status updated".to_string(),
            report_id: record.id.to_string(),
            new_status: record.status.to_string(),
        }),
        Err(e) => store_error(&e),
    }
}

/// Any other method on `/api/webhook/status`.
pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(ApiMessage::error("Method not allowed"))
}

/// Fallback for unknown routes.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(ApiMessage::error(format!("No route for {}", req.path())))
}

/// Answers malformed JSON bodies with a 400 in the API's error shape.
pub fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = bad_request(format!("Invalid request body: {err}"));
    InternalError::from_response(err, response).into()
}

/// Answers malformed query strings with a 400 in the API's error shape.
pub fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = bad_request(format!("Invalid query: {err}"));
    InternalError::from_response(err, response).into()
}

fn parse_filter(params: &ReportQueryParams) -> Result<ReportFilter, String> {
    fn non_empty(value: Option<&String>) -> Option<&str> {
        value.map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    Ok(ReportFilter {
        zone: non_empty(params.zone.as_ref())
            .map(Zone::from_label)
            .transpose()
            .map_err(|e| e.to_string())?,
        severity: non_empty(params.severity.as_ref())
            .map(Severity::from_label)
            .transpose()
            .map_err(|e| e.to_string())?,
        status: non_empty(params.status.as_ref())
            .map(ReportStatus::from_label)
            .transpose()
            .map_err(|e| e.to_string())?,
        from: non_empty(params.from.as_ref())
            .map(parse_date)
            .transpose()
            .map_err(|e| e.to_string())?,
        to: non_empty(params.to.as_ref())
            .map(parse_date)
            .transpose()
            .map_err(|e| e.to_string())?,
    })
}

fn candidates(
    state: &AppState,
    base: Coordinate,
    heading: Option<f64>,
    input: DetectionInput,
) -> Result<CandidateSet, DetectionError> {
    let detections: Vec<Detection> = match (input.detections, input.inference_response) {
        (Some(detections), _) => detections,
        (None, Some(text)) => parse_inference_response(&text)?,
        (None, None) => Vec::new(),
    };
    propose_candidates(base, heading.unwrap_or(0.0), detections, &state.classifier)
}

fn api_reports(reports: Vec<ReportRecord>) -> Vec<ApiReport> {
    reports.into_iter().map(ApiReport::from).collect()
}

fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiMessage::error(message))
}

fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiMessage::error("Internal server error"))
}

fn store_error(e: &StoreError) -> HttpResponse {
    match e {
        StoreError::NotFound { .. } => {
            HttpResponse::NotFound().json(ApiMessage::error(e.to_string()))
        }
        StoreError::Rejected { .. } => {
            log::warn!("Store rejected write: {e}");
            HttpResponse::Conflict().json(ApiMessage::error(e.to_string()))
        }
    }
}

fn detection_error(e: &DetectionError) -> HttpResponse {
    match e {
        DetectionError::Provider { .. } => {
            log::error!("Detection provider failed: {e}");
            HttpResponse::BadGateway().json(ApiMessage::error(e.to_string()))
        }
        DetectionError::Json(_)
        | DetectionError::NoSuchCandidate { .. }
        | DetectionError::Estimate(_)
        | DetectionError::Report(_) => bad_request(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::test;
    use baches_geography::Municipality;
    use baches_store::InMemoryReportStore;
    use serde_json::{Value, json};

    use crate::{AppState, build_app};

    fn state(api_key: Option<&str>) -> actix_web::web::Data<AppState> {
        actix_web::web::Data::new(AppState::new(
            Arc::new(InMemoryReportStore::new()),
            Municipality::default(),
            api_key.map(ToString::to_string),
        ))
    }

    fn new_report(lat: f64, lng: f64, severity: &str) -> Value {
        json!({
            "street": "Calle Guerrero",
            "description": "Bache profundo",
            "location": {"lat": lat, "lng": lng},
            "severity": severity,
        })
    }

    #[actix_web::test]
    async fn health_reports_version_and_municipality() {
        let app = test::init_service(build_app(state(None))).await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(body["municipality"], "Miahuatlán de Porfirio Díaz");
    }

    #[actix_web::test]
    async fn created_reports_are_zoned_and_listed() {
        let app = test::init_service(build_app(state(None))).await;

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(new_report(16.3350, -96.5958, "HIGH"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["data"]["zone"], "NORTH");
        assert_eq!(created["data"]["status"], "PENDING");
        assert_eq!(created["data"]["autoDetected"], false);

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(new_report(16.3219, -96.5958, "LOW"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri("/api/reports?zona=Norte")
            .to_request();
        let list: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list["success"], true);
        assert_eq!(list["count"], 1);
        assert_eq!(list["data"][0]["severity"], "HIGH");

        let id = created["data"]["id"].as_str().unwrap();
        let req = test::TestRequest::get()
            .uri(&format!("/api/reports/{id}"))
            .to_request();
        let fetched: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched["data"]["street"], "Calle Guerrero");
    }

    #[actix_web::test]
    async fn invalid_reports_are_rejected() {
        let app = test::init_service(build_app(state(None))).await;

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(json!({"street": "  ", "location": {"lat": 16.3, "lng": -96.6}}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(json!({"street": "Calle Reforma"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(new_report(120.0, -96.6, "LOW"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn unknown_ids_and_zones() {
        let app = test::init_service(build_app(state(None))).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/reports/{}", uuid::Uuid::new_v4()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/api/zones/Atlantida").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/api/zones/Centro").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["zone"], "CENTER");
        assert_eq!(body["count"], 0);

        let req = test::TestRequest::get().uri("/api/nowhere").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn classify_uses_the_reference_point() {
        let app = test::init_service(build_app(state(None))).await;

        let req = test::TestRequest::post()
            .uri("/api/classify")
            .set_json(json!({"lat": 16.3219, "lng": -96.5758}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["zone"], "EAST");
        assert_eq!(body["data"]["legacyLabel"], "Este");
    }

    #[actix_web::test]
    async fn proposals_are_never_stored() {
        let app = test::init_service(build_app(state(None))).await;

        let req = test::TestRequest::post()
            .uri("/api/detections/propose")
            .set_json(json!({
                "base": {"lat": 16.3219, "lng": -96.5958},
                "inferenceResponse": r#"{"detections":[{"severity":"alta","position":"left","distance":"far","confidence":0.9}]}"#,
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["candidates"][0]["decision"], "UNDECIDED");
        assert_eq!(body["data"]["candidates"][0]["zone"], "CENTER");

        let req = test::TestRequest::get().uri("/api/stats").to_request();
        let stats: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stats["data"]["total"], 0);
    }

    #[actix_web::test]
    async fn confirm_stores_only_accepted_candidates() {
        let app = test::init_service(build_app(state(None))).await;
        let detections = json!([
            {"severity": "HIGH", "position": "LEFT", "distance": "NEAR", "confidence": 0.8, "description": "a"},
            {"severity": "LOW", "position": "RIGHT", "distance": "FAR", "confidence": 0.4, "description": "b"},
        ]);

        let req = test::TestRequest::post()
            .uri("/api/detections/confirm")
            .set_json(json!({
                "base": {"lat": 16.3219, "lng": -96.5958},
                "heading": 90.0,
                "detections": detections,
                "accepted": [1],
                "street": "Avenida Juárez",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["severity"], "LOW");
        assert_eq!(body["data"][0]["autoDetected"], true);
        assert_eq!(body["data"][0]["detectionConfidence"], 0.4);

        let req = test::TestRequest::post()
            .uri("/api/detections/confirm")
            .set_json(json!({
                "base": {"lat": 16.3219, "lng": -96.5958},
                "detections": detections,
                "accepted": [5],
                "street": "Avenida Juárez",
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/api/stats").to_request();
        let stats: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stats["data"]["total"], 1);
    }

    #[actix_web::test]
    async fn webhook_requires_key_and_updates_status() {
        let app = test::init_service(build_app(state(Some("secret")))).await;

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(new_report(16.30, -96.5958, "MEDIUM"))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/webhook/status")
            .set_json(json!({"reportId": id, "newStatus": "resuelto"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/webhook/status")
            .insert_header(("x-api-key", "secret"))
            .set_json(json!({"reportId": id}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/webhook/status")
            .insert_header(("x-api-key", "secret"))
            .set_json(json!({
                "reporteId": uuid::Uuid::new_v4().to_string(),
                "nuevoEstado": "resuelto",
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri("/api/webhook/status")
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );

        let req = test::TestRequest::post()
            .uri("/api/webhook/status")
            .insert_header(("x-api-key", "secret"))
            .set_json(json!({"reportId": id, "newStatus": "en_revision"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["newStatus"], "UNDER_REVIEW");

        let req = test::TestRequest::get()
            .uri(&format!("/api/reports/{id}"))
            .to_request();
        let fetched: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched["data"]["status"], "UNDER_REVIEW");
        assert_eq!(fetched["data"]["updatedBy"], "municipal_system");
    }

    #[actix_web::test]
    async fn geojson_is_served_with_geo_content_type() {
        let app = test::init_service(build_app(state(None))).await;
        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(new_report(16.3219, -96.5958, "MEDIUM"))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/api/geojson").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(
            resp.headers().get("content-type").unwrap().to_str().unwrap(),
            "application/geo+json"
        );
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["type"], "FeatureCollection");
        assert_eq!(body["features"].as_array().unwrap().len(), 1);
    }
}
