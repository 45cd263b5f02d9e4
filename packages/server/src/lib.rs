#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for road-damage reports.
//!
//! Serves the REST API the citizen app and the municipal back office talk
//! to: report submission and lookup, zone statistics, a `GeoJSON` feed for
//! the map layer, the propose/confirm flow for photo detections and the
//! status webhook the municipal system calls when a repair moves forward.
//!
//! Reports are held in an [`InMemoryReportStore`], optionally seeded from a
//! JSON dump named by `BACHES_REPORTS`.

mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, middleware, web};
use baches_geography::{ConfigError, Municipality, ZoneClassifier};
use baches_report_models::{ReportError, ReportRecord};
use baches_store::{InMemoryReportStore, ReportStore};
use thiserror::Error;
use uuid::Uuid;

/// Environment variable naming the municipality TOML file.
pub const CONFIG_ENV: &str = "BACHES_CONFIG";

/// Environment variable naming a JSON file of reports to preload.
pub const REPORTS_ENV: &str = "BACHES_REPORTS";

/// Environment variable holding the key the municipal webhook must send.
pub const API_KEY_ENV: &str = "MUNICIPAL_API_KEY";

/// Header carrying the municipal webhook key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Actor recorded on status changes made through the webhook.
pub const MUNICIPAL_ACTOR: &str = "municipal_system";

/// Errors that can occur while starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The municipality configuration could not be resolved.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Binding or serving failed, or the seed file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The seed file is not a JSON array of reports.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A report in the seed file has an unusable location.
    #[error("Invalid report {id}: {source}")]
    InvalidReport {
        /// Id of the offending report.
        id: Uuid,
        /// Why it was rejected.
        source: ReportError,
    },
}

/// Shared application state.
pub struct AppState {
    /// Report persistence.
    pub store: Arc<dyn ReportStore>,
    /// The municipality reports belong to.
    pub municipality: Municipality,
    /// Classifier around the municipality's reference point.
    pub classifier: ZoneClassifier,
    /// Key the status webhook must present, if one is configured.
    pub api_key: Option<String>,
}

impl AppState {
    /// Creates the state for `municipality`.
    #[must_use]
    pub fn new(
        store: Arc<dyn ReportStore>,
        municipality: Municipality,
        api_key: Option<String>,
    ) -> Self {
        Self {
            store,
            classifier: municipality.classifier(),
            municipality,
            api_key,
        }
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handlers::json_error))
        .app_data(web::QueryConfig::default().error_handler(handlers::query_error))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::health))
                .route("/reports", web::get().to(handlers::list_reports))
                .route("/reports", web::post().to(handlers::create_report))
                .route("/reports/{id}", web::get().to(handlers::get_report))
                .route("/stats", web::get().to(handlers::stats))
                .route("/stats/zones", web::get().to(handlers::zone_stats))
                .route("/stats/weekly", web::get().to(handlers::weekly_stats))
                .route("/geojson", web::get().to(handlers::geojson))
                .route("/zones/{zone}", web::get().to(handlers::zone_reports))
                .route("/classify", web::post().to(handlers::classify))
                .route("/detections/propose", web::post().to(handlers::propose))
                .route("/detections/confirm", web::post().to(handlers::confirm))
                .service(
                    web::resource("/webhook/status")
                        .route(web::post().to(handlers::status_webhook))
                        .default_service(web::to(handlers::method_not_allowed)),
                ),
        );
}

/// Builds the application around `state`.
pub fn build_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(Cors::permissive())
        .wrap(middleware::Logger::default())
        .app_data(state)
        .configure(configure)
        .default_service(web::to(handlers::not_found))
}

/// Reads a JSON array of reports, re-zoning any record whose zone does not
/// match its location.
fn load_reports(
    path: &std::path::Path,
    classifier: &ZoneClassifier,
) -> Result<Vec<ReportRecord>, ServerError> {
    log::info!("Loading reports from {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    let records: Vec<ReportRecord> = serde_json::from_str(&contents)?;

    records
        .into_iter()
        .map(|record| {
            let id = record.id;
            classifier
                .reconcile(record)
                .map_err(|source| ServerError::InvalidReport { id, source })
        })
        .collect()
}

/// Starts the report API server.
///
/// Resolves the municipality from `BACHES_CONFIG` and the reference
/// overrides, preloads `BACHES_REPORTS` if set, and serves on
/// `BIND_ADDR:PORT`. The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns a [`ServerError`] if configuration or the seed file cannot be
/// loaded, or if the HTTP server fails to bind or run.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> Result<(), ServerError> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config_path = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
    let municipality = Municipality::resolve(config_path.as_deref())?;

    let store = match std::env::var(REPORTS_ENV).ok().map(PathBuf::from) {
        Some(path) => {
            let reports = load_reports(&path, &municipality.classifier())?;
            log::info!("Preloaded {} report(s)", reports.len());
            InMemoryReportStore::from_records(reports)
        }
        None => InMemoryReportStore::new(),
    };

    let api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
    if api_key.is_none() {
        log::warn!("{API_KEY_ENV} is not set, the status webhook is unauthenticated");
    }

    let state = web::Data::new(AppState::new(Arc::new(store), municipality, api_key));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || build_app(state.clone()))
        .bind((bind_addr, port))?
        .run()
        .await?;

    Ok(())
}
