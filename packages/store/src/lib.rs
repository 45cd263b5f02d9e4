#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report persistence interface.
//!
//! The production deployment keeps reports in a managed document database;
//! that backend lives outside this workspace. [`ReportStore`] is the
//! contract the API is written against, and [`InMemoryReportStore`] is the
//! implementation used for local runs and tests.
//!
//! Stores never delete reports, and the only mutation they allow after
//! insertion is [`ReportStore::update_status`].

use std::collections::BTreeMap;

use baches_analytics_models::ReportFilter;
use baches_report_models::{ReportRecord, ReportStatus};
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Errors that can occur in a report store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No report has the requested id.
    #[error("Report {id} not found")]
    NotFound {
        /// The requested id.
        id: Uuid,
    },

    /// The store refused the write.
    #[error("Rejected: {message}")]
    Rejected {
        /// Why the write was refused.
        message: String,
    },
}

/// Persistence contract for reports.
#[async_trait::async_trait]
pub trait ReportStore: Send + Sync {
    /// Stores a new report and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Rejected`] if a report with the same id exists.
    async fn insert(&self, report: ReportRecord) -> Result<ReportRecord, StoreError>;

    /// Fetches one report.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no report has `id`.
    async fn get(&self, id: Uuid) -> Result<ReportRecord, StoreError>;

    /// Reports matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails.
    async fn list(&self, filter: &ReportFilter) -> Result<Vec<ReportRecord>, StoreError>;

    /// Moves a report to `status` and returns the updated report.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no report has `id`.
    async fn update_status(
        &self,
        id: Uuid,
        status: ReportStatus,
        actor: Option<&str>,
    ) -> Result<ReportRecord, StoreError>;

    /// Every stored report, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails.
    async fn all(&self) -> Result<Vec<ReportRecord>, StoreError> {
        self.list(&ReportFilter::default()).await
    }
}

/// A [`ReportStore`] backed by a map behind an async `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    reports: RwLock<BTreeMap<Uuid, ReportRecord>>,
}

impl InMemoryReportStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `reports`. Later duplicates of an
    /// id replace earlier ones.
    #[must_use]
    pub fn from_records(reports: impl IntoIterator<Item = ReportRecord>) -> Self {
        Self {
            reports: RwLock::new(reports.into_iter().map(|r| (r.id, r)).collect()),
        }
    }
}

#[async_trait::async_trait]
impl ReportStore for InMemoryReportStore {
    async fn insert(&self, report: ReportRecord) -> Result<ReportRecord, StoreError> {
        let mut reports = self.reports.write().await;
        if reports.contains_key(&report.id) {
            return Err(StoreError::Rejected {
                message: format!("report {} already exists", report.id),
            });
        }
        log::info!(
            "Stored report {} ({} severity, {} zone)",
            report.id,
            report.severity,
            report.zone
        );
        if report.severity == baches_report_models::Severity::High {
            log::warn!("High-severity pothole reported at {}", report.location);
        }
        reports.insert(report.id, report.clone());
        Ok(report)
    }

    async fn get(&self, id: Uuid) -> Result<ReportRecord, StoreError> {
        self.reports
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { id })
    }

    async fn list(&self, filter: &ReportFilter) -> Result<Vec<ReportRecord>, StoreError> {
        let reports = self.reports.read().await;
        let all: Vec<ReportRecord> = reports.values().cloned().collect();
        Ok(baches_analytics::apply_filter(&all, filter))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ReportStatus,
        actor: Option<&str>,
    ) -> Result<ReportRecord, StoreError> {
        let mut reports = self.reports.write().await;
        let report = reports.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        let previous = report.set_status(status, actor, Utc::now());
        log::info!("Report {id} moved from {previous} to {status}");
        Ok(report.clone())
    }
}
