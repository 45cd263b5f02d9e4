#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geospatial core for road-damage reports.
//!
//! Two pure computations live here:
//!
//! * [`zone::classify`] assigns a coordinate to one of the six fixed
//!   [`Zone`](baches_report_models::Zone)s around the municipality's
//!   reference point. Historical reports were zoned with exactly these
//!   thresholds, so they must not drift.
//! * [`estimate::estimate`] turns the qualitative position/distance of a
//!   pothole detected in a photo into an absolute coordinate, relative to
//!   where the photo was taken.
//!
//! Both are total, side-effect free and safe to call from any thread.
//! [`config`] loads the municipality (name and reference point).

pub mod config;
pub mod estimate;
pub mod zone;

pub use config::Municipality;
pub use estimate::{distance_meters, estimate, try_estimate};
pub use zone::{ZoneClassifier, classify};

use thiserror::Error;

/// Errors from the checked estimator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    /// The base latitude is too close to a pole for the longitude scaling
    /// term to stay finite.
    #[error(
        "Latitude {lat} is outside the estimator's valid band of ±{max}°",
        max = estimate::MAX_VALID_LATITUDE_DEG
    )]
    OutsideValidLatitude {
        /// The rejected base latitude.
        lat: f64,
    },

    /// The base coordinate or heading was NaN or infinite.
    #[error("Non-finite estimator input: {message}")]
    NonFinite {
        /// Which input was not finite.
        message: String,
    },
}

/// Errors that can occur while loading the municipality configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the config file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for a [`Municipality`].
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("Invalid value for {name}: {value:?}")]
    Env {
        /// Environment variable name.
        name: &'static str,
        /// The raw value.
        value: String,
    },

    /// The configured reference point is not a valid coordinate.
    #[error("Invalid reference point: {0}")]
    Reference(#[from] baches_report_models::ReportError),
}
