//! Photo-relative position estimation.
//!
//! The inference service only says where a pothole is *roughly*: left of
//! the camera, far away, and so on. This module maps those labels onto a
//! fixed distance and bearing and displaces the camera coordinate with a
//! small-displacement equirectangular approximation on a spherical earth.
//! The approximation is only meant for the tens of meters covered by the
//! three distance buckets.

use baches_report_models::{Coordinate, QualitativeDistance, QualitativePosition};
use geo::{Distance as _, Haversine};

use crate::EstimateError;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Largest absolute base latitude accepted by [`try_estimate`].
///
/// The longitude term divides by `cos(lat)`, which vanishes at the poles.
pub const MAX_VALID_LATITUDE_DEG: f64 = 89.0;

/// Distance in meters assigned to each qualitative distance.
#[must_use]
pub const fn offset_meters(distance: QualitativeDistance) -> f64 {
    match distance {
        QualitativeDistance::Near => 3.0,
        QualitativeDistance::Medium => 10.0,
        QualitativeDistance::Far => 20.0,
    }
}

/// Bearing offset in degrees added to the camera heading.
///
/// `Up` maps to the same bearing as `Center`; the two are
/// indistinguishable in the output.
#[must_use]
pub const fn bearing_offset_deg(position: QualitativePosition) -> f64 {
    match position {
        QualitativePosition::Center | QualitativePosition::Up => 0.0,
        QualitativePosition::Left => -45.0,
        QualitativePosition::Right => 45.0,
        QualitativePosition::Down => 180.0,
    }
}

/// Estimates the coordinate of a pothole seen from `base`.
///
/// `heading_deg` is the camera heading in degrees clockwise from north
/// (`0.0` when unknown).
///
/// Only meaningful for `|base.lat|` up to [`MAX_VALID_LATITUDE_DEG`]; at
/// the poles the longitude offset is unbounded. Use [`try_estimate`] when
/// the base coordinate is not known to be in range.
#[must_use]
pub fn estimate(
    base: Coordinate,
    position: QualitativePosition,
    distance: QualitativeDistance,
    heading_deg: f64,
) -> Coordinate {
    let meters = offset_meters(distance);
    let bearing = (heading_deg + bearing_offset_deg(position)).to_radians();

    let d_lat = (meters * bearing.cos()) / EARTH_RADIUS_M * (180.0 / std::f64::consts::PI);
    let d_lng = (meters * bearing.sin()) / (EARTH_RADIUS_M * base.lat.to_radians().cos())
        * (180.0 / std::f64::consts::PI);

    Coordinate::new(base.lat + d_lat, base.lng + d_lng)
}

/// [`estimate`] with the heading defaulted to north.
#[must_use]
pub fn estimate_default_heading(
    base: Coordinate,
    position: QualitativePosition,
    distance: QualitativeDistance,
) -> Coordinate {
    estimate(base, position, distance, 0.0)
}

/// [`estimate`] that refuses inputs outside the valid band instead of
/// returning non-finite or meaningless coordinates.
///
/// # Errors
///
/// * [`EstimateError::NonFinite`] if any base component or the heading is
///   NaN or infinite
/// * [`EstimateError::OutsideValidLatitude`] if `|base.lat|` exceeds
///   [`MAX_VALID_LATITUDE_DEG`]
pub fn try_estimate(
    base: Coordinate,
    position: QualitativePosition,
    distance: QualitativeDistance,
    heading_deg: f64,
) -> Result<Coordinate, EstimateError> {
    if !base.lat.is_finite() || !base.lng.is_finite() {
        return Err(EstimateError::NonFinite {
            message: format!("base coordinate {base}"),
        });
    }
    if !heading_deg.is_finite() {
        return Err(EstimateError::NonFinite {
            message: format!("heading {heading_deg}"),
        });
    }
    if base.lat.abs() > MAX_VALID_LATITUDE_DEG {
        return Err(EstimateError::OutsideValidLatitude { lat: base.lat });
    }

    Ok(estimate(base, position, distance, heading_deg))
}

/// Great-circle distance in meters between two coordinates.
#[must_use]
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    Haversine.distance(geo::Point::from(a), geo::Point::from(b))
}
