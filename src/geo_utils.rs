//! # Geographic Utilities
//!
//! Great-circle distance and path length on a spherical Earth.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine`] | Great-circle distance between two raw coordinate pairs |
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`cumulative_distances`] | Running path length at every point of a segment |
//! | [`polyline_length`] | Total length of a segment in meters |
//!
//! ## Example
//!
//! ```rust
//! use track_density::{GpsPoint, geo_utils};
//!
//! let segment = vec![
//!     GpsPoint::new(51.5074, -0.1278),  // London
//!     GpsPoint::new(51.5080, -0.1290),
//!     GpsPoint::new(51.5090, -0.1300),
//! ];
//!
//! let running = geo_utils::cumulative_distances(&segment);
//! assert_eq!(running[0], 0.0);
//! assert_eq!(running[2], geo_utils::polyline_length(&segment));
//! ```
//!
//! ## Algorithm Notes
//!
//! The haversine formula treats the Earth as a sphere with the mean radius
//! [`EARTH_RADIUS_METERS`]. Against the WGS84 ellipsoid this is off by up to
//! about 0.5%, which does not matter when counting neighbours inside a radius
//! of a few hundred meters. Precision near antipodal points is not hardened.
//!
//! Reference: [Haversine formula (Wikipedia)](https://en.wikipedia.org/wiki/Haversine_formula)

use crate::GpsPoint;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance in meters between two coordinates given in degrees.
///
/// No range validation is done. Out-of-range values go through the formula
/// unchanged and non-finite values yield `NaN`; the function never panics.
///
/// The result is symmetric in its two points and exactly `0.0` for identical
/// coordinates.
///
/// # Example
///
/// ```rust
/// use track_density::geo_utils::haversine;
///
/// // One degree of longitude along the equator
/// let d = haversine(0.0, 0.0, 0.0, 1.0);
/// assert!((d - 111_194.93).abs() < 1.0);
/// ```
#[inline]
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);

    EARTH_RADIUS_METERS * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Calculate the great-circle distance between two GPS points.
///
/// Elevation is ignored.
///
/// # Example
///
/// ```rust
/// use track_density::{GpsPoint, geo_utils};
///
/// let london = GpsPoint::new(51.5074, -0.1278);
/// let paris = GpsPoint::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    haversine(p1.latitude, p1.longitude, p2.latitude, p2.longitude)
}

/// Running path length at every point of a segment, in meters.
///
/// The first entry is `0.0`; each following entry adds the distance from the
/// previous point. This is distance travelled, not displacement from the
/// start. Values keep full precision.
pub fn cumulative_distances(points: &[GpsPoint]) -> Vec<f64> {
    let mut running = Vec::with_capacity(points.len());
    let mut total = 0.0;

    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            total += haversine_distance(&points[i - 1], point);
        }
        running.push(total);
    }

    running
}

/// Calculate the total length of a segment in meters.
///
/// Sums the haversine distance between consecutive points. Empty or single-point
/// segments return 0.0.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

// =============================================================================
// Unit Tests
// =============================================================================
