//! # Track Density
//!
//! Point density and along-track distance analysis for recorded GPS tracks.
//!
//! This library provides:
//! - Great-circle (haversine) distances on a spherical Earth
//! - Per-point density: how many fixes of the same segment lie within a radius
//! - Cumulative path length from the start of each segment
//! - Ascent detection over point elevations
//!
//! ## Features
//!
//! - **`gpx`** (default) - Load tracks from GPX files
//! - **`table`** (default) - Render records as text tables
//! - **`serde`** - Serialize records and reports
//! - **`parallel`** - Enable parallel processing with rayon
//! - **`cli`** - Build the `track-density` command line tool
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use track_density::{DensityAnalyzer, GpsPoint};
//!
//! let segment = vec![
//!     GpsPoint::with_elevation(50.0000, 8.0, 112.4),
//!     GpsPoint::with_elevation(50.0004, 8.0, 113.0),
//!     GpsPoint::new(50.0008, 8.0),
//! ];
//!
//! let analyzer = DensityAnalyzer::new(60.0);
//! for record in analyzer.analyze(&segment) {
//!     println!(
//!         "#{} {:.2}m density={} elevation={}",
//!         record.index, record.cumulative_distance, record.density, record.elevation
//!     );
//! }
//! ```

use geo::{BoundingRect, MultiPoint, Point};

pub mod geo_utils;

pub mod density;
pub use density::{
    DensityAnalyzer, DensityConfig, DensityRecord, DensityStrategy, Elevation,
    SegmentReport, ELEVATION_NOT_AVAILABLE,
};

#[cfg(feature = "parallel")]
pub use density::analyze_tracks_parallel;

// Spatial index over a single segment
pub mod point_index;
pub use point_index::TrackPointIndex;

pub mod ascent;
pub use ascent::{detect_ascents, Ascent, AscentConfig};

#[cfg(feature = "table")]
pub mod report;
#[cfg(feature = "table")]
pub use report::render_table;

#[cfg(feature = "gpx")]
pub mod error;
#[cfg(feature = "gpx")]
pub use error::{TrackError, TrackResult};

#[cfg(feature = "gpx")]
pub mod gpx_input;
#[cfg(feature = "gpx")]
pub use gpx_input::{load_gpx, read_gpx};

// ============================================================================
// Core Types
// ============================================================================

/// A recorded GPS fix with latitude, longitude and optional elevation.
///
/// # Example
/// ```
/// use track_density::GpsPoint;
/// let plain = GpsPoint::new(51.5074, -0.1278); // London
/// let hill = GpsPoint::with_elevation(47.4211, 10.9863, 2962.0); // Zugspitze
/// assert!(plain.elevation.is_none());
/// assert_eq!(hill.elevation, Some(2962.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Elevation in meters, `None` when the fix carries no elevation.
    pub elevation: Option<f64>,
}

impl GpsPoint {
    /// Create a new GPS point without elevation.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude, elevation: None }
    }

    /// Create a new GPS point with an elevation in meters.
    pub fn with_elevation(latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self { latitude, longitude, elevation: Some(elevation) }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

impl From<GpsPoint> for Point<f64> {
    fn from(p: GpsPoint) -> Self {
        Point::new(p.longitude, p.latitude)
    }
}

impl From<Point<f64>> for GpsPoint {
    fn from(p: Point<f64>) -> Self {
        GpsPoint::new(p.y(), p.x())
    }
}

/// An ordered run of points, in recording order.
pub type Segment = Vec<GpsPoint>;

/// An ordered collection of segments, typically one recorded outing.
pub type Track = Vec<Segment>;

/// Bounding box of a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        let multi: MultiPoint<f64> = points.iter().map(|p| Point::from(*p)).collect();
        let rect = multi.bounding_rect()?;

        Some(Self {
            min_lat: rect.min().y,
            max_lat: rect.max().y,
            min_lng: rect.min().x,
            max_lng: rect.max().x,
        })
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
