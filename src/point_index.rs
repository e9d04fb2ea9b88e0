//! Spatial index over the points of one segment.
//!
//! Points are stored in an R-tree as unit vectors on the sphere. Straight-line
//! (chord) distance between unit vectors grows monotonically with great-circle
//! distance, so nearest-neighbour and radius queries in the tree agree with
//! the haversine ordering, with no special cases at the poles or the
//! antimeridian.
//!
//! Radius queries only use the tree to collect candidates. Every candidate is
//! then checked with the same `haversine <= radius` test the exhaustive count
//! uses, so both give identical results.

use std::f64::consts::PI;

use log::debug;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::geo_utils::{haversine_distance, EARTH_RADIUS_METERS};
use crate::GpsPoint;

/// Relative and absolute slack (in unit-sphere chord lengths) added to the
/// candidate search radius. Covers the rounding of the vector coordinates.
const CHORD_MARGIN: f64 = 1e-9;

/// A segment point with its position for R-tree queries
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    idx: usize,
    xyz: [f64; 3],
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.xyz)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.xyz[0] - point[0];
        let dy = self.xyz[1] - point[1];
        let dz = self.xyz[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

fn unit_vector(latitude: f64, longitude: f64) -> [f64; 3] {
    let phi = latitude.to_radians();
    let lambda = longitude.to_radians();
    [phi.cos() * lambda.cos(), phi.cos() * lambda.sin(), phi.sin()]
}

/// R-tree backed lookups over a borrowed segment.
///
/// Points with non-finite or out-of-range coordinates are left out of the
/// tree. When a segment has any, radius queries scan the whole segment
/// instead, which keeps counts identical to the exhaustive algorithm.
///
/// # Example
/// ```
/// use track_density::{GpsPoint, TrackPointIndex};
///
/// let segment = vec![
///     GpsPoint::new(50.0000, 8.0),
///     GpsPoint::new(50.0010, 8.0),
///     GpsPoint::new(50.0020, 8.0),
/// ];
/// let index = TrackPointIndex::new(&segment);
///
/// assert_eq!(index.nearest_index(50.0012, 8.0001), Some(1));
/// assert_eq!(index.within_radius(0, 120.0), vec![0, 1]);
/// ```
pub struct TrackPointIndex<'a> {
    points: &'a [GpsPoint],
    tree: RTree<IndexedPoint>,
    exhaustive: bool,
}

impl<'a> TrackPointIndex<'a> {
    /// Build the index for a segment.
    pub fn new(points: &'a [GpsPoint]) -> Self {
        let indexed: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_valid())
            .map(|(idx, p)| IndexedPoint {
                idx,
                xyz: unit_vector(p.latitude, p.longitude),
            })
            .collect();

        let exhaustive = indexed.len() < points.len();
        if exhaustive {
            debug!(
                "[PointIndex] {} of {} points have invalid coordinates, radius queries fall back to a full scan",
                points.len() - indexed.len(),
                points.len()
            );
        }

        Self {
            points,
            tree: RTree::bulk_load(indexed),
            exhaustive,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Position of the segment point closest to the given location.
    ///
    /// Returns `None` for an empty segment, a non-finite lookup location, or
    /// when no point of the segment has valid coordinates.
    pub fn nearest_index(&self, latitude: f64, longitude: f64) -> Option<usize> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        self.tree
            .nearest_neighbor(&unit_vector(latitude, longitude))
            .map(|p| p.idx)
    }

    /// The segment point closest to the given location.
    pub fn nearest_point(&self, latitude: f64, longitude: f64) -> Option<&'a GpsPoint> {
        let points = self.points;
        self.nearest_index(latitude, longitude).map(|idx| &points[idx])
    }

    /// Positions of all points within `radius_meters` of point `i`, ascending.
    ///
    /// Includes `i` itself whenever the radius is non-negative. An
    /// out-of-bounds `i` yields an empty vector.
    pub fn within_radius(&self, i: usize, radius_meters: f64) -> Vec<usize> {
        let Some(center) = self.points.get(i) else {
            return Vec::new();
        };

        let mut found: Vec<usize> = self
            .candidates(center, radius_meters)
            .into_iter()
            .filter(|&j| haversine_distance(center, &self.points[j]) <= radius_meters)
            .collect();
        found.sort_unstable();
        found
    }

    /// Number of points within `radius_meters` of point `i`, itself included.
    pub fn count_within_radius(&self, i: usize, radius_meters: f64) -> u32 {
        self.within_radius(i, radius_meters).len() as u32
    }

    /// Neighbour counts for every point of the segment.
    pub fn densities(&self, radius_meters: f64) -> Vec<u32> {
        (0..self.points.len())
            .map(|i| self.count_within_radius(i, radius_meters))
            .collect()
    }

    /// Superset of the points that can pass the exact distance test.
    fn candidates(&self, center: &GpsPoint, radius_meters: f64) -> Vec<usize> {
        if self.exhaustive {
            return (0..self.points.len()).collect();
        }
        // Negative or NaN radius: nothing satisfies `<=`
        if !(radius_meters >= 0.0) {
            return Vec::new();
        }

        let angle = radius_meters / EARTH_RADIUS_METERS;
        if angle >= PI {
            return (0..self.points.len()).collect();
        }

        let chord = 2.0 * (angle / 2.0).sin();
        let limit = chord * (1.0 + CHORD_MARGIN) + CHORD_MARGIN;

        self.tree
            .locate_within_distance(unit_vector(center.latitude, center.longitude), limit * limit)
            .map(|p| p.idx)
            .collect()
    }
}
