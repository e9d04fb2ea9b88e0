//! # Point Density Analysis
//!
//! Annotates every point of a segment with its running distance from the
//! segment start and the number of points of the same segment lying within a
//! radius of it.
//!
//! ## Algorithm
//! 1. Density: every point is compared with every point of its segment (itself
//!    included) and counted when `haversine <= radius`. Ties at exactly the
//!    radius are counted.
//! 2. Cumulative distance: sum of consecutive point-to-point distances, i.e.
//!    path length rather than straight-line displacement.
//! 3. Rounding happens once, when the record is built. Accumulation runs at
//!    full precision.
//!
//! Segments are analyzed in isolation. A point is never counted for a
//! neighbour in another segment or track.

use std::fmt;
use std::time::Instant;

use log::{debug, info};

use crate::geo_utils::{cumulative_distances, haversine_distance};
use crate::{Bounds, GpsPoint, Segment, Track, TrackPointIndex};

/// Printed in place of an elevation when the fix has none.
pub const ELEVATION_NOT_AVAILABLE: &str = "N/A";

const DISTANCE_DECIMALS: usize = 2;
const COORDINATE_DECIMALS: usize = 6;
const ELEVATION_DECIMALS: usize = 2;

/// How the per-point neighbour count is computed.
///
/// Both strategies produce identical counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DensityStrategy {
    /// Compare every point against every other point: O(n²) distance evaluations.
    #[default]
    AllPairs,
    /// Pre-filter candidates with an R-tree, then apply the exact distance test.
    /// Worth it for long segments with a small radius.
    SpatialIndex,
}

/// Configuration for density analysis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DensityConfig {
    /// Neighbourhood radius in meters. Points at exactly this distance count.
    /// Zero counts only coincident points; a negative radius counts nothing.
    /// Default: 100.0 meters
    pub radius_meters: f64,

    /// Neighbour counting strategy.
    /// Default: [`DensityStrategy::AllPairs`]
    pub strategy: DensityStrategy,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            radius_meters: 100.0,
            strategy: DensityStrategy::AllPairs,
        }
    }
}

/// Elevation as reported in a [`DensityRecord`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Elevation {
    /// Elevation in meters, rounded to 2 decimals
    Meters(f64),
    /// The fix carried no elevation
    NotAvailable,
}

impl Elevation {
    /// The elevation in meters, if present.
    pub fn meters(&self) -> Option<f64> {
        match self {
            Elevation::Meters(m) => Some(*m),
            Elevation::NotAvailable => None,
        }
    }
}

impl From<Option<f64>> for Elevation {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(m) => Elevation::Meters(round_to(m, ELEVATION_DECIMALS)),
            None => Elevation::NotAvailable,
        }
    }
}

impl fmt::Display for Elevation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Elevation::Meters(m) => write!(f, "{:.2}", m),
            Elevation::NotAvailable => f.write_str(ELEVATION_NOT_AVAILABLE),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Elevation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Elevation::Meters(m) => serializer.serialize_f64(*m),
            Elevation::NotAvailable => serializer.serialize_str(ELEVATION_NOT_AVAILABLE),
        }
    }
}

/// Analysis result for one point of a segment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DensityRecord {
    /// 1-based position within the segment
    #[cfg_attr(feature = "serde", serde(rename = "Index"))]
    pub index: usize,
    /// Path length from the segment start in meters, rounded to 2 decimals
    #[cfg_attr(feature = "serde", serde(rename = "Distance from Start (m)"))]
    pub cumulative_distance: f64,
    /// Rounded to 6 decimals
    #[cfg_attr(feature = "serde", serde(rename = "Latitude"))]
    pub latitude: f64,
    /// Rounded to 6 decimals
    #[cfg_attr(feature = "serde", serde(rename = "Longitude"))]
    pub longitude: f64,
    #[cfg_attr(feature = "serde", serde(rename = "Elevation"))]
    pub elevation: Elevation,
    /// Points of the same segment within the radius, this one included
    #[cfg_attr(feature = "serde", serde(rename = "Density"))]
    pub density: u32,
}

/// Records for one segment together with its position in the input.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SegmentReport {
    /// 1-based track number
    pub track_index: usize,
    /// 1-based segment number within the track
    pub segment_index: usize,
    /// Full-precision path length of the segment in meters
    pub length_meters: f64,
    /// Extent of the segment, `None` when it has no points
    pub bounds: Option<Bounds>,
    pub records: Vec<DensityRecord>,
}

/// Computes [`DensityRecord`]s for segments with a fixed configuration.
///
/// The analyzer holds nothing but its configuration, so one instance can be
/// reused (and shared between threads) for any number of segments.
///
/// # Example
/// ```
/// use track_density::{DensityAnalyzer, GpsPoint, Elevation};
///
/// let segment = vec![
///     GpsPoint::with_elevation(50.0, 8.0, 112.0),
///     GpsPoint::new(50.0, 8.0),
/// ];
///
/// let records = DensityAnalyzer::new(100.0).analyze(&segment);
/// assert_eq!(records.len(), 2);
/// assert!(records.iter().all(|r| r.density == 2));
/// assert_eq!(records[1].elevation, Elevation::NotAvailable);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DensityAnalyzer {
    config: DensityConfig,
}

impl DensityAnalyzer {
    /// Create an analyzer with the given radius and the default strategy.
    pub fn new(radius_meters: f64) -> Self {
        Self::with_config(DensityConfig {
            radius_meters,
            ..DensityConfig::default()
        })
    }

    /// Create an analyzer from a full configuration.
    pub fn with_config(config: DensityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DensityConfig {
        &self.config
    }

    pub fn radius_meters(&self) -> f64 {
        self.config.radius_meters
    }

    /// Analyze one segment.
    ///
    /// Returns one record per point, in segment order. An empty segment yields
    /// an empty vector.
    pub fn analyze(&self, segment: &[GpsPoint]) -> Vec<DensityRecord> {
        let densities = self.densities(segment);
        build_records(segment, &cumulative_distances(segment), &densities)
    }

    /// Per-point neighbour counts for one segment, without building records.
    pub fn densities(&self, segment: &[GpsPoint]) -> Vec<u32> {
        let radius = self.config.radius_meters;
        match self.config.strategy {
            DensityStrategy::AllPairs => all_pairs_densities(segment, radius),
            DensityStrategy::SpatialIndex => TrackPointIndex::new(segment).densities(radius),
        }
    }

    /// Analyze every segment of a track, keeping segment order.
    pub fn analyze_track(&self, track: &[Segment]) -> Vec<Vec<DensityRecord>> {
        track.iter().map(|segment| self.analyze(segment)).collect()
    }

    /// Analyze a collection of tracks.
    ///
    /// Returns one [`SegmentReport`] per segment, ordered by track and then by
    /// segment. Tracks without segments contribute nothing.
    pub fn analyze_tracks(&self, tracks: &[Track]) -> Vec<SegmentReport> {
        let start = Instant::now();

        let reports: Vec<SegmentReport> = enumerate_segments(tracks)
            .map(|(track_index, segment_index, segment)| {
                self.segment_report(track_index, segment_index, segment)
            })
            .collect();

        log_summary(&reports, start);
        reports
    }

    fn segment_report(
        &self,
        track_index: usize,
        segment_index: usize,
        segment: &[GpsPoint],
    ) -> SegmentReport {
        let densities = self.densities(segment);
        report_from_densities(track_index, segment_index, segment, &densities)
    }
}

/// Analyze a collection of tracks using parallel processing.
///
/// Produces exactly the reports of [`DensityAnalyzer::analyze_tracks`]. Segments
/// are processed in parallel, and so are the per-point neighbour counts inside
/// each segment. Cumulative distances stay sequential.
#[cfg(feature = "parallel")]
pub fn analyze_tracks_parallel(analyzer: &DensityAnalyzer, tracks: &[Track]) -> Vec<SegmentReport> {
    use rayon::prelude::*;

    let start = Instant::now();
    let radius = analyzer.radius_meters();
    let strategy = analyzer.config().strategy;

    let segments: Vec<(usize, usize, &Segment)> = enumerate_segments(tracks).collect();

    let reports: Vec<SegmentReport> = segments
        .par_iter()
        .map(|&(track_index, segment_index, segment)| {
            let densities: Vec<u32> = match strategy {
                DensityStrategy::AllPairs => (0..segment.len())
                    .into_par_iter()
                    .map(|i| count_within_radius(segment, i, radius))
                    .collect(),
                DensityStrategy::SpatialIndex => {
                    let index = TrackPointIndex::new(segment);
                    (0..segment.len())
                        .into_par_iter()
                        .map(|i| index.count_within_radius(i, radius))
                        .collect()
                }
            };
            report_from_densities(track_index, segment_index, segment, &densities)
        })
        .collect();

    log_summary(&reports, start);
    reports
}

/// Neighbour counts by exhaustive comparison.
///
/// Entry `i` is the number of points `j` (including `i` itself) with
/// `haversine_distance(points[i], points[j]) <= radius_meters`.
pub fn all_pairs_densities(points: &[GpsPoint], radius_meters: f64) -> Vec<u32> {
    (0..points.len())
        .map(|i| count_within_radius(points, i, radius_meters))
        .collect()
}

fn count_within_radius(points: &[GpsPoint], i: usize, radius_meters: f64) -> u32 {
    let point = &points[i];
    points
        .iter()
        .filter(|other| haversine_distance(point, other) <= radius_meters)
        .count() as u32
}

/// Round to a fixed number of decimal places.
///
/// Works on the exact binary value, so `1.115` (stored just below 1.115)
/// becomes `1.11`. Exact ties go to the even digit.
///
/// ```
/// use track_density::density::round_to;
///
/// assert_eq!(round_to(1.115, 2), 1.11);
/// assert_eq!(round_to(0.125, 2), 0.12);
/// ```
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}

fn build_records(points: &[GpsPoint], running: &[f64], densities: &[u32]) -> Vec<DensityRecord> {
    points
        .iter()
        .zip(running)
        .zip(densities)
        .enumerate()
        .map(|(i, ((point, distance), density))| DensityRecord {
            index: i + 1,
            cumulative_distance: round_to(*distance, DISTANCE_DECIMALS),
            latitude: round_to(point.latitude, COORDINATE_DECIMALS),
            longitude: round_to(point.longitude, COORDINATE_DECIMALS),
            elevation: Elevation::from(point.elevation),
            density: *density,
        })
        .collect()
}

fn report_from_densities(
    track_index: usize,
    segment_index: usize,
    segment: &[GpsPoint],
    densities: &[u32],
) -> SegmentReport {
    let running = cumulative_distances(segment);
    let length_meters = running.last().copied().unwrap_or(0.0);

    debug!(
        "[Density] Track {} segment {}: {} points, {:.1}m",
        track_index,
        segment_index,
        segment.len(),
        length_meters
    );

    SegmentReport {
        track_index,
        segment_index,
        length_meters,
        bounds: Bounds::from_points(segment),
        records: build_records(segment, &running, densities),
    }
}

fn enumerate_segments(tracks: &[Track]) -> impl Iterator<Item = (usize, usize, &Segment)> {
    tracks.iter().enumerate().flat_map(|(t, track)| {
        track
            .iter()
            .enumerate()
            .map(move |(s, segment)| (t + 1, s + 1, segment))
    })
}

fn log_summary(reports: &[SegmentReport], start: Instant) {
    let points: usize = reports.iter().map(|r| r.records.len()).sum();
    info!(
        "[Density] Analyzed {} segments ({} points) in {:?}",
        reports.len(),
        points,
        start.elapsed()
    );
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::EARTH_RADIUS_METERS;

    /// Degrees of latitude spanning `meters` along a meridian.
    fn lat_step(meters: f64) -> f64 {
        (meters / EARTH_RADIUS_METERS).to_degrees()
    }

    fn colinear_segment(count: usize, spacing_meters: f64) -> Vec<GpsPoint> {
        (0..count)
            .map(|i| GpsPoint::new(50.0 + i as f64 * lat_step(spacing_meters), 8.0))
            .collect()
    }

    fn sample_segment() -> Vec<GpsPoint> {
        vec![
            GpsPoint::with_elevation(51.5074, -0.1278, 11.0),
            GpsPoint::with_elevation(51.5075, -0.1279, 11.5),
            GpsPoint::new(51.5080, -0.1290),
            GpsPoint::with_elevation(51.5090, -0.1300, 14.25),
            GpsPoint::with_elevation(51.5074, -0.1277, 11.0),
            GpsPoint::with_elevation(51.5110, -0.1320, 18.0),
        ]
    }

    #[test]
    fn test_identical_points() {
        let segment = vec![GpsPoint::new(50.0, 8.0), GpsPoint::new(50.0, 8.0)];
        let records = DensityAnalyzer::new(100.0).analyze(&segment);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].density, 2);
        assert_eq!(records[1].density, 2);
        assert_eq!(records[1].cumulative_distance, 0.0);
    }

    #[test]
    fn test_colinear_points() {
        let segment = colinear_segment(3, 50.0);
        let records = DensityAnalyzer::new(60.0).analyze(&segment);

        let densities: Vec<u32> = records.iter().map(|r| r.density).collect();
        // The middle point reaches both ends, the ends only reach the middle
        assert_eq!(densities, vec![2, 3, 2]);
        assert_eq!(records[0].cumulative_distance, 0.0);
        assert_eq!(records[1].cumulative_distance, 50.0);
        assert_eq!(records[2].cumulative_distance, 100.0);
    }

    #[test]
    fn test_end_points_exclude_far_neighbour() {
        let segment = colinear_segment(3, 50.0);
        let densities = all_pairs_densities(&segment, 60.0);
        // First and last point are 100 m apart and never see each other
        assert_eq!(densities[0], 2);
        assert_eq!(densities[2], 2);
    }

    #[test]
    fn test_missing_elevation_is_sentinel() {
        let segment = vec![
            GpsPoint::with_elevation(50.0, 8.0, 0.0),
            GpsPoint::new(50.0001, 8.0),
        ];
        let records = DensityAnalyzer::default().analyze(&segment);

        assert_eq!(records[0].elevation, Elevation::Meters(0.0));
        assert_eq!(records[1].elevation, Elevation::NotAvailable);
        assert_eq!(records[1].elevation.to_string(), "N/A");
        assert_eq!(records[1].elevation.meters(), None);
    }

    #[test]
    fn test_empty_segment() {
        let records = DensityAnalyzer::new(100.0).analyze(&[]);
        assert!(records.is_empty());
    }

    #[test]
    fn test_single_point() {
        let records = DensityAnalyzer::new(100.0).analyze(&[GpsPoint::new(50.0, 8.0)]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].index, 1);
        assert_eq!(records[0].density, 1);
        assert_eq!(records[0].cumulative_distance, 0.0);
    }

    #[test]
    fn test_records_preserve_order_and_length() {
        let segment = sample_segment();
        let records = DensityAnalyzer::new(50.0).analyze(&segment);

        assert_eq!(records.len(), segment.len());
        for (i, (record, point)) in records.iter().zip(&segment).enumerate() {
            assert_eq!(record.index, i + 1);
            assert_eq!(record.latitude, round_to(point.latitude, 6));
            assert_eq!(record.longitude, round_to(point.longitude, 6));
        }
    }

    #[test]
    fn test_density_at_least_one_and_distance_non_decreasing() {
        let segment = sample_segment();
        for radius in [0.0, 1.0, 25.0, 100.0, 10_000.0] {
            let records = DensityAnalyzer::new(radius).analyze(&segment);
            assert!(records.iter().all(|r| r.density >= 1));
            assert_eq!(records[0].cumulative_distance, 0.0);
            assert!(records
                .windows(2)
                .all(|w| w[0].cumulative_distance <= w[1].cumulative_distance));
        }
    }

    #[test]
    fn test_density_symmetry() {
        let segment = sample_segment();
        let radius = 20.0;
        let densities = all_pairs_densities(&segment, radius);

        // Counting pairs from either side gives the same total
        let pairs: usize = (0..segment.len())
            .flat_map(|i| (0..segment.len()).map(move |j| (i, j)))
            .filter(|&(i, j)| haversine_distance(&segment[i], &segment[j]) <= radius)
            .count();
        assert_eq!(densities.iter().map(|&d| d as usize).sum::<usize>(), pairs);

        for i in 0..segment.len() {
            for j in 0..segment.len() {
                let a_sees_b = haversine_distance(&segment[i], &segment[j]) <= radius;
                let b_sees_a = haversine_distance(&segment[j], &segment[i]) <= radius;
                assert_eq!(a_sees_b, b_sees_a);
            }
        }
    }

    #[test]
    fn test_tie_at_radius_is_counted() {
        let segment = vec![GpsPoint::new(50.0, 8.0), GpsPoint::new(50.0003, 8.0004)];
        let exact = haversine_distance(&segment[0], &segment[1]);

        assert_eq!(all_pairs_densities(&segment, exact), vec![2, 2]);
        let just_below = exact - exact * 1e-12;
        assert_eq!(all_pairs_densities(&segment, just_below), vec![1, 1]);
    }

    #[test]
    fn test_zero_radius_counts_coincident_points() {
        let segment = vec![
            GpsPoint::new(50.0, 8.0),
            GpsPoint::new(50.0, 8.0),
            GpsPoint::new(50.00001, 8.0),
        ];
        assert_eq!(all_pairs_densities(&segment, 0.0), vec![2, 2, 1]);
    }

    #[test]
    fn test_negative_radius_counts_nothing() {
        let segment = vec![GpsPoint::new(50.0, 8.0), GpsPoint::new(50.0, 8.0)];
        assert_eq!(all_pairs_densities(&segment, -1.0), vec![0, 0]);
    }

    #[test]
    fn test_rounding_only_at_output() {
        // 1000 hops of 0.004 m each: rounding every hop would report 0.00
        let step = lat_step(0.004);
        let segment: Vec<GpsPoint> = (0..=1000)
            .map(|i| GpsPoint::new(i as f64 * step, 0.0))
            .collect();

        let records = DensityAnalyzer::new(1.0).analyze(&segment);
        let last = records.last().unwrap();
        assert!((last.cumulative_distance - 4.0).abs() < 0.011);
    }

    #[test]
    fn test_record_rounding() {
        let segment = vec![GpsPoint::with_elevation(50.12345678, 8.98765432, 123.456)];
        let record = &DensityAnalyzer::default().analyze(&segment)[0];

        assert_eq!(record.latitude, 50.123457);
        assert_eq!(record.longitude, 8.987654);
        assert_eq!(record.elevation, Elevation::Meters(123.46));
        assert_eq!(record.elevation.to_string(), "123.46");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.005_000_1, 2), 1.01);
        assert_eq!(round_to(-2.5, 0), -2.0);
        assert_eq!(round_to(3.5, 0), 4.0);
        assert_eq!(round_to(0.0, 6), 0.0);
        assert_eq!(round_to(8.987_654_32, 6), 8.987654);
        assert!(round_to(f64::NAN, 2).is_nan());
        assert_eq!(round_to(f64::INFINITY, 2), f64::INFINITY);
    }

    #[test]
    fn test_round_to_uses_exact_binary_value() {
        // 1.115 is stored as 1.11499999..., 0.125 is an exact tie
        assert_eq!(round_to(1.115, 2), 1.11);
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round_to(2.675, 2), 2.67);
    }

    #[test]
    fn test_elevation_tie_rounds_to_even() {
        let segment = vec![GpsPoint::with_elevation(50.0, 8.0, 112.125)];
        let record = &DensityAnalyzer::default().analyze(&segment)[0];

        assert_eq!(record.elevation, Elevation::Meters(112.12));
        assert_eq!(record.elevation.to_string(), "112.12");
    }

    #[test]
    fn test_strategies_agree() {
        let segment = sample_segment();
        for radius in [-1.0, 0.0, 5.0, 20.0, 100.0, 500.0] {
            let all_pairs = DensityAnalyzer::new(radius).densities(&segment);
            let indexed = DensityAnalyzer::with_config(DensityConfig {
                radius_meters: radius,
                strategy: DensityStrategy::SpatialIndex,
            })
            .densities(&segment);
            assert_eq!(all_pairs, indexed, "radius {}", radius);
        }
    }

    #[test]
    fn test_segments_are_isolated() {
        let here = vec![GpsPoint::new(50.0, 8.0)];
        let track: Track = vec![here.clone(), here.clone()];
        let results = DensityAnalyzer::new(100.0).analyze_track(&track);

        assert_eq!(results.len(), 2);
        // Same location in another segment is not a neighbour
        assert_eq!(results[0][0].density, 1);
        assert_eq!(results[1][0].density, 1);
    }

    #[test]
    fn test_analyze_tracks_reports() {
        let tracks: Vec<Track> = vec![
            vec![colinear_segment(3, 50.0), vec![]],
            vec![],
            vec![sample_segment()],
        ];
        let reports = DensityAnalyzer::new(60.0).analyze_tracks(&tracks);

        let positions: Vec<(usize, usize)> = reports
            .iter()
            .map(|r| (r.track_index, r.segment_index))
            .collect();
        assert_eq!(positions, vec![(1, 1), (1, 2), (3, 1)]);

        assert!((reports[0].length_meters - 100.0).abs() < 1e-6);
        assert_eq!(reports[0].records.len(), 3);
        assert!(reports[0].bounds.is_some());

        assert!(reports[1].records.is_empty());
        assert_eq!(reports[1].length_meters, 0.0);
        assert!(reports[1].bounds.is_none());

        assert_eq!(reports[2].records.len(), sample_segment().len());
    }

    #[test]
    fn test_default_config() {
        let config = DensityConfig::default();
        assert_eq!(config.radius_meters, 100.0);
        assert_eq!(config.strategy, DensityStrategy::AllPairs);
        assert_eq!(DensityAnalyzer::default().radius_meters(), 100.0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let tracks: Vec<Track> = vec![
            vec![sample_segment(), colinear_segment(40, 7.5)],
            vec![colinear_segment(5, 120.0)],
        ];
        for strategy in [DensityStrategy::AllPairs, DensityStrategy::SpatialIndex] {
            let analyzer = DensityAnalyzer::with_config(DensityConfig {
                radius_meters: 30.0,
                strategy,
            });
            assert_eq!(
                analyze_tracks_parallel(&analyzer, &tracks),
                analyzer.analyze_tracks(&tracks)
            );
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_record_serializes_with_table_keys() {
        let segment = vec![GpsPoint::new(50.0, 8.0)];
        let record = &DensityAnalyzer::default().analyze(&segment)[0];
        let json = serde_json::to_value(record).unwrap();

        assert_eq!(json["Index"], 1);
        assert_eq!(json["Distance from Start (m)"], 0.0);
        assert_eq!(json["Latitude"], 50.0);
        assert_eq!(json["Longitude"], 8.0);
        assert_eq!(json["Elevation"], "N/A");
        assert_eq!(json["Density"], 1);
    }
}
