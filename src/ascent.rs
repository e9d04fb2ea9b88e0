//! Ascent detection over point elevations.
//!
//! A window of `window_size` consecutive points slides along the segment.
//! While not climbing, an elevation gain of at least `start_trigger` across
//! the window starts an ascent at the lowest point of that window. While
//! climbing, a gain of at most `stop_trigger` ends it at the highest point of
//! the window, and scanning continues with the window starting there.

use crate::GpsPoint;

/// Configuration for ascent detection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AscentConfig {
    /// Gain across the window (meters) that starts an ascent.
    /// Default: 25.0 meters (5% over 500 m with ~100 m point spacing)
    pub start_trigger: f64,

    /// Gain across the window (meters) at or below which an ascent ends.
    /// Default: 5.0 meters
    pub stop_trigger: f64,

    /// Number of points in the sliding window. Below 2 nothing is detected.
    /// Default: 5
    pub window_size: u32,
}

impl Default for AscentConfig {
    fn default() -> Self {
        Self {
            start_trigger: 25.0,
            stop_trigger: 5.0,
            window_size: 5,
        }
    }
}

/// A detected climb, as 0-based positions into its segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Ascent {
    /// Lowest point where the climb starts
    pub start_index: usize,
    /// Highest point where the climb ends
    pub stop_index: usize,
}

impl Ascent {
    /// Elevation difference between stop and start, if both have elevation.
    pub fn elevation_gain(&self, segment: &[GpsPoint]) -> Option<f64> {
        let start = segment.get(self.start_index)?.elevation?;
        let stop = segment.get(self.stop_index)?.elevation?;
        Some(stop - start)
    }
}

/// Find the ascents of a segment.
///
/// Windows whose first or last point has no elevation neither start nor end
/// an ascent. Points without elevation are skipped when looking for the
/// lowest or highest point of a window.
///
/// # Example
/// ```
/// use track_density::{detect_ascents, AscentConfig, GpsPoint};
///
/// let elevations = [400.0, 400.0, 400.0, 415.0, 430.0, 445.0, 460.0, 460.0, 460.0, 460.0, 460.0];
/// let segment: Vec<GpsPoint> = elevations
///     .iter()
///     .enumerate()
///     .map(|(i, &e)| GpsPoint::with_elevation(46.0 + i as f64 * 0.001, 7.0, e))
///     .collect();
///
/// let ascents = detect_ascents(&segment, &AscentConfig::default());
/// assert_eq!(ascents.len(), 1);
/// assert_eq!(ascents[0].elevation_gain(&segment), Some(60.0));
/// ```
pub fn detect_ascents(segment: &[GpsPoint], config: &AscentConfig) -> Vec<Ascent> {
    let window = config.window_size as usize;
    if window < 2 {
        return Vec::new();
    }

    let mut ascents = Vec::new();
    let mut start: Option<usize> = None;
    let mut idx = window - 1;

    while idx < segment.len() {
        let window_start = idx + 1 - window;
        let points = &segment[window_start..=idx];
        let gain = match (segment[window_start].elevation, segment[idx].elevation) {
            (Some(first), Some(last)) => Some(last - first),
            _ => None,
        };

        match (start, gain) {
            (None, Some(gain)) if gain >= config.start_trigger => {
                start = extreme_elevation(points, |candidate, best| candidate < best)
                    .map(|i| window_start + i);
            }
            (Some(start_index), Some(gain)) if gain <= config.stop_trigger => {
                let stop_index = extreme_elevation(points, |candidate, best| candidate > best)
                    .map_or(idx, |i| window_start + i);
                ascents.push(Ascent { start_index, stop_index });
                start = None;
                // Next window starts at the summit
                idx = stop_index + window - 1;
                continue;
            }
            _ => {}
        }

        idx += 1;
    }

    ascents
}

/// Position of the first point whose elevation beats every earlier one.
fn extreme_elevation(points: &[GpsPoint], beats: impl Fn(f64, f64) -> bool) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, elevation) in points.iter().enumerate().filter_map(|(i, p)| Some((i, p.elevation?))) {
        match best {
            Some((_, current)) if !beats(elevation, current) => {}
            _ => best = Some((i, elevation)),
        }
    }
    best.map(|(i, _)| i)
}
