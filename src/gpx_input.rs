//! GPX ingestion.
//!
//! Turns the `<trk>` elements of a GPX document into [`Track`]s: one
//! [`Segment`] per `<trkseg>`, one [`GpsPoint`] per `<trkpt>` with its
//! optional `<ele>`. Waypoints and routes are ignored.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::{debug, info};

use crate::error::{TrackError, TrackResult};
use crate::{GpsPoint, Segment, Track};

/// Read all tracks from a GPX document.
///
/// A document without tracks yields an empty vector.
pub fn read_gpx<R: Read>(reader: R) -> TrackResult<Vec<Track>> {
    let gpx_data = gpx::read(reader)?;

    let tracks: Vec<Track> = gpx_data
        .tracks
        .iter()
        .map(|track| {
            track
                .segments
                .iter()
                .map(|segment| {
                    segment
                        .points
                        .iter()
                        .map(|waypoint| GpsPoint {
                            elevation: waypoint.elevation,
                            ..GpsPoint::from(waypoint.point())
                        })
                        .collect::<Segment>()
                })
                .collect::<Track>()
        })
        .collect();

    debug!(
        "[GpxInput] Read {} tracks, {} segments",
        tracks.len(),
        tracks.iter().map(Vec::len).sum::<usize>()
    );

    Ok(tracks)
}

/// Load all tracks from a GPX file.
///
/// Fails with [`TrackError::NoTracks`] when the file parses but holds no
/// `<trk>` element.
pub fn load_gpx<P: AsRef<Path>>(path: P) -> TrackResult<Vec<Track>> {
    let path = path.as_ref();
    let tracks = read_gpx(BufReader::new(File::open(path)?))?;

    if tracks.is_empty() {
        return Err(TrackError::NoTracks(path.display().to_string()));
    }

    let points: usize = tracks.iter().flatten().map(Vec::len).sum();
    info!("[GpxInput] Loaded {} ({} tracks, {} points)", path.display(), tracks.len(), points);

    Ok(tracks)
}
