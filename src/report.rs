//! Plain-text rendering of density records.
//!
//! Produces a bordered table with centered cells:
//!
//! ```text
//! +-------+-------------------------+-----------+-----------+-----------+---------+
//! | Index | Distance from Start (m) | Latitude  | Longitude | Elevation | Density |
//! +-------+-------------------------+-----------+-----------+-----------+---------+
//! |   1   |          0.00           | 50.000000 | 8.000000  |  112.40   |    2    |
//! +-------+-------------------------+-----------+-----------+-----------+---------+
//! |   2   |          44.48          | 50.000400 | 8.000000  |    N/A    |    2    |
//! +-------+-------------------------+-----------+-----------+-----------+---------+
//! ```

use tabled::settings::object::Segment as AllCells;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::{DensityRecord, SegmentReport};

/// Column headers, in output order.
pub const HEADERS: [&str; 6] = [
    "Index",
    "Distance from Start (m)",
    "Latitude",
    "Longitude",
    "Elevation",
    "Density",
];

/// One table row, formatted for display.
#[derive(Tabled)]
struct DensityRow {
    #[tabled(rename = "Index")]
    index: usize,
    #[tabled(rename = "Distance from Start (m)")]
    distance: String,
    #[tabled(rename = "Latitude")]
    latitude: String,
    #[tabled(rename = "Longitude")]
    longitude: String,
    #[tabled(rename = "Elevation")]
    elevation: String,
    #[tabled(rename = "Density")]
    density: u32,
}

impl From<&DensityRecord> for DensityRow {
    fn from(record: &DensityRecord) -> Self {
        Self {
            index: record.index,
            distance: format!("{:.2}", record.cumulative_distance),
            latitude: format!("{:.6}", record.latitude),
            longitude: format!("{:.6}", record.longitude),
            elevation: record.elevation.to_string(),
            density: record.density,
        }
    }
}

/// Render the records of one segment as a bordered table.
///
/// An empty slice renders the header only.
///
/// # Example
/// ```
/// use track_density::{render_table, DensityAnalyzer, GpsPoint};
///
/// let records = DensityAnalyzer::default().analyze(&[GpsPoint::new(50.0, 8.0)]);
/// let table = render_table(&records);
/// assert!(table.contains("| Index |"));
/// assert!(table.contains("N/A"));
/// ```
pub fn render_table(records: &[DensityRecord]) -> String {
    let mut table = Table::new(records.iter().map(DensityRow::from));
    table
        .with(Style::ascii())
        .with(Modify::new(AllCells::all()).with(Alignment::center()));

    let mut out = table.to_string();
    out.push('\n');
    out
}

/// Render one segment: a `Segment M` heading followed by its table.
pub fn render_segment(report: &SegmentReport) -> String {
    let mut out = format!(
        "  Segment {} ({} points, {:.2} m",
        report.segment_index,
        report.records.len(),
        report.length_meters
    );
    if let Some(center) = report.bounds.as_ref().map(|b| b.center()) {
        out.push_str(&format!(", centered at {:.6}, {:.6}", center.latitude, center.longitude));
    }
    out.push_str(")\n");
    out.push_str(&render_table(&report.records));
    out
}

/// Render all reports, with a `Track N` heading before the first segment of
/// each track.
pub fn render_reports(reports: &[SegmentReport]) -> String {
    render_reports_with(reports, |_| String::new())
}

/// Like [`render_reports`], appending `after(report)` below each segment table.
pub fn render_reports_with<F>(reports: &[SegmentReport], mut after: F) -> String
where
    F: FnMut(&SegmentReport) -> String,
{
    let mut out = String::new();
    let mut current_track = None;

    for report in reports {
        if current_track != Some(report.track_index) {
            out.push_str(&format!("\nTrack {}\n", report.track_index));
            current_track = Some(report.track_index);
        }
        out.push_str(&render_segment(report));
        out.push_str(&after(report));
    }

    out
}
