//! Print per-point density and distance tables for the tracks of a GPX file.
//!
//! Run with: cargo run --features cli -- track.gpx --radius 50

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use serde::Serialize;

use track_density::report::render_reports_with;
use track_density::{
    detect_ascents, load_gpx, Ascent, AscentConfig, DensityAnalyzer, DensityConfig,
    DensityStrategy, GpsPoint, Segment, SegmentReport, Track, ELEVATION_NOT_AVAILABLE,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// Compare every point against every other point
    AllPairs,
    /// Pre-filter neighbours with an R-tree
    SpatialIndex,
}

impl From<Strategy> for DensityStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::AllPairs => DensityStrategy::AllPairs,
            Strategy::SpatialIndex => DensityStrategy::SpatialIndex,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "track-density", version, about = "Point density and cumulative distance for GPX tracks")]
struct Cli {
    /// GPX file to analyze
    file: PathBuf,

    /// Neighbourhood radius in meters
    #[arg(short, long, default_value_t = 100.0, allow_negative_numbers = true)]
    radius: f64,

    /// Neighbour counting strategy
    #[arg(long, value_enum, default_value_t = Strategy::AllPairs)]
    strategy: Strategy,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Also detect ascents in every segment
    #[arg(long)]
    ascents: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct SegmentOutput<'a> {
    #[serde(flatten)]
    report: &'a SegmentReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    ascents: Option<Vec<Ascent>>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let tracks = load_gpx(&cli.file)
        .with_context(|| format!("failed to load {}", cli.file.display()))?;

    let analyzer = DensityAnalyzer::with_config(DensityConfig {
        radius_meters: cli.radius,
        strategy: cli.strategy.into(),
    });
    info!("[TrackDensity] Radius {}m, strategy {:?}", cli.radius, cli.strategy);

    #[cfg(feature = "parallel")]
    let reports = track_density::analyze_tracks_parallel(&analyzer, &tracks);

    #[cfg(not(feature = "parallel"))]
    let reports = analyzer.analyze_tracks(&tracks);

    let ascent_config = AscentConfig::default();
    let ascents_of = |report: &SegmentReport| -> Option<Vec<Ascent>> {
        cli.ascents
            .then(|| segment_of(&tracks, report))
            .flatten()
            .map(|segment| detect_ascents(segment, &ascent_config))
    };

    match cli.format {
        Format::Table => {
            let text = render_reports_with(&reports, |report| {
                segment_of(&tracks, report)
                    .zip(ascents_of(report))
                    .map(|(segment, ascents)| format_ascents(&ascents, segment))
                    .unwrap_or_default()
            });
            print!("{}", text);
        }
        Format::Json => {
            let output: Vec<SegmentOutput> = reports
                .iter()
                .map(|report| SegmentOutput {
                    report,
                    ascents: ascents_of(report),
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&output).context("failed to serialize reports")?
            );
        }
    }

    Ok(())
}

/// The input segment a report was computed from (indices are 1-based).
fn segment_of<'a>(tracks: &'a [Track], report: &SegmentReport) -> Option<&'a Segment> {
    tracks
        .get(report.track_index.checked_sub(1)?)?
        .get(report.segment_index.checked_sub(1)?)
}

fn format_ascents(ascents: &[Ascent], segment: &[GpsPoint]) -> String {
    if ascents.is_empty() {
        return "  No ascents\n".to_string();
    }
    ascents
        .iter()
        .map(|ascent| {
            let gain = ascent
                .elevation_gain(segment)
                .map_or_else(|| ELEVATION_NOT_AVAILABLE.to_string(), |g| format!("{:+.1} m", g));
            format!(
                "  Ascent: points {} to {} ({})\n",
                ascent.start_index + 1,
                ascent.stop_index + 1,
                gain
            )
        })
        .collect()
}
