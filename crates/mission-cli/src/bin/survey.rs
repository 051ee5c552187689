//! CLI tool to generate survey missions.
//!
//! Builds a lawn-mower, spiral or rectangle mission over an area and writes
//! it as a mission document.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use mission_cli::config::Config;
use mission_cli::{init_tracing, parse_lat_lon};
use mission_core::{
    generate_survey, rect_by_3_points, rectangle_tracks, save, to_xml_string, track_to_mission,
    LatLon, Mission, SpiralDirection, SurveyPattern,
};
use std::path::PathBuf;

/// Generate a survey mission document
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    pattern: PatternArgs,

    /// Write the mission here instead of stdout
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum PatternArgs {
    /// Back-and-forth legs parallel to P0 -> P1
    Lawnmower {
        #[command(flatten)]
        area: AreaArgs,

        /// Perpendicular legs added after the main sweep
        #[arg(long, default_value_t = 0)]
        across: u32,
    },
    /// Rectangular spiral over the area
    Spiral {
        #[command(flatten)]
        area: AreaArgs,

        /// Finish at P0 instead of starting there
        #[arg(long)]
        outward: bool,
    },
    /// Perimeter of the rectangle with side P1 -> P2 on P3's side
    Rectangle {
        #[arg(long, value_parser = parse_lat_lon)]
        p1: LatLon,
        #[arg(long, value_parser = parse_lat_lon)]
        p2: LatLon,
        #[arg(long, value_parser = parse_lat_lon)]
        p3: LatLon,

        /// Corner to start from (0-3)
        #[arg(long, default_value_t = 0)]
        start: usize,
    },
}

#[derive(clap::Args, Debug)]
struct AreaArgs {
    /// Start corner as "lat,lon"
    #[arg(long, value_parser = parse_lat_lon)]
    p0: LatLon,

    /// End of the along-track edge
    #[arg(long, value_parser = parse_lat_lon)]
    p1: LatLon,

    /// End of the across-track edge
    #[arg(long, value_parser = parse_lat_lon)]
    p2: LatLon,

    /// Distance between parallel legs in meters
    #[arg(long, default_value_t = 10.0)]
    spacing: f64,
}

fn build_mission(pattern: PatternArgs, config: &Config) -> anyhow::Result<Mission> {
    let geo = config.geodesy.geodesy();
    let params = config.survey_params();

    let (area, survey) = match pattern {
        PatternArgs::Lawnmower { area, across } => (
            area,
            SurveyPattern::Lawnmower {
                num_across_tracks: across,
            },
        ),
        PatternArgs::Spiral { area, outward } => {
            let direction = if outward {
                SpiralDirection::Outward
            } else {
                SpiralDirection::Inward
            };
            (area, SurveyPattern::Spiral { direction })
        }
        PatternArgs::Rectangle { p1, p2, p3, start } => {
            let corners = rect_by_3_points(geo, p1, p2, p3)
                .ok_or_else(|| anyhow!("the three points are collinear"))?;
            let waypoints = rectangle_tracks(corners, start)
                .ok_or_else(|| anyhow!("start corner must be 0-3, got {}", start))?;
            return Ok(track_to_mission(&waypoints, &params));
        }
    };

    generate_survey(geo, [area.p0, area.p1, area.p2], area.spacing, survey, &params)
        .ok_or_else(|| anyhow!("cannot build a {:?} survey with spacing {}", survey, area.spacing))
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let args = Args::parse();
    let config = Config::from_env();
    tracing::debug!("Using {:?}", config);

    let mission = build_mission(args.pattern, &config)?;
    tracing::info!("Generated mission with {} steps", mission.len());

    match args.output {
        Some(path) => {
            save(&mission, &path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {} steps to {}", mission.len(), path.display());
        }
        None => print!("{}", to_xml_string(&mission)?),
    }
    Ok(())
}
