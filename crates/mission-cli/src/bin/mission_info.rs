//! CLI tool to inspect a mission document.

use anyhow::Context;
use clap::Parser;
use mission_cli::config::Config;
use mission_cli::init_tracing;
use mission_cli::summary::MissionSummary;
use mission_core::MissionTrack;
use std::path::PathBuf;

/// Print step counts, length and duration of a mission file
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Mission XML file
    path: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let args = Args::parse();
    let config = Config::from_env();

    let track = MissionTrack::load(&args.path)
        .with_context(|| format!("failed to load {}", args.path.display()))?;
    let summary = MissionSummary::new(
        track.name().map(str::to_string),
        track.mission(),
        config.geodesy.geodesy(),
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }
    if let Some(error) = &summary.link_error {
        tracing::warn!("{}: {}", args.path.display(), error);
    }
    Ok(())
}
