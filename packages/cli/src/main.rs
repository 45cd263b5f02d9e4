#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line tools for pothole reports.
//!
//! Zones coordinates, estimates where a pothole seen in a photo sits, walks
//! the reporter through the candidates found in a photo one at a time, and
//! summarizes or exports a JSON dump of reports.

mod reports;
mod review;

use std::path::{Path, PathBuf};

use baches_analytics::{summary, to_geojson, weekly_summary, zone_stats};
use baches_detection::{parse_inference_response, propose};
use baches_geography::{Municipality, distance_meters, try_estimate};
use baches_report_models::{Coordinate, QualitativeDistance, QualitativePosition};
use chrono::Utc;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "baches", about = "Pothole report tools")]
struct Cli {
    /// Municipality config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the zone of a coordinate
    Classify {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// Estimate the coordinate of a pothole seen from a known point
    Estimate {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Position in the frame (center, left, right, up, down)
        #[arg(long, default_value = "center")]
        position: String,
        /// Distance from the camera (near, medium, far)
        #[arg(long, default_value = "near")]
        distance: String,
        /// Camera heading in degrees clockwise from north
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        heading: f64,
    },
    /// Review the detections for one photo and keep the confirmed ones
    Propose {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Camera heading in degrees clockwise from north
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        heading: f64,
        /// File with the inference service's answer
        #[arg(long)]
        detections: PathBuf,
        /// Street or landmark for the reports
        #[arg(long)]
        street: String,
        /// URL of the uploaded photo
        #[arg(long)]
        photo_url: Option<String>,
        /// Append confirmed reports to this JSON file instead of printing them
        #[arg(long)]
        output: Option<PathBuf>,
        /// List the candidates without prompting or writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Summarize a JSON file of reports
    Stats {
        #[arg(long)]
        input: PathBuf,
        /// Only the last seven days
        #[arg(long)]
        weekly: bool,
        /// Per-zone severity breakdown instead of the overall summary
        #[arg(long, conflicts_with = "weekly")]
        zones: bool,
    },
    /// Export a JSON file of reports as a GeoJSON FeatureCollection
    Geojson {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let municipality = Municipality::resolve(cli.config.as_deref())?;
    let classifier = municipality.classifier();

    match cli.command {
        Commands::Classify { lat, lng } => {
            let point = Coordinate::new(lat, lng).validated()?;
            let zone = classifier.classify(point);
            println!("{zone} ({})", zone.legacy_label());
        }
        Commands::Estimate {
            lat,
            lng,
            position,
            distance,
            heading,
        } => {
            let base = Coordinate::new(lat, lng).validated()?;
            let position = QualitativePosition::from_label(&position);
            let distance = QualitativeDistance::from_label(&distance);
            let point = try_estimate(base, position, distance, heading)?;
            println!("{point}");
            println!("zone: {}", classifier.classify(point));
            println!("displacement: {:.1} m", distance_meters(base, point));
        }
        Commands::Propose {
            lat,
            lng,
            heading,
            detections,
            street,
            photo_url,
            output,
            dry_run,
        } => {
            let base = Coordinate::new(lat, lng).validated()?;
            let answer = std::fs::read_to_string(&detections)?;
            let detections = parse_inference_response(&answer)?;
            let mut set = propose(base, heading, detections, &classifier)?;

            if set.is_empty() {
                println!("No potholes detected.");
                return Ok(());
            }
            if dry_run {
                review::list(&set);
                return Ok(());
            }

            review::review(&mut set)?;
            let records = set.commit(&street, photo_url.as_deref(), Utc::now())?;
            if records.is_empty() {
                println!("Nothing confirmed, no reports written.");
                return Ok(());
            }

            match output {
                Some(path) => {
                    let total = reports::append(&path, &records, &classifier)?;
                    println!(
                        "Wrote {} report(s) to {} ({total} total)",
                        records.len(),
                        path.display()
                    );
                }
                None => println!("{}", serde_json::to_string_pretty(&records)?),
            }
        }
        Commands::Stats {
            input,
            weekly,
            zones,
        } => {
            let reports = reports::read(&input, &classifier)?;
            let now = Utc::now();
            let json = if weekly {
                serde_json::to_string_pretty(&weekly_summary(&reports, now))?
            } else if zones {
                serde_json::to_string_pretty(&zone_stats(&reports))?
            } else {
                serde_json::to_string_pretty(&summary(&reports, now))?
            };
            println!("{json}");
        }
        Commands::Geojson { input, output } => {
            let reports = reports::read(&input, &classifier)?;
            let json = serde_json::to_string_pretty(&to_geojson(&reports))?;
            write_or_print(output.as_deref(), &json)?;
        }
    }

    Ok(())
}

fn write_or_print(path: Option<&Path>, contents: &str) -> std::io::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, contents)?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{contents}"),
    }
    Ok(())
}
