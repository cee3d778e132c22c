#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for Montreal street resolution.
//!
//! Works on already-downloaded city data: the geobase map (`--catalog`),
//! the street-side polylines (`--geometry`) and optionally a planification
//! feed (`--planifications`).
//!
//! Uses `indicatif-log-bridge` (via [`snow_removal_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and loading spinners never fight for the terminal.

mod track;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use snow_removal_address::{expand_street_types, parse};
use snow_removal_catalog::{Snapshot, StreetCatalog};
use snow_removal_cli_utils::{LoadingSpinner, MultiProgress};
use snow_removal_planification::{PlanificationBook, PlanificationFeed};
use snow_removal_planification_models::Timestamp;
use snow_removal_resolver::{ResolverConfig, StreetData};
use snow_removal_spatial::StreetGeometryIndex;
use snow_removal_street_models::StreetSideId;

#[derive(Parser)]
#[command(name = "snow_removal", about = "Montreal street resolution and snow removal status")]
struct Cli {
    /// Geobase map JSON (street sides keyed by id)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    /// Street-side polylines (`GeoJSON` `FeatureCollection`)
    #[arg(long, global = true)]
    geometry: Option<PathBuf>,
    /// Resolver settings (TOML); defaults to the built-in Montreal settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Planification feed JSON
    #[arg(long, global = true)]
    planifications: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a free-text address into number, street name and type
    Parse {
        /// Address, e.g. "1234 rue Saint-Denis"
        address: String,
    },
    /// Search the catalog for a street name
    Search {
        /// Street name (accents and case are ignored)
        name: String,
        /// Civic number used to rank street sides whose range contains it
        #[arg(long)]
        number: Option<u32>,
    },
    /// Find the street side closest to a GPS coordinate
    Nearest {
        latitude: f64,
        longitude: f64,
    },
    /// Resolve newline-delimited JSON location updates read from stdin
    Track {
        /// Name of the tracked source, used in logs
        #[arg(long, default_value = "vehicle")]
        source: String,
    },
    /// Show the snow removal status of a street side
    Status {
        /// Street side id (`COTE_RUE_ID`)
        id: StreetSideId,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = snow_removal_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ResolverConfig::load(path)?,
        None => ResolverConfig::default(),
    };

    match cli.command {
        Commands::Parse { address } => {
            let Some(parsed) = parse(&address) else {
                println!("Could not parse {address:?}");
                return Ok(());
            };
            println!("number:   {}", display_option(parsed.number));
            println!("name:     {}", parsed.name);
            println!("type:     {}", display_option(parsed.street_type.as_deref()));
            let synonyms = expand_street_types(parsed.street_type.as_deref());
            if !synonyms.is_empty() {
                println!("synonyms: {}", synonyms.join(", "));
            }
        }
        Commands::Search { name, number } => {
            let path = required(cli.catalog.as_deref(), "--catalog")?;
            let catalog = load_catalog(&multi, path)?;

            let matches = catalog.search(number, &name);
            if matches.is_empty() {
                println!("No street matches {name:?}");
            }
            println!("{:<10} {:>5} {:<8} NAME", "ID", "SCORE", "IN RANGE");
            println!("{}", "-".repeat(60));
            for hit in &matches {
                println!(
                    "{:<10} {:>5} {:<8} {}",
                    hit.id,
                    hit.score,
                    if hit.in_range { "yes" } else { "" },
                    catalog.full_street_name(hit.id)
                );
            }
        }
        Commands::Nearest {
            latitude,
            longitude,
        } => {
            let path = required(cli.geometry.as_deref(), "--geometry")?;
            let geometry = load_geometry(&multi, path)?;
            let catalog = match cli.catalog.as_deref() {
                Some(path) => load_catalog(&multi, path)?,
                None => StreetCatalog::default(),
            };
            let data = StreetData::new(catalog, geometry);

            let Some(hit) =
                data.nearest_within(latitude, longitude, config.match_threshold_meters)
            else {
                println!(
                    "No street within {:.0}m of ({latitude}, {longitude})",
                    config.match_threshold_meters
                );
                return Ok(());
            };

            println!("id:       {}", hit.id);
            if data.catalog().is_loaded() {
                println!("street:   {}", data.catalog().full_street_name(hit.id));
            }
            println!("side:     {}", display_option(hit.side.as_deref()));
            println!("distance: {:.1}m", hit.distance_m);
            println!("position: {:.0}%", hit.position_ratio * 100.0);
            if let Some(center) = data.geometry().center(hit.id) {
                println!("center:   {:.6}, {:.6}", center.latitude, center.longitude);
            }
        }
        Commands::Track { source } => {
            let catalog = match cli.catalog.as_deref() {
                Some(path) => load_catalog(&multi, path)?,
                None => {
                    log::warn!("No --catalog given, addresses will not resolve");
                    StreetCatalog::default()
                }
            };
            let geometry = match cli.geometry.as_deref() {
                Some(path) => load_geometry(&multi, path)?,
                None => {
                    log::warn!("No --geometry given, GPS coordinates will not resolve");
                    StreetGeometryIndex::default()
                }
            };
            let feed = cli
                .planifications
                .as_deref()
                .map(PlanificationFeed::load)
                .transpose()?;

            let data = Arc::new(Snapshot::new(StreetData::new(catalog, geometry)));
            let stdin = std::io::stdin().lock();
            let stdout = std::io::stdout().lock();
            track::run(&source, data, config, feed.as_ref(), stdin, stdout)?;
        }
        Commands::Status { id } => {
            let path = required(cli.planifications.as_deref(), "--planifications")?;
            let feed = PlanificationFeed::load(path)?;

            let mut book = PlanificationBook::new();
            book.track(id);
            book.apply(feed.records);

            if let Some(path) = cli.catalog.as_deref() {
                println!("{}", load_catalog(&multi, path)?.full_street_name(id));
            }

            let now = Timestamp::from(chrono::Local::now());
            match book.status(id, &now) {
                Some(status) => println!("{}", serde_json::to_string_pretty(&status)?),
                None => println!("No planification for street side {id}"),
            }
        }
    }

    Ok(())
}

fn required<'a>(path: Option<&'a Path>, flag: &str) -> Result<&'a Path, String> {
    path.ok_or_else(|| format!("{flag} is required for this command"))
}

fn load_catalog(
    multi: &MultiProgress,
    path: &Path,
) -> Result<StreetCatalog, snow_removal_catalog::CatalogError> {
    let spinner = LoadingSpinner::start(multi, "Loading street catalog...");
    let catalog = match StreetCatalog::load(path) {
        Ok(catalog) => catalog,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e);
        }
    };
    spinner.finish(&format!("Loaded {} street sides", catalog.len()));
    Ok(catalog)
}

fn load_geometry(
    multi: &MultiProgress,
    path: &Path,
) -> Result<StreetGeometryIndex, snow_removal_spatial::GeometryError> {
    let spinner = LoadingSpinner::start(multi, "Loading street geometry...");
    let geometry = match StreetGeometryIndex::load(path) {
        Ok(geometry) => geometry,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e);
        }
    };
    spinner.finish(&format!("Loaded {} street geometries", geometry.len()));
    Ok(geometry)
}

fn display_option<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
