//! Pipeline command line: four file-to-file stages driven by one TOML
//! configuration.

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "walkshed", version, about = "Pedestrian accessibility analysis pipeline")]
struct Cli {
    /// Run configuration
    #[arg(short, long, default_value = "walkshed.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Retrieve POI categories from the Overpass API
    Pois,
    /// Compute walking isochrones for every retrieved POI
    Isochrones,
    /// Stack isochrone layers into a coverage GeoTIFF
    Rasterize,
    /// Accumulate building-to-POI route frequencies per street edge
    Routes,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = Config::load(&cli.config).and_then(|config| match cli.command {
        Command::Pois => commands::pois(&config),
        Command::Isochrones => commands::isochrones(&config),
        Command::Rasterize => commands::rasterize(&config),
        Command::Routes => commands::routes(&config),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
