//! Command-line interface parsing for Nalssi
//!
//! This module handles parsing of CLI arguments using clap: the global
//! connection and cache flags, one subcommand per service operation, and the
//! conversion of parsed arguments into a [`Config`].

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::config::Config;
use crate::data::weather::OPENWEATHERMAP_BASE_URL;
use crate::data::Coordinate;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The value is not a number
    #[error("Invalid coordinate: '{0}' is not a number")]
    NotANumber(String),

    /// The value is outside the valid range for its axis
    #[error("Invalid {axis}: {value} is outside {min}..={max}")]
    OutOfRange {
        axis: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Nalssi - Weather lookups with caching and offline fallback
#[derive(Parser, Debug)]
#[command(name = "nalssi")]
#[command(about = "Weather lookups with caching and offline fallback")]
#[command(version)]
pub struct Cli {
    /// OpenWeatherMap API key; without one, weather data is synthesized
    #[arg(long, env = "OPENWEATHERMAP_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// API host
    #[arg(long, default_value = OPENWEATHERMAP_BASE_URL, global = true)]
    pub base_url: String,

    /// Unit system requested from the API
    #[arg(long, default_value = "metric", global = true)]
    pub units: String,

    /// Response language requested from the API
    #[arg(long, default_value = "kr", global = true)]
    pub lang: String,

    /// Per-request timeout in seconds
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    pub timeout_secs: u64,

    /// Directory for the on-disk cache (defaults to the XDG cache directory)
    #[arg(long, value_name = "DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Keep the cache in memory for this run only
    #[arg(long, global = true, conflicts_with = "cache_dir")]
    pub no_disk_cache: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations exposed on the command line
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search for places by name
    ///
    /// Examples:
    ///   nalssi search seoul
    ///   nalssi search "new york" --limit 1
    Search {
        query: String,
        /// Maximum number of matches
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Current conditions at a coordinate
    Current {
        #[command(flatten)]
        coords: CoordArgs,
        /// Label to report instead of the provider's place name
        #[arg(long, value_name = "LABEL")]
        name: Option<String>,
    },
    /// Hourly and daily forecast at a coordinate
    Forecast(CoordArgs),
    /// Current conditions and forecast, fetched together
    Overview(CoordArgs),
    /// Name of the place nearest a coordinate
    Reverse(CoordArgs),
    /// Inspect or clear the cache
    #[command(subcommand)]
    Cache(CacheCommand),
}

/// Cache administration
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCommand {
    /// Show entry count, size and oldest/newest keys
    Info,
    /// Remove every cached entry
    Clear,
}

/// A latitude/longitude pair given as two positional arguments
#[derive(Args, Debug, Clone, Copy)]
pub struct CoordArgs {
    /// Latitude in decimal degrees
    #[arg(allow_negative_numbers = true, value_parser = parse_latitude)]
    pub lat: f64,
    /// Longitude in decimal degrees
    #[arg(allow_negative_numbers = true, value_parser = parse_longitude)]
    pub lon: f64,
}

impl CoordArgs {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

fn parse_axis(s: &str, axis: &'static str, limit: f64) -> Result<f64, CliError> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| CliError::NotANumber(s.to_string()))?;

    if !value.is_finite() {
        return Err(CliError::NotANumber(s.to_string()));
    }
    if !(-limit..=limit).contains(&value) {
        return Err(CliError::OutOfRange {
            axis,
            value,
            min: -limit,
            max: limit,
        });
    }
    Ok(value)
}

/// Parses a latitude argument, accepting -90 to 90
pub fn parse_latitude(s: &str) -> Result<f64, CliError> {
    parse_axis(s, "latitude", 90.0)
}

/// Parses a longitude argument, accepting -180 to 180
pub fn parse_longitude(s: &str) -> Result<f64, CliError> {
    parse_axis(s, "longitude", 180.0)
}

impl Config {
    /// Creates a Config from parsed CLI arguments
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            api_key: cli.api_key.clone(),
            base_url: cli.base_url.clone(),
            units: cli.units.clone(),
            lang: cli.lang.clone(),
            request_timeout: Duration::from_secs(cli.timeout_secs),
            cache_dir: cli.cache_dir.clone(),
            memory_cache: cli.no_disk_cache,
        }
    }
}
