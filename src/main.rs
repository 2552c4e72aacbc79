//! Nalssi - Weather lookups from the command line
//!
//! Prints current conditions, forecasts and place searches as JSON. Results
//! are cached on disk and fall back to synthesized data when the weather API
//! is unreachable or no API key is configured.

use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use nalssi::cli::{CacheCommand, Cli, Command};
use nalssi::config::Config;
use nalssi::service::WeatherService;

/// Sets up logging to stderr, filtered by `RUST_LOG` (default: warnings)
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Writes a value to stdout as pretty-printed JSON
fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_cli(&cli);
    let service = WeatherService::from_config(&config)?;

    match cli.command {
        Command::Search { query, limit } => {
            print_json(&service.search_locations(&query, limit).await)?;
        }
        Command::Current { coords, name } => {
            let mut fetched = service.current_weather(coords.coordinate()).await;
            if let Some(name) = name {
                fetched.data = fetched.data.with_location(name);
            }
            print_json(&fetched)?;
        }
        Command::Forecast(args) => {
            print_json(&service.forecast(args.coordinate()).await)?;
        }
        Command::Overview(args) => {
            print_json(&service.overview(args.coordinate()).await)?;
        }
        Command::Reverse(args) => {
            // `null` when the API knows no place there
            let place = service.location_by_coords(args.coordinate()).await?;
            print_json(&place)?;
        }
        Command::Cache(CacheCommand::Info) => {
            let info = service.cache_info();
            print_json(&serde_json::json!({
                "count": info.count,
                "totalSizeKB": info.total_size_kb(),
                "oldestKey": info.oldest_key,
                "newestKey": info.newest_key,
            }))?;
        }
        Command::Cache(CacheCommand::Clear) => {
            let removed = service.clear_cache();
            print_json(&serde_json::json!({ "removed": removed }))?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
