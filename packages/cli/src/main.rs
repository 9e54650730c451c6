#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line tools for the food map sync engine.
//!
//! ```text
//! food_map health
//! food_map watch-health [--interval 60]
//! food_map locate [--collection locations|suppliers] [--concurrency N]
//! food_map project [--collection locations|suppliers] [--categories A,B] [--output file]
//! food_map scores [--limit 20]
//! food_map normalize <address>
//! food_map serve
//! ```
//!
//! Uses `indicatif-log-bridge` (via [`food_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "food_map", about = "Food map geocoding and layer tools")]
struct Cli {
    /// Dashboard record API base URL (overrides `FOOD_MAP_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// A locatable record collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Collection {
    Locations,
    Suppliers,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the record API answers
    Health,
    /// Poll the record API health endpoint until interrupted
    WatchHealth {
        /// Seconds between checks
        #[arg(long, default_value = "60")]
        interval: u64,
    },
    /// Geocode records missing coordinates and write the results back
    Locate {
        #[arg(long, value_enum, default_value = "locations")]
        collection: Collection,
        /// Geocoding lookups in flight at once (defaults to the service limit)
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Emit a collection as a GeoJSON feature collection
    Project {
        #[arg(long, value_enum, default_value = "locations")]
        collection: Collection,
        /// Comma-separated location categories to keep
        #[arg(long)]
        categories: Option<String>,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Geocoding lookups in flight at once (defaults to the service limit)
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Print zip regions ranked by need score
    Scores {
        /// Maximum number of regions to show
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show the geocoding query built from an address
    Normalize {
        /// Free-text address
        address: String,
    },
    /// Start the map API server
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = food_map_cli_utils::init_logger();
    let cli = Cli::parse();
    let api_url = cli
        .api_url
        .unwrap_or_else(food_map_store::api_url_from_env);

    match cli.command {
        Commands::Health => {
            let status = commands::health(&api_url).await;
            println!("{status}");
            if !status.is_connected() {
                std::process::exit(1);
            }
        }
        Commands::WatchHealth { interval } => {
            commands::watch_health(&api_url, interval, &multi).await;
        }
        Commands::Locate {
            collection,
            concurrency,
        } => {
            commands::locate(&api_url, collection, concurrency, &multi).await?;
        }
        Commands::Project {
            collection,
            categories,
            output,
            concurrency,
        } => {
            let features = commands::project(
                &api_url,
                collection,
                categories.as_deref(),
                concurrency,
                &multi,
            )
            .await?;
            let json = serde_json::to_string_pretty(&features)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!(
                        "Wrote {} features to {}",
                        features.features.len(),
                        path.display()
                    );
                }
                None => println!("{json}"),
            }
        }
        Commands::Scores { limit } => {
            let scores = commands::scores(&api_url).await?;
            print!("{}", commands::format_scores(&scores, limit));
        }
        Commands::Normalize { address } => {
            println!("{}", commands::normalize(&address)?);
        }
        Commands::Serve => {
            let mut config = food_map_server::ServerConfig::from_env();
            config.api_url = api_url;
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(food_map_server::run_server(config))
            })
            .await??;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn watch_health_defaults_to_a_minute() {
        let cli = Cli::parse_from(["food_map", "watch-health"]);
        assert!(matches!(cli.command, Commands::WatchHealth { interval: 60 }));
    }

    #[test]
    fn locate_takes_collection_and_global_api_url() {
        let cli = Cli::parse_from([
            "food_map",
            "locate",
            "--collection",
            "suppliers",
            "--api-url",
            "http://example.test/api",
        ]);
        assert_eq!(cli.api_url.as_deref(), Some("http://example.test/api"));
        assert!(matches!(
            cli.command,
            Commands::Locate {
                collection: Collection::Suppliers,
                concurrency: None,
            }
        ));
    }
}
