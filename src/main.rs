// src/main.rs

//! Mention harvester CLI.
//!
//! Local execution entry point: harvest all configured sources, validate
//! configuration, or show what a run would cover.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use harvester::error::Result;
use harvester::models::Config;
use harvester::pipeline::run_harvest;
use harvester::storage::LocalStorage;

/// Mention harvester
#[derive(Parser, Debug)]
#[command(
    name = "harvester",
    version,
    about = "Harvests public mentions of competing services into one normalized record set"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the harvest across all enabled sources
    Harvest {
        /// Override the output snapshot path
        #[arg(short, long)]
        output: Option<String>,

        /// Restrict the run to these source ids (repeatable)
        #[arg(long = "source")]
        sources: Vec<String>,
    },

    /// Validate the configuration file
    Validate,

    /// Show what a run would cover
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Harvest { output, sources } => {
            if let Some(path) = output {
                config.output.path = path;
            }
            if !sources.is_empty() {
                config.sources.retain(|s| sources.contains(&s.id));
            }

            let cancel = CancellationToken::new();
            let interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("interrupt received; letting in-flight work finish...");
                    interrupt.cancel();
                }
            });

            let storage = LocalStorage::new(&config.output.path);
            let summary = run_harvest(&config, &storage, cancel).await?;

            log::info!(
                "Done: {} records from {} sources -> {}",
                summary.records,
                summary.sources.len(),
                summary.location
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {e}");
                return Err(e);
            }
            log::info!(
                "Config OK ({} sources, {} keywords)",
                config.sources.len(),
                config.all_keywords().len()
            );
        }

        Command::Info => {
            log::info!("Company: {}", config.company);
            log::info!("Output: {}", config.output.path);
            log::info!("Keywords: {} across {} groups", config.all_keywords().len(), config.keywords.len());
            for source in &config.sources {
                let kind = if source.is_search() {
                    "search".to_string()
                } else {
                    format!("{} fixed urls", source.urls.len())
                };
                log::info!(
                    "  {} [{}] {} ({kind}){}",
                    source.id,
                    source.source_type,
                    source.platform,
                    if source.enabled { "" } else { " - disabled" }
                );
            }
        }
    }

    Ok(())
}
