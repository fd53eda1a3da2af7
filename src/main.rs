mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sigenrich::config::SigenrichConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sigenrich", version, about = "Semantic signature enrichment for gene summaries")]
struct Cli {
    /// Config file (defaults to ~/.sigenrich/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rank a set of item texts against the signature catalog and write reports
    Run(cli::run::RunArgs),
    /// Rank a single ad-hoc text and print the top matches
    Rank(cli::rank::RankArgs),
    /// List supported embedding models
    Models,
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
    /// Check configuration, model files and the signature catalog
    Doctor,
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download a model to ~/.sigenrich/models/<name>/
    Download {
        /// Model name (defaults to the configured model)
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SigenrichConfig::load_from(path)?,
        None => SigenrichConfig::load()?,
    };

    // Log to stderr so stdout stays clean for results.
    let filter = EnvFilter::try_new(&config.logging.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Run(args) => cli::run::run(config, args).await?,
        Command::Rank(args) => cli::rank::rank(config, args).await?,
        Command::Models => cli::list_models(&config.embedding),
        Command::Model { action } => match action {
            ModelAction::Download { model } => {
                let mut embedding = config.embedding.clone();
                if let Some(model) = model {
                    embedding.model = model;
                }
                cli::model_download(&embedding).await?;
            }
        },
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
