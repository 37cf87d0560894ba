use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsroom_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "newsroom")]
#[command(author, version, about = "Curated, AI-summarized news digests")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one curation cycle now and save the result
    Refresh,
    /// Background daemon that keeps the snapshot fresh
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
    /// Show the curated articles of a category
    Show {
        /// Category name, e.g. `technology`
        category: String,
    },
    /// Search titles and summaries across all categories
    Search {
        query: String,
    },
    /// List configured categories and their feeds
    Categories,
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum DaemonAction {
    /// Start the background daemon
    Start,
    /// Stop the background daemon
    Stop,
    /// Check daemon status
    Status,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file path
    Path,
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Load the configuration and start logging at its level
fn load_config() -> Result<Arc<AppConfig>> {
    let config = AppConfig::load()?;
    init_tracing(&config.general.log_level);
    Ok(Arc::new(config))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Refresh => {
            let config = load_config()?;
            commands::refresh::run(&config).await
        }
        Commands::Daemon { action } => match action {
            DaemonAction::Start => commands::daemon::start(load_config()?).await,
            DaemonAction::Stop => commands::daemon::stop().await,
            DaemonAction::Status => commands::daemon::status().await,
        },
        Commands::Show { category } => {
            let config = load_config()?;
            commands::show::run(&config, &category)
        }
        Commands::Search { query } => {
            let config = load_config()?;
            commands::search::run(&config, &query)
        }
        Commands::Categories => {
            let config = load_config()?;
            commands::categories::run(&config)
        }
        // Config commands must work even when the current file does not load
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => commands::config::init(force),
            ConfigAction::Path => commands::config::path(),
        },
    }
}
