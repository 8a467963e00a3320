use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use purse_core::config::{ConfigRepository, PurseConfig};
use purse_infrastructure::TomlConfigRepository;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "purse")]
#[command(about = "PURSE CLI - Purchase session core sandbox", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.config/purse/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command script against the fixture-driven sandbox backend
    Sandbox {
        /// JSON fixture seeding products and owned purchases
        #[arg(long)]
        fixture: PathBuf,
        /// Script with one command per line
        script: PathBuf,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the resolved configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let repository = match &cli.config {
        Some(path) => TomlConfigRepository::with_path(path),
        None => TomlConfigRepository::new().context("Failed to resolve config path")?,
    };
    let config = repository
        .load()
        .await
        .with_context(|| format!("Failed to load config {}", repository.path().display()))?;

    init_logging(&config);

    match cli.command {
        Commands::Sandbox { fixture, script } => {
            commands::sandbox::execute(&fixture, &script, config.session).await?
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&config, repository.path())?,
        },
    }

    Ok(())
}

/// Logs go to stderr so stdout stays a clean JSON line stream.
fn init_logging(config: &PurseConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
