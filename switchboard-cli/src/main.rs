use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use switchboard_models::ServiceFactory;
use switchboard_models::catalog::TomlCatalog;
use tracing::debug;

mod commands;
mod config;

use config::ConfigLoader;

#[derive(Parser)]
#[command(name = "switchboard", about = "Resolve AI models to ready-to-call services")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Model catalog file (defaults to the configured catalog)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which service a model resolves to
    Resolve(commands::resolve::ResolveArgs),
    /// Send a prompt to a model
    Send(commands::send::SendArgs),
    /// List supported providers
    Providers(commands::providers::ProvidersArgs),
    /// Manage provider credentials
    Credentials(commands::credentials::CredentialsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let factory = build_factory(cli.catalog)?;

    match cli.command {
        Commands::Resolve(args) => commands::resolve::run(&factory, args).await,
        Commands::Send(args) => commands::send::run(&factory, args).await,
        Commands::Providers(args) => commands::providers::run(&factory, args).await,
        Commands::Credentials(args) => commands::credentials::run(&factory, args).await,
    }
}

/// Composition root: one factory per process.
fn build_factory(catalog_override: Option<PathBuf>) -> Result<ServiceFactory> {
    let config = ConfigLoader::load()?;
    let catalog_path = catalog_override.unwrap_or(config.catalog.path);
    debug!(catalog = %catalog_path.display(), "building service factory");

    Ok(ServiceFactory::builder(Arc::new(TomlCatalog::new(catalog_path)))
        .config(config.factory)
        .build())
}
