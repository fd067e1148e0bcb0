//! docstash entry point.
//!
//! Logging goes to stderr so exported content can be piped from stdout.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use docstash_client::DocContext;
use docstash_core::AppConfig;

mod commands;

/// Local cache of remote documents, refreshed by fingerprint.
#[derive(Parser, Debug)]
#[command(name = "docstash", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Fetch documents whose cached copy is missing or stale.
    Preload(commands::PreloadArgs),
    /// Report which cached documents are stale.
    Check(commands::CheckArgs),
    /// Print or save one document.
    Export(commands::ExportArgs),
}

impl Commands {
    fn needs_network(&self) -> bool {
        !matches!(self, Commands::Export(args) if args.offline)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;
    if cli.command.needs_network() {
        config.require_access_token()?;
    }
    let ctx = DocContext::from_config(&config)?;

    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Commands::Preload(args) => commands::preload(&ctx, args, &mut stdout),
        Commands::Check(args) => commands::check(&ctx, args, &mut stdout),
        Commands::Export(args) => commands::export(&ctx, args, &mut stdout),
    }
}
