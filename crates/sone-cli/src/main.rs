//! Sone CLI
//!
//! Command-line interface for publishing Sones to a local datastore

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sone_core::logging_facility;
use sone_core::SoneConfig;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "sone-cli")]
#[command(about = "Sone - publish Sone profiles", long_about = None)]
struct Cli {
    /// TOML configuration file; SONE_* environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Publish a Sone once and print its URI
    Insert(commands::insert::InsertArgs),
    /// Keep a Sone published for a while
    Watch(commands::watch::WatchArgs),
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = SoneConfig::load(cli.config.as_deref())?;
    logging_facility::init(config.logging.profile);

    match cli.command {
        Commands::Insert(args) => commands::insert::execute(args, &config),
        Commands::Watch(args) => commands::watch::execute(args, &config),
    }
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
