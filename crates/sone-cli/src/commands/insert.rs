//! Insert command
//!
//! Usage: sone-cli insert --sone <FILE> [--store <DIR>]

use clap::Args;
use sone_core::{InsertOutcome, InserterConfig, SoneConfig, SoneInserter};

use super::TargetArgs;

#[derive(Debug, Args)]
pub struct InsertArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

/// Run a single inserter tick and print the final URI
pub fn execute(args: InsertArgs, config: &SoneConfig) -> Result<(), Box<dyn std::error::Error>> {
    let sone = args.target.load_sone()?;
    let store = args.target.open_store(config);
    let mut inserter = SoneInserter::new(sone, store, InserterConfig::from(&config.inserter));

    match inserter.run_once() {
        InsertOutcome::Inserted { final_uri, .. } => {
            println!("{}", final_uri);
            Ok(())
        }
        InsertOutcome::Failed { error } => Err(error.into()),
        InsertOutcome::Idle => Err("Sone has no changes to insert".into()),
    }
}
