//! Watch command
//!
//! Usage: sone-cli watch --sone <FILE> [--store <DIR>] [--duration-secs <N>]
//!        [--insertion-delay-secs <N>]

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use sone_core::options::{OptionWatcher, INSERTION_DELAY};
use sone_core::{FreenetUri, InsertListener, InserterRegistry, Options, SoneConfig, SoneError};

use super::TargetArgs;

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// How long to keep the Sone published before exiting
    #[arg(long, default_value_t = 60)]
    pub duration_secs: u64,

    /// Override the configured poll interval
    #[arg(long)]
    pub insertion_delay_secs: Option<u64>,
}

struct LogOptionChange;

impl OptionWatcher<u64> for LogOptionChange {
    fn option_changed(&self, name: &str, old_value: &u64, new_value: &u64) {
        tracing::info!(option = name, old = old_value, new = new_value, "option changed");
    }
}

/// Prints one line per finished insert attempt
struct ConsoleListener;

impl InsertListener for ConsoleListener {
    fn sone_inserted(&self, sone_id: &str, final_uri: &FreenetUri, duration: Duration) {
        println!(
            "inserted {} at {} ({} ms)",
            sone_id,
            final_uri,
            duration.as_millis()
        );
    }

    fn sone_insert_aborted(&self, sone_id: &str, error: &SoneError) {
        eprintln!("insert of {} failed: {}", sone_id, error);
    }
}

/// Track the Sone in a registry for the requested time, then stop
pub fn execute(args: WatchArgs, config: &SoneConfig) -> Result<(), Box<dyn std::error::Error>> {
    let sone = args.target.load_sone()?;
    let sone_id = sone.id().to_string();
    let store = args.target.open_store(config);
    let options = Options::from_config(config)?;
    let insertion_delay = options.integer_option(INSERTION_DELAY)?;
    insertion_delay.add_watcher(Arc::new(LogOptionChange))?;
    if let Some(secs) = args.insertion_delay_secs {
        insertion_delay.set(Some(secs))?;
    }

    let mut registry =
        InserterRegistry::new(store, &options, config.inserter.default_document.clone())?;
    registry.add_listener(Arc::new(ConsoleListener));
    registry.add_sone(sone)?;

    std::thread::sleep(Duration::from_secs(args.duration_secs));

    registry.stop_all()?;
    println!("stopped watching {}", sone_id);
    Ok(())
}
