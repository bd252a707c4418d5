//! CLI subcommands

pub mod insert;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use sone_core::{SoneConfig, SoneDefinition, SoneHandle};
use sone_store::LocalDatastore;

/// Which Sone to publish and where
#[derive(Debug, Args)]
pub struct TargetArgs {
    /// JSON file describing the Sone
    #[arg(long)]
    pub sone: PathBuf,

    /// Datastore directory (defaults to `store.root` from configuration)
    #[arg(long)]
    pub store: Option<PathBuf>,
}

impl TargetArgs {
    /// Load the Sone, marked as modified so the first tick publishes it
    pub fn load_sone(&self) -> Result<SoneHandle, Box<dyn std::error::Error>> {
        let mut sone = SoneDefinition::load(&self.sone)?.into_sone();
        sone.mark_modified();
        Ok(SoneHandle::new(sone))
    }

    pub fn open_store(&self, config: &SoneConfig) -> Arc<LocalDatastore> {
        let root = self
            .store
            .clone()
            .unwrap_or_else(|| config.store.root.clone());
        Arc::new(LocalDatastore::new(root))
    }
}
