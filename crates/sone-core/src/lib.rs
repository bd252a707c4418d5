//! Sone Core - publishing of local Sones
//!
//! This crate holds everything needed to keep a local Sone published:
//! - The Sone model, guarded by a single exclusive lock per Sone
//! - Manifest rendering from a detached snapshot
//! - The per-Sone inserter worker and a registry supervising them
//! - Runtime options, configuration loading and the logging facility
//!
//! The network itself sits behind the `FreenetInterface` trait.

pub mod config;
pub mod errors;
pub mod freenet;
pub mod inserter;
pub mod listener;
pub mod logging_facility;
pub mod manifest;
pub mod model;
pub mod options;
pub mod registry;
pub mod snapshot;

// Used by the exported logging macros
#[doc(hidden)]
pub use sone_core_types as core_types;
#[doc(hidden)]
pub use tracing;

// Re-export commonly used types
pub use config::SoneConfig;
pub use errors::{ExError, ExErrorKind, Result, SoneError};
pub use freenet::FreenetInterface;
pub use inserter::{InsertOutcome, InserterConfig, InserterHandle, InserterState, SoneInserter};
pub use listener::InsertListener;
pub use manifest::{build_manifest, Manifest, ManifestEntry};
pub use model::{FreenetUri, KeyType, Post, Reply, Sone, SoneDefinition, SoneHandle};
pub use options::{DefaultOption, Options};
pub use registry::InserterRegistry;
pub use snapshot::InsertSnapshot;
