//! Sone Store - Local filesystem datastore
//!
//! Provides:
//! - A `FreenetInterface` implementation that publishes manifests to disk
//! - Edition tracking per insert key and document name
//! - Atomic writes: an edition is either complete on disk or absent

pub mod datastore;
pub mod errors;

// Re-export key types
pub use datastore::LocalDatastore;
pub use errors::Result;
