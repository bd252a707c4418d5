//! Local datastore
//!
//! Provides:
//! - Filesystem publishing with atomic, all-or-nothing editions
//! - Sharding by the first 2 hex chars of the key digest
//! - Digest-checked reads of published entries

mod atomic;
mod layout;
mod local;

pub use layout::key_digest;
pub use local::{EditionIndex, IndexedEntry, LocalDatastore, StoredEntry};
