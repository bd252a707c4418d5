//! The network-insert capability
//!
//! The inserter only needs one thing from the network layer: publish a
//! directory of documents under a key and say where it ended up.

use crate::errors::Result;
use crate::manifest::Manifest;
use crate::model::FreenetUri;

/// Publishes manifests to the network
///
/// Implementations block until the insert has completed or failed. They are
/// shared between inserter threads.
pub trait FreenetInterface: Send + Sync {
    /// Insert `manifest` as a directory under `insert_uri`
    ///
    /// `default_document` names the manifest entry served for the bare key.
    /// Returns the URI the directory was finally published at.
    ///
    /// # Errors
    ///
    /// Returns `SoneError::InsertionFailed` on any network or storage
    /// problem.
    fn insert_directory(
        &self,
        insert_uri: &FreenetUri,
        manifest: &Manifest,
        default_document: &str,
    ) -> Result<FreenetUri>;
}
