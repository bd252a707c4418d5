//! On-disk layout of the datastore
//!
//! ```text
//! <root>/<shard>/<key digest>/<doc name>/<edition>/<path>
//! ```
//!
//! The key digest is the SHA-256 of the insert key, and the shard is its
//! first two hex characters.

use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::errors::{invalid_path, Result};

/// Name of the per-edition index file
pub const EDITION_INDEX: &str = ".edition.json";

/// Prefix of edition directories still being written
pub const STAGING_PREFIX: &str = ".staging-";

/// Hex SHA-256 of a key
pub fn key_digest(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Whether `s` has the shape of a [`key_digest`]
pub fn is_key_digest(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Hex SHA-256 of some content
pub fn content_digest(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Directory holding all editions of one document under one key
///
/// For digest "abc123...", returns "<root>/ab/abc123.../<doc_name>"
pub fn document_dir(root: &Path, digest: &str, doc_name: &str) -> PathBuf {
    let shard = digest.get(..2).unwrap_or(digest);
    root.join(shard).join(digest).join(doc_name)
}

/// Check a document name is a single plain path component
pub fn validate_doc_name(doc_name: &str) -> Result<()> {
    if doc_name.is_empty() {
        return Err(invalid_path(doc_name, "document name is empty"));
    }
    if doc_name.contains('/') || doc_name.contains('\\') {
        return Err(invalid_path(doc_name, "document name contains a separator"));
    }
    if doc_name.starts_with('.') {
        return Err(invalid_path(doc_name, "document name starts with '.'"));
    }
    Ok(())
}

/// Resolve a manifest path below an edition directory
///
/// Only plain relative components are accepted.
pub fn entry_path(edition_dir: &Path, path: &str) -> Result<PathBuf> {
    if path.is_empty() {
        return Err(invalid_path(path, "path is empty"));
    }
    if path == EDITION_INDEX {
        return Err(invalid_path(path, "name is reserved"));
    }
    let relative = Path::new(path);
    for component in relative.components() {
        match component {
            Component::Normal(_) => {}
            _ => return Err(invalid_path(path, "only plain relative components allowed")),
        }
    }
    Ok(edition_dir.join(relative))
}
