//! Filesystem-backed publishing
//!
//! Stands in for a Freenet node: each insert becomes a new edition
//! directory addressed by the digest of the insert key.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use sone_core::errors::ExError;
use sone_core::model::{FreenetUri, KeyType};
use sone_core::{log_op_end, log_op_error, log_op_start, FreenetInterface, Manifest};
use sone_core_types::schema::OP_WRITE_MANIFEST;

use crate::datastore::atomic::{atomic_write, publish_dir};
use crate::datastore::layout::{
    content_digest, document_dir, entry_path, is_key_digest, key_digest, validate_doc_name,
    EDITION_INDEX, STAGING_PREFIX,
};
use crate::errors::{
    corrupt_entry, from_serde_json, insertion_failed, invalid_path, io_error, not_found,
    unsupported_uri, Result,
};

/// Index written last into every edition directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditionIndex {
    pub edition: u64,
    pub default_document: String,
    pub entries: BTreeMap<String, IndexedEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedEntry {
    pub mime_type: String,
    pub size: u64,
    pub sha256: String,
}

/// A document read back from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// Local datastore rooted at a directory
#[derive(Debug, Clone)]
pub struct LocalDatastore {
    root: PathBuf,
}

impl LocalDatastore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a manifest as the next edition of the insert URI's document
    ///
    /// - Edition is the larger of the suggested edition and latest + 1
    /// - Entries are staged and the edition directory renamed into place
    /// - Returns `USK@<key digest>/<doc name>/<edition>`
    pub fn publish(
        &self,
        insert_uri: &FreenetUri,
        manifest: &Manifest,
        default_document: &str,
    ) -> Result<FreenetUri> {
        let start = Instant::now();
        let (digest, doc_name) = resolve_insert_uri(insert_uri)?;
        let doc_dir = document_dir(&self.root, &digest, doc_name);

        let suggested = insert_uri.edition().unwrap_or(0).max(0) as u64;
        let edition = match self.latest_in(&doc_dir)? {
            Some(latest) => suggested.max(latest + 1),
            None => suggested,
        };
        log_op_start!(
            OP_WRITE_MANIFEST,
            doc_name = doc_name,
            edition = edition,
            entries = manifest.len() as u64,
            bytes = manifest.size() as u64
        );

        let result = self
            .write_edition(&doc_dir, edition, manifest, default_document)
            .and_then(|()| {
                FreenetUri::parse(&format!("USK@{}/{}/{}", digest, doc_name, edition))
                    .map_err(ExError::from)
            });

        match &result {
            Ok(final_uri) => {
                log_op_end!(
                    OP_WRITE_MANIFEST,
                    duration_ms = start.elapsed().as_millis() as u64,
                    final_uri = %final_uri
                );
            }
            Err(err) => {
                log_op_error!(
                    OP_WRITE_MANIFEST,
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    doc_name = doc_name,
                    edition = edition
                );
            }
        }
        result
    }

    /// Newest complete edition stored for an insert URI, if any
    pub fn latest_edition(&self, insert_uri: &FreenetUri) -> Result<Option<u64>> {
        let (digest, doc_name) = resolve_insert_uri(insert_uri)?;
        self.latest_in(&document_dir(&self.root, &digest, doc_name))
    }

    /// Read one entry of a published edition
    ///
    /// An empty `path` returns the edition's default document.
    pub fn read(&self, final_uri: &FreenetUri, path: &str) -> Result<StoredEntry> {
        let edition_dir = self.edition_dir(final_uri)?;
        let index = read_index(&edition_dir)?;

        let path = if path.is_empty() {
            index.default_document.as_str()
        } else {
            path
        };
        let indexed = index
            .entries
            .get(path)
            .ok_or_else(|| not_found(&format!("entry {} of {}", path, final_uri)))?;

        let content =
            fs::read(entry_path(&edition_dir, path)?).map_err(|e| io_error("read_entry", e))?;
        let actual = content_digest(&content);
        if actual != indexed.sha256 {
            return Err(corrupt_entry(path, &indexed.sha256, &actual));
        }

        Ok(StoredEntry {
            mime_type: indexed.mime_type.clone(),
            content,
        })
    }

    /// Index of a published edition
    pub fn edition_index(&self, final_uri: &FreenetUri) -> Result<EditionIndex> {
        read_index(&self.edition_dir(final_uri)?)
    }

    fn edition_dir(&self, final_uri: &FreenetUri) -> Result<PathBuf> {
        let uri = final_uri.to_string();
        if final_uri.key_type() != KeyType::Usk {
            return Err(unsupported_uri(&uri, "not a USK"));
        }
        if !is_key_digest(final_uri.key()) {
            return Err(unsupported_uri(&uri, "key is not a key digest"));
        }
        let doc_name = final_uri
            .doc_name()
            .ok_or_else(|| unsupported_uri(&uri, "missing document name"))?;
        validate_doc_name(doc_name)?;
        let edition = final_uri
            .edition()
            .filter(|e| *e >= 0)
            .ok_or_else(|| unsupported_uri(&uri, "missing or negative edition"))?;

        let edition_dir =
            document_dir(&self.root, final_uri.key(), doc_name).join(edition.to_string());
        if !edition_dir.join(EDITION_INDEX).is_file() {
            return Err(not_found(&format!("edition {}", uri)));
        }
        Ok(edition_dir)
    }

    fn latest_in(&self, doc_dir: &Path) -> Result<Option<u64>> {
        let entries = match fs::read_dir(doc_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error("list_editions", e)),
        };

        let mut latest = None;
        for entry in entries {
            let entry = entry.map_err(|e| io_error("list_editions", e))?;
            let Some(edition) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u64>().ok())
            else {
                continue;
            };
            if entry.path().join(EDITION_INDEX).is_file() {
                latest = latest.max(Some(edition));
            }
        }
        Ok(latest)
    }

    fn write_edition(
        &self,
        doc_dir: &Path,
        edition: u64,
        manifest: &Manifest,
        default_document: &str,
    ) -> Result<()> {
        if !manifest.contains(default_document) {
            return Err(invalid_path(
                default_document,
                "default document is not part of the manifest",
            ));
        }

        let staging_dir = doc_dir.join(format!(
            "{}{}",
            STAGING_PREFIX,
            uuid::Uuid::new_v4().simple()
        ));
        let result = stage_edition(&staging_dir, edition, manifest, default_document)
            .and_then(|()| publish_dir(&staging_dir, &doc_dir.join(edition.to_string())));
        if result.is_err() {
            let _ = fs::remove_dir_all(&staging_dir);
        }
        result
    }
}

impl FreenetInterface for LocalDatastore {
    fn insert_directory(
        &self,
        insert_uri: &FreenetUri,
        manifest: &Manifest,
        default_document: &str,
    ) -> sone_core::Result<FreenetUri> {
        self.publish(insert_uri, manifest, default_document)
            .map_err(insertion_failed)
    }
}

fn resolve_insert_uri(insert_uri: &FreenetUri) -> Result<(String, &str)> {
    let doc_name = insert_uri.doc_name().ok_or_else(|| {
        // The insert key itself must not end up in an error message.
        unsupported_uri(insert_uri.key_type().as_str(), "insert URI has no document name")
    })?;
    validate_doc_name(doc_name)?;
    Ok((key_digest(insert_uri.key()), doc_name))
}

fn stage_edition(
    staging_dir: &Path,
    edition: u64,
    manifest: &Manifest,
    default_document: &str,
) -> Result<()> {
    let mut entries = BTreeMap::new();
    for (path, entry) in manifest.entries() {
        atomic_write(&entry_path(staging_dir, path)?, &entry.content)?;
        entries.insert(
            path.clone(),
            IndexedEntry {
                mime_type: entry.mime_type.clone(),
                size: entry.content.len() as u64,
                sha256: content_digest(&entry.content),
            },
        );
    }

    let index = EditionIndex {
        edition,
        default_document: default_document.to_string(),
        entries,
    };
    let encoded = serde_json::to_vec_pretty(&index).map_err(from_serde_json)?;
    atomic_write(&staging_dir.join(EDITION_INDEX), &encoded)
}

fn read_index(edition_dir: &Path) -> Result<EditionIndex> {
    let raw = fs::read(edition_dir.join(EDITION_INDEX)).map_err(|e| io_error("read_index", e))?;
    serde_json::from_slice(&raw).map_err(from_serde_json)
}
