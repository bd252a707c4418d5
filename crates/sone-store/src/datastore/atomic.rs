//! Atomic write primitives
//!
//! Files and whole edition directories appear on disk through a single
//! rename, never half written.

use crate::errors::{io_error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Atomically write bytes to a file
///
/// The temp file lives next to the target so the rename never crosses
/// filesystems.
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create_entry_dir", e))?;
    }

    let temp_path = temp_sibling(target_path);
    if let Err(e) = fs::write(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error("write_entry_temp", e));
    }
    fs::rename(&temp_path, target_path).map_err(|e| io_error("rename_entry_temp", e))?;

    Ok(())
}

/// Move a fully written staging directory to its final place
///
/// Fails if `target_dir` already exists.
pub fn publish_dir(staging_dir: &Path, target_dir: &Path) -> Result<()> {
    if target_dir.exists() {
        return Err(io_error(
            "publish_edition",
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", target_dir.display()),
            ),
        ));
    }
    fs::rename(staging_dir, target_dir).map_err(|e| io_error("publish_edition", e))
}

fn temp_sibling(target_path: &Path) -> PathBuf {
    let name = target_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target_path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple()))
}
