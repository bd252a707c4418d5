//! Error handling for sone-store
//!
//! Wraps sone-core ExError with store-specific helpers

use sone_core::errors::{ExError, ExErrorKind, SoneError};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// A manifest path or document name that would escape its edition directory
pub fn invalid_path(path: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("validate_path")
        .with_message(format!("Invalid path '{}': {}", path, reason))
}

/// A URI the datastore cannot address
pub fn unsupported_uri(uri: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidUri)
        .with_op("resolve_uri")
        .with_message(format!("Cannot resolve '{}': {}", uri, reason))
}

/// An edition or entry that was never written
pub fn not_found(what: &str) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op("read_entry")
        .with_message(format!("{} not found", what))
}

/// Stored content that no longer matches its recorded digest
pub fn corrupt_entry(path: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op("read_entry")
        .with_message(format!(
            "Digest mismatch for {}: expected {}, got {}",
            path, expected, actual
        ))
}

/// Create a serialization error from serde_json::Error
pub fn from_serde_json(err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("edition_index")
        .with_message(err.to_string())
}

/// Collapse a store error into what the inserter sees
pub fn insertion_failed(err: ExError) -> SoneError {
    SoneError::InsertionFailed {
        reason: err.to_string(),
    }
}
