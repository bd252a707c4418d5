//! Correlation id for insert attempts
//!
//! Every tick of an inserter that actually publishes gets a fresh
//! `InsertId`, so the start/end events and listener callbacks of one
//! attempt can be tied together in the logs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single insert attempt
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InsertId(String);

impl InsertId {
    /// Generate a new InsertId using UUIDv7 (time ordered)
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for InsertId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InsertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_id_generation() {
        let id1 = InsertId::new();
        let id2 = InsertId::new();

        assert_ne!(id1, id2);
        assert!(!id1.as_str().is_empty());
    }

    #[test]
    fn test_insert_ids_are_time_ordered() {
        let first = InsertId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = InsertId::new();

        assert!(first.as_str() < second.as_str());
    }

    #[test]
    fn test_insert_id_display() {
        let id = InsertId::new();
        assert_eq!(format!("{}", id), id.as_str());
    }

    #[test]
    fn test_serialization() {
        let id = InsertId::from_string("0190a0b4-0000-7000-8000-000000000000".to_string());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0190a0b4-0000-7000-8000-000000000000\"");
        let deserialized: InsertId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
