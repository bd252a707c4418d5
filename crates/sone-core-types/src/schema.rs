//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_INSERT_ID: &str = "insert_id";

// Entity identifiers
pub const FIELD_SONE_ID: &str = "sone_id";
pub const FIELD_FINAL_URI: &str = "final_uri";
pub const FIELD_MODIFICATION_COUNTER: &str = "modification_counter";
pub const FIELD_CONSECUTIVE_FAILURES: &str = "consecutive_failures";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Canonical operation names
pub const OP_INSERT_SONE: &str = "insert_sone";
pub const OP_WRITE_MANIFEST: &str = "write_manifest";
pub const OP_ADD_SONE: &str = "add_sone";
pub const OP_REMOVE_SONE: &str = "remove_sone";
